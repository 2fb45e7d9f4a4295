//! Mock debate backend for testing and offline practice

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::{stream, StreamExt};

use podium_core::{ArgumentKind, DebateConfig, ScoreResult, DONE_SENTINEL};

use crate::backend::{
    ArgumentRecord, BackendError, ByteStream, DebateBackend, DebateRecord, Feedback,
    FeedbackScores, UserStats,
};

/// Backend operations, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Initiate,
    SubmitArgument,
    SaveAiArgument,
    Respond,
    Complete,
    GetScores,
    GetDebate,
    GetFeedback,
    GetUserStats,
}

/// A call received by the mock, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Initiate { title: String, topic: String, ai_stance: String, duration_minutes: u32 },
    SubmitArgument { debate_id: String, content: String },
    SaveAiArgument { debate_id: String, content: String, kind: ArgumentKind },
    Respond { debate_id: String, content: String },
    Complete { debate_id: String },
    GetScores { debate_id: String },
    GetDebate { debate_id: String },
    GetFeedback { debate_id: String },
    GetUserStats,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<BackendCall>,
    failures: HashSet<Operation>,
    config: Option<DebateConfig>,
    user_arguments: Vec<ArgumentRecord>,
    ai_arguments: Vec<ArgumentRecord>,
    completed: bool,
    /// Fail streams with an interruption after this many fragments
    interrupt_after: Option<usize>,
}

/// A mock backend that streams canned AI replies
#[derive(Debug)]
pub struct MockBackend {
    debate_id: String,
    /// Canned replies (cycles through them)
    replies: Vec<String>,
    index: AtomicUsize,
    /// Characters per streamed fragment
    chunk_size: usize,
    /// Simulated delay before each stream item
    chunk_delay: Duration,
    /// Keep streams open after the last fragment instead of sending the sentinel
    hold_open: bool,
    scores: ScoreResult,
    state: Mutex<MockState>,
}

impl MockBackend {
    /// Create a mock with the given replies
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            debate_id: "mock-debate".to_string(),
            replies,
            index: AtomicUsize::new(0),
            chunk_size: 16,
            chunk_delay: Duration::ZERO,
            hold_open: false,
            scores: ScoreResult {
                overall_score: 7.5,
                logic_score: 8.0,
                persuasion_score: 7.0,
                structure_score: 7.5,
                strengths: vec!["Clear thesis".to_string()],
                improvements: vec!["Cite more evidence".to_string()],
            },
            state: Mutex::new(MockState::default()),
        }
    }

    /// Create a mock that always replies with the same text
    pub fn constant(reply: &str) -> Self {
        Self::new(vec![reply.to_string()])
    }

    /// A paced opponent for offline practice
    pub fn sparring() -> Self {
        Self::new(vec![
            "Let me open by questioning the premise. The benefits are often assumed \
             rather than demonstrated, and the costs fall on those with the least say."
                .to_string(),
            "That point deserves a closer look. Correlation is not causation, and the \
             evidence you cite comes from a narrow sample."
                .to_string(),
            "Even granting your example, it does not generalize. Consider who bears the \
             risk when the policy fails."
                .to_string(),
            "You have not addressed the strongest objection: the same goal can be reached \
             with fewer trade-offs."
                .to_string(),
        ])
        .with_chunk_size(6)
        .with_chunk_delay(Duration::from_millis(40))
    }

    pub fn with_debate_id(mut self, debate_id: impl Into<String>) -> Self {
        self.debate_id = debate_id.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn with_scores(mut self, scores: ScoreResult) -> Self {
        self.scores = scores;
        self
    }

    /// Break every stream after `fragments` fragments
    pub fn interrupt_streams_after(mut self, fragments: usize) -> Self {
        self.state
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .interrupt_after = Some(fragments);
        self
    }

    /// Change stream interruption for streams opened from now on
    pub fn set_stream_interruption(&self, fragments: Option<usize>) {
        self.state().interrupt_after = fragments;
    }

    /// Never finish streams
    pub fn hold_streams_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Make `operation` fail until [`MockBackend::recover`] is called
    pub fn fail(&self, operation: Operation) {
        self.state().failures.insert(operation);
    }

    pub fn recover(&self, operation: Operation) {
        self.state().failures.remove(&operation);
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state().calls.clone()
    }

    pub fn debate_id(&self) -> &str {
        &self.debate_id
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a call and report an injected failure
    fn record(&self, operation: Operation, call: BackendCall) -> Result<(), BackendError> {
        let mut state = self.state();
        state.calls.push(call);
        if state.failures.contains(&operation) {
            return Err(BackendError::RequestFailed {
                status: 500,
                message: format!("mock failure: {operation:?}"),
            });
        }
        Ok(())
    }

    fn check_id(&self, debate_id: &str) -> Result<(), BackendError> {
        if debate_id != self.debate_id {
            return Err(BackendError::RequestFailed {
                status: 404,
                message: "Debate not found".to_string(),
            });
        }
        Ok(())
    }

    fn next_reply(&self) -> String {
        if self.replies.is_empty() {
            return "I see it differently.".to_string();
        }
        let idx = self.index.fetch_add(1, Ordering::Relaxed);
        self.replies[idx % self.replies.len()].clone()
    }

    /// Encode a reply as the backend's event stream
    fn reply_stream(&self, debate_id: Option<&str>, reply: &str) -> ByteStream {
        let mut items: Vec<Result<Vec<u8>, BackendError>> = Vec::new();
        if let Some(id) = debate_id {
            items.push(Ok(event(&serde_json::json!({ "debateId": id }).to_string())));
        }

        let interrupt_after = self.state().interrupt_after;
        let chars: Vec<char> = reply.chars().collect();
        for (sent, piece) in chars.chunks(self.chunk_size).enumerate() {
            if interrupt_after == Some(sent) {
                items.push(Err(BackendError::StreamInterrupted(
                    "connection reset".to_string(),
                )));
                break;
            }
            let content: String = piece.iter().collect();
            items.push(Ok(event(
                &serde_json::json!({ "content": content }).to_string(),
            )));
        }

        let interrupted = items.iter().any(|item| item.is_err());
        if !interrupted && !self.hold_open {
            items.push(Ok(event(DONE_SENTINEL)));
        }

        let delay = self.chunk_delay;
        let body = stream::iter(items).then(move |item| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            item
        });

        if self.hold_open && !interrupted {
            body.chain(stream::pending::<Result<Vec<u8>, BackendError>>()).boxed()
        } else {
            body.boxed()
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::sparring()
            .with_chunk_delay(Duration::ZERO)
            .with_chunk_size(16)
    }
}

fn event(payload: &str) -> Vec<u8> {
    format!("data: {payload}\n\n").into_bytes()
}

#[async_trait]
impl DebateBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn initiate(&self, config: &DebateConfig) -> Result<ByteStream, BackendError> {
        self.record(
            Operation::Initiate,
            BackendCall::Initiate {
                title: config.title.clone(),
                topic: config.topic.clone(),
                ai_stance: config.ai_stance.clone(),
                duration_minutes: config.duration_minutes(),
            },
        )?;
        {
            let mut state = self.state();
            state.config = Some(config.clone());
            state.user_arguments.clear();
            state.ai_arguments.clear();
            state.completed = false;
        }
        let reply = self.next_reply();
        Ok(self.reply_stream(Some(&self.debate_id), &reply))
    }

    async fn submit_argument(&self, debate_id: &str, content: &str) -> Result<(), BackendError> {
        self.record(
            Operation::SubmitArgument,
            BackendCall::SubmitArgument {
                debate_id: debate_id.to_string(),
                content: content.to_string(),
            },
        )?;
        self.check_id(debate_id)?;
        self.state().user_arguments.push(ArgumentRecord {
            content: content.to_string(),
            kind: Some(ArgumentKind::Rebuttal),
            side: Some("user".to_string()),
            timestamp: Some(Utc::now()),
        });
        Ok(())
    }

    async fn save_ai_argument(
        &self,
        debate_id: &str,
        content: &str,
        kind: ArgumentKind,
    ) -> Result<(), BackendError> {
        self.record(
            Operation::SaveAiArgument,
            BackendCall::SaveAiArgument {
                debate_id: debate_id.to_string(),
                content: content.to_string(),
                kind,
            },
        )?;
        self.check_id(debate_id)?;
        self.state().ai_arguments.push(ArgumentRecord {
            content: content.to_string(),
            kind: Some(kind),
            side: Some("ai".to_string()),
            timestamp: Some(Utc::now()),
        });
        Ok(())
    }

    async fn respond(&self, debate_id: &str, content: &str) -> Result<ByteStream, BackendError> {
        self.record(
            Operation::Respond,
            BackendCall::Respond {
                debate_id: debate_id.to_string(),
                content: content.to_string(),
            },
        )?;
        self.check_id(debate_id)?;
        let reply = self.next_reply();
        Ok(self.reply_stream(None, &reply))
    }

    async fn complete(&self, debate_id: &str) -> Result<(), BackendError> {
        self.record(
            Operation::Complete,
            BackendCall::Complete {
                debate_id: debate_id.to_string(),
            },
        )?;
        self.check_id(debate_id)?;
        self.state().completed = true;
        Ok(())
    }

    async fn get_scores(&self, debate_id: &str) -> Result<ScoreResult, BackendError> {
        self.record(
            Operation::GetScores,
            BackendCall::GetScores {
                debate_id: debate_id.to_string(),
            },
        )?;
        self.check_id(debate_id)?;
        if !self.state().completed {
            return Err(BackendError::RequestFailed {
                status: 400,
                message: "Debate is not complete".to_string(),
            });
        }
        Ok(self.scores.clone())
    }

    async fn get_debate(&self, debate_id: &str) -> Result<DebateRecord, BackendError> {
        self.record(
            Operation::GetDebate,
            BackendCall::GetDebate {
                debate_id: debate_id.to_string(),
            },
        )?;
        self.check_id(debate_id)?;
        let state = self.state();
        let config = state.config.as_ref().ok_or(BackendError::RequestFailed {
            status: 404,
            message: "Debate not found".to_string(),
        })?;
        Ok(DebateRecord {
            id: self.debate_id.clone(),
            title: config.title.clone(),
            topic: config.topic.clone(),
            status: Some(if state.completed { "completed" } else { "active" }.to_string()),
            duration: Some(config.duration_minutes()),
            user_arguments: state.user_arguments.clone(),
            ai_arguments: state.ai_arguments.clone(),
            created_at: None,
        })
    }

    async fn get_feedback(&self, debate_id: &str) -> Result<Feedback, BackendError> {
        self.record(
            Operation::GetFeedback,
            BackendCall::GetFeedback {
                debate_id: debate_id.to_string(),
            },
        )?;
        self.check_id(debate_id)?;
        Ok(Feedback {
            scores: FeedbackScores {
                logic: self.scores.logic_score * 10.0,
                persuasion: self.scores.persuasion_score * 10.0,
                structure: self.scores.structure_score * 10.0,
            },
            suggestions: self.scores.improvements.clone(),
        })
    }

    async fn get_user_stats(&self) -> Result<UserStats, BackendError> {
        self.record(Operation::GetUserStats, BackendCall::GetUserStats)?;
        let state = self.state();
        let total = u32::from(state.config.is_some());
        let completed = u32::from(state.completed);
        Ok(UserStats {
            total_debates: total,
            completed_debates: completed,
            average_score: state.completed.then_some(self.scores.overall_score),
            extra: serde_json::Map::new(),
        })
    }
}
