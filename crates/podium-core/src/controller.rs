//! Turn session controller
//!
//! A single-writer reducer over one debate session. Every external event
//! (stream chunk, clock tick, user intent, backend acknowledgement) enters
//! through [`SessionController::apply`] as an [`Input`] and runs to
//! completion, returning the [`Effect`]s the caller must perform. The
//! controller itself never performs I/O, which keeps it testable without a
//! runtime or a UI.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::DebateConfig;
use crate::error::SessionError;
use crate::message::{ArgumentKind, Message, Speaker};
use crate::score::ScoreResult;
use crate::stream::{LineDecoder, StreamEvent};
use crate::turn::{HandoffOutcome, TickOutcome, TurnState};

/// Identifies one AI response stream. Chunks tagged with a stale id are dropped.
pub type StreamId = u64;

/// Argument text submitted when the user's turn runs out with nothing typed
pub const TIMEOUT_PLACEHOLDER: &str = "Time expired - no argument submitted";

/// One discrete event fed into the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    StreamChunk { stream: StreamId, bytes: Vec<u8> },
    StreamClosed { stream: StreamId },
    StreamFailed { stream: StreamId, error: String },
    Tick,
    Submit(String),
    Draft(String),
    Dictation(String),
    ToggleRunning,
    RetryResults,
    RetryResponse,
    ArgumentAccepted,
    ArgumentRejected(String),
    AiTurnSaved,
    AiTurnSaveFailed(String),
    Completed,
    CompletionFailed(String),
    ScoresLoaded(ScoreResult),
    ScoresFailed(String),
}

/// Work the caller performs on behalf of the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Open the session on the backend and stream the opening statement
    Initiate { stream: StreamId, config: DebateConfig },
    /// Stream the AI reply to `content`
    RequestResponse {
        stream: StreamId,
        debate_id: String,
        content: String,
    },
    /// Drop the reader of a stream that is no longer wanted
    CancelStream(StreamId),
    SubmitArgument { debate_id: String, content: String },
    SaveAiArgument {
        debate_id: String,
        content: String,
        kind: ArgumentKind,
    },
    Complete { debate_id: String },
    FetchScores { debate_id: String },
    Speak(String),
    StopSpeaking,
    Notify(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// The user can act to recover (resubmit, retry results)
    pub retryable: bool,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn warning(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
            retryable,
        }
    }

    pub fn error(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            retryable,
        }
    }
}

/// Where the session stands, beyond the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No session
    Idle,
    /// Initiation stream requested, nothing received yet
    Initiating,
    /// AI response is streaming in
    AiStreaming,
    /// AI stream broke off; the AI turn waits out its clock
    AiIdle,
    /// User holds the floor and may type
    AwaitingUser,
    /// User argument sent, waiting for the backend
    Submitting,
    Completing,
    FetchingScores,
    Scored,
    /// Completion or score fetch failed; a manual retry is available
    ResultsFailed,
    /// Initiation failed; the user must go back to setup
    Aborted,
}

/// Everything the presentation layer renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub title: String,
    pub topic: String,
    pub speaker: Option<Speaker>,
    pub remaining_total_secs: u32,
    pub remaining_turn_secs: u32,
    pub running: bool,
    pub terminal: bool,
    pub input_enabled: bool,
    pub messages: Vec<Message>,
    pub draft: String,
    pub remote_id: Option<String>,
    pub scores: Option<ScoreResult>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            title: String::new(),
            topic: String::new(),
            speaker: None,
            remaining_total_secs: 0,
            remaining_turn_secs: 0,
            running: false,
            terminal: false,
            input_enabled: false,
            messages: Vec::new(),
            draft: String::new(),
            remote_id: None,
            scores: None,
        }
    }
}

/// State of the one active debate
#[derive(Debug)]
pub struct Session {
    config: DebateConfig,
    turns: TurnState,
    messages: Vec<Message>,
    remote_id: Option<String>,
    scores: Option<ScoreResult>,
    phase: Phase,
    draft: String,
    decoder: LineDecoder,
    stream: Option<StreamId>,
    pending_argument: Option<String>,
    /// The user argument the current AI stream replies to
    reply_to: Option<String>,
    ai_turns_recorded: usize,
    completion_acknowledged: bool,
}

impl Session {
    fn new(config: DebateConfig) -> Self {
        let turns = TurnState::start(&config);
        Self {
            config,
            turns,
            messages: Vec::new(),
            remote_id: None,
            scores: None,
            phase: Phase::Initiating,
            draft: String::new(),
            decoder: LineDecoder::new(),
            stream: None,
            pending_argument: None,
            reply_to: None,
            ai_turns_recorded: 0,
            completion_acknowledged: false,
        }
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    pub fn turns(&self) -> &TurnState {
        &self.turns
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn scores(&self) -> Option<&ScoreResult> {
        self.scores.as_ref()
    }

    fn input_enabled(&self) -> bool {
        self.phase == Phase::AwaitingUser
            && self.turns.speaker == Speaker::User
            && !self.turns.is_terminal()
    }

    fn require_remote_id(&self) -> Result<String, SessionError> {
        self.remote_id.clone().ok_or(SessionError::MissingRemoteId)
    }

    fn streaming_message(&mut self) -> Option<&mut Message> {
        self.messages.last_mut().filter(|m| m.streaming)
    }
}

/// Drives one debate session at a time
#[derive(Debug, Default)]
pub struct SessionController {
    session: Option<Session>,
    next_stream: StreamId,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// True while the one-second timer should be scheduled
    pub fn is_ticking(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.phase != Phase::Aborted && s.turns.is_ticking())
            .unwrap_or(false)
    }

    /// Id of the stream whose chunks are currently accepted
    pub fn current_stream(&self) -> Option<StreamId> {
        self.session.as_ref().and_then(|s| s.stream)
    }

    pub fn snapshot(&self) -> Snapshot {
        let Some(session) = &self.session else {
            return Snapshot::default();
        };
        Snapshot {
            phase: session.phase,
            title: session.config.title.clone(),
            topic: session.config.topic.clone(),
            speaker: Some(session.turns.speaker),
            remaining_total_secs: session.turns.remaining_total_secs,
            remaining_turn_secs: session.turns.remaining_turn_secs,
            running: session.turns.running,
            terminal: session.turns.is_terminal() || session.phase == Phase::Aborted,
            input_enabled: session.input_enabled(),
            messages: session.messages.clone(),
            draft: session.draft.clone(),
            remote_id: session.remote_id.clone(),
            scores: session.scores.clone(),
        }
    }

    /// Apply one input. Refused intents become notices instead of errors.
    pub fn apply(&mut self, input: Input) -> Vec<Effect> {
        if self.is_inert() {
            debug!(?input, "Ignoring input without a live session");
            return Vec::new();
        }

        match input {
            Input::StreamChunk { stream, bytes } => self.ingest_stream_chunk(stream, &bytes),
            Input::StreamClosed { stream } => self.stream_closed(stream),
            Input::StreamFailed { stream, error } => self.stream_failed(stream, &error),
            Input::Tick => self.tick(),
            Input::Submit(text) => match self.submit_argument(&text) {
                Ok(effects) => effects,
                Err(SessionError::EmptyArgument | SessionError::InputDisabled) => {
                    debug!("Submission ignored while input is unavailable");
                    Vec::new()
                }
                Err(e) => vec![Effect::Notify(Notice::warning(e.to_string(), false))],
            },
            Input::Draft(text) => {
                self.set_draft(text);
                Vec::new()
            }
            Input::Dictation(text) => {
                self.append_dictation(&text);
                Vec::new()
            }
            Input::ToggleRunning => {
                self.toggle_running();
                Vec::new()
            }
            Input::RetryResults => match self.retry_results() {
                Ok(effects) => effects,
                Err(e) => vec![Effect::Notify(Notice::warning(e.to_string(), false))],
            },
            Input::RetryResponse => match self.retry_response() {
                Ok(effects) => effects,
                Err(e) => vec![Effect::Notify(Notice::warning(e.to_string(), false))],
            },
            Input::ArgumentAccepted => self.argument_accepted(),
            Input::ArgumentRejected(error) => self.argument_rejected(&error),
            Input::AiTurnSaved => {
                debug!("AI turn recorded");
                Vec::new()
            }
            Input::AiTurnSaveFailed(error) => {
                warn!(%error, "Failed to record AI turn");
                vec![Effect::Notify(Notice::warning(
                    format!("Failed to save AI response: {error}"),
                    false,
                ))]
            }
            Input::Completed => self.completion_acknowledged(),
            Input::CompletionFailed(error) => self.results_failed("complete debate", &error),
            Input::ScoresLoaded(scores) => self.scores_loaded(scores),
            Input::ScoresFailed(error) => self.results_failed("load debate results", &error),
        }
    }

    /// Begin a session: AI speaks first with full budgets and the clock running
    pub fn start_session(&mut self, config: DebateConfig) -> Result<Vec<Effect>, SessionError> {
        if self.session.as_ref().is_some_and(|s| s.phase != Phase::Aborted) {
            return Err(SessionError::AlreadyActive);
        }
        config.validate()?;

        info!(
            title = %config.title,
            topic = %config.topic,
            total_secs = config.total_budget_secs,
            turn_secs = config.turn_budget_secs,
            "Starting debate session"
        );

        let stream = self.allocate_stream();
        let mut session = Session::new(config.clone());
        session.stream = Some(stream);
        self.session = Some(session);

        Ok(vec![Effect::Initiate { stream, config }])
    }

    /// Discard the session, releasing its stream and speech output
    pub fn end_session(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        info!(phase = ?session.phase, "Ending debate session");

        let mut effects = Vec::new();
        if let Some(stream) = session.stream {
            effects.push(Effect::CancelStream(stream));
        }
        effects.push(Effect::StopSpeaking);
        effects
    }

    /// Decode a chunk of `stream` and apply its events in arrival order
    pub fn ingest_stream_chunk(&mut self, stream: StreamId, bytes: &[u8]) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.stream != Some(stream) {
            debug!(stream, "Dropping chunk from inactive stream");
            return Vec::new();
        }

        let events = session.decoder.push(bytes);
        self.apply_stream_events(stream, events)
    }

    fn apply_stream_events(&mut self, stream: StreamId, events: Vec<StreamEvent>) -> Vec<Effect> {
        let mut effects = Vec::new();
        for event in events {
            // A terminal event earlier in the batch may have retired the stream
            if self.current_stream() != Some(stream) {
                break;
            }
            effects.extend(self.apply_stream_event(event));
        }
        effects
    }

    fn apply_stream_event(&mut self, event: StreamEvent) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        match event {
            StreamEvent::Fragment(fragment) => {
                if session.phase == Phase::Initiating {
                    session.phase = Phase::AiStreaming;
                }
                if fragment.is_empty() {
                    return Vec::new();
                }
                let position = session.messages.len();
                match session.streaming_message() {
                    Some(message) => message.content.push_str(&fragment),
                    None => {
                        let mut message = Message::streaming_ai(position);
                        message.content.push_str(&fragment);
                        session.messages.push(message);
                    }
                }
                Vec::new()
            }
            StreamEvent::RemoteId(id) => {
                match &session.remote_id {
                    None => {
                        info!(debate_id = %id, "Debate registered with backend");
                        session.remote_id = Some(id);
                    }
                    Some(existing) if *existing != id => {
                        warn!(debate_id = %existing, ignored = %id, "Ignoring second debate id");
                    }
                    Some(_) => {}
                }
                if session.phase == Phase::Initiating {
                    session.phase = Phase::AiStreaming;
                }
                Vec::new()
            }
            StreamEvent::Malformed(_) => Vec::new(),
            StreamEvent::Done => {
                if session.remote_id.is_none() {
                    return self.abort("backend did not assign a debate id");
                }
                let mut effects = self.finish_ai_turn();
                effects.extend(self.handoff_turn(Speaker::Ai, Speaker::User));
                effects
            }
        }
    }

    /// Retire the current AI stream and record whatever text it produced
    fn finish_ai_turn(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        session.stream = None;
        session.reply_to = None;
        session.decoder.reset();

        let Some(message) = session.streaming_message() else {
            return effects;
        };
        message.streaming = false;
        let content = message.content.clone();

        if content.trim().is_empty() {
            return effects;
        }

        match session.require_remote_id() {
            Ok(debate_id) => {
                let kind = if session.ai_turns_recorded == 0 {
                    ArgumentKind::Opening
                } else {
                    ArgumentKind::Rebuttal
                };
                session.ai_turns_recorded += 1;
                effects.push(Effect::SaveAiArgument {
                    debate_id,
                    content: content.clone(),
                    kind,
                });
            }
            Err(e) => effects.push(Effect::Notify(Notice::warning(e.to_string(), false))),
        }
        effects.push(Effect::Speak(content));
        effects
    }

    fn stream_closed(&mut self, stream: StreamId) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.stream != Some(stream) {
            return Vec::new();
        }

        let events = session.decoder.finish();
        let mut effects = self.apply_stream_events(stream, events);
        if self.current_stream() == Some(stream) {
            effects.extend(self.stream_failed(stream, "response ended before completion"));
        }
        effects
    }

    fn stream_failed(&mut self, stream: StreamId, error: &str) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.stream != Some(stream) {
            return Vec::new();
        }

        if session.remote_id.is_none() {
            return self.abort(error);
        }

        warn!(stream, %error, "AI response stream failed");
        session.stream = None;
        session.decoder.reset();
        if let Some(message) = session.streaming_message() {
            message.streaming = false;
        }
        session.phase = Phase::AiIdle;
        let retryable = session.reply_to.is_some();

        vec![Effect::Notify(Notice::error(
            format!("Failed to receive AI response: {error}"),
            retryable,
        ))]
    }

    /// Ask again for the AI reply whose stream failed. The AI keeps the floor
    /// and its clock.
    pub fn retry_response(&mut self) -> Result<Vec<Effect>, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
        if session.phase != Phase::AiIdle || session.turns.is_terminal() {
            return Err(SessionError::NothingToRetry);
        }
        let content = session.reply_to.clone().ok_or(SessionError::NothingToRetry)?;
        let debate_id = session.require_remote_id()?;

        let stream = self.allocate_stream();
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        if session
            .messages
            .last()
            .is_some_and(|m| m.speaker == Speaker::Ai)
        {
            // partial reply from the failed stream
            session.messages.pop();
        }
        info!(stream, "Retrying AI response");
        session.stream = Some(stream);
        session.decoder.reset();
        session.phase = Phase::AiStreaming;
        Ok(vec![Effect::RequestResponse {
            stream,
            debate_id,
            content,
        }])
    }

    /// Initiation failed: keep nothing but the fact that it failed
    fn abort(&mut self, reason: &str) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        warn!(%reason, "Failed to start debate");

        let mut effects = Vec::new();
        if let Some(stream) = session.stream.take() {
            effects.push(Effect::CancelStream(stream));
        }
        session.decoder.reset();
        session.messages.clear();
        session.draft.clear();
        session.turns.terminate();
        session.phase = Phase::Aborted;

        effects.push(Effect::StopSpeaking);
        effects.push(Effect::Notify(Notice::error(
            format!("Failed to start debate: {reason}"),
            false,
        )));
        effects
    }

    /// Submit an argument typed by the user
    pub fn submit_argument(&mut self, text: &str) -> Result<Vec<Effect>, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
        if session.turns.is_terminal() {
            return Err(SessionError::Terminal);
        }
        if session.turns.speaker != Speaker::User {
            return Err(SessionError::NotYourTurn(session.turns.speaker));
        }
        if !session.input_enabled() {
            return Err(SessionError::InputDisabled);
        }
        let content = text.trim();
        if content.is_empty() {
            return Err(SessionError::EmptyArgument);
        }
        self.send_argument(content.to_string())
    }

    fn send_argument(&mut self, content: String) -> Result<Vec<Effect>, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        let debate_id = session.require_remote_id()?;

        debug!(chars = content.len(), "Submitting argument");
        session.phase = Phase::Submitting;
        session.pending_argument = Some(content.clone());
        Ok(vec![Effect::SubmitArgument { debate_id, content }])
    }

    fn argument_accepted(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.phase != Phase::Submitting {
            debug!("Unexpected argument acknowledgement");
            return Vec::new();
        }
        let Some(content) = session.pending_argument.take() else {
            return Vec::new();
        };

        let position = session.messages.len();
        session
            .messages
            .push(Message::finalized(Speaker::User, content.clone(), position));
        session.draft.clear();

        let last_turn = session.turns.is_last_turn(session.config.turn_budget_secs);
        let mut effects = self.handoff_turn(Speaker::User, Speaker::Ai);
        if last_turn {
            info!("Final argument recorded");
            return effects;
        }

        let stream = self.allocate_stream();
        let Some(session) = self.session.as_mut() else {
            return effects;
        };
        match session.require_remote_id() {
            Ok(debate_id) => {
                session.stream = Some(stream);
                session.reply_to = Some(content.clone());
                session.decoder.reset();
                session.phase = Phase::AiStreaming;
                effects.push(Effect::RequestResponse {
                    stream,
                    debate_id,
                    content,
                });
            }
            Err(e) => effects.push(Effect::Notify(Notice::error(e.to_string(), false))),
        }
        effects
    }

    fn argument_rejected(&mut self, error: &str) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.phase != Phase::Submitting {
            return Vec::new();
        }
        warn!(%error, "Argument submission failed");
        session.pending_argument = None;
        session.phase = Phase::AwaitingUser;
        if session.turns.remaining_turn_secs == 0 {
            // an automatic submission failed; give the turn a fresh clock
            session.turns.restart_turn(session.config.turn_budget_secs);
        }
        vec![Effect::Notify(Notice::error(
            format!("Failed to submit argument: {error}"),
            true,
        ))]
    }

    /// Pass the floor, deducting one full turn budget from the total
    pub fn handoff_turn(&mut self, from: Speaker, to: Speaker) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.turns.speaker != from {
            debug!(%from, current = %session.turns.speaker, "Ignoring stale handoff");
            return Vec::new();
        }

        let outcome = session
            .turns
            .handoff(to, session.config.turn_budget_secs);
        debug!(
            %from,
            %to,
            remaining_total = session.turns.remaining_total_secs,
            "Turn handed off"
        );

        match outcome {
            HandoffOutcome::Continued => {
                session.phase = match to {
                    Speaker::User => Phase::AwaitingUser,
                    Speaker::Ai => Phase::AiStreaming,
                };
                Vec::new()
            }
            HandoffOutcome::Exhausted => self.begin_completion(),
        }
    }

    /// Advance the clock by one second
    pub fn tick(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.phase == Phase::Aborted {
            return Vec::new();
        }

        match session.turns.tick() {
            TickOutcome::Idle | TickOutcome::Counted => Vec::new(),
            TickOutcome::Expired(Speaker::User) => self.user_turn_expired(),
            TickOutcome::Expired(Speaker::Ai) => self.ai_turn_expired(),
        }
    }

    fn user_turn_expired(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.phase == Phase::Submitting {
            debug!("User turn expired while an argument is in flight");
            return Vec::new();
        }

        let content = if session.draft.trim().is_empty() {
            TIMEOUT_PLACEHOLDER.to_string()
        } else {
            session.draft.trim().to_string()
        };
        info!("User turn expired, submitting automatically");

        match self.send_argument(content) {
            Ok(effects) => effects,
            Err(e) => vec![Effect::Notify(Notice::error(e.to_string(), false))],
        }
    }

    /// The AI ran out of time: abandon its stream and give the user the floor
    fn ai_turn_expired(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        if session.remote_id.is_none() {
            return self.abort("timed out waiting for the backend");
        }

        info!("AI turn expired");
        let mut effects = Vec::new();
        if let Some(stream) = session.stream {
            effects.push(Effect::CancelStream(stream));
        }
        effects.extend(self.finish_ai_turn());
        effects.extend(self.handoff_turn(Speaker::Ai, Speaker::User));
        effects
    }

    /// Pause or resume the clock without touching remaining times
    pub fn toggle_running(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.turns.is_terminal() {
                return;
            }
            session.turns.toggle_running();
            info!(running = session.turns.running, "Timer toggled");
        }
    }

    fn set_draft(&mut self, text: String) {
        if let Some(session) = self.session.as_mut() {
            session.draft = text;
        }
    }

    fn append_dictation(&mut self, text: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !session.draft.is_empty() && !session.draft.ends_with(' ') {
            session.draft.push(' ');
        }
        session.draft.push_str(text);
    }

    /// End the debate and request its scores. Repeated calls do not finalize twice.
    pub fn complete_session(&mut self) -> Result<Vec<Effect>, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        match session.phase {
            Phase::Aborted => return Err(SessionError::Terminal),
            Phase::Completing | Phase::FetchingScores | Phase::Scored => return Ok(Vec::new()),
            _ => {}
        }
        if session.remote_id.is_none() {
            return Ok(self.abort("debate ended before the backend registered it"));
        }
        session.turns.terminate();
        Ok(self.begin_completion())
    }

    fn begin_completion(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        if let Some(stream) = session.stream.take() {
            effects.push(Effect::CancelStream(stream));
            session.decoder.reset();
        }
        if let Some(message) = session.streaming_message() {
            message.streaming = false;
        }
        session.pending_argument = None;

        let debate_id = match session.require_remote_id() {
            Ok(id) => id,
            Err(e) => {
                session.phase = Phase::ResultsFailed;
                effects.push(Effect::Notify(Notice::error(e.to_string(), false)));
                return effects;
            }
        };

        if session.completion_acknowledged {
            session.phase = Phase::FetchingScores;
            effects.push(Effect::FetchScores { debate_id });
        } else {
            info!(%debate_id, "Completing debate");
            session.phase = Phase::Completing;
            effects.push(Effect::Complete { debate_id });
        }
        effects
    }

    fn completion_acknowledged(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.phase != Phase::Completing {
            return Vec::new();
        }
        session.completion_acknowledged = true;

        let mut effects = vec![Effect::Notify(Notice::info("Debate completed!"))];
        effects.extend(self.begin_completion());
        effects
    }

    fn scores_loaded(&mut self, scores: ScoreResult) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.phase != Phase::FetchingScores {
            return Vec::new();
        }
        info!(overall = scores.overall_score, "Scores received");
        session.scores = Some(scores);
        session.phase = Phase::Scored;
        Vec::new()
    }

    fn results_failed(&mut self, action: &str, error: &str) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if !matches!(session.phase, Phase::Completing | Phase::FetchingScores) {
            return Vec::new();
        }
        warn!(%action, %error, "Debate results unavailable");
        session.phase = Phase::ResultsFailed;
        vec![Effect::Notify(Notice::error(
            format!("Failed to {action}: {error}"),
            true,
        ))]
    }

    /// Manual retry of a failed completion or score fetch
    pub fn retry_results(&mut self) -> Result<Vec<Effect>, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
        if session.phase != Phase::ResultsFailed {
            return Err(SessionError::NothingToRetry);
        }
        Ok(self.begin_completion())
    }

    fn is_inert(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.phase == Phase::Aborted)
            .unwrap_or(true)
    }

    fn allocate_stream(&mut self) -> StreamId {
        self.next_stream += 1;
        self.next_stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(total: u32, turn: u32) -> DebateConfig {
        DebateConfig::new("Practice", "AI Ethics", "Argue against regulation", total, turn)
    }

    fn start(total: u32, turn: u32) -> (SessionController, StreamId) {
        let mut controller = SessionController::new();
        let effects = controller.start_session(config(total, turn)).unwrap();
        let stream = match effects.as_slice() {
            [Effect::Initiate { stream, .. }] => *stream,
            other => panic!("Expected Initiate, got {:?}", other),
        };
        (controller, stream)
    }

    fn feed(controller: &mut SessionController, stream: StreamId, lines: &[&str]) -> Vec<Effect> {
        let mut wire = lines.join("\n");
        wire.push('\n');
        controller.apply(Input::StreamChunk {
            stream,
            bytes: wire.into_bytes(),
        })
    }

    /// Run the opening statement through to the user's turn
    fn opened(total: u32, turn: u32) -> SessionController {
        let (mut controller, stream) = start(total, turn);
        feed(
            &mut controller,
            stream,
            &[
                r#"data: {"debateId":"abc"}"#,
                r#"data: {"content":"Opening"}"#,
                "data: [DONE]",
            ],
        );
        controller
    }

    fn ticks(controller: &mut SessionController, n: u32) -> Vec<Effect> {
        let mut effects = Vec::new();
        for _ in 0..n {
            effects.extend(controller.apply(Input::Tick));
        }
        effects
    }

    fn response_stream(effects: &[Effect]) -> StreamId {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::RequestResponse { stream, .. } => Some(*stream),
                _ => None,
            })
            .expect("RequestResponse effect")
    }

    #[test]
    fn test_start_session_initial_state() {
        let (controller, _) = start(1800, 300);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, Phase::Initiating);
        assert_eq!(snapshot.speaker, Some(Speaker::Ai));
        assert_eq!(snapshot.remaining_total_secs, 1800);
        assert_eq!(snapshot.remaining_turn_secs, 300);
        assert!(snapshot.running);
        assert!(!snapshot.input_enabled);
        assert!(controller.is_ticking());
    }

    #[test]
    fn test_start_session_rejects_bad_config_and_second_session() {
        let mut controller = SessionController::new();
        assert!(matches!(
            controller.start_session(config(100, 300)),
            Err(SessionError::InvalidConfig(_))
        ));
        assert!(controller.session().is_none());

        controller.start_session(config(1800, 300)).unwrap();
        assert_eq!(
            controller.start_session(config(1800, 300)),
            Err(SessionError::AlreadyActive)
        );
    }

    #[test]
    fn test_opening_stream_scenario() {
        let (mut controller, stream) = start(1800, 300);

        feed(&mut controller, stream, &[r#"data: {"debateId":"abc"}"#]);
        feed(&mut controller, stream, &[r#"data: {"content":"Hello"}"#]);
        let mid = controller.snapshot();
        assert_eq!(mid.messages.len(), 1);
        assert!(mid.messages[0].streaming);
        assert_eq!(mid.messages[0].content, "Hello");
        assert!(!mid.input_enabled);

        feed(&mut controller, stream, &[r#"data: {"content":" world"}"#]);
        let effects = feed(&mut controller, stream, &["data: [DONE]"]);

        let snapshot = controller.snapshot();
        assert_eq!(
            snapshot.messages,
            vec![Message::finalized(Speaker::Ai, "Hello world", 0)]
        );
        assert_eq!(snapshot.remote_id.as_deref(), Some("abc"));
        assert_eq!(snapshot.speaker, Some(Speaker::User));
        assert_eq!(snapshot.remaining_total_secs, 1500);
        assert_eq!(snapshot.remaining_turn_secs, 300);
        assert!(snapshot.input_enabled);
        assert_eq!(
            effects,
            vec![
                Effect::SaveAiArgument {
                    debate_id: "abc".to_string(),
                    content: "Hello world".to_string(),
                    kind: ArgumentKind::Opening,
                },
                Effect::Speak("Hello world".to_string()),
            ]
        );
    }

    #[test]
    fn test_remote_id_is_not_overwritten() {
        let (mut controller, stream) = start(1800, 300);
        feed(
            &mut controller,
            stream,
            &[r#"data: {"debateId":"abc"}"#, r#"data: {"debateId":"xyz"}"#],
        );
        assert_eq!(controller.snapshot().remote_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let (mut controller, stream) = start(1800, 300);
        feed(
            &mut controller,
            stream,
            &[
                r#"data: {"debateId":"abc"}"#,
                r#"data: {"content":"A"}"#,
                "data: {broken",
                r#"data: {"content":"B"}"#,
                "data: [DONE]",
            ],
        );
        assert_eq!(controller.snapshot().messages[0].content, "AB");
    }

    #[test]
    fn test_submit_argument_round_trip() {
        let mut controller = opened(1800, 300);
        controller.apply(Input::Draft("My point".to_string()));

        let effects = controller.apply(Input::Submit("  My point ".to_string()));
        assert_eq!(
            effects,
            vec![Effect::SubmitArgument {
                debate_id: "abc".to_string(),
                content: "My point".to_string(),
            }]
        );
        let waiting = controller.snapshot();
        assert_eq!(waiting.phase, Phase::Submitting);
        assert!(!waiting.input_enabled);
        assert_eq!(waiting.remaining_total_secs, 1500);

        let effects = controller.apply(Input::ArgumentAccepted);
        let stream = response_stream(&effects);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(
            snapshot.messages[1],
            Message::finalized(Speaker::User, "My point", 1)
        );
        assert_eq!(snapshot.speaker, Some(Speaker::Ai));
        assert_eq!(snapshot.remaining_total_secs, 1200);
        assert_eq!(snapshot.phase, Phase::AiStreaming);
        assert!(snapshot.draft.is_empty());
        assert_eq!(controller.current_stream(), Some(stream));

        let effects = feed(
            &mut controller,
            stream,
            &[r#"data: {"content":"Rebuttal"}"#, "data: [DONE]"],
        );
        assert!(effects.contains(&Effect::SaveAiArgument {
            debate_id: "abc".to_string(),
            content: "Rebuttal".to_string(),
            kind: ArgumentKind::Rebuttal,
        }));
        assert_eq!(controller.snapshot().remaining_total_secs, 900);
    }

    #[test]
    fn test_argument_rejection_keeps_turn() {
        let mut controller = opened(1800, 300);
        ticks(&mut controller, 10);
        controller.apply(Input::Submit("Point".to_string()));

        let effects = controller.apply(Input::ArgumentRejected("502".to_string()));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Notify(Notice { level: NoticeLevel::Error, retryable: true, .. })]
        ));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, Phase::AwaitingUser);
        assert!(snapshot.input_enabled);
        assert_eq!(snapshot.speaker, Some(Speaker::User));
        assert_eq!(snapshot.remaining_total_secs, 1500);
        assert_eq!(snapshot.remaining_turn_secs, 290);
        assert_eq!(snapshot.messages.len(), 1);
    }

    #[test]
    fn test_blank_or_out_of_turn_submission_is_refused() {
        let (mut controller, stream) = start(1800, 300);
        assert_eq!(
            controller.submit_argument("hello"),
            Err(SessionError::NotYourTurn(Speaker::Ai))
        );

        feed(
            &mut controller,
            stream,
            &[r#"data: {"debateId":"abc"}"#, "data: [DONE]"],
        );
        assert_eq!(
            controller.submit_argument("   "),
            Err(SessionError::EmptyArgument)
        );
        assert!(controller.apply(Input::Submit(String::new())).is_empty());
        assert_eq!(controller.snapshot().phase, Phase::AwaitingUser);
    }

    #[test]
    fn test_user_timeout_submits_placeholder() {
        let mut controller = opened(1800, 300);
        assert!(ticks(&mut controller, 299).is_empty());

        let effects = controller.apply(Input::Tick);
        assert_eq!(
            effects,
            vec![Effect::SubmitArgument {
                debate_id: "abc".to_string(),
                content: TIMEOUT_PLACEHOLDER.to_string(),
            }]
        );

        // no second submission while the first is in flight
        assert!(ticks(&mut controller, 5).is_empty());

        controller.apply(Input::ArgumentAccepted);
        let user = &controller.snapshot().messages[1];
        assert_eq!(user.speaker, Speaker::User);
        assert_eq!(user.content, TIMEOUT_PLACEHOLDER);
    }

    #[test]
    fn test_user_timeout_submits_draft() {
        let mut controller = opened(1800, 300);
        controller.apply(Input::Dictation("Speech".to_string()));
        controller.apply(Input::Dictation("matters".to_string()));

        let effects = ticks(&mut controller, 300);
        assert_eq!(
            effects,
            vec![Effect::SubmitArgument {
                debate_id: "abc".to_string(),
                content: "Speech matters".to_string(),
            }]
        );
    }

    #[test]
    fn test_ai_timeout_abandons_stream() {
        let mut controller = opened(1800, 300);
        controller.apply(Input::Submit("Point".to_string()));
        let stream = response_stream(&controller.apply(Input::ArgumentAccepted));
        feed(&mut controller, stream, &[r#"data: {"content":"partial"}"#]);

        let effects = ticks(&mut controller, 300);
        assert_eq!(effects[0], Effect::CancelStream(stream));
        assert!(effects.contains(&Effect::SaveAiArgument {
            debate_id: "abc".to_string(),
            content: "partial".to_string(),
            kind: ArgumentKind::Rebuttal,
        }));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.speaker, Some(Speaker::User));
        assert_eq!(snapshot.remaining_total_secs, 900);
        assert!(snapshot.input_enabled);
        assert!(snapshot.messages.iter().all(|m| !m.streaming));

        // late chunks of the abandoned stream change nothing
        feed(&mut controller, stream, &[r#"data: {"content":" more"}"#, "data: [DONE]"]);
        let after = controller.snapshot();
        assert_eq!(after.messages[2].content, "partial");
        assert_eq!(after.remaining_total_secs, 900);
    }

    #[test]
    fn test_last_turn_completes_session() {
        let mut controller = opened(600, 300);
        assert_eq!(controller.snapshot().remaining_total_secs, 300);

        controller.apply(Input::Submit("Closing".to_string()));
        let effects = controller.apply(Input::ArgumentAccepted);
        assert_eq!(
            effects,
            vec![Effect::Complete {
                debate_id: "abc".to_string()
            }]
        );

        let snapshot = controller.snapshot();
        assert!(snapshot.terminal);
        assert!(!controller.is_ticking());
        assert_eq!(snapshot.phase, Phase::Completing);

        let frozen = controller.snapshot();
        assert!(ticks(&mut controller, 10).is_empty());
        assert_eq!(controller.snapshot(), frozen);

        let effects = controller.apply(Input::Completed);
        assert!(effects.contains(&Effect::FetchScores {
            debate_id: "abc".to_string()
        }));
        assert_eq!(controller.complete_session(), Ok(Vec::new()));

        let scores = ScoreResult {
            overall_score: 7.0,
            logic_score: 8.0,
            persuasion_score: 6.0,
            structure_score: 7.0,
            strengths: vec!["Evidence".to_string()],
            improvements: vec![],
        };
        controller.apply(Input::ScoresLoaded(scores.clone()));
        let done = controller.snapshot();
        assert_eq!(done.phase, Phase::Scored);
        assert_eq!(done.scores, Some(scores));
    }

    #[test]
    fn test_score_failure_can_be_retried() {
        let mut controller = opened(600, 300);
        controller.apply(Input::Submit("Closing".to_string()));
        controller.apply(Input::ArgumentAccepted);
        controller.apply(Input::Completed);

        let effects = controller.apply(Input::ScoresFailed("timeout".to_string()));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Notify(Notice { retryable: true, .. })]
        ));
        assert_eq!(controller.snapshot().phase, Phase::ResultsFailed);
        assert!(controller.snapshot().terminal);

        let effects = controller.apply(Input::RetryResults);
        assert_eq!(
            effects,
            vec![Effect::FetchScores {
                debate_id: "abc".to_string()
            }]
        );
    }

    #[test]
    fn test_completion_failure_retries_completion() {
        let mut controller = opened(600, 300);
        controller.apply(Input::Submit("Closing".to_string()));
        controller.apply(Input::ArgumentAccepted);
        controller.apply(Input::CompletionFailed("down".to_string()));

        assert_eq!(
            controller.retry_results(),
            Ok(vec![Effect::Complete {
                debate_id: "abc".to_string()
            }])
        );
        assert_eq!(controller.retry_results(), Err(SessionError::NothingToRetry));
    }

    #[test]
    fn test_initiation_failure_aborts() {
        let (mut controller, stream) = start(1800, 300);
        feed(&mut controller, stream, &[r#"data: {"content":"Hel"}"#]);

        let effects = controller.apply(Input::StreamFailed {
            stream,
            error: "connection reset".to_string(),
        });
        assert!(effects.contains(&Effect::CancelStream(stream)));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notify(Notice { level: NoticeLevel::Error, retryable: false, .. })
        )));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, Phase::Aborted);
        assert!(snapshot.messages.is_empty());
        assert!(snapshot.terminal);
        assert!(!controller.is_ticking());
        assert!(controller.apply(Input::Tick).is_empty());

        assert!(controller.start_session(config(1800, 300)).is_ok());
    }

    #[test]
    fn test_mid_turn_stream_failure_leaves_turn() {
        let mut controller = opened(1800, 300);
        controller.apply(Input::Submit("Point".to_string()));
        let stream = response_stream(&controller.apply(Input::ArgumentAccepted));
        feed(&mut controller, stream, &[r#"data: {"content":"Half"}"#]);

        let effects = controller.apply(Input::StreamFailed {
            stream,
            error: "reset".to_string(),
        });
        assert_eq!(effects.len(), 1);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, Phase::AiIdle);
        assert_eq!(snapshot.speaker, Some(Speaker::Ai));
        assert_eq!(snapshot.remaining_total_secs, 1200);
        assert!(!snapshot.input_enabled);
        assert!(!snapshot.messages[2].streaming);

        // the AI clock still hands the floor back
        ticks(&mut controller, 300);
        assert_eq!(controller.snapshot().speaker, Some(Speaker::User));
        assert!(controller.snapshot().input_enabled);
    }

    #[test]
    fn test_failed_response_can_be_requested_again() {
        let mut controller = opened(1800, 300);
        controller.apply(Input::Submit("Point".to_string()));
        let failed = response_stream(&controller.apply(Input::ArgumentAccepted));
        feed(&mut controller, failed, &[r#"data: {"content":"Half"}"#]);
        ticks(&mut controller, 40);

        let effects = controller.apply(Input::StreamFailed {
            stream: failed,
            error: "reset".to_string(),
        });
        assert!(matches!(
            effects.as_slice(),
            [Effect::Notify(Notice { level: NoticeLevel::Error, retryable: true, .. })]
        ));
        assert_eq!(
            controller.submit_argument("again"),
            Err(SessionError::NotYourTurn(Speaker::Ai))
        );

        let effects = controller.apply(Input::RetryResponse);
        let retried = response_stream(&effects);
        assert_ne!(retried, failed);
        assert_eq!(
            effects,
            vec![Effect::RequestResponse {
                stream: retried,
                debate_id: "abc".to_string(),
                content: "Point".to_string(),
            }]
        );

        // same AI turn: no handoff, clock untouched
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, Phase::AiStreaming);
        assert_eq!(snapshot.speaker, Some(Speaker::Ai));
        assert_eq!(snapshot.remaining_total_secs, 1200);
        assert_eq!(snapshot.remaining_turn_secs, 260);
        assert_eq!(snapshot.messages.len(), 2);

        feed(&mut controller, failed, &[r#"data: {"content":"stale"}"#]);
        let effects = feed(
            &mut controller,
            retried,
            &[r#"data: {"content":"Whole reply"}"#, "data: [DONE]"],
        );
        assert!(effects.contains(&Effect::SaveAiArgument {
            debate_id: "abc".to_string(),
            content: "Whole reply".to_string(),
            kind: ArgumentKind::Rebuttal,
        }));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.messages.len(), 3);
        assert_eq!(snapshot.messages[2].content, "Whole reply");
        assert_eq!(snapshot.speaker, Some(Speaker::User));
        assert_eq!(snapshot.remaining_total_secs, 900);
        assert_eq!(controller.retry_response(), Err(SessionError::NothingToRetry));
    }

    #[test]
    fn test_failed_opening_after_registration_is_not_retryable() {
        let (mut controller, stream) = start(1800, 300);
        feed(&mut controller, stream, &[r#"data: {"debateId":"abc"}"#]);

        let effects = controller.apply(Input::StreamFailed {
            stream,
            error: "reset".to_string(),
        });
        assert!(matches!(
            effects.as_slice(),
            [Effect::Notify(Notice { retryable: false, .. })]
        ));
        assert_eq!(controller.snapshot().phase, Phase::AiIdle);
        assert_eq!(controller.retry_response(), Err(SessionError::NothingToRetry));
    }

    #[test]
    fn test_rejected_timeout_submission_restarts_user_clock() {
        let mut controller = opened(1800, 300);
        let effects = ticks(&mut controller, 300);
        assert_eq!(effects.len(), 1);

        controller.apply(Input::ArgumentRejected("502".to_string()));
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, Phase::AwaitingUser);
        assert_eq!(snapshot.remaining_turn_secs, 300);
        assert_eq!(snapshot.remaining_total_secs, 1500);
        assert!(controller.is_ticking());

        let effects = ticks(&mut controller, 300);
        assert_eq!(
            effects,
            vec![Effect::SubmitArgument {
                debate_id: "abc".to_string(),
                content: TIMEOUT_PLACEHOLDER.to_string(),
            }]
        );
    }

    #[test]
    fn test_finish_before_registration_aborts() {
        let (mut controller, stream) = start(1800, 300);
        feed(&mut controller, stream, &[r#"data: {"content":"Hel"}"#]);

        let effects = controller.complete_session().unwrap();
        assert!(effects.contains(&Effect::CancelStream(stream)));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notify(Notice { level: NoticeLevel::Error, retryable: false, .. })
        )));
        assert_eq!(controller.snapshot().phase, Phase::Aborted);
        assert!(controller.apply(Input::RetryResults).is_empty());
        assert_eq!(controller.complete_session(), Err(SessionError::Terminal));
    }

    #[test]
    fn test_stream_closed_without_sentinel() {
        let mut controller = opened(1800, 300);
        controller.apply(Input::Submit("Point".to_string()));
        let stream = response_stream(&controller.apply(Input::ArgumentAccepted));
        feed(&mut controller, stream, &[r#"data: {"content":"Cut"}"#]);

        controller.apply(Input::StreamClosed { stream });
        assert_eq!(controller.snapshot().phase, Phase::AiIdle);
    }

    #[test]
    fn test_unterminated_sentinel_before_close() {
        let (mut controller, stream) = start(1800, 300);
        feed(&mut controller, stream, &[r#"data: {"debateId":"abc"}"#]);
        controller.apply(Input::StreamChunk {
            stream,
            bytes: b"data: {\"content\":\"x\"}\ndata: [DONE]".to_vec(),
        });
        controller.apply(Input::StreamClosed { stream });
        assert_eq!(controller.snapshot().phase, Phase::AwaitingUser);
    }

    #[test]
    fn test_toggle_running_pauses_clock() {
        let mut controller = opened(1800, 300);
        controller.apply(Input::ToggleRunning);
        assert!(!controller.is_ticking());
        ticks(&mut controller, 5);
        assert_eq!(controller.snapshot().remaining_turn_secs, 300);

        controller.apply(Input::ToggleRunning);
        ticks(&mut controller, 5);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.remaining_turn_secs, 295);
        assert_eq!(snapshot.remaining_total_secs, 1500);
    }

    #[test]
    fn test_fixed_deduction_independent_of_time_used() {
        let mut controller = opened(1800, 300);
        // opening consumed no clock time; now burn most of the user's turn
        ticks(&mut controller, 250);
        controller.apply(Input::Submit("Point".to_string()));
        let stream = response_stream(&controller.apply(Input::ArgumentAccepted));
        feed(&mut controller, stream, &["data: {\"content\":\"r\"}", "data: [DONE]"]);

        assert_eq!(controller.snapshot().remaining_total_secs, 1800 - 3 * 300);
    }

    #[test]
    fn test_end_session_releases_stream() {
        let (mut controller, stream) = start(1800, 300);
        assert_eq!(
            controller.end_session(),
            vec![Effect::CancelStream(stream), Effect::StopSpeaking]
        );
        assert!(controller.session().is_none());
        assert_eq!(controller.snapshot().phase, Phase::Idle);
        assert!(!controller.is_ticking());
    }

    proptest! {
        #[test]
        fn prop_streamed_message_is_concatenation(
            fragments in proptest::collection::vec("[a-zA-Z .,!?]{0,10}", 1..12),
        ) {
            let (mut controller, stream) = start(1800, 300);
            feed(&mut controller, stream, &[r#"data: {"debateId":"abc"}"#]);

            let mut seen = String::new();
            for fragment in &fragments {
                let line = format!("data: {}", serde_json::json!({ "content": fragment }));
                feed(&mut controller, stream, &[line.as_str()]);
                seen.push_str(fragment);

                let snapshot = controller.snapshot();
                let streaming = snapshot.messages.iter().filter(|m| m.streaming).count();
                prop_assert!(streaming <= 1);
                if !seen.is_empty() {
                    prop_assert_eq!(&snapshot.messages.last().unwrap().content, &seen);
                }
            }

            feed(&mut controller, stream, &["data: [DONE]"]);
            let snapshot = controller.snapshot();
            prop_assert!(snapshot.messages.iter().all(|m| !m.streaming));
            if seen.is_empty() {
                prop_assert!(snapshot.messages.is_empty());
            } else {
                prop_assert_eq!(&snapshot.messages[0].content, &seen);
            }
        }
    }
}
