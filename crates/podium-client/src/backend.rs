//! Debate backend trait and shared types

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use podium_core::{ArgumentKind, DebateConfig, ScoreResult};

/// Errors from the debate backend
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },
    #[error("Not signed in")]
    Unauthorized,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

/// Raw body of a streamed AI response, chunked as it arrives
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, BackendError>> + Send>>;

/// One argument stored on a debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentRecord {
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: Option<ArgumentKind>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A debate as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub topic: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub user_arguments: Vec<ArgumentRecord>,
    #[serde(default)]
    pub ai_arguments: Vec<ArgumentRecord>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Category scores shown in the feedback panel (0-100)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackScores {
    #[serde(default)]
    pub logic: f64,
    #[serde(default)]
    pub persuasion: f64,
    #[serde(default)]
    pub structure: f64,
}

/// Running feedback on a debate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub scores: FeedbackScores,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Aggregate statistics of the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(default)]
    pub total_debates: u32,
    #[serde(default)]
    pub completed_debates: u32,
    #[serde(default)]
    pub average_score: Option<f64>,
    /// Fields this client does not model
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Operations offered by the debate backend
#[async_trait]
pub trait DebateBackend: Send + Sync + fmt::Debug {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Register a debate and stream the AI's opening statement.
    /// The first event of the stream carries the new debate id.
    async fn initiate(&self, config: &DebateConfig) -> Result<ByteStream, BackendError>;

    /// Record the user's argument
    async fn submit_argument(&self, debate_id: &str, content: &str) -> Result<(), BackendError>;

    /// Record the AI's finished turn
    async fn save_ai_argument(
        &self,
        debate_id: &str,
        content: &str,
        kind: ArgumentKind,
    ) -> Result<(), BackendError>;

    /// Stream the AI's reply to an argument
    async fn respond(&self, debate_id: &str, content: &str) -> Result<ByteStream, BackendError>;

    /// Close the debate so the backend can score it
    async fn complete(&self, debate_id: &str) -> Result<(), BackendError>;

    async fn get_scores(&self, debate_id: &str) -> Result<ScoreResult, BackendError>;

    async fn get_debate(&self, debate_id: &str) -> Result<DebateRecord, BackendError>;

    async fn get_feedback(&self, debate_id: &str) -> Result<Feedback, BackendError>;

    async fn get_user_stats(&self) -> Result<UserStats, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debate_record_accepts_mongo_id() {
        let raw = r#"{
            "_id": "65f0",
            "title": "Practice",
            "topic": "AI Ethics",
            "status": "active",
            "duration": 30,
            "aiArguments": [{"content": "Opening", "type": "opening", "side": "ai"}]
        }"#;
        let record: DebateRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.id, "65f0");
        assert_eq!(record.ai_arguments[0].kind, Some(ArgumentKind::Opening));
        assert!(record.user_arguments.is_empty());
    }

    #[test]
    fn test_user_stats_keeps_unknown_fields() {
        let raw = r#"{"totalDebates": 4, "averageScore": 7.2, "streak": 3}"#;
        let stats: UserStats = serde_json::from_str(raw).unwrap();
        assert_eq!(stats.total_debates, 4);
        assert_eq!(stats.extra.get("streak"), Some(&serde_json::json!(3)));
    }
}
