//! Chat messages exchanged during a debate

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who holds the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Ai,
    User,
}

impl Speaker {
    /// The other participant
    pub fn opponent(self) -> Self {
        match self {
            Speaker::Ai => Speaker::User,
            Speaker::User => Speaker::Ai,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Ai => write!(f, "AI"),
            Speaker::User => write!(f, "user"),
        }
    }
}

/// How the backend files a recorded argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentKind {
    Opening,
    Rebuttal,
}

/// One entry of the debate transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub speaker: Speaker,
    pub content: String,
    /// Insertion order within the session, starting at 0
    pub position: usize,
    /// True only while an AI message is still receiving fragments
    pub streaming: bool,
}

impl Message {
    pub fn finalized(speaker: Speaker, content: impl Into<String>, position: usize) -> Self {
        Self {
            speaker,
            content: content.into(),
            position,
            streaming: false,
        }
    }

    pub(crate) fn streaming_ai(position: usize) -> Self {
        Self {
            speaker: Speaker::Ai,
            content: String::new(),
            position,
            streaming: true,
        }
    }
}
