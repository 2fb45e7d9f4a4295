//! Setup wizard data: topic catalog, duration presets and the draft that
//! turns the wizard's choices into a [`DebateConfig`].

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::DebateConfig;

static TOPICS_JSON: &str = include_str!("../data/topics.json");
static TOPICS: OnceLock<Vec<Topic>> = OnceLock::new();

/// Errors from assembling a debate setup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("Please fill in {0} before starting")]
    MissingField(&'static str),
    #[error("Unknown duration preset: {0}")]
    UnknownPreset(String),
    #[error("{preset} does not offer {turn_secs}s turns")]
    UnsupportedTurn {
        preset: DurationPreset,
        turn_secs: u32,
    },
}

/// A suggested debate topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub icon: String,
}

impl Topic {
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.category.to_lowercase().contains(needle)
    }
}

/// The built-in topic catalog
pub fn catalog() -> &'static [Topic] {
    TOPICS.get_or_init(|| {
        serde_json::from_str(TOPICS_JSON).unwrap_or_else(|e| {
            warn!(error = %e, "Topic catalog is unreadable");
            Vec::new()
        })
    })
}

/// Case-insensitive search over name, description and category
pub fn search_topics(query: &str) -> Vec<&'static Topic> {
    let needle = query.trim().to_lowercase();
    catalog()
        .iter()
        .filter(|topic| needle.is_empty() || topic.matches(&needle))
        .collect()
}

/// Find a catalog topic by id or exact (case-insensitive) name
pub fn find_topic(key: &str) -> Option<&'static Topic> {
    let key = key.trim();
    if let Ok(id) = key.parse::<u32>() {
        return catalog().iter().find(|t| t.id == id);
    }
    catalog().iter().find(|t| t.name.eq_ignore_ascii_case(key))
}

/// Total session lengths offered by the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationPreset {
    Quick,
    Standard,
    Extended,
}

/// One turn length a preset allows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOption {
    pub seconds: u32,
    /// Turns each participant gets at this length
    pub turns_each: u32,
}

impl DurationPreset {
    pub const ALL: [DurationPreset; 3] = [Self::Quick, Self::Standard, Self::Extended];

    pub fn total_secs(self) -> u32 {
        match self {
            Self::Quick => 1200,
            Self::Standard => 1800,
            Self::Extended => 3600,
        }
    }

    pub fn minutes(self) -> u32 {
        self.total_secs() / 60
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Quick => "Quick practice session",
            Self::Standard => "Standard debate length",
            Self::Extended => "Extended discussion",
        }
    }

    fn turn_lengths(self) -> &'static [u32] {
        match self {
            Self::Quick => &[120],
            Self::Standard => &[180, 300],
            Self::Extended => &[120, 180, 300, 360],
        }
    }

    /// Turn lengths that split the session evenly between both participants
    pub fn turn_options(self) -> Vec<TurnOption> {
        let per_participant = self.total_secs() / 2;
        self.turn_lengths()
            .iter()
            .map(|&seconds| TurnOption {
                seconds,
                turns_each: per_participant / seconds,
            })
            .collect()
    }

    pub fn offers(self, turn_secs: u32) -> bool {
        self.turn_lengths().contains(&turn_secs)
    }
}

impl fmt::Display for DurationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} minutes", self.minutes())
    }
}

impl FromStr for DurationPreset {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" | "20" => Ok(Self::Quick),
            "standard" | "30" => Ok(Self::Standard),
            "extended" | "60" => Ok(Self::Extended),
            other => Err(SetupError::UnknownPreset(other.to_string())),
        }
    }
}

/// The wizard's in-progress choices
#[derive(Debug, Clone, Default)]
pub struct SetupDraft {
    pub title: String,
    pub topic: Option<String>,
    pub preset: Option<DurationPreset>,
    pub turn_secs: Option<u32>,
    pub ai_stance: String,
}

impl SetupDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn preset(mut self, preset: DurationPreset) -> Self {
        self.preset = Some(preset);
        self
    }

    pub fn turn_secs(mut self, seconds: u32) -> Self {
        self.turn_secs = Some(seconds);
        self
    }

    pub fn ai_stance(mut self, stance: impl Into<String>) -> Self {
        self.ai_stance = stance.into();
        self
    }

    /// Validate the choices and produce the session configuration
    pub fn build(&self) -> Result<DebateConfig, SetupError> {
        if self.title.trim().is_empty() {
            return Err(SetupError::MissingField("a title"));
        }
        let topic = self
            .topic
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(SetupError::MissingField("a topic"))?;
        let preset = self.preset.ok_or(SetupError::MissingField("a duration"))?;
        let turn_secs = self
            .turn_secs
            .ok_or(SetupError::MissingField("a turn length"))?;
        if self.ai_stance.trim().is_empty() {
            return Err(SetupError::MissingField("the AI stance"));
        }
        if !preset.offers(turn_secs) {
            return Err(SetupError::UnsupportedTurn { preset, turn_secs });
        }

        let topic = find_topic(topic)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| topic.trim().to_string());

        Ok(DebateConfig::new(
            self.title.trim(),
            topic,
            self.ai_stance.trim(),
            preset.total_secs(),
            turn_secs,
        ))
    }
}
