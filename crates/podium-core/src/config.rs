//! Debate configuration handed over by the setup wizard

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Immutable settings of one debate session.
///
/// Budgets are in seconds. A valid configuration has a positive turn budget
/// that fits at least once into the total budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateConfig {
    /// Session title chosen by the user
    pub title: String,
    /// Debate topic
    pub topic: String,
    /// Stance or instructions for the AI opponent
    pub ai_stance: String,
    /// Overall session ceiling
    pub total_budget_secs: u32,
    /// Time allotted to each speaker per turn
    pub turn_budget_secs: u32,
}

impl DebateConfig {
    pub fn new(
        title: impl Into<String>,
        topic: impl Into<String>,
        ai_stance: impl Into<String>,
        total_budget_secs: u32,
        turn_budget_secs: u32,
    ) -> Self {
        Self {
            title: title.into(),
            topic: topic.into(),
            ai_stance: ai_stance.into(),
            total_budget_secs,
            turn_budget_secs,
        }
    }

    /// Check that every field is populated and the budgets are consistent
    pub fn validate(&self) -> Result<(), SessionError> {
        let blank = [
            ("title", &self.title),
            ("topic", &self.topic),
            ("ai stance", &self.ai_stance),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        if let Some((field, _)) = blank {
            return Err(SessionError::InvalidConfig(format!("{field} is required")));
        }
        if self.turn_budget_secs == 0 {
            return Err(SessionError::InvalidConfig(
                "turn budget must be positive".to_string(),
            ));
        }
        if self.total_budget_secs < self.turn_budget_secs {
            return Err(SessionError::InvalidConfig(format!(
                "total budget {}s is shorter than one turn ({}s)",
                self.total_budget_secs, self.turn_budget_secs
            )));
        }
        Ok(())
    }

    /// Total budget rounded down to whole minutes, as the backend expects it
    pub fn duration_minutes(&self) -> u32 {
        self.total_budget_secs / 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = DebateConfig::new("Night debate", "AI Ethics", "against", 1800, 300);
        assert!(config.validate().is_ok());
        assert_eq!(config.duration_minutes(), 30);
    }

    #[test]
    fn test_blank_field_rejected() {
        let config = DebateConfig::new("  ", "AI Ethics", "against", 1800, 300);
        assert_eq!(
            config.validate(),
            Err(SessionError::InvalidConfig("title is required".to_string()))
        );
    }

    #[test]
    fn test_budget_rules() {
        let zero_turn = DebateConfig::new("t", "topic", "for", 1800, 0);
        assert!(zero_turn.validate().is_err());

        let short_total = DebateConfig::new("t", "topic", "for", 100, 300);
        assert!(short_total.validate().is_err());

        let exact = DebateConfig::new("t", "topic", "for", 300, 300);
        assert!(exact.validate().is_ok());
    }
}
