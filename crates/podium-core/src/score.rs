//! Results computed by the backend once a debate completes

use serde::{Deserialize, Serialize};

/// Scores and written feedback for a finished debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub overall_score: f64,
    pub logic_score: f64,
    pub persuasion_score: f64,
    pub structure_score: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
}
