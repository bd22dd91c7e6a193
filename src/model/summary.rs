//! Serializable record of a feature selection run.

use serde::{Deserialize, Serialize};

use crate::training::{Diagnostic, RoundRecord};

/// What a training run selected and how it got there.
///
/// Written as JSON so selections can be compared against other selectors
/// outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    /// Original features with non-zero coefficients, ascending.
    pub selected: Vec<usize>,
    /// Importance score of every original feature.
    pub importances: Vec<f64>,
    pub history: Vec<RoundRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SelectionSummary {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Final-round loss, if any round ran.
    pub fn final_loss(&self) -> Option<f64> {
        self.history.last().map(|r| r.train_loss)
    }

    /// Best held-out accuracy over all rounds.
    pub fn best_held_out_accuracy(&self) -> Option<f64> {
        self.history
            .iter()
            .filter_map(|r| r.held_out_accuracy)
            .max_by(f64::total_cmp)
    }
}
