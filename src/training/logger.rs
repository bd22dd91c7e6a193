//! Training progress logging.
//!
//! [`TrainingLogger`] turns training events into `tracing` events, filtered
//! by a [`Verbosity`] level. The crate never installs a subscriber; the
//! caller decides where events go.

use serde::{Deserialize, Serialize};

use super::threshold::Diagnostic;

/// How much the trainer reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verbosity {
    /// Nothing.
    #[default]
    Silent,
    /// Diagnostics and failures only.
    Warning,
    /// Start/end of training and per-round metrics.
    Info,
    /// Also the selected feature set of every round.
    Debug,
}

/// Emits training events at the configured verbosity.
#[derive(Debug, Clone)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    n_rounds: usize,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            n_rounds: 0,
        }
    }

    #[inline]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn start_training(&mut self, n_rounds: usize, sparsity: usize, n_features: usize) {
        self.n_rounds = n_rounds;
        if self.verbosity >= Verbosity::Info {
            tracing::info!(n_rounds, sparsity, n_features, "starting group IHT training");
        }
    }

    pub fn log_round(
        &self,
        round: usize,
        train_loss: f64,
        held_out_accuracy: Option<f64>,
        selected: &[usize],
    ) {
        if self.verbosity >= Verbosity::Info {
            match held_out_accuracy {
                Some(accuracy) => tracing::info!(
                    round,
                    n_rounds = self.n_rounds,
                    train_loss,
                    accuracy,
                    "round complete"
                ),
                None => tracing::info!(round, n_rounds = self.n_rounds, train_loss, "round complete"),
            }
        }
        if self.verbosity >= Verbosity::Debug {
            tracing::debug!(round, ?selected, "selected features");
        }
    }

    pub fn log_diagnostic(&self, diagnostic: &Diagnostic) {
        if self.verbosity >= Verbosity::Warning {
            tracing::warn!(%diagnostic, "thresholding diagnostic");
        }
    }

    pub fn log_failure(&self, round: usize, quantity: &str) {
        if self.verbosity >= Verbosity::Warning {
            tracing::error!(round, quantity, "training stopped on non-finite values");
        }
    }

    pub fn finish_training(&self, rounds_completed: usize, selected: &[usize]) {
        if self.verbosity >= Verbosity::Info {
            tracing::info!(rounds_completed, ?selected, "training finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_ordering() {
        assert!(Verbosity::Silent < Verbosity::Warning);
        assert!(Verbosity::Warning < Verbosity::Info);
        assert!(Verbosity::Info < Verbosity::Debug);
        assert_eq!(Verbosity::default(), Verbosity::Silent);
    }

    #[test]
    fn logging_without_subscriber_is_harmless() {
        let mut logger = TrainingLogger::new(Verbosity::Debug);
        logger.start_training(3, 1, 2);
        logger.log_round(0, 0.5, Some(0.75), &[1]);
        logger.log_round(1, 0.4, None, &[0]);
        logger.log_diagnostic(&Diagnostic::SparsityExceedsFeatureCount {
            sparsity: 3,
            n_features: 2,
        });
        logger.finish_training(3, &[0]);
        assert_eq!(logger.verbosity(), Verbosity::Debug);
    }
}
