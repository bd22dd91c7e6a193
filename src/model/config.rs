//! Group IHT configuration with builder pattern.
//!
//! [`GroupIhtConfig`] is built with `bon` and validated when the builder
//! finishes, so an invalid configuration never reaches the trainer.
//!
//! # Example
//!
//! ```
//! use catiht::model::GroupIhtConfig;
//! use catiht::training::ClassWeighting;
//!
//! let config = GroupIhtConfig::builder()
//!     .sparsity(5)
//!     .n_epochs(200)
//!     .learning_rate(0.05)
//!     .class_weighting(ClassWeighting::Uniform)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.seed, 42);
//! assert_eq!(config.batch_size, None);
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::training::{ClassWeighting, IhtParams, Verbosity};

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Learning rate must be finite and positive.
    InvalidLearningRate(f64),
    /// Number of epochs must be at least 1.
    InvalidEpochs,
    /// Sparsity must be at least 1.
    InvalidSparsity,
    /// Batch size, when given, must be at least 1.
    InvalidBatchSize,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLearningRate(v) => {
                write!(f, "learning_rate must be finite and positive, got {}", v)
            }
            Self::InvalidEpochs => write!(f, "n_epochs must be at least 1"),
            Self::InvalidSparsity => write!(f, "sparsity must be at least 1"),
            Self::InvalidBatchSize => write!(f, "batch_size must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

// =============================================================================
// GroupIhtConfig
// =============================================================================

/// Configuration for group IHT training.
///
/// `sparsity` is the only required field. A sparsity larger than the number
/// of original features is accepted; training then reports a diagnostic and
/// keeps every feature.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct GroupIhtConfig {
    // === Selection ===
    /// Number of original features to keep.
    pub sparsity: usize,

    // === Optimization ===
    /// Number of rounds. Default: 100.
    #[builder(default = 100)]
    pub n_epochs: usize,

    /// Gradient step size. Default: 0.1.
    #[builder(default = 0.1)]
    pub learning_rate: f64,

    /// Rows per round. `None` (default) uses the full training set.
    pub batch_size: Option<usize>,

    /// Per-class weighting of the loss. Default: `Balanced`.
    #[builder(default)]
    pub class_weighting: ClassWeighting,

    // === Reproducibility ===
    /// Random seed for batch sampling. Default: 42.
    #[builder(default = 42)]
    pub seed: u64,

    // === Logging ===
    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

/// Custom finishing function that validates the config.
impl<S: group_iht_config_builder::IsComplete> GroupIhtConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `sparsity`, `n_epochs` or `batch_size` is
    /// zero, or if `learning_rate` is not a positive finite number.
    pub fn build(self) -> Result<GroupIhtConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl GroupIhtConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if self.n_epochs == 0 {
            return Err(ConfigError::InvalidEpochs);
        }
        if self.sparsity == 0 {
            return Err(ConfigError::InvalidSparsity);
        }
        if self.batch_size == Some(0) {
            return Err(ConfigError::InvalidBatchSize);
        }
        Ok(())
    }

    /// Convert to trainer parameters.
    pub fn to_params(&self) -> IhtParams {
        IhtParams {
            sparsity: self.sparsity,
            n_epochs: self.n_epochs,
            learning_rate: self.learning_rate,
            batch_size: self.batch_size,
            class_weighting: self.class_weighting,
            seed: Some(self.seed),
            verbosity: self.verbosity,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
