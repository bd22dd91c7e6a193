//! Training infrastructure for group-sparse softmax regression.
//!
//! - [`ClassWeights`]: balanced per-class sample weights
//! - [`group_scores`] / [`GroupThreshold`]: group-wise hard thresholding
//! - [`SoftmaxObjective`]: weighted softmax loss and its closed-form gradient
//! - [`MetricFn`]: evaluation metrics over class probabilities
//! - [`BatchSampler`]: per-round row sampling
//! - [`IhtSession`] / [`IhtTrainer`]: the projected gradient loop
//! - [`TrainingLogger`]: `tracing` output gated by [`Verbosity`]

mod logger;
mod metrics;
mod objective;
pub mod sampling;
mod threshold;
mod trainer;
mod weights;

pub use logger::{TrainingLogger, Verbosity};
pub use metrics::{argmax_rows, MetricFn, MulticlassAccuracy, MulticlassLogLoss};
pub use objective::{Batch, SoftmaxObjective, LOG_PROB_FLOOR};
pub use sampling::BatchSampler;
pub use threshold::{group_scores, nonzero_groups, Diagnostic, GroupThreshold, Thresholded};
pub use trainer::{
    IhtParams, IhtSession, IhtTrainer, Quantity, RoundRecord, TrainError, TrainingOutcome,
    TrainingPhase,
};
pub use weights::{ClassWeighting, ClassWeights};
