//! Encoded categorical data.
//!
//! - [`FeatureGroups`]: which one-hot columns belong to which original feature
//! - [`EncodedDataset`]: validated 0/1 feature matrix with class labels
//!
//! Encoding raw categorical values is left to the caller; this module only
//! checks that the supplied encoding is consistent.

mod dataset;
mod groups;

pub use dataset::{DatasetError, EncodedDataset};
pub use groups::FeatureGroups;
