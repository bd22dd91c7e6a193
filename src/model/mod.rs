//! High-level model API.
//!
//! - [`GroupIhtConfig`]: validated training configuration
//! - [`GroupIhtModel`]: train, predict, evaluate
//! - [`SelectionSummary`]: JSON-serializable selection report
//!
//! # Example
//!
//! ```ignore
//! use catiht::model::{GroupIhtConfig, GroupIhtModel};
//!
//! let config = GroupIhtConfig::builder().sparsity(10).build()?;
//! let model = GroupIhtModel::train(&train, Some(&test), config)?;
//! std::fs::write("selection.json", model.summary().to_json()?)?;
//! ```

mod config;
mod iht;
mod summary;

pub use config::{ConfigError, GroupIhtConfig, GroupIhtConfigBuilder};
pub use iht::GroupIhtModel;
pub use summary::SelectionSummary;
