//! catiht: group-sparse softmax regression for categorical feature selection.
//!
//! Categorical features are one-hot encoded into contiguous column groups.
//! A multinomial logistic regression is trained by iterative hard
//! thresholding: after every gradient step only the `s` original features
//! with the largest coefficient mass keep their columns. The surviving
//! features are the selection.
//!
//! # Layout
//!
//! - [`data`]: group index and validated one-hot datasets
//! - [`repr`]: the coefficient model
//! - [`training`]: weights, objective, thresholding and the training loop
//! - [`model`]: configuration and the high-level train/predict API
//! - [`testing`]: synthetic data for tests
//!
//! # Example
//!
//! ```
//! use catiht::model::{GroupIhtConfig, GroupIhtModel};
//! use catiht::testing::SyntheticCategorical;
//!
//! let data = SyntheticCategorical::new(&[4, 2, 3], 2)
//!     .informative(&[0])
//!     .generate(100, 7)
//!     .unwrap();
//!
//! let config = GroupIhtConfig::builder().sparsity(1).n_epochs(40).build().unwrap();
//! let model = GroupIhtModel::train(&data, None, config).unwrap();
//! assert!(model.selected_features().len() <= 1);
//! ```

pub mod data;
pub mod model;
pub mod repr;
pub mod testing;
pub mod training;

pub use data::{DatasetError, EncodedDataset, FeatureGroups};
pub use model::{ConfigError, GroupIhtConfig, GroupIhtModel, SelectionSummary};
pub use repr::SoftmaxModel;
pub use training::{IhtParams, IhtTrainer, TrainError, Verbosity};
