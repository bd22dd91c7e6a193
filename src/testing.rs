//! Testing utilities for catiht.
//!
//! Seeded synthetic categorical datasets and one-hot helpers, shared by unit
//! tests, integration tests and doc examples.
//!
//! ```
//! use catiht::testing::SyntheticCategorical;
//!
//! let data = SyntheticCategorical::new(&[3, 2], 2)
//!     .informative(&[0])
//!     .generate(50, 1)
//!     .unwrap();
//! assert_eq!(data.n_columns(), 5);
//! ```

use ndarray::{Array1, Array2};
use rand::prelude::*;

use crate::data::{DatasetError, EncodedDataset, FeatureGroups};

/// One-hot encode category codes.
///
/// `codes[row][feature]` is the category of `feature` in `row`, and must be
/// below that feature's cardinality.
///
/// # Panics
///
/// Panics if a row has the wrong number of features or a code is out of range.
pub fn one_hot(codes: &[Vec<usize>], groups: &FeatureGroups) -> Array2<f64> {
    let mut features = Array2::zeros((codes.len(), groups.n_columns()));
    for (r, row) in codes.iter().enumerate() {
        assert_eq!(row.len(), groups.n_groups(), "row {} has {} features", r, row.len());
        for (g, &code) in row.iter().enumerate() {
            let range = groups.range(g);
            assert!(code < range.len(), "code {} out of range for feature {}", code, g);
            features[[r, range.start + code]] = 1.0;
        }
    }
    features
}

/// Generator for categorical classification data.
///
/// Labels cycle through the classes so every class is present once there
/// are at least `n_classes` rows. An informative feature takes category
/// `label % cardinality` except with probability `noise`, where it is drawn
/// uniformly like every other feature.
#[derive(Debug, Clone)]
pub struct SyntheticCategorical {
    cardinalities: Vec<usize>,
    n_classes: usize,
    informative: Vec<usize>,
    noise: f64,
}

impl SyntheticCategorical {
    pub fn new(cardinalities: &[usize], n_classes: usize) -> Self {
        Self {
            cardinalities: cardinalities.to_vec(),
            n_classes,
            informative: Vec::new(),
            noise: 0.1,
        }
    }

    /// Features whose category tracks the label.
    pub fn informative(mut self, features: &[usize]) -> Self {
        self.informative = features.to_vec();
        self
    }

    /// Probability that an informative feature ignores the label. Default 0.1.
    pub fn noise(mut self, noise: f64) -> Self {
        self.noise = noise.clamp(0.0, 1.0);
        self
    }

    /// Generate `n_rows` rows from `seed`.
    pub fn generate(&self, n_rows: usize, seed: u64) -> Result<EncodedDataset, DatasetError> {
        let groups = FeatureGroups::from_cardinalities(&self.cardinalities)?;
        let mut rng = StdRng::seed_from_u64(seed);

        let labels: Array1<usize> = (0..n_rows).map(|i| i % self.n_classes.max(1)).collect();
        let codes: Vec<Vec<usize>> = labels
            .iter()
            .map(|&label| {
                self.cardinalities
                    .iter()
                    .enumerate()
                    .map(|(g, &card)| {
                        if self.informative.contains(&g) && rng.gen::<f64>() >= self.noise {
                            label % card
                        } else {
                            rng.gen_range(0..card)
                        }
                    })
                    .collect()
            })
            .collect();

        EncodedDataset::new(one_hot(&codes, &groups), labels, groups, self.n_classes)
    }
}
