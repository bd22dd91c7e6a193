//! Per-class sample weights for imbalanced labels.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::data::DatasetError;

/// Class weighting scheme applied to the training labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeighting {
    /// `n / (n_classes * count(c))`, the "balanced" scheme.
    #[default]
    Balanced,
    /// Every class weighs 1.
    Uniform,
}

impl ClassWeighting {
    /// Compute the weight table for `labels`.
    pub fn compute(
        self,
        labels: ArrayView1<'_, usize>,
        n_classes: usize,
    ) -> Result<ClassWeights, DatasetError> {
        match self {
            Self::Balanced => ClassWeights::balanced(labels, n_classes),
            Self::Uniform => Ok(ClassWeights::uniform(n_classes)),
        }
    }
}

/// One positive weight per class.
///
/// Computed once before training and immutable afterwards; the per-sample
/// weight of row `i` is `weight(labels[i])`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassWeights {
    table: Vec<f64>,
}

impl ClassWeights {
    /// Balanced weights: `weight(c) = n / (n_classes * count(c))`.
    ///
    /// With these weights every class contributes the same total weight and
    /// `Σ_c weight(c) * count(c) == n`.
    ///
    /// # Errors
    ///
    /// [`DatasetError::EmptyClass`] for the first class with no samples, and
    /// [`DatasetError::InvalidClassCount`] if `n_classes < 2`.
    pub fn balanced(labels: ArrayView1<'_, usize>, n_classes: usize) -> Result<Self, DatasetError> {
        if n_classes < 2 {
            return Err(DatasetError::InvalidClassCount(n_classes));
        }

        let mut counts = vec![0usize; n_classes];
        for (row, &label) in labels.iter().enumerate() {
            if label >= n_classes {
                return Err(DatasetError::LabelOutOfRange {
                    row,
                    label,
                    n_classes,
                });
            }
            counts[label] += 1;
        }

        if let Some(class) = counts.iter().position(|&c| c == 0) {
            return Err(DatasetError::EmptyClass { class });
        }

        let n = labels.len() as f64;
        let k = n_classes as f64;
        let table = counts.iter().map(|&c| n / (k * c as f64)).collect();
        Ok(Self { table })
    }

    /// All classes weighted 1.
    pub fn uniform(n_classes: usize) -> Self {
        Self {
            table: vec![1.0; n_classes],
        }
    }

    #[inline]
    pub fn n_classes(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn weight(&self, class: usize) -> f64 {
        self.table[class]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.table
    }

    /// Look up the weight of every sample by its label.
    ///
    /// # Panics
    ///
    /// Panics if a label is outside the table.
    pub fn sample_weights(&self, labels: ArrayView1<'_, usize>) -> Array1<f64> {
        labels.mapv(|label| self.table[label])
    }
}
