//! Validated one-hot encoded dataset.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::FeatureGroups;

/// Dataset construction and validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    #[error("cardinality of feature {feature} must be >= 1, got {cardinality}")]
    InvalidCardinality { feature: usize, cardinality: usize },

    #[error("at least one categorical feature is required")]
    NoFeatures,

    #[error("class {class} has no samples; balanced class weight is undefined")]
    EmptyClass { class: usize },

    #[error("feature matrix has {got} columns but the group index covers {expected}")]
    ColumnMismatch { expected: usize, got: usize },

    #[error("number of labels ({labels}) does not match number of rows ({rows})")]
    LabelLengthMismatch { rows: usize, labels: usize },

    #[error("label {label} at row {row} is out of range for {n_classes} classes")]
    LabelOutOfRange {
        row: usize,
        label: usize,
        n_classes: usize,
    },

    #[error("one-hot value at ({row}, {column}) must be 0 or 1, got {value}")]
    NonBinaryValue { row: usize, column: usize, value: f64 },

    #[error("number of weights ({weights}) does not match number of rows ({rows})")]
    WeightLengthMismatch { rows: usize, weights: usize },

    #[error("at least 2 classes are required, got {0}")]
    InvalidClassCount(usize),

    #[error("data has {got} classes but the model has {expected}")]
    ClassCountMismatch { expected: usize, got: usize },

    #[error("dataset has no rows")]
    EmptyDataset,
}

/// Dense one-hot encoded features with class labels.
///
/// Rows are samples, columns are one-hot indicator columns partitioned into
/// contiguous groups by [`FeatureGroups`]. All shapes and values are checked
/// at construction so the training loop never sees malformed input.
#[derive(Debug, Clone)]
pub struct EncodedDataset {
    /// Shape `[n_samples, n_columns]`, values in {0, 1}.
    features: Array2<f64>,
    labels: Array1<usize>,
    groups: FeatureGroups,
    n_classes: usize,
}

impl EncodedDataset {
    /// Create a dataset, validating shapes, label range and binary values.
    ///
    /// `n_classes` is the class count of the full (pre-split) label set, so
    /// partitions of one dataset always agree on it.
    pub fn new(
        features: Array2<f64>,
        labels: Array1<usize>,
        groups: FeatureGroups,
        n_classes: usize,
    ) -> Result<Self, DatasetError> {
        if n_classes < 2 {
            return Err(DatasetError::InvalidClassCount(n_classes));
        }
        if features.ncols() != groups.n_columns() {
            return Err(DatasetError::ColumnMismatch {
                expected: groups.n_columns(),
                got: features.ncols(),
            });
        }
        if labels.len() != features.nrows() {
            return Err(DatasetError::LabelLengthMismatch {
                rows: features.nrows(),
                labels: labels.len(),
            });
        }
        if let Some((row, &label)) = labels.iter().enumerate().find(|&(_, &l)| l >= n_classes) {
            return Err(DatasetError::LabelOutOfRange {
                row,
                label,
                n_classes,
            });
        }
        if let Some(((row, column), &value)) = features
            .indexed_iter()
            .find(|&(_, &v)| v != 0.0 && v != 1.0)
        {
            return Err(DatasetError::NonBinaryValue { row, column, value });
        }

        Ok(Self {
            features,
            labels,
            groups,
            n_classes,
        })
    }

    /// Create a dataset with the class count inferred as `max(label) + 1`.
    pub fn with_inferred_classes(
        features: Array2<f64>,
        labels: Array1<usize>,
        groups: FeatureGroups,
    ) -> Result<Self, DatasetError> {
        let n_classes = labels.iter().copied().max().map_or(0, |m| m + 1);
        Self::new(features, labels, groups, n_classes)
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.features.ncols()
    }

    #[inline]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_samples() == 0
    }

    /// Feature matrix view, shape `[n_samples, n_columns]`.
    #[inline]
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    #[inline]
    pub fn labels(&self) -> ArrayView1<'_, usize> {
        self.labels.view()
    }

    #[inline]
    pub fn groups(&self) -> &FeatureGroups {
        &self.groups
    }

    /// Number of samples per class, length `n_classes`.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &label in self.labels.iter() {
            counts[label] += 1;
        }
        counts
    }

    /// New dataset made of the given rows, in order. Rows may repeat.
    ///
    /// The group index and class count are carried over unchanged.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), rows),
            labels: rows.iter().map(|&r| self.labels[r]).collect(),
            groups: self.groups.clone(),
            n_classes: self.n_classes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn groups() -> FeatureGroups {
        FeatureGroups::from_cardinalities(&[2, 2]).unwrap()
    }

    #[test]
    fn valid_dataset() {
        let features = array![[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 1.0, 0.0]];
        let ds = EncodedDataset::new(features, array![0, 2], groups(), 3).unwrap();
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.n_columns(), 4);
        assert_eq!(ds.class_counts(), vec![1, 0, 1]);
    }

    #[test]
    fn column_mismatch_rejected() {
        let features = array![[1.0, 0.0, 1.0]];
        let err = EncodedDataset::new(features, array![0], groups(), 2).unwrap_err();
        assert_eq!(err, DatasetError::ColumnMismatch { expected: 4, got: 3 });
    }

    #[test]
    fn label_length_mismatch_rejected() {
        let features = array![[1.0, 0.0, 1.0, 0.0]];
        let err = EncodedDataset::new(features, array![0, 1], groups(), 2).unwrap_err();
        assert_eq!(err, DatasetError::LabelLengthMismatch { rows: 1, labels: 2 });
    }

    #[test]
    fn label_out_of_range_rejected() {
        let features = array![[1.0, 0.0, 1.0, 0.0], [0.0, 1.0, 0.0, 1.0]];
        let err = EncodedDataset::new(features, array![0, 2], groups(), 2).unwrap_err();
        assert_eq!(
            err,
            DatasetError::LabelOutOfRange {
                row: 1,
                label: 2,
                n_classes: 2
            }
        );
    }

    #[test]
    fn non_binary_rejected() {
        let features = array![[1.0, 0.0, 0.5, 0.0]];
        let err = EncodedDataset::new(features, array![0], groups(), 2).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::NonBinaryValue { row: 0, column: 2, .. }
        ));
    }

    #[test]
    fn inferred_classes() {
        let features = array![[1.0, 0.0, 1.0, 0.0], [0.0, 1.0, 0.0, 1.0]];
        let ds = EncodedDataset::with_inferred_classes(features, array![0, 3], groups()).unwrap();
        assert_eq!(ds.n_classes(), 4);
    }

    #[test]
    fn select_rows_keeps_metadata() {
        let features = array![
            [1.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 1.0],
            [1.0, 0.0, 0.0, 1.0]
        ];
        let ds = EncodedDataset::new(features, array![0, 1, 2], groups(), 3).unwrap();
        let sub = ds.select_rows(&[2, 2, 0]);
        assert_eq!(sub.n_samples(), 3);
        assert_eq!(sub.labels().to_vec(), vec![2, 2, 0]);
        assert_eq!(sub.features().row(0).to_vec(), vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(sub.n_classes(), 3);
        assert_eq!(sub.groups(), ds.groups());
    }
}
