//! Sparse softmax regression model data structure.

use ndarray::{Array1, Array2, ArrayView2};

use crate::data::{DatasetError, FeatureGroups};
use crate::training::{group_scores, nonzero_groups, SoftmaxObjective};

/// Multinomial softmax model over one-hot encoded categorical features.
///
/// Stores the coefficient matrix with shape `[n_classes, n_columns]`:
///
/// ```text
/// coefficients[[class, column]] → coefficient
/// ```
///
/// There is no intercept. The group index is kept alongside so the model can
/// report which original features it uses.
///
/// # Example
///
/// ```
/// use catiht::data::FeatureGroups;
/// use catiht::repr::SoftmaxModel;
/// use ndarray::array;
///
/// let groups = FeatureGroups::from_cardinalities(&[2, 2]).unwrap();
/// let coefs = array![
///     [0.0, 0.0, 1.5, -0.5],
///     [0.0, 0.0, -1.5, 0.5],
/// ];
/// let model = SoftmaxModel::from_array(coefs, groups).unwrap();
///
/// assert_eq!(model.selected_features(), vec![1]);
/// assert_eq!(model.predict(array![[1.0, 0.0, 1.0, 0.0]].view()), vec![0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SoftmaxModel {
    coefficients: Array2<f64>,
    groups: FeatureGroups,
}

impl SoftmaxModel {
    /// All-zero model.
    pub fn zeros(n_classes: usize, groups: FeatureGroups) -> Self {
        Self {
            coefficients: Array2::zeros((n_classes, groups.n_columns())),
            groups,
        }
    }

    /// Create a model from a `[n_classes, n_columns]` coefficient matrix.
    pub fn from_array(coefficients: Array2<f64>, groups: FeatureGroups) -> Result<Self, DatasetError> {
        if coefficients.nrows() < 2 {
            return Err(DatasetError::InvalidClassCount(coefficients.nrows()));
        }
        if coefficients.ncols() != groups.n_columns() {
            return Err(DatasetError::ColumnMismatch {
                expected: groups.n_columns(),
                got: coefficients.ncols(),
            });
        }
        Ok(Self {
            coefficients,
            groups,
        })
    }

    /// Shapes must already agree.
    pub(crate) fn from_parts(coefficients: Array2<f64>, groups: FeatureGroups) -> Self {
        debug_assert_eq!(coefficients.ncols(), groups.n_columns());
        Self {
            coefficients,
            groups,
        }
    }

    #[inline]
    pub fn n_classes(&self) -> usize {
        self.coefficients.nrows()
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.coefficients.ncols()
    }

    #[inline]
    pub fn groups(&self) -> &FeatureGroups {
        &self.groups
    }

    /// Coefficient matrix view, shape `[n_classes, n_columns]`.
    #[inline]
    pub fn coefficients(&self) -> ArrayView2<'_, f64> {
        self.coefficients.view()
    }

    #[inline]
    pub fn coefficient(&self, class: usize, column: usize) -> f64 {
        self.coefficients[[class, column]]
    }

    /// Take the coefficient matrix out of the model.
    pub fn into_array(self) -> Array2<f64> {
        self.coefficients
    }

    /// Class probabilities for each row, shape `[n_rows, n_classes]`.
    ///
    /// # Panics
    ///
    /// Panics if `features` does not have `n_columns()` columns.
    pub fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Array2<f64> {
        assert_eq!(
            features.ncols(),
            self.n_columns(),
            "features have {} columns, model expects {}",
            features.ncols(),
            self.n_columns()
        );
        SoftmaxObjective::new(self.n_classes()).predict(features, self.coefficients.view())
    }

    /// Most probable class for each row.
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Vec<usize> {
        crate::training::argmax_rows(self.predict_proba(features).view())
    }

    /// Original features with at least one non-zero coefficient, ascending.
    pub fn selected_features(&self) -> Vec<usize> {
        nonzero_groups(self.coefficients.view(), &self.groups)
    }

    /// Group importance scores (mean absolute class-summed coefficient per
    /// original feature), length `n_groups`.
    pub fn feature_importances(&self) -> Array1<f64> {
        group_scores(self.coefficients.view(), &self.groups)
    }

    /// `(feature, importance)` pairs sorted by descending importance.
    /// Equal importances keep ascending feature order.
    pub fn ranked_features(&self) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> =
            self.feature_importances().iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}
