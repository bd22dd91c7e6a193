//! Group-wise hard thresholding.
//!
//! Classical IHT keeps the `s` largest individual coefficients. Here the unit
//! of selection is an original categorical feature: all of its one-hot
//! columns are kept or dropped together, since keeping one indicator column
//! while dropping its siblings has no meaning.
//!
//! Selection is a two-step reduction over the `[n_classes, n_columns]`
//! coefficient matrix:
//!
//! ```text
//! col_mag[j] = Σ_c |B[c, j]|                       (collapse classes)
//! score[g]   = mean(col_mag[boundaries[g]..boundaries[g+1]])
//! ```
//!
//! The `s` groups with the largest score keep their columns verbatim; every
//! other column is set to zero. There is no shrinkage of retained values.

use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::data::FeatureGroups;

/// Non-fatal condition raised while setting up thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// The sparsity budget exceeds the number of original features, so every
    /// feature is retained and thresholding is a no-op.
    SparsityExceedsFeatureCount { sparsity: usize, n_features: usize },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SparsityExceedsFeatureCount {
                sparsity,
                n_features,
            } => write!(
                f,
                "sparsity {} exceeds the number of features {}; all features are retained",
                sparsity, n_features
            ),
        }
    }
}

/// Importance score of every group: mean over the group's columns of the
/// class-summed absolute coefficient.
///
/// Returns a vector of length `groups.n_groups()`.
///
/// # Panics
///
/// Panics (debug) if `coefficients` does not have `groups.n_columns()` columns.
pub fn group_scores(coefficients: ArrayView2<'_, f64>, groups: &FeatureGroups) -> Array1<f64> {
    debug_assert_eq!(coefficients.ncols(), groups.n_columns());

    let col_mag = coefficients.mapv(f64::abs).sum_axis(Axis(0));
    groups
        .ranges()
        .map(|range| {
            let len = range.len() as f64;
            col_mag.slice(s![range]).sum() / len
        })
        .collect()
}

/// Output of [`GroupThreshold::apply`].
#[derive(Debug, Clone)]
pub struct Thresholded {
    /// Sparsified copy of the candidate matrix.
    pub coefficients: Array2<f64>,
    /// Groups that kept their columns, in ascending index order.
    pub retained: Vec<usize>,
}

/// Keeps the top-`s` groups of a coefficient matrix and zeroes the rest.
///
/// Groups are ranked by [`group_scores`] in descending order; equal scores are
/// ordered by ascending group index, so the lower index wins a tie at the
/// cutoff. The operator never mutates its input.
///
/// # Example
///
/// ```
/// use catiht::data::FeatureGroups;
/// use catiht::training::GroupThreshold;
/// use ndarray::array;
///
/// let groups = FeatureGroups::from_cardinalities(&[2, 1]).unwrap();
/// let candidate = array![[0.1, -0.1, 2.0], [0.0, 0.2, -1.0]];
///
/// let out = GroupThreshold::new(1, &groups).apply(candidate.view(), &groups);
/// assert_eq!(out.retained, vec![1]);
/// assert_eq!(out.coefficients, array![[0.0, 0.0, 2.0], [0.0, 0.0, -1.0]]);
/// ```
#[derive(Debug, Clone)]
pub struct GroupThreshold {
    sparsity: usize,
    n_groups: usize,
    diagnostic: Option<Diagnostic>,
}

impl GroupThreshold {
    /// Create the operator for a sparsity budget over `groups`.
    ///
    /// A budget above the number of features raises
    /// [`Diagnostic::SparsityExceedsFeatureCount`]. A budget equal to it keeps
    /// every group and raises nothing.
    pub fn new(sparsity: usize, groups: &FeatureGroups) -> Self {
        let n_features = groups.n_groups();
        let diagnostic = (sparsity > n_features).then_some(Diagnostic::SparsityExceedsFeatureCount {
            sparsity,
            n_features,
        });
        Self {
            sparsity,
            n_groups: n_features,
            diagnostic,
        }
    }

    #[inline]
    pub fn sparsity(&self) -> usize {
        self.sparsity
    }

    /// Number of groups the operator was built for.
    #[inline]
    pub fn n_groups(&self) -> usize {
        self.n_groups
    }

    /// Diagnostic raised for this budget, if any.
    #[inline]
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        self.diagnostic
    }

    /// Groups that survive thresholding of `candidate`, in ascending order.
    ///
    /// `groups` must be the index the operator was built with.
    pub fn select(&self, candidate: ArrayView2<'_, f64>, groups: &FeatureGroups) -> Vec<usize> {
        let n_groups = groups.n_groups();
        debug_assert_eq!(
            n_groups, self.n_groups,
            "threshold built for {} groups, applied to {}",
            self.n_groups, n_groups
        );
        if self.sparsity >= n_groups {
            return (0..n_groups).collect();
        }

        let scores = group_scores(candidate, groups);
        let mut order: Vec<usize> = (0..n_groups).collect();
        // Stable sort: ties keep ascending group order.
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(self.sparsity);
        order.sort_unstable();
        order
    }

    /// Threshold `candidate`, returning a new matrix.
    pub fn apply(&self, candidate: ArrayView2<'_, f64>, groups: &FeatureGroups) -> Thresholded {
        let retained = self.select(candidate, groups);

        let coefficients = if retained.len() == groups.n_groups() {
            candidate.to_owned()
        } else {
            let mut out = Array2::zeros(candidate.raw_dim());
            for &group in &retained {
                let range = groups.range(group);
                out.slice_mut(s![.., range.clone()])
                    .assign(&candidate.slice(s![.., range]));
            }
            out
        };

        Thresholded {
            coefficients,
            retained,
        }
    }
}

/// Groups with at least one non-zero coefficient, in ascending order.
pub fn nonzero_groups(coefficients: ArrayView2<'_, f64>, groups: &FeatureGroups) -> Vec<usize> {
    groups
        .ranges()
        .enumerate()
        .filter(|(_, range)| {
            coefficients
                .slice(s![.., range.clone()])
                .iter()
                .any(|&v| v != 0.0)
        })
        .map(|(group, _)| group)
        .collect()
}
