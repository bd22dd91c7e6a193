//! Weighted multinomial (softmax) negative log-likelihood.
//!
//! For a batch of `b` samples, `K` classes and coefficient matrix `B`
//! (`[K, m]`):
//!
//! ```text
//! Z = X · Bᵀ                                   [b, K] logits
//! P = softmax(Z) row-wise                      [b, K]
//! L = -(1 / (b·K)) Σ_i w_i · log P[i, y_i]
//! ```
//!
//! `L` is the negated mean over all `b × K` entries of `w ⊙ Y ⊙ log P`, where
//! `Y` is the one-hot label matrix. Its gradient with respect to `B` has the
//! closed form
//!
//! ```text
//! ∇L = (1 / (b·K)) · (w ⊙ (P - Y))ᵀ · X        [K, m]
//! ```
//!
//! so no automatic differentiation is needed.

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Zip};

use crate::data::DatasetError;

/// Floor applied to `log p` so a vanishing probability cannot yield `-inf`.
/// NaN is not floored.
pub const LOG_PROB_FLOOR: f64 = -34.538_776_394_910_684; // ln(1e-15)

// =============================================================================
// Batch
// =============================================================================

/// One minibatch: features, labels and per-sample weights of the same rows.
///
/// Passed explicitly to every objective call, so there is no hidden
/// "current batch" state between iterations.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    features: ArrayView2<'a, f64>,
    labels: ArrayView1<'a, usize>,
    weights: ArrayView1<'a, f64>,
}

impl<'a> Batch<'a> {
    /// Create a batch, checking that all three parts have the same row count.
    pub fn new(
        features: ArrayView2<'a, f64>,
        labels: ArrayView1<'a, usize>,
        weights: ArrayView1<'a, f64>,
    ) -> Result<Self, DatasetError> {
        let rows = features.nrows();
        if labels.len() != rows {
            return Err(DatasetError::LabelLengthMismatch {
                rows,
                labels: labels.len(),
            });
        }
        if weights.len() != rows {
            return Err(DatasetError::WeightLengthMismatch {
                rows,
                weights: weights.len(),
            });
        }
        Ok(Self {
            features,
            labels,
            weights,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn features(&self) -> ArrayView2<'a, f64> {
        self.features
    }

    #[inline]
    pub fn labels(&self) -> ArrayView1<'a, usize> {
        self.labels
    }

    #[inline]
    pub fn weights(&self) -> ArrayView1<'a, f64> {
        self.weights
    }
}

// =============================================================================
// Transforms (module-private)
// =============================================================================

/// Replace a row of logits by its log-softmax, stabilized by the row max.
#[inline]
fn log_softmax_row_inplace(mut row: ArrayViewMut1<'_, f64>) {
    let max_val = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = row.iter().map(|&z| (z - max_val).exp()).sum();
    let log_norm = max_val + sum.ln();
    row.mapv_inplace(|z| z - log_norm);
}

/// Replace a row of logits by its softmax.
#[inline]
fn softmax_row_inplace(mut row: ArrayViewMut1<'_, f64>) {
    let max_val = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for z in row.iter_mut() {
        *z = (*z - max_val).exp();
        sum += *z;
    }
    if sum > 0.0 {
        row.mapv_inplace(|p| p / sum);
    }
}

// =============================================================================
// SoftmaxObjective
// =============================================================================

/// Weighted softmax cross-entropy over a `[n_classes, n_columns]` coefficient
/// matrix. The model has no intercept.
///
/// # Example
///
/// ```
/// use catiht::training::{Batch, SoftmaxObjective};
/// use ndarray::{array, Array2};
///
/// let obj = SoftmaxObjective::new(3);
/// let x = array![[1.0, 0.0], [0.0, 1.0]];
/// let y = array![0usize, 2];
/// let w = array![1.0, 1.0];
/// let batch = Batch::new(x.view(), y.view(), w.view()).unwrap();
///
/// // Zero coefficients predict the uniform distribution: loss = ln(3) / 3.
/// let coefs = Array2::<f64>::zeros((3, 2));
/// let loss = obj.loss(&batch, coefs.view());
/// assert!((loss - 3f64.ln() / 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftmaxObjective {
    n_classes: usize,
}

impl SoftmaxObjective {
    /// Create the objective for `n_classes` classes.
    pub fn new(n_classes: usize) -> Self {
        debug_assert!(n_classes >= 2, "n_classes must be >= 2");
        Self { n_classes }
    }

    #[inline]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn logits(&self, features: ArrayView2<'_, f64>, coefficients: ArrayView2<'_, f64>) -> Array2<f64> {
        debug_assert_eq!(coefficients.nrows(), self.n_classes);
        debug_assert_eq!(coefficients.ncols(), features.ncols());
        features.dot(&coefficients.t())
    }

    /// Class probabilities, shape `[n_rows, n_classes]`; each row sums to 1.
    pub fn predict(
        &self,
        features: ArrayView2<'_, f64>,
        coefficients: ArrayView2<'_, f64>,
    ) -> Array2<f64> {
        let mut probs = self.logits(features, coefficients);
        for row in probs.axis_iter_mut(Axis(0)) {
            softmax_row_inplace(row);
        }
        probs
    }

    /// Log-probabilities, shape `[n_rows, n_classes]`.
    fn log_probabilities(
        &self,
        features: ArrayView2<'_, f64>,
        coefficients: ArrayView2<'_, f64>,
    ) -> Array2<f64> {
        let mut log_probs = self.logits(features, coefficients);
        for row in log_probs.axis_iter_mut(Axis(0)) {
            log_softmax_row_inplace(row);
        }
        log_probs
    }

    fn normalizer(&self, batch: &Batch<'_>) -> f64 {
        (batch.len() * self.n_classes) as f64
    }

    fn loss_from_log_probs(&self, batch: &Batch<'_>, log_probs: &Array2<f64>) -> f64 {
        if batch.is_empty() {
            return 0.0;
        }
        let total: f64 = batch
            .labels()
            .iter()
            .zip(batch.weights().iter())
            .enumerate()
            .map(|(i, (&label, &w))| {
                let lp = log_probs[[i, label]];
                // f64::max would swallow NaN.
                w * if lp.is_nan() { lp } else { lp.max(LOG_PROB_FLOOR) }
            })
            .sum();
        -total / self.normalizer(batch)
    }

    /// Weighted negative log-likelihood of the batch. Always `>= 0` for
    /// non-negative weights.
    pub fn loss(&self, batch: &Batch<'_>, coefficients: ArrayView2<'_, f64>) -> f64 {
        let log_probs = self.log_probabilities(batch.features(), coefficients);
        self.loss_from_log_probs(batch, &log_probs)
    }

    /// Gradient of [`loss`](Self::loss), shape `[n_classes, n_columns]`.
    pub fn gradient(&self, batch: &Batch<'_>, coefficients: ArrayView2<'_, f64>) -> Array2<f64> {
        let log_probs = self.log_probabilities(batch.features(), coefficients);
        self.gradient_from_log_probs(batch, log_probs)
    }

    /// Loss and gradient from a single forward pass.
    pub fn loss_and_gradient(
        &self,
        batch: &Batch<'_>,
        coefficients: ArrayView2<'_, f64>,
    ) -> (f64, Array2<f64>) {
        let log_probs = self.log_probabilities(batch.features(), coefficients);
        let loss = self.loss_from_log_probs(batch, &log_probs);
        (loss, self.gradient_from_log_probs(batch, log_probs))
    }

    fn gradient_from_log_probs(&self, batch: &Batch<'_>, log_probs: Array2<f64>) -> Array2<f64> {
        if batch.is_empty() {
            return Array2::zeros((self.n_classes, batch.features().ncols()));
        }

        // Residual (P - Y), scaled per row by w_i / (b·K).
        let scale = self.normalizer(batch).recip();
        let mut residual = log_probs.mapv(f64::exp);
        Zip::from(residual.axis_iter_mut(Axis(0)))
            .and(batch.labels())
            .and(batch.weights())
            .for_each(|mut row, &label, &w| {
                row[label] -= 1.0;
                row *= w * scale;
            });

        residual.t().dot(&batch.features())
    }
}
