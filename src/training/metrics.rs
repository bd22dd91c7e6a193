//! Evaluation metrics over predicted class probabilities.
//!
//! Predictions are `[n_rows, n_classes]` probability matrices as produced by
//! [`SoftmaxObjective::predict`](super::SoftmaxObjective::predict).

use ndarray::{ArrayView1, ArrayView2, Axis};

/// A metric computed from class probabilities and true labels.
pub trait MetricFn {
    /// Compute the metric. Pass an empty `weights` view for unweighted.
    fn compute(
        &self,
        probabilities: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, usize>,
        weights: ArrayView1<'_, f64>,
    ) -> f64;

    /// Whether larger values are better.
    fn higher_is_better(&self) -> bool;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Index of the largest value in each row. Ties resolve to the lowest index.
pub fn argmax_rows(probabilities: ArrayView2<'_, f64>) -> Vec<usize> {
    probabilities
        .axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0usize, f64::NEG_INFINITY), |(best, best_v), (i, &v)| {
                    if v > best_v {
                        (i, v)
                    } else {
                        (best, best_v)
                    }
                })
                .0
        })
        .collect()
}

#[inline]
fn weight_at(weights: ArrayView1<'_, f64>, i: usize) -> f64 {
    if weights.is_empty() {
        1.0
    } else {
        weights[i]
    }
}

// =============================================================================
// MulticlassAccuracy
// =============================================================================

/// Fraction of rows whose argmax class equals the label.
#[derive(Debug, Clone, Copy, Default)]
pub struct MulticlassAccuracy;

impl MetricFn for MulticlassAccuracy {
    fn compute(
        &self,
        probabilities: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, usize>,
        weights: ArrayView1<'_, f64>,
    ) -> f64 {
        let n_rows = probabilities.nrows();
        if n_rows == 0 {
            return 0.0;
        }
        debug_assert_eq!(labels.len(), n_rows);

        let predicted = argmax_rows(probabilities);
        let (sum_correct, sum_w) = predicted
            .iter()
            .zip(labels.iter())
            .enumerate()
            .fold((0.0f64, 0.0f64), |(sc, sw), (i, (&p, &l))| {
                let w = weight_at(weights, i);
                let correct = if p == l { 1.0 } else { 0.0 };
                (sc + w * correct, sw + w)
            });

        if sum_w > 0.0 { sum_correct / sum_w } else { 0.0 }
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "accuracy"
    }
}

// =============================================================================
// MulticlassLogLoss
// =============================================================================

/// Mean negative log-probability of the true class.
#[derive(Debug, Clone, Copy, Default)]
pub struct MulticlassLogLoss;

impl MetricFn for MulticlassLogLoss {
    fn compute(
        &self,
        probabilities: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, usize>,
        weights: ArrayView1<'_, f64>,
    ) -> f64 {
        let n_rows = probabilities.nrows();
        if n_rows == 0 {
            return 0.0;
        }

        const EPS: f64 = 1e-15;

        let (sum_loss, sum_w) = labels
            .iter()
            .enumerate()
            .fold((0.0f64, 0.0f64), |(sl, sw), (i, &label)| {
                let w = weight_at(weights, i);
                let prob = probabilities[[i, label]].clamp(EPS, 1.0 - EPS);
                (sl - w * prob.ln(), sw + w)
            });

        if sum_w > 0.0 { sum_loss / sum_w } else { 0.0 }
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "mlogloss"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1, Array2};

    fn no_weights() -> Array1<f64> {
        Array1::zeros(0)
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        let probs = array![[0.2, 0.4, 0.4], [0.5, 0.25, 0.25], [0.1, 0.1, 0.8]];
        assert_eq!(argmax_rows(probs.view()), vec![1, 0, 2]);
    }

    #[test]
    fn accuracy_counts_argmax_hits() {
        let probs = array![[0.7, 0.2, 0.1], [0.1, 0.8, 0.1], [0.3, 0.3, 0.4], [0.6, 0.3, 0.1]];
        let labels = array![0usize, 1, 2, 2];
        let acc = MulticlassAccuracy.compute(probs.view(), labels.view(), no_weights().view());
        assert_abs_diff_eq!(acc, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn accuracy_weighted() {
        let probs = array![[0.9, 0.1], [0.9, 0.1]];
        let labels = array![0usize, 1];
        let weights = array![3.0, 1.0];
        let acc = MulticlassAccuracy.compute(probs.view(), labels.view(), weights.view());
        assert_abs_diff_eq!(acc, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn accuracy_empty_is_zero() {
        let probs = Array2::<f64>::zeros((0, 3));
        let labels = Array1::<usize>::zeros(0);
        assert_eq!(
            MulticlassAccuracy.compute(probs.view(), labels.view(), no_weights().view()),
            0.0
        );
    }

    #[test]
    fn logloss_uniform() {
        let probs = Array2::from_elem((2, 3), 1.0 / 3.0);
        let labels = array![0usize, 2];
        let loss = MulticlassLogLoss.compute(probs.view(), labels.view(), no_weights().view());
        assert_abs_diff_eq!(loss, 3f64.ln(), epsilon = 1e-12);
    }
}
