//! Group IHT model implementation.
//!
//! High-level wrapper around [`SoftmaxModel`] with training, prediction and
//! selection reporting.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::data::{DatasetError, EncodedDataset};
use crate::repr::SoftmaxModel;
use crate::training::{Diagnostic, IhtTrainer, MetricFn, RoundRecord, TrainError};

use super::{GroupIhtConfig, SelectionSummary};

/// Trained group-sparse softmax classifier.
///
/// # Example
///
/// ```
/// use catiht::model::{GroupIhtConfig, GroupIhtModel};
/// use catiht::testing::SyntheticCategorical;
/// use catiht::training::MulticlassAccuracy;
///
/// let data = SyntheticCategorical::new(&[2, 3, 3, 2], 2)
///     .informative(&[1])
///     .generate(200, 11)
///     .unwrap();
///
/// let config = GroupIhtConfig::builder()
///     .sparsity(1)
///     .n_epochs(50)
///     .learning_rate(1.0)
///     .build()
///     .unwrap();
/// let model = GroupIhtModel::train(&data, None, config).unwrap();
///
/// assert_eq!(model.selected_features(), vec![1]);
/// let acc = model.evaluate(&data, &MulticlassAccuracy).unwrap();
/// assert!(acc > 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct GroupIhtModel {
    model: SoftmaxModel,
    history: Vec<RoundRecord>,
    diagnostics: Vec<Diagnostic>,
    config: GroupIhtConfig,
}

impl GroupIhtModel {
    /// Train a new model.
    ///
    /// # Arguments
    ///
    /// * `train` - Training rows
    /// * `eval` - Optional held-out rows, scored every round
    /// * `config` - Validated training configuration
    pub fn train(
        train: &EncodedDataset,
        eval: Option<&EncodedDataset>,
        config: GroupIhtConfig,
    ) -> Result<Self, TrainError> {
        let outcome = IhtTrainer::new(config.to_params()).train(train, eval)?;
        Ok(Self {
            model: outcome.model,
            history: outcome.history,
            diagnostics: outcome.diagnostics,
            config,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn model(&self) -> &SoftmaxModel {
        &self.model
    }

    pub fn config(&self) -> &GroupIhtConfig {
        &self.config
    }

    /// Per-round training record.
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Original features the model uses, ascending.
    pub fn selected_features(&self) -> Vec<usize> {
        self.model.selected_features()
    }

    pub fn feature_importances(&self) -> Array1<f64> {
        self.model.feature_importances()
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Class probabilities, shape `[n_rows, n_classes]`.
    pub fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>, DatasetError> {
        self.check_columns(features.ncols())?;
        Ok(self.model.predict_proba(features))
    }

    /// Most probable class per row.
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<usize>, DatasetError> {
        self.check_columns(features.ncols())?;
        Ok(self.model.predict(features))
    }

    /// Score `dataset` with `metric`, unweighted.
    pub fn evaluate(&self, dataset: &EncodedDataset, metric: &impl MetricFn) -> Result<f64, DatasetError> {
        if dataset.n_classes() != self.model.n_classes() {
            return Err(DatasetError::ClassCountMismatch {
                expected: self.model.n_classes(),
                got: dataset.n_classes(),
            });
        }
        let probabilities = self.predict_proba(dataset.features())?;
        Ok(metric.compute(probabilities.view(), dataset.labels(), ArrayView1::from(&[] as &[f64])))
    }

    /// Selection result in serializable form.
    pub fn summary(&self) -> SelectionSummary {
        SelectionSummary {
            selected: self.selected_features(),
            importances: self.feature_importances().to_vec(),
            history: self.history.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }

    fn check_columns(&self, got: usize) -> Result<(), DatasetError> {
        let expected = self.model.n_columns();
        if got != expected {
            return Err(DatasetError::ColumnMismatch { expected, got });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SyntheticCategorical;
    use crate::training::{MulticlassAccuracy, MulticlassLogLoss};

    fn config(sparsity: usize) -> GroupIhtConfig {
        GroupIhtConfig::builder()
            .sparsity(sparsity)
            .n_epochs(30)
            .learning_rate(1.0)
            .build()
            .unwrap()
    }

    #[test]
    fn train_and_summarize() {
        let data = SyntheticCategorical::new(&[3, 3, 2], 3)
            .informative(&[2])
            .generate(150, 3)
            .unwrap();
        let model = GroupIhtModel::train(&data, Some(&data), config(1)).unwrap();

        assert_eq!(model.history().len(), 30);
        assert!(model.history().iter().all(|r| r.held_out_accuracy.is_some()));

        let summary = model.summary();
        assert_eq!(summary.selected, model.selected_features());
        assert_eq!(summary.importances.len(), 3);
        assert!(summary.diagnostics.is_empty());
    }

    #[test]
    fn evaluate_rejects_wrong_shape() {
        let data = SyntheticCategorical::new(&[2, 2], 2).generate(40, 1).unwrap();
        let other = SyntheticCategorical::new(&[3], 2).generate(10, 1).unwrap();
        let model = GroupIhtModel::train(&data, None, config(1)).unwrap();

        let err = model.evaluate(&other, &MulticlassAccuracy).unwrap_err();
        assert_eq!(err, DatasetError::ColumnMismatch { expected: 4, got: 3 });

        let loss = model.evaluate(&data, &MulticlassLogLoss).unwrap();
        assert!(loss.is_finite() && loss >= 0.0);
    }

    #[test]
    fn evaluate_rejects_wrong_class_count() {
        let data = SyntheticCategorical::new(&[2, 2], 2).generate(40, 1).unwrap();
        let three_class = SyntheticCategorical::new(&[2, 2], 3).generate(30, 1).unwrap();
        let model = GroupIhtModel::train(&data, None, config(1)).unwrap();

        let err = model.evaluate(&three_class, &MulticlassAccuracy).unwrap_err();
        assert_eq!(err, DatasetError::ClassCountMismatch { expected: 2, got: 3 });
    }

    #[test]
    fn oversized_sparsity_keeps_diagnostic() {
        let data = SyntheticCategorical::new(&[2, 2], 2).generate(40, 2).unwrap();
        let model = GroupIhtModel::train(&data, None, config(5)).unwrap();
        assert_eq!(
            model.diagnostics(),
            &[Diagnostic::SparsityExceedsFeatureCount {
                sparsity: 5,
                n_features: 2
            }]
        );
    }
}
