//! Group-sparse iterative hard thresholding trainer.
//!
//! Every round takes one projected gradient step on the weighted softmax
//! loss:
//!
//! ```text
//! candidate = B - λ · ∇L(B; batch)
//! B         = keep_top_s_groups(candidate)
//! ```
//!
//! [`IhtSession`] exposes the loop one round at a time; [`IhtTrainer`] runs
//! it to completion.
//!
//! # Example
//!
//! ```
//! use catiht::testing::SyntheticCategorical;
//! use catiht::training::{IhtParams, IhtTrainer};
//!
//! let data = SyntheticCategorical::new(&[3, 2, 4], 3)
//!     .informative(&[0])
//!     .generate(120, 5)
//!     .unwrap();
//!
//! let params = IhtParams {
//!     sparsity: 1,
//!     n_epochs: 20,
//!     learning_rate: 0.5,
//!     ..Default::default()
//! };
//! let outcome = IhtTrainer::new(params).train(&data, None).unwrap();
//!
//! assert_eq!(outcome.rounds, 20);
//! assert!(outcome.model.selected_features().len() <= 1);
//! ```

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::data::{DatasetError, EncodedDataset};
use crate::repr::SoftmaxModel;

use super::logger::{TrainingLogger, Verbosity};
use super::metrics::{MetricFn, MulticlassAccuracy};
use super::objective::{Batch, SoftmaxObjective};
use super::sampling::BatchSampler;
use super::threshold::{Diagnostic, GroupThreshold, Thresholded};
use super::weights::ClassWeighting;

// ============================================================================
// IhtParams
// ============================================================================

/// Parameters for group IHT training.
///
/// Use struct construction with `..Default::default()`. The validated,
/// serializable front end is [`GroupIhtConfig`](crate::model::GroupIhtConfig).
#[derive(Clone, Debug)]
pub struct IhtParams {
    /// Number of original features kept after every round.
    pub sparsity: usize,

    /// Number of rounds. Training always runs all of them.
    pub n_epochs: usize,

    /// Gradient step size (λ).
    pub learning_rate: f64,

    /// Rows per round. `None` uses the whole training set every round.
    pub batch_size: Option<usize>,

    /// How per-class sample weights are derived from the training labels.
    pub class_weighting: ClassWeighting,

    /// Seed for batch sampling. `None` draws a fresh seed.
    pub seed: Option<u64>,

    pub verbosity: Verbosity,
}

impl Default for IhtParams {
    fn default() -> Self {
        Self {
            sparsity: 1,
            n_epochs: 100,
            learning_rate: 0.1,
            batch_size: None,
            class_weighting: ClassWeighting::default(),
            seed: Some(42),
            verbosity: Verbosity::default(),
        }
    }
}

impl IhtParams {
    fn validate(&self) -> Result<(), TrainError> {
        if self.sparsity == 0 {
            return Err(TrainError::InvalidParams("sparsity must be >= 1"));
        }
        if self.n_epochs == 0 {
            return Err(TrainError::InvalidParams("n_epochs must be >= 1"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TrainError::InvalidParams("learning_rate must be finite and > 0"));
        }
        if self.batch_size == Some(0) {
            return Err(TrainError::InvalidParams("batch_size must be >= 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Records and outcome
// ============================================================================

/// Lifecycle of an [`IhtSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingPhase {
    /// Created, no round run yet.
    Initialized,
    Running,
    /// All rounds done, or stopped by a failure.
    Terminated,
}

/// Observations from one round.
///
/// Loss and accuracy are measured at the coefficients the round started
/// from; `selected` is the support chosen by that round's thresholding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: usize,
    pub train_loss: f64,
    /// Accuracy on the held-out set, when one was given.
    pub held_out_accuracy: Option<f64>,
    pub selected: Vec<usize>,
}

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: SoftmaxModel,
    pub history: Vec<RoundRecord>,
    pub diagnostics: Vec<Diagnostic>,
    /// Rounds completed.
    pub rounds: usize,
}

/// Which value went non-finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantity {
    Loss,
    Gradient,
    Candidate,
}

impl Quantity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loss => "loss",
            Self::Gradient => "gradient",
            Self::Candidate => "candidate",
        }
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Training errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TrainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("invalid training parameters: {0}")]
    InvalidParams(&'static str),

    #[error("eval set does not match the training set: {0}")]
    IncompatibleEvalSet(String),

    /// The state in `partial` is the last one that was fully finite.
    #[error("non-finite {quantity} at round {round}")]
    NumericInstability {
        round: usize,
        quantity: Quantity,
        partial: Box<TrainingOutcome>,
    },

    #[error("training session has already terminated")]
    AlreadyTerminated,
}

// ============================================================================
// IhtSession
// ============================================================================

/// A training run that advances one round per [`step`](Self::step).
pub struct IhtSession<'a> {
    params: IhtParams,
    train: &'a EncodedDataset,
    eval: Option<&'a EncodedDataset>,

    objective: SoftmaxObjective,
    threshold: GroupThreshold,
    sample_weights: Array1<f64>,
    sampler: BatchSampler,
    logger: TrainingLogger,

    coefficients: Array2<f64>,
    history: Vec<RoundRecord>,
    diagnostics: Vec<Diagnostic>,
    round: usize,
    phase: TrainingPhase,
}

impl<'a> IhtSession<'a> {
    /// Validate inputs and set up a run starting from all-zero coefficients.
    ///
    /// Class weights are computed here, so a class absent from `train`
    /// fails with [`DatasetError::EmptyClass`] before any round runs
    /// (under [`ClassWeighting::Balanced`]).
    pub fn new(
        params: IhtParams,
        train: &'a EncodedDataset,
        eval: Option<&'a EncodedDataset>,
    ) -> Result<Self, TrainError> {
        let initial = Array2::zeros((train.n_classes(), train.n_columns()));
        Self::with_initial_coefficients(params, train, eval, initial)
    }

    /// Like [`new`](Self::new), but the first round starts from `initial`.
    ///
    /// `initial` must be finite with shape `[n_classes, n_columns]`. It is
    /// not thresholded before the first round.
    pub fn with_initial_coefficients(
        params: IhtParams,
        train: &'a EncodedDataset,
        eval: Option<&'a EncodedDataset>,
        initial: Array2<f64>,
    ) -> Result<Self, TrainError> {
        params.validate()?;
        if train.is_empty() {
            return Err(DatasetError::EmptyDataset.into());
        }
        if let Some(eval) = eval {
            check_compatible(train, eval)?;
        }

        let n_classes = train.n_classes();
        let groups = train.groups();
        if initial.nrows() != n_classes {
            return Err(DatasetError::ClassCountMismatch {
                expected: n_classes,
                got: initial.nrows(),
            }
            .into());
        }
        if initial.ncols() != groups.n_columns() {
            return Err(DatasetError::ColumnMismatch {
                expected: groups.n_columns(),
                got: initial.ncols(),
            }
            .into());
        }
        if !all_finite(initial.view()) {
            return Err(TrainError::InvalidParams("initial coefficients must be finite"));
        }
        let class_weights = params.class_weighting.compute(train.labels(), n_classes)?;
        let sample_weights = class_weights.sample_weights(train.labels());

        let threshold = GroupThreshold::new(params.sparsity, groups);
        let mut logger = TrainingLogger::new(params.verbosity);
        logger.start_training(params.n_epochs, params.sparsity, groups.n_groups());

        let mut diagnostics = Vec::new();
        if let Some(diagnostic) = threshold.diagnostic() {
            logger.log_diagnostic(&diagnostic);
            diagnostics.push(diagnostic);
        }

        Ok(Self {
            objective: SoftmaxObjective::new(n_classes),
            threshold,
            sample_weights,
            sampler: BatchSampler::new(params.batch_size, params.seed),
            logger,
            coefficients: initial,
            history: Vec::with_capacity(params.n_epochs),
            diagnostics,
            round: 0,
            phase: TrainingPhase::Initialized,
            params,
            train,
            eval,
        })
    }

    #[inline]
    pub fn phase(&self) -> TrainingPhase {
        self.phase
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.phase == TrainingPhase::Terminated
    }

    /// Rounds completed so far.
    #[inline]
    pub fn round(&self) -> usize {
        self.round
    }

    #[inline]
    pub fn params(&self) -> &IhtParams {
        &self.params
    }

    /// Current coefficients, shape `[n_classes, n_columns]`.
    #[inline]
    pub fn coefficients(&self) -> ArrayView2<'_, f64> {
        self.coefficients.view()
    }

    #[inline]
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    #[inline]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Run one round.
    pub fn step(&mut self) -> Result<RoundRecord, TrainError> {
        match self.phase {
            TrainingPhase::Terminated => return Err(TrainError::AlreadyTerminated),
            TrainingPhase::Initialized => self.phase = TrainingPhase::Running,
            TrainingPhase::Running => {}
        }
        let round = self.round;

        let rows = self.sampler.sample(self.train.n_samples());
        let features = self.train.features().select(Axis(0), &rows);
        let labels = self.train.labels().select(Axis(0), &rows);
        let weights = self.sample_weights.select(Axis(0), &rows);
        let batch = Batch::new(features.view(), labels.view(), weights.view())?;

        let (train_loss, gradient) = self
            .objective
            .loss_and_gradient(&batch, self.coefficients.view());
        let held_out_accuracy = self.held_out_accuracy();

        if !train_loss.is_finite() {
            return Err(self.fail(round, Quantity::Loss));
        }
        if !all_finite(gradient.view()) {
            return Err(self.fail(round, Quantity::Gradient));
        }

        let mut candidate = self.coefficients.clone();
        candidate.scaled_add(-self.params.learning_rate, &gradient);
        if !all_finite(candidate.view()) {
            return Err(self.fail(round, Quantity::Candidate));
        }

        let Thresholded {
            coefficients,
            retained,
        } = self.threshold.apply(candidate.view(), self.train.groups());
        self.coefficients = coefficients;

        let record = RoundRecord {
            round,
            train_loss,
            held_out_accuracy,
            selected: retained,
        };
        self.logger
            .log_round(round, train_loss, held_out_accuracy, &record.selected);
        self.history.push(record.clone());

        self.round += 1;
        if self.round == self.params.n_epochs {
            self.phase = TrainingPhase::Terminated;
            let selected = super::threshold::nonzero_groups(self.coefficients.view(), self.train.groups());
            self.logger.finish_training(self.round, &selected);
        }
        Ok(record)
    }

    /// Consume the session and return the model and history so far.
    pub fn finish(self) -> TrainingOutcome {
        TrainingOutcome {
            model: self.model(),
            history: self.history,
            diagnostics: self.diagnostics,
            rounds: self.round,
        }
    }

    fn model(&self) -> SoftmaxModel {
        // Shape is fixed at construction: [n_classes, groups.n_columns()].
        SoftmaxModel::from_parts(self.coefficients.clone(), self.train.groups().clone())
    }

    fn held_out_accuracy(&self) -> Option<f64> {
        self.eval.map(|eval| {
            let probabilities = self
                .objective
                .predict(eval.features(), self.coefficients.view());
            MulticlassAccuracy.compute(probabilities.view(), eval.labels(), ArrayView1::from(&[] as &[f64]))
        })
    }

    fn fail(&mut self, round: usize, quantity: Quantity) -> TrainError {
        self.phase = TrainingPhase::Terminated;
        self.logger.log_failure(round, quantity.as_str());
        TrainError::NumericInstability {
            round,
            quantity,
            partial: Box::new(TrainingOutcome {
                model: self.model(),
                history: self.history.clone(),
                diagnostics: self.diagnostics.clone(),
                rounds: self.round,
            }),
        }
    }
}

fn check_compatible(train: &EncodedDataset, eval: &EncodedDataset) -> Result<(), TrainError> {
    if train.groups() != eval.groups() {
        return Err(TrainError::IncompatibleEvalSet(format!(
            "feature cardinalities {:?} vs {:?}",
            train.groups().cardinalities(),
            eval.groups().cardinalities()
        )));
    }
    if train.n_classes() != eval.n_classes() {
        return Err(TrainError::IncompatibleEvalSet(format!(
            "{} classes vs {} classes",
            train.n_classes(),
            eval.n_classes()
        )));
    }
    Ok(())
}

#[inline]
fn all_finite(values: ArrayView2<'_, f64>) -> bool {
    values.iter().all(|v| v.is_finite())
}

// ============================================================================
// IhtTrainer
// ============================================================================

/// Runs group IHT to completion.
#[derive(Debug, Clone)]
pub struct IhtTrainer {
    params: IhtParams,
}

impl IhtTrainer {
    pub fn new(params: IhtParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IhtParams {
        &self.params
    }

    /// Train on `train`, reporting held-out accuracy on `eval` each round.
    pub fn train(
        &self,
        train: &EncodedDataset,
        eval: Option<&EncodedDataset>,
    ) -> Result<TrainingOutcome, TrainError> {
        let mut session = IhtSession::new(self.params.clone(), train, eval)?;
        while !session.is_terminated() {
            session.step()?;
        }
        Ok(session.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureGroups;
    use ndarray::array;

    /// Six rows, two features of cardinality 2, three classes.
    fn small_dataset() -> EncodedDataset {
        let groups = FeatureGroups::from_cardinalities(&[2, 2]).unwrap();
        let features = array![
            [1.0, 0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 1.0],
            [1.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 1.0],
        ];
        EncodedDataset::new(features, array![0, 1, 2, 0, 1, 2], groups, 3).unwrap()
    }

    fn params(sparsity: usize, n_epochs: usize) -> IhtParams {
        IhtParams {
            sparsity,
            n_epochs,
            learning_rate: 0.1,
            ..Default::default()
        }
    }

    #[test]
    fn session_walks_through_phases() {
        let data = small_dataset();
        let mut session = IhtSession::new(params(1, 2), &data, None).unwrap();
        assert_eq!(session.phase(), TrainingPhase::Initialized);

        session.step().unwrap();
        assert_eq!(session.phase(), TrainingPhase::Running);
        session.step().unwrap();
        assert_eq!(session.phase(), TrainingPhase::Terminated);

        assert!(matches!(session.step(), Err(TrainError::AlreadyTerminated)));
        let outcome = session.finish();
        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.history.len(), 2);
    }

    #[test]
    fn first_round_loss_is_uniform_prediction() {
        // B = 0 gives p = 1/3 everywhere, so L = Σ w_i ln 3 / (n K).
        let data = small_dataset();
        let mut session = IhtSession::new(params(2, 1), &data, None).unwrap();
        let record = session.step().unwrap();
        let expected = 6.0 * 3f64.ln() / (6.0 * 3.0);
        approx::assert_abs_diff_eq!(record.train_loss, expected, epsilon = 1e-12);
    }

    #[test]
    fn support_never_exceeds_sparsity() {
        let data = small_dataset();
        let outcome = IhtTrainer::new(params(1, 5)).train(&data, None).unwrap();
        for record in &outcome.history {
            assert_eq!(record.selected.len(), 1);
        }
        assert!(outcome.model.selected_features().len() <= 1);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn held_out_accuracy_only_with_eval_set() {
        let data = small_dataset();
        let outcome = IhtTrainer::new(params(1, 1)).train(&data, None).unwrap();
        assert_eq!(outcome.history[0].held_out_accuracy, None);

        let outcome = IhtTrainer::new(params(1, 1)).train(&data, Some(&data)).unwrap();
        let acc = outcome.history[0].held_out_accuracy.unwrap();
        assert!((0.0..=1.0).contains(&acc));
    }

    #[test]
    fn incompatible_eval_set_is_rejected() {
        let data = small_dataset();
        let other_groups = FeatureGroups::from_cardinalities(&[1, 3]).unwrap();
        let other = EncodedDataset::new(
            array![[1.0, 1.0, 0.0, 0.0]],
            array![0],
            other_groups,
            3,
        )
        .unwrap();
        let err = IhtSession::new(params(1, 1), &data, Some(&other)).err().unwrap();
        assert!(matches!(err, TrainError::IncompatibleEvalSet(_)));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let data = small_dataset();
        for bad in [params(0, 1), params(1, 0)] {
            let err = IhtSession::new(bad, &data, None).err().unwrap();
            assert!(matches!(err, TrainError::InvalidParams(_)));
        }
        let bad = IhtParams {
            learning_rate: -1.0,
            ..params(1, 1)
        };
        assert!(matches!(
            IhtSession::new(bad, &data, None).err().unwrap(),
            TrainError::InvalidParams(_)
        ));
    }

    fn unwrap_instability(err: TrainError) -> (usize, Quantity, Box<TrainingOutcome>) {
        match err {
            TrainError::NumericInstability {
                round,
                quantity,
                partial,
            } => (round, quantity, partial),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn initial_coefficients_must_match_shape() {
        let data = small_dataset();
        let err = IhtSession::with_initial_coefficients(params(1, 1), &data, None, Array2::zeros((2, 4)))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            TrainError::Dataset(DatasetError::ClassCountMismatch { expected: 3, got: 2 })
        ));

        let err = IhtSession::with_initial_coefficients(params(1, 1), &data, None, Array2::zeros((3, 5)))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            TrainError::Dataset(DatasetError::ColumnMismatch { expected: 4, got: 5 })
        ));

        let mut initial = Array2::zeros((3, 4));
        initial[[1, 2]] = f64::NAN;
        let err = IhtSession::with_initial_coefficients(params(1, 1), &data, None, initial)
            .err()
            .unwrap();
        assert!(matches!(err, TrainError::InvalidParams(_)));
    }

    #[test]
    fn overflowing_logit_stops_on_loss() {
        // Rows 0 and 4 activate columns 0 and 2, so their class-0 logit is
        // MAX + MAX = inf and the log-softmax is NaN.
        let data = small_dataset();
        let mut initial = Array2::zeros((3, 4));
        initial[[0, 0]] = f64::MAX;
        initial[[0, 2]] = f64::MAX;
        let mut session =
            IhtSession::with_initial_coefficients(params(2, 5), &data, None, initial.clone()).unwrap();

        let (round, quantity, partial) = unwrap_instability(session.step().unwrap_err());
        assert_eq!(round, 0);
        assert_eq!(quantity, Quantity::Loss);
        assert_eq!(partial.rounds, 0);
        assert!(partial.history.is_empty());
        assert!(partial.model.coefficients().iter().all(|c| c.is_finite()));
        assert_eq!(partial.model.coefficients(), initial.view());

        assert_eq!(session.phase(), TrainingPhase::Terminated);
        assert!(matches!(session.step(), Err(TrainError::AlreadyTerminated)));
        assert_eq!(session.finish().rounds, 0);
    }

    #[test]
    fn overflowing_update_stops_on_candidate() {
        // Class 0 dominates every row with column 0, so the step pushes
        // B[1, 0] up by MAX * 2/18 from 0.99 * MAX, past the f64 range.
        let data = small_dataset();
        let mut initial = Array2::zeros((3, 4));
        initial[[0, 0]] = f64::MAX;
        initial[[1, 0]] = 0.99 * f64::MAX;
        let huge_step = IhtParams {
            learning_rate: f64::MAX,
            ..params(2, 5)
        };
        let mut session = IhtSession::with_initial_coefficients(huge_step, &data, None, initial).unwrap();

        let (round, quantity, partial) = unwrap_instability(session.step().unwrap_err());
        assert_eq!(round, 0);
        assert_eq!(quantity, Quantity::Candidate);
        assert!(partial.model.coefficients().iter().all(|c| c.is_finite()));
        assert!(session.is_terminated());
    }

    #[test]
    fn failure_keeps_last_finite_state() {
        let data = small_dataset();
        let mut session = IhtSession::new(params(2, 5), &data, None).unwrap();
        session.step().unwrap();
        let before = session.coefficients().to_owned();

        let err = session.fail(1, Quantity::Gradient);
        match err {
            TrainError::NumericInstability {
                round,
                quantity,
                partial,
            } => {
                assert_eq!(round, 1);
                assert_eq!(quantity, Quantity::Gradient);
                assert_eq!(partial.rounds, 1);
                assert_eq!(partial.history.len(), 1);
                assert_eq!(partial.model.coefficients(), before.view());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(session.is_terminated());
        assert!(matches!(session.step(), Err(TrainError::AlreadyTerminated)));
    }
}
