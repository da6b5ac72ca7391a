//! Pipeline: an ordered list of transformation steps with a fit/apply lifecycle
//!
//! A `Pipeline` starts *unfit*. `fit` learns every step's parameters from the
//! training partition and returns a new, immutable *fit* pipeline; the
//! original value is left untouched. A fit pipeline can be applied any number
//! of times, from any number of threads, to datasets with the training schema.
//!
//! `RecipeSpec` is the declarative, file-friendly form: steps select their
//! columns with a `Selector`, and selectors are resolved against the training
//! frame while fitting.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::dataset::{ColumnKind, Dataset, OutcomeMapping};
use super::error::{PrepError, PrepResult};
use super::matrix::NumericMatrix;
use super::steps::{StepParameters, TransformStep};

/// Default number of bins for the `tenure` discretization in the churn recipe
pub const DEFAULT_TENURE_BINS: usize = 6;

/// A step paired with the parameters it learned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedStep {
    pub step: TransformStep,
    pub parameters: StepParameters,
}

#[derive(Debug)]
struct FitState {
    fitted: Vec<FittedStep>,
    output_columns: Vec<String>,
    excluded_columns: Vec<String>,
    train_rows: usize,
}

/// Ordered, stateful sequence of transformation steps
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    steps: Vec<TransformStep>,
    outcome: Option<String>,
    ignored: Vec<String>,
    state: Option<Arc<FitState>>,
}

impl Pipeline {
    pub fn new(steps: Vec<TransformStep>) -> Self {
        Self {
            steps,
            ..Default::default()
        }
    }

    /// Mark `column` as the outcome: it is never transformed and never
    /// appears in the output matrix, and need not be present at apply time.
    pub fn with_outcome(mut self, column: impl Into<String>) -> Self {
        self.outcome = Some(column.into());
        self.state = None;
        self
    }

    /// Columns (identifiers and the like) removed before any step runs
    pub fn ignoring(mut self, columns: Vec<String>) -> Self {
        self.ignored = columns;
        self.state = None;
        self
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    pub fn outcome(&self) -> Option<&str> {
        self.outcome.as_deref()
    }

    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    pub fn is_fit(&self) -> bool {
        self.state.is_some()
    }

    /// Append a step. Any edit returns the pipeline to the unfit state.
    pub fn push_step(&mut self, step: TransformStep) {
        self.steps.push(step);
        self.state = None;
    }

    pub fn insert_step(&mut self, index: usize, step: TransformStep) -> PrepResult<()> {
        if index > self.steps.len() {
            return Err(PrepError::invalid(
                "index",
                format!("{} is past the end of {} step(s)", index, self.steps.len()),
            ));
        }
        self.steps.insert(index, step);
        self.state = None;
        Ok(())
    }

    pub fn remove_step(&mut self, index: usize) -> PrepResult<TransformStep> {
        if index >= self.steps.len() {
            return Err(PrepError::invalid(
                "index",
                format!("no step at {} ({} step(s))", index, self.steps.len()),
            ));
        }
        self.state = None;
        Ok(self.steps.remove(index))
    }

    /// Learn every step's parameters from `train`, in declared order.
    ///
    /// Each step sees the columns as left by the steps before it. Returns a
    /// new fit pipeline; calling `fit` on an already-fit pipeline produces a
    /// fresh value whose parameters replace the old ones wholesale.
    pub fn fit(&self, train: &Dataset) -> PrepResult<Pipeline> {
        let mut frame = FitFrame::new(train, self.outcome.as_deref(), &self.ignored);
        for step in &self.steps {
            frame.fit_step(step.clone())?;
        }
        frame.finish(self.outcome.clone(), self.ignored.clone())
    }

    /// Fit on `train` and apply to it in one call
    pub fn fit_apply(&self, train: &Dataset) -> PrepResult<(Pipeline, NumericMatrix)> {
        let fitted = self.fit(train)?;
        let matrix = fitted.apply(train)?;
        Ok((fitted, matrix))
    }

    /// Replay the fitted steps on `data` and emit the numeric matrix.
    ///
    /// The output columns are exactly those fixed at fit time. Nothing is
    /// computed from `data` beyond the per-row values of the columns read.
    pub fn apply(&self, data: &Dataset) -> PrepResult<NumericMatrix> {
        let state = self.state.as_ref().ok_or(PrepError::PipelineNotFit)?;

        let mut frame = data.without_columns(&self.removed_columns());
        for fitted in &state.fitted {
            let position = frame.position(fitted.step.column())?;
            let replacement = fitted
                .step
                .apply(&fitted.parameters, &frame.columns()[position])?;
            frame.splice(position, replacement);
        }

        let columns = state
            .output_columns
            .iter()
            .map(|name| -> PrepResult<(String, Vec<f64>)> {
                Ok((name.clone(), frame.numeric(name)?.to_vec()))
            })
            .collect::<PrepResult<Vec<_>>>()?;

        NumericMatrix::from_columns(columns)
    }

    /// Fitted steps and their parameters
    pub fn fitted_steps(&self) -> PrepResult<&[FittedStep]> {
        Ok(&self.fit_state()?.fitted)
    }

    /// Output column names, fixed at fit time
    pub fn output_columns(&self) -> PrepResult<&[String]> {
        Ok(&self.fit_state()?.output_columns)
    }

    /// Nominal columns left unencoded after all steps; they are not part of the matrix
    pub fn excluded_columns(&self) -> PrepResult<&[String]> {
        Ok(&self.fit_state()?.excluded_columns)
    }

    /// Number of rows the pipeline was fit on
    pub fn train_rows(&self) -> PrepResult<usize> {
        Ok(self.fit_state()?.train_rows)
    }

    fn fit_state(&self) -> PrepResult<&FitState> {
        self.state.as_deref().ok_or(PrepError::PipelineNotFit)
    }

    fn removed_columns(&self) -> Vec<String> {
        self.outcome
            .iter()
            .chain(self.ignored.iter())
            .cloned()
            .collect()
    }
}

/// Working copy of the training data while steps are fit one by one
struct FitFrame {
    frame: Dataset,
    fitted: Vec<FittedStep>,
    outcome: Option<String>,
    train_rows: usize,
}

impl FitFrame {
    fn new(train: &Dataset, outcome: Option<&str>, ignored: &[String]) -> Self {
        let removed: Vec<String> = outcome
            .map(str::to_string)
            .into_iter()
            .chain(ignored.iter().cloned())
            .collect();
        Self {
            frame: train.without_columns(&removed),
            fitted: Vec::new(),
            outcome: outcome.map(str::to_string),
            train_rows: train.n_rows(),
        }
    }

    fn fit_step(&mut self, step: TransformStep) -> PrepResult<()> {
        if self.outcome.as_deref() == Some(step.column()) {
            return Err(PrepError::invalid(
                "steps",
                format!("{} targets the outcome column", step),
            ));
        }

        let parameters = step.fit(&self.frame)?;
        let position = self.frame.position(step.column())?;
        let replacement = step.apply(&parameters, &self.frame.columns()[position])?;

        // Indicator names must not collide with columns already in the frame.
        for column in &replacement {
            let clashes = self
                .frame
                .columns()
                .iter()
                .enumerate()
                .any(|(i, c)| i != position && c.name == column.name);
            if clashes {
                return Err(PrepError::invalid(
                    "steps",
                    format!("{} produces column '{}' which already exists", step, column.name),
                ));
            }
        }

        self.frame.splice(position, replacement);
        self.fitted.push(FittedStep { step, parameters });
        Ok(())
    }

    fn schema_kinds(&self) -> Vec<(String, ColumnKind)> {
        self.frame.schema().fields
    }

    fn finish(self, outcome: Option<String>, ignored: Vec<String>) -> PrepResult<Pipeline> {
        let mut output_columns = Vec::new();
        let mut excluded_columns = Vec::new();
        for column in self.frame.columns() {
            match column.kind() {
                ColumnKind::Numeric => output_columns.push(column.name.clone()),
                ColumnKind::Nominal => excluded_columns.push(column.name.clone()),
            }
        }

        let steps = self.fitted.iter().map(|f| f.step.clone()).collect();
        Ok(Pipeline {
            steps,
            outcome,
            ignored,
            state: Some(Arc::new(FitState {
                fitted: self.fitted,
                output_columns,
                excluded_columns,
                train_rows: self.train_rows,
            })),
        })
    }
}

// ============================================================================
// Declarative recipes
// ============================================================================

/// Which columns a recipe step addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Explicit column names
    Columns(Vec<String>),
    /// Every numeric column other than the outcome, at the point the step runs
    AllNumericPredictors,
    /// Every nominal column other than the outcome, at the point the step runs
    AllNominalPredictors,
}

impl Selector {
    fn resolve(&self, kinds: &[(String, ColumnKind)]) -> PrepResult<Vec<String>> {
        let by_kind = |wanted: ColumnKind| -> Vec<String> {
            kinds
                .iter()
                .filter(|(_, kind)| *kind == wanted)
                .map(|(name, _)| name.clone())
                .collect()
        };

        match self {
            Selector::Columns(names) => {
                for name in names {
                    if !kinds.iter().any(|(n, _)| n == name) {
                        return Err(PrepError::unknown(name));
                    }
                }
                Ok(names.clone())
            }
            Selector::AllNumericPredictors => Ok(by_kind(ColumnKind::Numeric)),
            Selector::AllNominalPredictors => Ok(by_kind(ColumnKind::Nominal)),
        }
    }
}

/// One declared recipe step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepSpec {
    Discretize { select: Selector, bin_count: usize },
    Log { select: Selector },
    Encode { select: Selector },
    CenterScale { select: Selector },
}

impl StepSpec {
    fn selector(&self) -> &Selector {
        match self {
            StepSpec::Discretize { select, .. }
            | StepSpec::Log { select }
            | StepSpec::Encode { select }
            | StepSpec::CenterScale { select } => select,
        }
    }

    fn step_for(&self, column: String) -> TransformStep {
        match self {
            StepSpec::Discretize { bin_count, .. } => TransformStep::discretize(column, *bin_count),
            StepSpec::Log { .. } => TransformStep::log(column),
            StepSpec::Encode { .. } => TransformStep::encode(column),
            StepSpec::CenterScale { .. } => TransformStep::center_scale(column),
        }
    }
}

/// Declarative pipeline description, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSpec {
    #[serde(default)]
    pub outcome: OutcomeMapping,
    /// Identifier-like columns removed before any step runs
    #[serde(default)]
    pub ignore: Vec<String>,
    pub steps: Vec<StepSpec>,
}

impl RecipeSpec {
    /// The churn preparation recipe: six tenure bins, log total charges,
    /// indicator-encode every nominal predictor, then center and scale every
    /// numeric predictor (indicators included).
    pub fn churn_default() -> Self {
        Self {
            outcome: OutcomeMapping::default(),
            ignore: vec!["customerID".to_string()],
            steps: vec![
                StepSpec::Discretize {
                    select: Selector::Columns(vec!["tenure".to_string()]),
                    bin_count: DEFAULT_TENURE_BINS,
                },
                StepSpec::Log {
                    select: Selector::Columns(vec!["TotalCharges".to_string()]),
                },
                StepSpec::Encode {
                    select: Selector::AllNominalPredictors,
                },
                StepSpec::CenterScale {
                    select: Selector::AllNumericPredictors,
                },
            ],
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Resolve selectors against `train` and fit the resulting pipeline.
    ///
    /// Each selector sees the columns as left by the steps before it, so a
    /// numeric-predictor selector after an encode step also picks up the
    /// indicator columns. The returned pipeline lists one concrete
    /// single-column step per selected column and can be refit with `Pipeline::fit`.
    pub fn fit(&self, train: &Dataset) -> PrepResult<Pipeline> {
        let outcome = self.outcome.column.clone();
        let mut frame = FitFrame::new(train, Some(&outcome), &self.ignore);

        for spec in &self.steps {
            let columns = spec.selector().resolve(&frame.schema_kinds())?;
            for column in columns {
                frame.fit_step(spec.step_for(column))?;
            }
        }

        frame.finish(Some(outcome), self.ignore.clone())
    }
}

impl Default for RecipeSpec {
    fn default() -> Self {
        Self::churn_default()
    }
}
