//! Active-learning loop that grows the snapshot table one case at a time.
//!
//! Each iteration walks the states
//! `Selecting → Inferring → RunningCase → Evaluating → RebuildingRom`:
//!
//! 1. [`AcquisitionSelector`] proposes values for the active parameters.
//! 2. [`LocalSurrogateRegressor`] fills in the inactive ones.
//! 3. The [`CaseExecutor`] reconstructs the ROM prediction and runs the
//!    full simulation under a fresh `case_NNNN` name.
//! 4. Every metric is evaluated on both results and compared.
//! 5. The row is appended to the table (and the optional store) and the
//!    ROM is rebuilt from all snapshots.
//!
//! Store writes are synchronous I/O. With the `async` feature they run on
//! tokio's blocking pool; without it they run on the task driving the loop,
//! and a [`JournalSnapshotStore`](crate::storage) replays its whole file on
//! every append.
//!
//! Any error stops the loop in [`LoopState::Failed`]. Rows and results
//! recorded before the failure are kept.
//!
//! ```
//! use romsampler::enhance::{CancelToken, CaseExecutor, EnhancementLoop};
//! use romsampler::metric::{Fidelity, Metric, MetricKind};
//! use romsampler::parameter::Parameter;
//! use romsampler::snapshot::{ParamValues, SnapshotTable};
//!
//! struct Analytic;
//!
//! impl CaseExecutor for Analytic {
//!     async fn reconstruct(&mut self, _: &str, _: &ParamValues) -> romsampler::Result<()> {
//!         Ok(())
//!     }
//!     async fn run_case(&mut self, _: &str, _: &ParamValues) -> romsampler::Result<()> {
//!         Ok(())
//!     }
//!     async fn evaluate_metric(
//!         &mut self,
//!         _: &str,
//!         _: &Metric,
//!         fidelity: Fidelity,
//!     ) -> romsampler::Result<f64> {
//!         Ok(match fidelity {
//!             Fidelity::Rom => 0.99,
//!             Fidelity::Cfd => 1.0,
//!         })
//!     }
//!     async fn rebuild_rom(&mut self, _: &[String]) -> romsampler::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut table = SnapshotTable::new(["u"]);
//! for (i, u) in [1.0, 2.0, 3.0].into_iter().enumerate() {
//!     table.push(format!("case_{i:04}"), ParamValues::from([("u".into(), u)])).unwrap();
//! }
//!
//! let enhancer = EnhancementLoop::builder()
//!     .parameters(vec![Parameter::new("u", 0.0, 4.0)])
//!     .metric(Metric::new(MetricKind::SurfaceAggregate {
//!         surface: "outlet".into(),
//!         report_type: "areaAverage".into(),
//!         field: "p".into(),
//!         component: None,
//!     }))
//!     .iterations(2)
//!     .build()
//!     .unwrap();
//!
//! let report = enhancer.run(&mut table, &mut Analytic, &CancelToken::new()).await;
//! assert!(report.is_done());
//! assert_eq!(report.new_cases, ["case_0003", "case_0004"]);
//! # });
//! ```

use core::fmt;
use core::future::Future;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::acquisition::AcquisitionSelector;
use crate::error::{Error, Result};
use crate::metric::{EvalReport, EvalResult, Fidelity, Metric};
use crate::parameter::{Parameter, validate_schema};
use crate::regression::LocalSurrogateRegressor;
use crate::snapshot::{ParamValues, SnapshotTable};
use crate::storage::SnapshotStore;

/// Default number of loop iterations.
pub const DEFAULT_ITERATIONS: usize = 1;

/// External collaborator that reconstructs ROM fields, runs CFD cases,
/// extracts metrics and rebuilds the ROM.
///
/// Implementations report failures as [`Error::CaseExecution`],
/// [`Error::RomBuild`] or [`Error::MetricEvaluation`].
pub trait CaseExecutor {
    /// Reconstruct the ROM prediction for `params` under `case`.
    fn reconstruct(
        &mut self,
        case: &str,
        params: &ParamValues,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Run the full-fidelity simulation for `params` under `case`.
    fn run_case(
        &mut self,
        case: &str,
        params: &ParamValues,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Extract `metric` from the `fidelity` result of `case`.
    fn evaluate_metric(
        &mut self,
        case: &str,
        metric: &Metric,
        fidelity: Fidelity,
    ) -> impl Future<Output = Result<f64>> + Send;

    /// Rebuild the ROM from the named snapshots.
    fn rebuild_rom(&mut self, snapshots: &[String]) -> impl Future<Output = Result<()>> + Send;
}

/// Where the loop is, or where it stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Picking the next active-parameter values.
    Selecting,
    /// Filling inactive parameters.
    Inferring,
    /// Reconstructing and simulating the new case.
    RunningCase,
    /// Comparing metrics.
    Evaluating,
    /// Appending the row and rebuilding the ROM.
    RebuildingRom,
    /// All iterations finished.
    Done,
    /// A step returned an error.
    Failed,
    /// Stopped through a [`CancelToken`].
    Cancelled,
}

impl LoopState {
    /// Returns `true` for `Done`, `Failed` and `Cancelled`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Selecting => "selecting",
            Self::Inferring => "inferring",
            Self::RunningCase => "running case",
            Self::Evaluating => "evaluating",
            Self::RebuildingRom => "rebuilding ROM",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Cooperative cancellation flag, checked before every iteration.
///
/// Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of [`EnhancementLoop::run`].
#[derive(Debug)]
pub struct EnhancementReport {
    /// Terminal state.
    pub state: LoopState,
    /// Iterations that reached the end of `RebuildingRom`.
    pub iterations_completed: usize,
    /// Cases appended to the table, in order.
    pub new_cases: Vec<String>,
    /// Every metric comparison, in the order it was computed.
    pub results: EvalReport,
    /// State in which the loop failed.
    pub failed_in: Option<LoopState>,
    error: Option<Error>,
}

impl EnhancementReport {
    fn new() -> Self {
        Self {
            state: LoopState::Selecting,
            iterations_completed: 0,
            new_cases: Vec::new(),
            results: EvalReport::new(),
            failed_in: None,
            error: None,
        }
    }

    /// Returns `true` if every iteration finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == LoopState::Done
    }

    /// The error that stopped the loop, if any.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Converts the report into a `Result`, surfacing the stop error.
    ///
    /// # Errors
    ///
    /// Returns the error that moved the loop into [`LoopState::Failed`].
    pub fn into_result(self) -> Result<Self> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }

    fn fail(mut self, state: LoopState, error: Error) -> Self {
        trace_info!(state = %state, error = %error, "enhancement loop failed");
        self.state = LoopState::Failed;
        self.failed_in = Some(state);
        self.error = Some(error);
        self
    }
}

/// The active-learning loop configuration.
///
/// Build one with [`EnhancementLoop::builder`] and drive it with
/// [`run`](Self::run).
pub struct EnhancementLoop {
    parameters: Vec<Parameter>,
    metrics: Vec<Metric>,
    iterations: usize,
    selector: AcquisitionSelector,
    regressor: LocalSurrogateRegressor,
    store: Option<Arc<dyn SnapshotStore>>,
}

impl EnhancementLoop {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> EnhancementLoopBuilder {
        EnhancementLoopBuilder::default()
    }

    /// The parameter schema.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// The metrics compared after each case.
    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Number of iterations per run.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Runs the configured number of iterations against `table`.
    ///
    /// Never panics on collaborator failure: the error is returned inside
    /// the report together with everything recorded before it.
    pub async fn run<E>(
        &self,
        table: &mut SnapshotTable,
        executor: &mut E,
        cancel: &CancelToken,
    ) -> EnhancementReport
    where
        E: CaseExecutor,
    {
        let fut = self.drive(table, executor, cancel);
        #[cfg(feature = "tracing")]
        let fut = tracing::Instrument::instrument(
            fut,
            tracing::info_span!(
                "enhance",
                iterations = self.iterations,
                parameters = self.parameters.len(),
                metrics = self.metrics.len()
            ),
        );
        fut.await
    }

    async fn drive<E>(
        &self,
        table: &mut SnapshotTable,
        executor: &mut E,
        cancel: &CancelToken,
    ) -> EnhancementReport
    where
        E: CaseExecutor,
    {
        let mut report = EnhancementReport::new();

        for iteration in 0..self.iterations {
            if cancel.is_cancelled() {
                trace_info!(iteration, "enhancement loop cancelled");
                report.state = LoopState::Cancelled;
                return report;
            }

            let mut state = LoopState::Selecting;
            if let Err(e) = self
                .iterate(iteration, table, executor, &mut report, &mut state)
                .await
            {
                return report.fail(state, e);
            }
            report.iterations_completed += 1;
        }

        trace_info!(
            iterations = report.iterations_completed,
            results = report.results.len(),
            "enhancement loop finished"
        );
        report.state = LoopState::Done;
        report
    }

    async fn iterate<E>(
        &self,
        iteration: usize,
        table: &mut SnapshotTable,
        executor: &mut E,
        report: &mut EnhancementReport,
        state: &mut LoopState,
    ) -> Result<()>
    where
        E: CaseExecutor,
    {
        enter(state, LoopState::Selecting, iteration);
        let active = self.selector.select_next(table, &self.parameters)?;

        enter(state, LoopState::Inferring, iteration);
        let params = self.regressor.complete(table, &active)?;

        enter(state, LoopState::RunningCase, iteration);
        let case = table.next_case_name();
        executor.reconstruct(&case, &params).await?;
        executor.run_case(&case, &params).await?;

        enter(state, LoopState::Evaluating, iteration);
        for metric in &self.metrics {
            let rom = executor.evaluate_metric(&case, metric, Fidelity::Rom).await?;
            let cfd = executor.evaluate_metric(&case, metric, Fidelity::Cfd).await?;
            let result = EvalResult::new(case.clone(), metric.label(), rom, cfd);
            trace_debug!(
                case = %case,
                metric = %result.metric_label,
                rom,
                cfd,
                error_percent = result.relative_error_percent,
                "metric evaluated"
            );
            report.results.push(result);
        }

        enter(state, LoopState::RebuildingRom, iteration);
        table.push(case.clone(), params.clone())?;
        report.new_cases.push(case.clone());
        if let Some(store) = &self.store {
            #[cfg(feature = "async")]
            crate::offload::persist_snapshot(Arc::clone(store), case.clone(), params.clone()).await?;
            #[cfg(not(feature = "async"))]
            store.persist_snapshot(&case, &params)?;
        }
        executor.rebuild_rom(&table.case_names()).await?;
        Ok(())
    }
}

#[allow(unused_variables)]
fn enter(state: &mut LoopState, next: LoopState, iteration: usize) {
    trace_debug!(iteration, from = %state, to = %next, "loop state transition");
    *state = next;
}

/// Builder for [`EnhancementLoop`].
#[derive(Default)]
pub struct EnhancementLoopBuilder {
    parameters: Vec<Parameter>,
    metrics: Vec<Metric>,
    iterations: Option<usize>,
    selector: Option<AcquisitionSelector>,
    regressor: Option<LocalSurrogateRegressor>,
    store: Option<Arc<dyn SnapshotStore>>,
}

impl EnhancementLoopBuilder {
    /// Sets the parameter schema; active flags decide what is sampled.
    #[must_use]
    pub fn parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Adds one metric.
    #[must_use]
    pub fn metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Replaces the metric list.
    #[must_use]
    pub fn metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Sets the number of iterations. Default: [`DEFAULT_ITERATIONS`].
    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Sets the acquisition selector.
    #[must_use]
    pub fn selector(mut self, selector: AcquisitionSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Sets the regressor for inactive parameters.
    #[must_use]
    pub fn regressor(mut self, regressor: LocalSurrogateRegressor) -> Self {
        self.regressor = Some(regressor);
        self
    }

    /// Persists every appended row to `store`.
    ///
    /// Writes happen on tokio's blocking pool when the `async` feature is
    /// enabled, inline otherwise.
    #[must_use]
    pub fn store(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Persists every appended row to a shared store.
    #[must_use]
    pub fn shared_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validates the schema and builds the loop.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidBounds`] / [`Error::Domain`] for a bad parameter.
    /// - [`Error::InvalidArgument`] for duplicate names or when no
    ///   parameter is active.
    pub fn build(self) -> Result<EnhancementLoop> {
        validate_schema(&self.parameters)?;
        if !self.parameters.iter().any(|p| p.active) {
            return Err(Error::InvalidArgument(
                "enhancement needs at least one active parameter".into(),
            ));
        }
        Ok(EnhancementLoop {
            parameters: self.parameters,
            metrics: self.metrics,
            iterations: self.iterations.unwrap_or(DEFAULT_ITERATIONS),
            selector: self.selector.unwrap_or_default(),
            regressor: self.regressor.unwrap_or_default(),
            store: self.store,
        })
    }
}
