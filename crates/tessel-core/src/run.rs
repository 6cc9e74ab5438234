//! The generation loop: step the generator until a stop condition holds,
//! keeping what the output filter accepts.

use std::collections::BTreeSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tessel_explore::{ForwardGenerator, GenerationError, GeneratorCounters};
use tessel_ir::universe::Universe;
use tessel_ir::{ExecutionBackend, ParseError};
use tessel_model::Failure;
use tessel_sandbox::ExecutableSequence;

use crate::config::RunConfig;
use crate::filter::{DefaultTestFilter, TestFilter};
use crate::limits::{RunLimits, StopChecker, StopReason};
use crate::listener::GenerationListener;
use crate::progress::{ProgressReporter, RunCounters};
use crate::stats::RunStatistics;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("universe error: {0}")]
    Universe(#[from] ParseError),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("generation aborted: {0}")]
    Generation(#[from] GenerationError),
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunResult {
    pub stop_reason: StopReason,
    /// Retained sequences without failures.
    pub passing: Vec<ExecutableSequence>,
    /// Retained sequences revealing at least one new failure.
    pub failing: Vec<ExecutableSequence>,
    pub statistics: RunStatistics,
    pub counters: GeneratorCounters,
    pub elapsed: Duration,
}

impl RunResult {
    /// Distinct failures across all retained failing sequences.
    pub fn failures(&self) -> BTreeSet<Failure> {
        self.failing.iter().flat_map(ExecutableSequence::failures).collect()
    }
}

pub struct GenerationRun {
    generator: ForwardGenerator,
    filter: Box<dyn TestFilter>,
    limits: RunLimits,
    listeners: Vec<Box<dyn GenerationListener>>,
    counters: Arc<RunCounters>,
}

impl GenerationRun {
    pub fn new(generator: ForwardGenerator, config: &RunConfig) -> Self {
        Self {
            generator,
            filter: Box::new(DefaultTestFilter::new(config.output.clone())),
            limits: config.limits.clone(),
            listeners: Vec::new(),
            counters: RunCounters::new(),
        }
    }

    /// Build the generator for `universe` with the generation and
    /// execution settings of `config`.
    pub fn from_universe(
        universe: Universe,
        backend: Box<dyn ExecutionBackend>,
        config: &RunConfig,
    ) -> Result<Self, RunError> {
        let generator = ForwardGenerator::from_universe(universe, backend, config.gen.clone())?
            .with_exec_config(config.exec.clone());
        Ok(Self::new(generator, config))
    }

    /// Same as `from_universe`, with both the universe and the config
    /// given as JSON.
    pub fn from_json(
        universe_json: &str,
        config_json: &str,
        backend: Box<dyn ExecutionBackend>,
    ) -> Result<Self, RunError> {
        let universe = Universe::from_json(universe_json)?;
        let config = RunConfig::from_json(config_json)?;
        Self::from_universe(universe, backend, &config)
    }

    pub fn with_filter(mut self, filter: Box<dyn TestFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn add_listener(&mut self, listener: Box<dyn GenerationListener>) {
        self.listeners.push(listener);
    }

    /// Shared counters, readable from other threads during `explore`.
    pub fn counters(&self) -> Arc<RunCounters> {
        self.counters.clone()
    }

    pub fn generator(&self) -> &ForwardGenerator {
        &self.generator
    }

    /// Run until a limit is hit, a listener vetoes, or no operation is
    /// left. Engine errors abort the run.
    pub fn explore(&mut self) -> Result<RunResult, RunError> {
        let checker = StopChecker::new(self.limits.clone());
        let reporter = self
            .limits
            .progress_interval()
            .map(|interval| ProgressReporter::spawn(self.counters.clone(), interval));

        let mut statistics = RunStatistics::new();
        let mut passing = Vec::new();
        let mut failing = Vec::new();

        tracing::info!(operations = self.generator.operations().len(), "generation started");
        for listener in &mut self.listeners {
            listener.generation_started();
        }

        let stop_reason = loop {
            let snap = self.counters.snapshot();
            if let Some(reason) = checker.check(snap.steps, snap.generated, snap.output) {
                break reason;
            }
            if self.listeners.iter().any(|l| l.should_stop()) {
                break StopReason::ListenerVeto;
            }
            if self.generator.operations().is_empty() {
                break StopReason::Exhausted;
            }

            let produced = self.generator.step()?;
            self.counters.steps.fetch_add(1, Ordering::Relaxed);
            self.counters
                .generated
                .store(self.generator.num_generated() as u64, Ordering::Relaxed);

            if let Some(eseq) = &produced {
                statistics.record(eseq);
            }
            for listener in &mut self.listeners {
                listener.step_done(produced.as_ref());
            }

            let Some(eseq) = produced else {
                continue;
            };
            if !self.filter.retain(&eseq) {
                continue;
            }
            self.counters.output.fetch_add(1, Ordering::Relaxed);
            if eseq.has_failure() {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                tracing::info!(failures = ?eseq.failures(), "failing sequence kept");
                failing.push(eseq);
            } else {
                passing.push(eseq);
            }
        };

        if let Some(reporter) = reporter {
            reporter.stop();
        }
        for listener in &mut self.listeners {
            listener.generation_stopped(stop_reason);
        }

        let snap = self.counters.snapshot();
        statistics.steps = snap.steps;
        statistics.sequences_output = snap.output;
        statistics.elapsed_secs = checker.elapsed().as_secs_f64();
        tracing::info!(
            reason = ?stop_reason,
            steps = snap.steps,
            generated = snap.generated,
            output = snap.output,
            "generation stopped"
        );

        Ok(RunResult {
            stop_reason,
            passing,
            failing,
            statistics,
            counters: self.generator.counters(),
            elapsed: checker.elapsed(),
        })
    }
}
