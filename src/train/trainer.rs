use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::input::climate::ClimateInputs;
use crate::input::normalizer::NormalizationPolicy;
use crate::network::backward::validate_target;
use crate::network::forward::{ForwardResult, Wiring};
use crate::network::weights::{WeightInit, WeightSet};
use crate::network::INPUT_SIZE;
use crate::optim::sgd::Sgd;
use crate::train::history::TrainingHistoryEntry;
use crate::train::step::{train_step, StepOutcome};
use crate::train::train_config::TrainConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainerState {
    Idle,
    /// A single `step()` is executing.
    Stepping,
    /// A run is active; drive it with `advance()`.
    Running,
    /// The last run reached the convergence threshold. Terminal until reset.
    Converged,
    /// The last run hit its iteration cap or was cancelled. Terminal until reset.
    Stopped,
}

impl TrainerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrainerState::Converged | TrainerState::Stopped)
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Converged,
    IterationCap,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Iterations completed by this run (not counting earlier history).
    pub iterations: usize,
    pub final_loss: Option<f64>,
    pub outcome: RunOutcome,
}

/// A batch of setting changes. `None` leaves the current value alone.
///
/// `Trainer::apply_settings` validates every present field before touching
/// any of them, so a rejected batch changes nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SettingsUpdate {
    pub inputs: Option<ClimateInputs>,
    pub target: Option<f64>,
    pub learning_rate: Option<f64>,
    pub policy: Option<NormalizationPolicy>,
}

/// Cloneable cancellation flag. Requests take effect before the next
/// iteration starts; an iteration already in progress always completes.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveRun {
    max_iterations: usize,
    convergence_threshold: f64,
    completed: usize,
    last_loss: Option<f64>,
}

/// Owns the current weight snapshot and the training history, and walks the
/// Idle → Stepping/Running → Converged/Stopped state machine.
///
/// Generic over the random source used by `WeightInit::Random` so tests can
/// inject a seeded generator.
pub struct Trainer<R: RngCore = ChaCha12Rng> {
    policy: NormalizationPolicy,
    wiring: Wiring,
    init: WeightInit,
    init_half_range: f64,
    inputs: ClimateInputs,
    target: f64,
    optimizer: Sgd,
    rng: R,
    weights: Arc<WeightSet>,
    history: Vec<TrainingHistoryEntry>,
    state: TrainerState,
    active_run: Option<ActiveRun>,
    last_run: Option<RunSummary>,
    last_step: Option<StepOutcome>,
    stop: StopHandle,
}

impl Trainer<ChaCha12Rng> {
    /// Seeds from `config.seed` when set, from OS entropy otherwise.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::from_entropy(),
        };
        Trainer::with_rng(config, rng)
    }
}

impl<R: RngCore> Trainer<R> {
    pub fn with_rng(config: &EngineConfig, mut rng: R) -> Result<Self> {
        config.validate()?;
        let wiring = config.wiring();
        let weights = WeightSet::from_init(config.init, &mut rng, config.init_half_range);

        Ok(Trainer {
            policy: config.normalization,
            wiring,
            init: config.init,
            init_half_range: config.init_half_range,
            inputs: config.inputs,
            target: config.target,
            optimizer: Sgd::new(config.learning_rate)?,
            rng,
            weights: Arc::new(weights),
            history: Vec::new(),
            state: TrainerState::Idle,
            active_run: None,
            last_run: None,
            last_step: None,
            stop: StopHandle::default(),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn state(&self) -> TrainerState {
        self.state
    }

    /// The current snapshot. Cloning the `Arc` is cheap and the snapshot
    /// never changes underneath the holder.
    pub fn weights(&self) -> Arc<WeightSet> {
        Arc::clone(&self.weights)
    }

    pub fn history(&self) -> &[TrainingHistoryEntry] {
        &self.history
    }

    pub fn inputs(&self) -> ClimateInputs {
        self.inputs
    }

    pub fn features(&self) -> [f64; INPUT_SIZE] {
        self.policy.normalize(&self.inputs)
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate
    }

    pub fn policy(&self) -> NormalizationPolicy {
        self.policy
    }

    pub fn wiring(&self) -> Wiring {
        self.wiring
    }

    pub fn last_step(&self) -> Option<&StepOutcome> {
        self.last_step.as_ref()
    }

    pub fn last_run(&self) -> Option<&RunSummary> {
        self.last_run.as_ref()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Forward pass over the current weights without training.
    pub fn preview(&self) -> Result<ForwardResult> {
        self.wiring.forward(&self.weights, &self.features())
    }

    // ── Settings (rejected while a run is active) ───────────────────────

    pub fn set_inputs(&mut self, inputs: ClimateInputs) -> Result<()> {
        self.ensure_not_running("change inputs")?;
        inputs.validate()?;
        self.inputs = inputs;
        Ok(())
    }

    pub fn set_target(&mut self, target: f64) -> Result<()> {
        self.ensure_not_running("change target")?;
        validate_target(target)?;
        self.target = target;
        Ok(())
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        self.ensure_not_running("change learning rate")?;
        self.optimizer = Sgd::new(learning_rate)?;
        Ok(())
    }

    pub fn set_policy(&mut self, policy: NormalizationPolicy) -> Result<()> {
        self.ensure_not_running("change normalization")?;
        self.policy = policy;
        Ok(())
    }

    /// All-or-nothing version of the individual setters.
    pub fn apply_settings(&mut self, update: SettingsUpdate) -> Result<()> {
        self.ensure_not_running("change settings")?;
        if let Some(inputs) = &update.inputs {
            inputs.validate()?;
        }
        if let Some(target) = update.target {
            validate_target(target)?;
        }
        let optimizer = update.learning_rate.map(Sgd::new).transpose()?;

        if let Some(inputs) = update.inputs {
            self.inputs = inputs;
        }
        if let Some(target) = update.target {
            self.target = target;
        }
        if let Some(optimizer) = optimizer {
            self.optimizer = optimizer;
        }
        if let Some(policy) = update.policy {
            self.policy = policy;
        }
        debug!(?update, "settings applied");
        Ok(())
    }

    // ── Training ────────────────────────────────────────────────────────

    /// Runs exactly one iteration and appends its history entry.
    pub fn step(&mut self) -> Result<StepOutcome> {
        self.ensure_state("step", TrainerState::Idle)?;
        self.state = TrainerState::Stepping;
        let result = self.iterate();
        self.state = TrainerState::Idle;
        result
    }

    /// Starts a run. Call `advance()` until it returns `None`, or use `run()`.
    pub fn begin_run(&mut self, config: &TrainConfig) -> Result<()> {
        self.ensure_state("start a run", TrainerState::Idle)?;
        config.validate()?;
        self.stop.clear();
        self.active_run = Some(ActiveRun {
            max_iterations: config.max_iterations,
            convergence_threshold: config.convergence_threshold,
            completed: 0,
            last_loss: None,
        });
        self.state = TrainerState::Running;
        info!(
            max_iterations = config.max_iterations,
            threshold = config.convergence_threshold,
            start_iteration = self.history.len(),
            "training run started"
        );
        Ok(())
    }

    /// Performs the next iteration of the active run, or ends the run and
    /// returns `None` once it has converged, hit its cap, or been cancelled.
    ///
    /// Stopping conditions are checked before each iteration, so every
    /// returned outcome is a fully applied update.
    pub fn advance(&mut self) -> Result<Option<StepOutcome>> {
        self.ensure_state("advance", TrainerState::Running)?;
        let mut run = match self.active_run {
            Some(run) => run,
            None => return Err(EngineError::InvalidState { op: "advance", state: self.state }),
        };

        if run.last_loss.is_some_and(|loss| loss < run.convergence_threshold) {
            self.finish(run, RunOutcome::Converged);
            return Ok(None);
        }
        if self.stop.is_stop_requested() {
            warn!(completed = run.completed, "training run cancelled");
            self.finish(run, RunOutcome::Cancelled);
            return Ok(None);
        }
        if run.completed >= run.max_iterations {
            self.finish(run, RunOutcome::IterationCap);
            return Ok(None);
        }

        let outcome = match self.iterate() {
            Ok(outcome) => outcome,
            Err(e) => {
                self.finish(run, RunOutcome::Cancelled);
                return Err(e);
            }
        };
        run.completed += 1;
        run.last_loss = Some(outcome.entry.loss);
        self.active_run = Some(run);
        Ok(Some(outcome))
    }

    /// Iterator over the iterations of a fresh run. Each item is one completed
    /// iteration; the iterator ends when the run does.
    pub fn run_iter(&mut self, config: &TrainConfig) -> Result<RunIter<'_, R>> {
        self.begin_run(config)?;
        Ok(RunIter { trainer: self, done: false })
    }

    /// Drives a run to completion on the calling thread.
    /// See `train::loop_fn::train_loop`.
    pub fn run(&mut self, config: &TrainConfig) -> Result<RunSummary> {
        crate::train::loop_fn::train_loop(self, config)
    }

    /// Requests cancellation of the active run.
    pub fn cancel(&self) {
        self.stop.request_stop();
    }

    /// Discards history, re-initializes weights and returns to Idle. Legal in
    /// every state, including mid-run.
    pub fn reset(&mut self) {
        let weights = WeightSet::from_init(self.init, &mut self.rng, self.init_half_range);
        self.weights = Arc::new(weights);
        self.history.clear();
        self.active_run = None;
        self.last_run = None;
        self.last_step = None;
        self.stop.clear();
        self.state = TrainerState::Idle;
        info!(init = ?self.init, "trainer reset");
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn iterate(&mut self) -> Result<StepOutcome> {
        let iteration = self.history.len();
        let outcome = train_step(
            &self.weights,
            &self.wiring,
            &self.features(),
            self.target,
            &self.optimizer,
            iteration,
        )?;

        // Whole-snapshot swap; readers holding the old Arc keep a consistent view.
        self.weights = Arc::clone(outcome.weights());
        self.history.push(outcome.entry.clone());
        self.last_step = Some(outcome.clone());
        debug!(
            iteration,
            loss = outcome.entry.loss,
            prediction = outcome.entry.prediction,
            "iteration complete"
        );
        Ok(outcome)
    }

    fn finish(&mut self, run: ActiveRun, outcome: RunOutcome) {
        let summary = RunSummary {
            iterations: run.completed,
            final_loss: run.last_loss,
            outcome,
        };
        self.state = match outcome {
            RunOutcome::Converged => TrainerState::Converged,
            RunOutcome::IterationCap | RunOutcome::Cancelled => TrainerState::Stopped,
        };
        self.active_run = None;
        self.last_run = Some(summary);
        info!(
            iterations = summary.iterations,
            final_loss = ?summary.final_loss,
            outcome = ?summary.outcome,
            "training run finished"
        );
    }

    fn ensure_state(&self, op: &'static str, wanted: TrainerState) -> Result<()> {
        if self.state != wanted {
            return Err(EngineError::InvalidState { op, state: self.state });
        }
        Ok(())
    }

    fn ensure_not_running(&self, op: &'static str) -> Result<()> {
        if matches!(self.state, TrainerState::Running | TrainerState::Stepping) {
            return Err(EngineError::InvalidState { op, state: self.state });
        }
        Ok(())
    }
}

/// Borrowing iterator returned by `Trainer::run_iter`.
pub struct RunIter<'a, R: RngCore> {
    trainer: &'a mut Trainer<R>,
    done: bool,
}

impl<'a, R: RngCore> RunIter<'a, R> {
    /// Read access to the trainer between iterations.
    pub fn trainer(&self) -> &Trainer<R> {
        self.trainer
    }

    pub fn cancel(&self) {
        self.trainer.cancel();
    }
}

impl<'a, R: RngCore> Iterator for RunIter<'a, R> {
    type Item = Result<StepOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.trainer.advance() {
            Ok(Some(outcome)) => Some(Ok(outcome)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
