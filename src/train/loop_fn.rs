use rand::RngCore;
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::train::train_config::TrainConfig;
use crate::train::trainer::{RunSummary, Trainer};

/// Drives a full run on the calling thread and returns how it ended.
///
/// Each completed iteration is appended to the trainer's history before the
/// next begins, and is forwarded on `config.progress_tx` when one is set.
///
/// # Early termination
/// The loop ends before `config.max_iterations` if:
/// - an iteration reports a loss below `config.convergence_threshold`,
/// - the trainer's `StopHandle` is triggered (e.g. from another thread), **or**
/// - the `progress_tx` receiver has been dropped.
pub fn train_loop<R: RngCore>(trainer: &mut Trainer<R>, config: &TrainConfig) -> Result<RunSummary> {
    trainer.begin_run(config)?;

    while let Some(outcome) = trainer.advance()? {
        if let Some(ref tx) = config.progress_tx {
            // Receiver gone: nobody is watching, stop at the next boundary.
            if tx.send(outcome.entry).is_err() {
                warn!("progress receiver dropped; cancelling run");
                trainer.cancel();
            }
        }
    }

    trainer
        .last_run()
        .copied()
        .ok_or(EngineError::InvalidState { op: "summarize run", state: trainer.state() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    use crate::config::EngineConfig;
    use crate::input::climate::{ClimateInputs, Scenario};
    use crate::input::normalizer::NormalizationPolicy;
    use crate::train::trainer::{RunOutcome, TrainerState};

    fn trainer(config: EngineConfig) -> Trainer {
        Trainer::with_rng(&config, ChaCha12Rng::seed_from_u64(1)).unwrap()
    }

    #[test]
    fn progress_channel_receives_every_iteration_in_order() {
        let mut t = trainer(EngineConfig { inputs: Scenario::CurrentTrend.inputs(), ..EngineConfig::default() });
        let (tx, rx) = mpsc::channel();
        let summary = t.run(&TrainConfig::new(6, 1e-12).with_progress(tx)).unwrap();
        let received: Vec<usize> = rx.try_iter().map(|e| e.iteration).collect();
        assert_eq!(received, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(summary.iterations, 6);
    }

    #[test]
    fn dropped_receiver_cancels_after_one_iteration() {
        let mut t = trainer(EngineConfig { inputs: Scenario::CurrentTrend.inputs(), ..EngineConfig::default() });
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let summary = t.run(&TrainConfig::new(50, 1e-12).with_progress(tx)).unwrap();
        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert_eq!(summary.iterations, 1);
    }

    #[test]
    fn converges_on_reachable_target() {
        let mut t = trainer(EngineConfig {
            normalization: NormalizationPolicy::FloorClamped,
            inputs: ClimateInputs::new(1.5, -5.0, 420.0),
            target: 0.55,
            learning_rate: 0.5,
            ..EngineConfig::default()
        });
        let summary = t.run(&TrainConfig::new(100, 1e-4)).unwrap();
        assert_eq!(summary.outcome, RunOutcome::Converged);
        assert!(summary.iterations < 100);
        assert!(t.history().last().unwrap().loss < 1e-4);
        assert_eq!(t.state(), TrainerState::Converged);
    }

    #[test]
    fn invalid_config_is_rejected_before_starting() {
        let mut t = trainer(EngineConfig::default());
        assert!(matches!(t.run(&TrainConfig::new(0, 1e-4)), Err(EngineError::InvalidRunConfig(_))));
        assert!(matches!(t.run(&TrainConfig::new(10, -1.0)), Err(EngineError::InvalidRunConfig(_))));
        assert_eq!(t.state(), TrainerState::Idle);
    }
}
