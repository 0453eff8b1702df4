use std::sync::mpsc;

use crate::error::{EngineError, Result};
use crate::train::history::TrainingHistoryEntry;

/// Configuration for a continuous training run.
///
/// # Fields
/// - `max_iterations`: hard cap on iterations in this run
/// - `convergence_threshold`: the run ends once an iteration reports a loss
///   below this value
/// - `progress_tx`: optional channel sender; one entry is sent per completed
///   iteration. If the receiver is dropped the loop stops early, as if cancelled.
pub struct TrainConfig {
    pub max_iterations: usize,
    pub convergence_threshold: f64,
    pub progress_tx: Option<mpsc::Sender<TrainingHistoryEntry>>,
}

impl TrainConfig {
    /// Creates a `TrainConfig` with no progress channel.
    pub fn new(max_iterations: usize, convergence_threshold: f64) -> Self {
        TrainConfig {
            max_iterations,
            convergence_threshold,
            progress_tx: None,
        }
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<TrainingHistoryEntry>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(EngineError::InvalidRunConfig("max_iterations must be at least 1".into()));
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold <= 0.0 {
            return Err(EngineError::InvalidRunConfig(format!(
                "convergence threshold must be positive and finite, got {}",
                self.convergence_threshold
            )));
        }
        Ok(())
    }
}
