use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};

use climate_nn::{EngineConfig, RunSummary, StopHandle, Trainer, TrainingHistoryEntry};
use serde_json::{json, Value};

/// Pause between background iterations so a front end can animate them.
pub const DEFAULT_STEP_DELAY_MS: u64 = 50;

// ---------------------------------------------------------------------------
// Training status
// ---------------------------------------------------------------------------

pub enum TrainingStatus {
    /// No background run has been started since the last reset.
    Idle,
    /// A background thread is driving `Trainer::advance`. Each event-stream
    /// client owns one sender; dropping this variant hangs them all up.
    Running {
        stop:        StopHandle,
        subscribers: Vec<mpsc::Sender<TrainingHistoryEntry>>,
    },
    /// The background run ended (converged, hit its cap, or was stopped).
    Done {
        summary: RunSummary,
    },
    /// The background run aborted on an engine error.
    Failed {
        reason: String,
    },
}

impl TrainingStatus {
    pub fn to_json(&self) -> Value {
        match self {
            TrainingStatus::Idle => json!({ "status": "idle" }),
            TrainingStatus::Running { .. } => json!({ "status": "running" }),
            TrainingStatus::Done { summary } => json!({ "status": "done", "summary": summary }),
            TrainingStatus::Failed { reason } => json!({ "status": "failed", "reason": reason }),
        }
    }
}

// ---------------------------------------------------------------------------
// Main state struct
// ---------------------------------------------------------------------------

pub struct StudioState {
    pub trainer:       Trainer,
    /// Settings the studio was started with; run defaults come from here.
    pub config:        EngineConfig,
    pub training:      TrainingStatus,
    pub step_delay_ms: u64,
    /// Bumped on every start and reset; a background thread exits as soon
    /// as it no longer owns the current id.
    pub run_id:        u64,
}

impl StudioState {
    pub fn new(trainer: Trainer, config: EngineConfig) -> Self {
        StudioState {
            trainer,
            config,
            training:      TrainingStatus::Idle,
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
            run_id:        0,
        }
    }

    /// Registers a new event-stream client and returns its receiver together
    /// with the history recorded so far. Both are taken under the same lock,
    /// so every entry is either in the snapshot or arrives on the channel.
    /// `None` for the receiver when no run is in progress.
    pub fn subscribe(&mut self) -> (Vec<TrainingHistoryEntry>, Option<mpsc::Receiver<TrainingHistoryEntry>>) {
        let rx = match &mut self.training {
            TrainingStatus::Running { subscribers, .. } => {
                let (tx, rx) = mpsc::channel();
                subscribers.push(tx);
                Some(rx)
            }
            _ => None,
        };
        (self.trainer.history().to_vec(), rx)
    }

    /// Sends `entry` to every live client and forgets the ones that left.
    pub fn broadcast(&mut self, entry: &TrainingHistoryEntry) {
        if let TrainingStatus::Running { subscribers, .. } = &mut self.training {
            subscribers.retain(|tx| tx.send(entry.clone()).is_ok());
        }
    }
}

/// Shared state type, an `Arc<Mutex<StudioState>>` passed to every handler.
pub type SharedState = Arc<Mutex<StudioState>>;

/// Locks the state, recovering the guard if a handler thread panicked.
pub fn lock(state: &SharedState) -> MutexGuard<'_, StudioState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
