pub mod history;
pub mod loop_fn;
pub mod step;
pub mod train_config;
pub mod trainer;

pub use history::TrainingHistoryEntry;
pub use loop_fn::train_loop;
pub use step::{train_step, StepOutcome};
pub use train_config::TrainConfig;
pub use trainer::{RunIter, RunOutcome, RunSummary, SettingsUpdate, StopHandle, Trainer, TrainerState};
