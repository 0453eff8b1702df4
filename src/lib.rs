pub mod error;
pub mod config;
pub mod math;
pub mod activation;
pub mod input;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use error::{ConfigError, EngineError, Result};
pub use config::EngineConfig;
pub use math::matrix::Matrix;
pub use activation::activation::{ActivationDescriptor, ActivationFunction, CATALOG};
pub use input::{ClimateInputs, NormalizationPolicy, Scenario};
pub use network::{backward, forward, ForwardResult, GradientResult, ImpactLevel, WeightInit, WeightSet, Wiring};
pub use network::impact::impact_score;
pub use loss::mse::MseLoss;
pub use optim::sgd::Sgd;
pub use train::{
    train_step, RunOutcome, RunSummary, SettingsUpdate, StepOutcome, StopHandle, TrainConfig, Trainer, TrainerState,
    TrainingHistoryEntry,
};
