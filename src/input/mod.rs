pub mod climate;
pub mod normalizer;

pub use climate::{ClimateInputs, Scenario};
pub use normalizer::NormalizationPolicy;
