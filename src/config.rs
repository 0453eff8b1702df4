//! Engine configuration loaded from TOML.
//!
//! ## Loading order (`EngineConfig::load`)
//!
//! 1. `CLIMATE_NN_CONFIG` environment variable (path to a TOML file)
//! 2. `climate_nn.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Every key is optional; missing keys take their default.
//!
//! ```toml
//! normalization = "floor_clamped"
//! init = "random"            # fixed | gentle | random
//! seed = 42
//! learning_rate = 0.1
//! target = 0.8
//!
//! [inputs]
//! temperatureChange = 1.5
//! precipitationChange = -5.0
//! co2Level = 420.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::activation::activation::ActivationFunction;
use crate::error::ConfigError;
use crate::input::climate::ClimateInputs;
use crate::input::normalizer::NormalizationPolicy;
use crate::network::forward::Wiring;
use crate::network::weights::{WeightInit, DEFAULT_INIT_HALF_RANGE};
use crate::train::train_config::TrainConfig;

pub const CONFIG_ENV_VAR: &str = "CLIMATE_NN_CONFIG";
pub const LOCAL_CONFIG_FILE: &str = "climate_nn.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub normalization: NormalizationPolicy,
    pub init: WeightInit,
    pub init_half_range: f64,
    /// Seed for random initialization; OS entropy when absent.
    pub seed: Option<u64>,
    pub learning_rate: f64,
    pub target: f64,
    pub max_iterations: usize,
    pub convergence_threshold: f64,
    pub hidden_activation: ActivationFunction,
    pub output_activation: ActivationFunction,
    pub inputs: ClimateInputs,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            normalization: NormalizationPolicy::LinearCentered,
            init: WeightInit::Fixed,
            init_half_range: DEFAULT_INIT_HALF_RANGE,
            seed: None,
            learning_rate: 0.1,
            target: 0.8,
            max_iterations: 100,
            convergence_threshold: 1e-4,
            hidden_activation: ActivationFunction::ReLU,
            output_activation: ActivationFunction::Sigmoid,
            inputs: ClimateInputs::default(),
        }
    }
}

impl EngineConfig {
    /// Searches the standard locations, falling back to defaults when no
    /// file is found or the file found is unusable.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            match Self::load_from_file(&p) {
                Ok(config) => {
                    info!(path = %p.display(), "loaded config from {}", CONFIG_ENV_VAR);
                    return config;
                }
                Err(e) => warn!(path = %p.display(), error = %e, "failed to load config, falling back"),
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("loaded config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => warn!(error = %e, "failed to load ./{}, using defaults", LOCAL_CONFIG_FILE),
            }
        }

        info!("no config file found, using built-in defaults");
        Self::default()
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(invalid("learning_rate", format!("must be positive, got {}", self.learning_rate)));
        }
        if !(0.0..=1.0).contains(&self.target) {
            return Err(invalid("target", format!("must lie in [0, 1], got {}", self.target)));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1".into()));
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold <= 0.0 {
            return Err(invalid(
                "convergence_threshold",
                format!("must be positive, got {}", self.convergence_threshold),
            ));
        }
        if !self.init_half_range.is_finite() || self.init_half_range <= 0.0 {
            return Err(invalid("init_half_range", format!("must be positive, got {}", self.init_half_range)));
        }
        if self.inputs.validate().is_err() {
            return Err(invalid("inputs", "all readings must be finite".into()));
        }
        Ok(())
    }

    pub fn wiring(&self) -> Wiring {
        Wiring { hidden: self.hidden_activation, output: self.output_activation }
    }

    pub fn train_config(&self) -> TrainConfig {
        TrainConfig::new(self.max_iterations, self.convergence_threshold)
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn parses_policies_and_inputs() {
        let cfg = EngineConfig::from_toml_str(
            r#"
            normalization = "floor_clamped"
            init = "random"
            seed = 7
            hidden_activation = "leaky_relu"

            [inputs]
            temperatureChange = 3.5
            precipitationChange = -20.0
            co2Level = 700.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.normalization, NormalizationPolicy::FloorClamped);
        assert_eq!(cfg.init, WeightInit::Random);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.wiring().hidden, ActivationFunction::LeakyReLU);
        assert_eq!(cfg.inputs, ClimateInputs::new(3.5, -20.0, 700.0));
    }

    #[test]
    fn parses_gentle_init() {
        let cfg = EngineConfig::from_toml_str(r#"init = "gentle""#).unwrap();
        assert_eq!(cfg.init, WeightInit::Gentle);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            EngineConfig::from_toml_str("learning_rate = -0.1"),
            Err(ConfigError::Invalid { field: "learning_rate", .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("target = 1.2"),
            Err(ConfigError::Invalid { field: "target", .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("max_iterations = 0"),
            Err(ConfigError::Invalid { field: "max_iterations", .. })
        ));
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(matches!(
            EngineConfig::from_toml_str(r#"normalization = "zscore""#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EngineConfig::load_from_file(Path::new("/nonexistent/climate_nn.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/climate_nn.toml"));
    }
}
