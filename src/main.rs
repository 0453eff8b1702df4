//! climate-nn command line.
//!
//! All network logic lives in the library; this binary wires configuration,
//! logging and JSON output around it.
//!
//! ```bash
//! climate-nn forward --scenario current_trend
//! climate-nn train --target 0.55 --policy floor-clamped --learning-rate 0.5
//! climate-nn activation sigmoid 0.0
//! ```
//!
//! `RUST_LOG=debug` shows one line per training iteration.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;

use climate_nn::{
    ActivationFunction, ClimateInputs, EngineConfig, ImpactLevel, NormalizationPolicy, Scenario,
    Trainer, WeightInit, CATALOG,
};
use climate_nn::network::impact::impact_score;

#[derive(Parser, Debug)]
#[command(name = "climate-nn")]
#[command(about = "3-4-1 neural network predicting climate impact on biodiversity")]
#[command(version)]
struct CliArgs {
    /// TOML config file (defaults to $CLIMATE_NN_CONFIG, then ./climate_nn.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct Overrides {
    /// Load inputs from a preset (current_trend, mitigation, worst_case, optimistic)
    #[arg(long, global = true)]
    scenario: Option<String>,

    /// Temperature change in °C
    #[arg(long, global = true, allow_hyphen_values = true)]
    temperature: Option<f64>,

    /// Precipitation change in %
    #[arg(long, global = true, allow_hyphen_values = true)]
    precipitation: Option<f64>,

    /// CO2 concentration in ppm
    #[arg(long, global = true)]
    co2: Option<f64>,

    #[arg(long, global = true, value_enum)]
    policy: Option<PolicyArg>,

    /// Target output in [0, 1]
    #[arg(long, global = true)]
    target: Option<f64>,

    #[arg(long, global = true)]
    learning_rate: Option<f64>,

    /// Start from random weights instead of the fixed seed set
    #[arg(long, global = true)]
    random_init: bool,

    #[arg(long, global = true, env = "CLIMATE_NN_SEED")]
    seed: Option<u64>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PolicyArg {
    LinearCentered,
    FloorClamped,
}

impl From<PolicyArg> for NormalizationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::LinearCentered => NormalizationPolicy::LinearCentered,
            PolicyArg::FloorClamped => NormalizationPolicy::FloorClamped,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Forward pass over the current weights
    Forward,
    /// One training iteration, printing activations, gradients and new weights
    Step,
    /// Train until convergence or the iteration cap
    Train {
        #[arg(long)]
        max_iterations: Option<usize>,
        #[arg(long)]
        threshold: Option<f64>,
        /// Print every history entry instead of only the summary
        #[arg(long)]
        history: bool,
    },
    /// Evaluate an activation function, or list the catalog
    Activation {
        name: Option<String>,
        #[arg(allow_hyphen_values = true)]
        x: Option<f64>,
    },
    /// List preset scenarios
    Scenarios,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = build_config(&args)?;

    let output = match args.command {
        Command::Forward => {
            let trainer = Trainer::from_config(&config)?;
            let result = trainer.preview()?;
            let level = ImpactLevel::from_output(result.output);
            let score = impact_score(result.output);
            json!({
                "inputs": trainer.inputs(),
                "policy": trainer.policy(),
                "forward": result,
                "impactScore": score,
                "impactLevel": level.label(),
            })
        }
        Command::Step => {
            let mut trainer = Trainer::from_config(&config)?;
            let before = trainer.weights();
            let outcome = trainer.step()?;
            let change = outcome.weights().delta(&before)?;
            json!({ "step": outcome, "weightChange": change })
        }
        Command::Train { max_iterations, threshold, history } => {
            let mut train_config = config.train_config();
            if let Some(n) = max_iterations {
                train_config.max_iterations = n;
            }
            if let Some(t) = threshold {
                train_config.convergence_threshold = t;
            }
            let mut trainer = Trainer::from_config(&config)?;
            let summary = trainer.run(&train_config)?;
            info!(outcome = ?summary.outcome, iterations = summary.iterations, "done");
            let mut out = json!({
                "summary": summary,
                "finalWeights": trainer.weights(),
            });
            if history {
                out["history"] = serde_json::to_value(trainer.history())?;
            }
            out
        }
        Command::Activation { name: Some(name), x } => {
            let function = ActivationFunction::from_name(&name)?;
            let x = x.ok_or_else(|| anyhow!("missing x value for `{}`", name))?;
            let (value, derivative) = function.evaluate(x);
            json!({ "function": function.descriptor(), "x": x, "value": value, "derivative": derivative })
        }
        Command::Activation { name: None, .. } => serde_json::to_value(CATALOG)?,
        Command::Scenarios => {
            let list: Vec<_> = Scenario::ALL
                .iter()
                .map(|s| json!({ "key": s.key(), "description": s.description(), "inputs": s.inputs() }))
                .collect();
            json!(list)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// File/env config first, then command-line overrides on top.
fn build_config(args: &CliArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::load(),
    };

    let o = &args.overrides;
    if let Some(name) = &o.scenario {
        let scenario = Scenario::from_name(name).ok_or_else(|| anyhow!("unknown scenario `{}`", name))?;
        config.inputs = scenario.inputs();
    }
    let ClimateInputs { temperature_change, precipitation_change, co2_level } = config.inputs;
    config.inputs = ClimateInputs::new(
        o.temperature.unwrap_or(temperature_change),
        o.precipitation.unwrap_or(precipitation_change),
        o.co2.unwrap_or(co2_level),
    );
    if let Some(policy) = o.policy {
        config.normalization = policy.into();
    }
    if let Some(target) = o.target {
        config.target = target;
    }
    if let Some(lr) = o.learning_rate {
        config.learning_rate = lr;
    }
    if o.random_init {
        config.init = WeightInit::Random;
    }
    if o.seed.is_some() {
        config.seed = o.seed;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}
