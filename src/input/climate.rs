use serde::{Serialize, Deserialize};

use crate::error::{EngineError, Result};

/// Raw environmental readings fed to the network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateInputs {
    /// Warming relative to baseline, °C.
    pub temperature_change: f64,
    /// Precipitation change relative to baseline, percent.
    pub precipitation_change: f64,
    /// Atmospheric CO₂ concentration, ppm.
    pub co2_level: f64,
}

impl ClimateInputs {
    pub fn new(temperature_change: f64, precipitation_change: f64, co2_level: f64) -> Self {
        ClimateInputs { temperature_change, precipitation_change, co2_level }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.temperature_change.is_finite() {
            return Err(EngineError::NonFiniteInput("temperature change"));
        }
        if !self.precipitation_change.is_finite() {
            return Err(EngineError::NonFiniteInput("precipitation change"));
        }
        if !self.co2_level.is_finite() {
            return Err(EngineError::NonFiniteInput("CO2 level"));
        }
        Ok(())
    }
}

impl Default for ClimateInputs {
    /// No warming, no precipitation shift, 400 ppm.
    fn default() -> Self {
        ClimateInputs::new(0.0, 0.0, 400.0)
    }
}

/// Canned climate scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    CurrentTrend,
    Mitigation,
    WorstCase,
    Optimistic,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::CurrentTrend,
        Scenario::Mitigation,
        Scenario::WorstCase,
        Scenario::Optimistic,
    ];

    pub fn inputs(&self) -> ClimateInputs {
        match self {
            Scenario::CurrentTrend => ClimateInputs::new(1.5, -5.0, 420.0),
            Scenario::Mitigation   => ClimateInputs::new(1.0, 0.0, 450.0),
            Scenario::WorstCase    => ClimateInputs::new(3.5, -20.0, 700.0),
            Scenario::Optimistic   => ClimateInputs::new(0.5, 5.0, 380.0),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Scenario::CurrentTrend => "current_trend",
            Scenario::Mitigation   => "mitigation",
            Scenario::WorstCase    => "worst_case",
            Scenario::Optimistic   => "optimistic",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::CurrentTrend => "Current climate trend with moderate warming",
            Scenario::Mitigation   => "Successful climate mitigation scenario",
            Scenario::WorstCase    => "Worst-case climate scenario",
            Scenario::Optimistic   => "Optimistic scenario with cooling and increased precipitation",
        }
    }

    /// Accepts the snake_case key or the camelCase spelling (`currentTrend`).
    pub fn from_name(name: &str) -> Option<Scenario> {
        let wanted = name.replace('_', "").to_lowercase();
        Scenario::ALL.into_iter().find(|s| s.key().replace('_', "") == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_lookup_accepts_both_spellings() {
        assert_eq!(Scenario::from_name("worst_case"), Some(Scenario::WorstCase));
        assert_eq!(Scenario::from_name("currentTrend"), Some(Scenario::CurrentTrend));
        assert_eq!(Scenario::from_name("apocalypse"), None);
    }

    #[test]
    fn current_trend_matches_reference_reading() {
        assert_eq!(Scenario::CurrentTrend.inputs(), ClimateInputs::new(1.5, -5.0, 420.0));
    }

    #[test]
    fn validate_rejects_non_finite_readings() {
        assert!(ClimateInputs::default().validate().is_ok());
        let bad = ClimateInputs::new(f64::NAN, 0.0, 400.0);
        assert!(matches!(bad.validate(), Err(EngineError::NonFiniteInput("temperature change"))));
        let bad = ClimateInputs::new(0.0, 0.0, f64::INFINITY);
        assert!(matches!(bad.validate(), Err(EngineError::NonFiniteInput(_))));
    }
}
