use serde::{Serialize, Deserialize};

/// Qualitative reading of the network output as a biodiversity impact score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    Critical,
}

impl ImpactLevel {
    /// Buckets a sigmoid output by its percentage score in steps of 20.
    pub fn from_output(output: f64) -> ImpactLevel {
        let score = impact_score(output);
        if score < 20.0 {
            ImpactLevel::VeryLow
        } else if score < 40.0 {
            ImpactLevel::Low
        } else if score < 60.0 {
            ImpactLevel::Moderate
        } else if score < 80.0 {
            ImpactLevel::High
        } else {
            ImpactLevel::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImpactLevel::VeryLow  => "Very Low",
            ImpactLevel::Low      => "Low",
            ImpactLevel::Moderate => "Moderate",
            ImpactLevel::High     => "High",
            ImpactLevel::Critical => "Critical",
        }
    }
}

/// Output in [0, 1] expressed as a percentage.
pub fn impact_score(output: f64) -> f64 {
    output * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_are_half_open() {
        assert_eq!(ImpactLevel::from_output(0.0), ImpactLevel::VeryLow);
        assert_eq!(ImpactLevel::from_output(0.19), ImpactLevel::VeryLow);
        assert_eq!(ImpactLevel::from_output(0.2), ImpactLevel::Low);
        assert_eq!(ImpactLevel::from_output(0.4867), ImpactLevel::Moderate);
        assert_eq!(ImpactLevel::from_output(0.79), ImpactLevel::High);
        assert_eq!(ImpactLevel::from_output(0.95), ImpactLevel::Critical);
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(ImpactLevel::VeryLow < ImpactLevel::Critical);
        assert_eq!(ImpactLevel::Moderate.label(), "Moderate");
    }
}
