use super::{RankError, RankResult};
use crate::config::RankSettings;

pub const DEFAULT_ALPHA: f64 = 0.25;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_TOLERANCE: f64 = 1.0e-6;
pub const DEFAULT_WEIGHT_KEY: &str = "weight";

const MIN_TOLERANCE: f64 = 1.0e-8;
const MAX_TOLERANCE: f64 = 1.0e-4;

/// Validated SymbolRank parameters.
///
/// Fields are private so a config can only exist once validated.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRankConfig {
    alpha: f64,
    max_iterations: usize,
    tolerance: f64,
    weight_key: String,
}

impl SymbolRankConfig {
    /// `alpha` must lie strictly inside (0, 1) and `tolerance` strictly
    /// inside (1e-8, 1e-4).
    pub fn new(
        alpha: f64,
        max_iterations: usize,
        tolerance: f64,
        weight_key: impl Into<String>,
    ) -> RankResult<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(RankError::InvalidConfig(format!(
                "alpha must be in (0, 1), got {alpha}"
            )));
        }
        if !(tolerance > MIN_TOLERANCE && tolerance < MAX_TOLERANCE) {
            return Err(RankError::InvalidConfig(format!(
                "tolerance must be in ({MIN_TOLERANCE:e}, {MAX_TOLERANCE:e}), got {tolerance:e}"
            )));
        }
        Ok(Self {
            alpha,
            max_iterations,
            tolerance,
            weight_key: weight_key.into(),
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn weight_key(&self) -> &str {
        &self.weight_key
    }
}

impl Default for SymbolRankConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            weight_key: DEFAULT_WEIGHT_KEY.to_string(),
        }
    }
}

impl TryFrom<&RankSettings> for SymbolRankConfig {
    type Error = RankError;

    fn try_from(settings: &RankSettings) -> RankResult<Self> {
        Self::new(
            settings.alpha,
            settings.max_iterations,
            settings.tolerance,
            settings.weight_key.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let default = SymbolRankConfig::default();
        let validated = SymbolRankConfig::new(
            DEFAULT_ALPHA,
            DEFAULT_MAX_ITERATIONS,
            DEFAULT_TOLERANCE,
            DEFAULT_WEIGHT_KEY,
        )
        .unwrap();
        assert_eq!(default, validated);
    }

    #[test]
    fn test_alpha_bounds_are_exclusive() {
        for alpha in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let result = SymbolRankConfig::new(alpha, 10, 1e-6, "weight");
            assert!(
                matches!(result, Err(RankError::InvalidConfig(_))),
                "alpha {alpha} accepted"
            );
        }
        assert!(SymbolRankConfig::new(0.85, 10, 1e-6, "weight").is_ok());
    }

    #[test]
    fn test_tolerance_bounds_are_exclusive() {
        for tolerance in [1e-3, 1e-4, 1e-8, 1e-9, 0.0] {
            let result = SymbolRankConfig::new(0.25, 10, tolerance, "weight");
            assert!(
                matches!(result, Err(RankError::InvalidConfig(_))),
                "tolerance {tolerance} accepted"
            );
        }
        assert!(SymbolRankConfig::new(0.25, 10, 5e-5, "weight").is_ok());
    }

    #[test]
    fn test_try_from_settings() {
        let settings = RankSettings {
            alpha: 0.5,
            max_iterations: 42,
            tolerance: 1e-7,
            weight_key: "w".to_string(),
        };
        let config = SymbolRankConfig::try_from(&settings).unwrap();
        assert_eq!(config.alpha(), 0.5);
        assert_eq!(config.max_iterations(), 42);
        assert_eq!(config.weight_key(), "w");

        let invalid = RankSettings {
            alpha: 1.0,
            ..settings
        };
        assert!(SymbolRankConfig::try_from(&invalid).is_err());
    }
}
