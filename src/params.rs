//! Tuning parameters for terrain scanning and portal optimization
//!
//! Defaults reproduce the wiki's portal calculator. Presets trade speed
//! against placement quality.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// Hard ceiling on relocation rounds for any configuration
pub const MAX_ROUNDS: usize = 20;

/// Configuration for one planner session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerParams {
    // Map source
    /// Maps wider than this are downscaled before classification (pixels)
    pub max_width: u32,

    // Terrain classification
    /// RGB distance from the water color above which a pixel counts as land
    pub water_distance: f64,
    /// Target number of sampled positions; drives the sampling stride
    pub sample_budget: usize,
    /// Smallest sampling stride allowed
    pub min_stride: usize,

    // Clustering
    /// Maximum relocation rounds (1 to `MAX_ROUNDS`)
    pub max_iterations: usize,
    /// Stop once no centroid moves this far in a round (pixels)
    pub convergence_shift: f64,
}

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            max_width: 1000,
            water_distance: 15.0,
            sample_budget: 5000,
            min_stride: 2,
            max_iterations: MAX_ROUNDS,
            convergence_shift: 2.0,
        }
    }
}

impl PlannerParams {
    /// Coarser sampling and fewer rounds for quick previews
    pub fn fast() -> Self {
        Self {
            sample_budget: 2000,
            max_iterations: 10,
            ..Default::default()
        }
    }

    /// Denser sampling and a tighter convergence test
    pub fn precise() -> Self {
        Self {
            sample_budget: 20000,
            convergence_shift: 0.5,
            ..Default::default()
        }
    }

    /// Load parameters from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PlannerError::Config(format!("{}: {}", path.display(), e)))?;
        let params: PlannerParams = serde_json::from_str(&text)
            .map_err(|e| PlannerError::Config(format!("{}: {}", path.display(), e)))?;
        params.validate()?;
        Ok(params)
    }

    /// Reject values that would make scanning or clustering meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.max_width == 0 {
            return Err(PlannerError::Config("max_width must be positive".into()));
        }
        if self.sample_budget == 0 {
            return Err(PlannerError::Config("sample_budget must be positive".into()));
        }
        if self.min_stride == 0 {
            return Err(PlannerError::Config("min_stride must be at least 1".into()));
        }
        if !(1..=MAX_ROUNDS).contains(&self.max_iterations) {
            return Err(PlannerError::Config(format!(
                "max_iterations must be between 1 and {}, got {}",
                MAX_ROUNDS, self.max_iterations
            )));
        }
        if !self.water_distance.is_finite() || self.water_distance < 0.0 {
            return Err(PlannerError::Config("water_distance must be a non-negative number".into()));
        }
        if !self.convergence_shift.is_finite() || self.convergence_shift < 0.0 {
            return Err(PlannerError::Config("convergence_shift must be a non-negative number".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_calculator() {
        let params = PlannerParams::default();
        assert_eq!(params.max_width, 1000);
        assert_eq!(params.water_distance, 15.0);
        assert_eq!(params.sample_budget, 5000);
        assert_eq!(params.min_stride, 2);
        assert_eq!(params.max_iterations, 20);
        assert_eq!(params.convergence_shift, 2.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(PlannerParams::fast().validate().is_ok());
        assert!(PlannerParams::precise().validate().is_ok());
        assert!(PlannerParams::fast().sample_budget < PlannerParams::precise().sample_budget);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let path = std::env::temp_dir().join("portal_network_params_partial.json");
        std::fs::write(&path, r#"{ "max_iterations": 7 }"#).unwrap();

        let params = PlannerParams::from_json_file(&path).unwrap();
        assert_eq!(params.max_iterations, 7);
        assert_eq!(params.sample_budget, 5000);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let params = PlannerParams { min_stride: 0, ..Default::default() };
        assert!(matches!(params.validate(), Err(PlannerError::Config(_))));

        let params = PlannerParams { water_distance: f64::NAN, ..Default::default() };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_round_limit_capped() {
        let params = PlannerParams { max_iterations: 21, ..Default::default() };
        assert!(matches!(params.validate(), Err(PlannerError::Config(_))));

        let params = PlannerParams { max_iterations: 0, ..Default::default() };
        assert!(params.validate().is_err());

        let params = PlannerParams { max_iterations: MAX_ROUNDS, ..Default::default() };
        assert!(params.validate().is_ok());
        assert!(PlannerParams::precise().max_iterations <= MAX_ROUNDS);
    }

    #[test]
    fn test_json_round_limit_rejected() {
        let path = std::env::temp_dir().join("portal_network_params_rounds.json");
        std::fs::write(&path, r#"{ "max_iterations": 500 }"#).unwrap();

        let result = PlannerParams::from_json_file(&path);
        assert!(matches!(result, Err(PlannerError::Config(_))));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = PlannerParams::from_json_file("/definitely/not/here.json");
        assert!(matches!(result, Err(PlannerError::Config(_))));
    }
}
