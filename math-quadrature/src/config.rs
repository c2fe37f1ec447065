//! JSON configuration for rule registries

use crate::error::{QuadratureError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Limits and solver tolerances used when building rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadratureConfig {
    /// Largest order a registry will build
    #[serde(default = "default_max_order")]
    pub max_order: usize,
    /// Convergence tolerance for Newton refinement of Gauss nodes
    #[serde(default = "default_newton_tolerance")]
    pub newton_tolerance: f64,
    /// Iteration cap for Newton refinement
    #[serde(default = "default_max_newton_iterations")]
    pub max_newton_iterations: usize,
}

impl Default for QuadratureConfig {
    fn default() -> Self {
        Self {
            max_order: default_max_order(),
            newton_tolerance: default_newton_tolerance(),
            max_newton_iterations: default_max_newton_iterations(),
        }
    }
}

fn default_max_order() -> usize {
    64
}

fn default_newton_tolerance() -> f64 {
    1e-15
}

fn default_max_newton_iterations() -> usize {
    100
}

impl QuadratureConfig {
    /// Load configuration from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| QuadratureError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_json(&contents)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: QuadratureConfig = serde_json::from_str(json)
            .map_err(|e| QuadratureError::Config(format!("Failed to parse JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| QuadratureError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, json)
            .map_err(|e| QuadratureError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Check that limits and tolerances are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_order == 0 {
            return Err(QuadratureError::Config(
                "max_order must be at least 1".to_string(),
            ));
        }
        if !(self.newton_tolerance > 0.0 && self.newton_tolerance.is_finite()) {
            return Err(QuadratureError::Config(format!(
                "newton_tolerance must be positive and finite, got {}",
                self.newton_tolerance
            )));
        }
        if self.max_newton_iterations == 0 {
            return Err(QuadratureError::Config(
                "max_newton_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = QuadratureConfig::default();
        assert_eq!(config.max_order, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = QuadratureConfig::from_json(r#"{ "max_order": 12 }"#).unwrap();
        assert_eq!(config.max_order, 12);
        assert_eq!(config.max_newton_iterations, 100);
        assert_eq!(config.newton_tolerance, 1e-15);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = QuadratureConfig::from_json(r#"{ "max_order": 0 }"#).unwrap_err();
        assert!(matches!(err, QuadratureError::Config(_)));

        let err = QuadratureConfig::from_json(r#"{ "newton_tolerance": -1.0 }"#).unwrap_err();
        assert!(matches!(err, QuadratureError::Config(_)));

        let err = QuadratureConfig::from_json("not json").unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quadrature.json");

        let config = QuadratureConfig {
            max_order: 20,
            ..Default::default()
        };
        config.to_file(&path).unwrap();

        let loaded = QuadratureConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let err = QuadratureConfig::from_file("/nonexistent/quadrature.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
