use std::path::Path;

use framecore_render::Viewport;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Frame loop settings. Every field has a default, so a config file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Upper bound on a frame's delta, in seconds.
    pub max_delta: f32,
    /// Frame-rate samples kept for min/max/average.
    pub stats_capacity: usize,
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
    pub viewport: Viewport,
    /// Post effect active on the first frame.
    pub initial_effect: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_delta: 1.0,
            stats_capacity: 128,
            clear_color: [0.08, 0.17, 0.31, 1.0],
            clear_depth: 1.0,
            viewport: Viewport::default(),
            initial_effect: 0,
        }
    }
}

impl DriverConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), "loaded driver config");
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_delta.is_finite() || self.max_delta <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "max_delta",
                reason: format!("{} is not positive", self.max_delta),
            });
        }
        if self.stats_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "stats_capacity",
                reason: "must hold at least one sample".into(),
            });
        }
        self.viewport.validate().map_err(|err| ConfigError::Invalid {
            field: "viewport",
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DriverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_delta, 1.0);
        assert_eq!(config.stats_capacity, 128);
        assert_eq!(config.viewport, Viewport::new(1280, 720));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"initial_effect": 1, "viewport": {"width": 640, "height": 480}}"#;
        let config = DriverConfig::from_json(json).unwrap();
        assert_eq!(config.initial_effect, 1);
        assert_eq!(config.viewport.aspect(), 640.0 / 480.0);
        assert_eq!(config.clear_depth, 1.0);
    }

    fn invalid_field(json: &str) -> Option<&'static str> {
        match DriverConfig::from_json(json) {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn rejects_bad_values() {
        let zero_delta = r#"{"max_delta": 0.0}"#;
        assert_eq!(invalid_field(zero_delta), Some("max_delta"));
        let zero_capacity = r#"{"stats_capacity": 0}"#;
        assert_eq!(invalid_field(zero_capacity), Some("stats_capacity"));
        let flat = r#"{"viewport": {"width": 0, "height": 720}}"#;
        assert_eq!(invalid_field(flat), Some("viewport"));
        assert!(matches!(
            DriverConfig::from_json("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driver.json");
        let mut config = DriverConfig::default();
        config.max_delta = 0.5;
        std::fs::write(&path, config.to_json().unwrap()).unwrap();
        assert_eq!(DriverConfig::load(&path).unwrap(), config);
        assert!(matches!(
            DriverConfig::load(&dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
