//! CLI configuration file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tailrisk::risk::{SimulationLimits, SweepConfig};
use thiserror::Error;
use tracing::warn;

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The file could not be read.
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`AppConfig`].
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration, read from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    /// Sweep grid and simulation settings
    pub(crate) sweep: SweepConfig,
    /// Per-request resource limits
    pub(crate) limits: SimulationLimits,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub(crate) fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `path` if given and present, otherwise use defaults.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            Some(p) => {
                warn!(path = %p.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tailrisk::risk::{FitObjective, SimulationMethod};

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [sweep]
            window = 120
            df_max = 60
            methods = ["normal", "t_mc"]
            fit_objective = "variance_matched"
            "#,
        )
        .unwrap();

        assert_eq!(config.sweep.window, 120);
        assert_eq!(config.sweep.df_max, Some(60));
        assert_eq!(
            config.sweep.methods,
            vec![SimulationMethod::Normal, SimulationMethod::StudentT]
        );
        assert_eq!(config.sweep.fit_objective, FitObjective::VarianceMatched);
        assert_eq!(config.sweep.horizons, vec![1, 5, 10]);
        assert_eq!(config.limits, SimulationLimits::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load(Some(Path::new("/nonexistent/tailrisk.toml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_sample_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/tailrisk.toml");
        let config = AppConfig::from_file(&path).unwrap();
        assert!(config.sweep.validate().is_ok());
    }
}
