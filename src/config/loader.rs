//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::EngineConfig;
use crate::config::validation::{config_warnings, validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    for warning in config_warnings(&config) {
        tracing::warn!(%warning, "Config warning");
    }
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let config = parse_config(
            r#"
            [sla]
            target_latency_ms = 250.0
            target_error_rate = 0.005
            "#,
        )
        .unwrap();
        assert_eq!(config.sla.target_latency_ms, 250.0);
        assert_eq!(config.sla.target_error_rate, 0.005);
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        let err = parse_config("[sampling]\nsample_rate = 2.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("sampling.sample_rate"));
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        let err = parse_config("[sampling\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "observability-engine-loader-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "service_name = \"payments\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.service_name, "payments");

        // Cleanup
        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
