use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::errors::EntrainmentError;
use crate::domain::models::config::Config;
use crate::domain::models::Feature;
use crate::services::feature_channel::FeatureChannel;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("TTS host cannot be empty")]
    EmptyTtsHost,

    #[error("Invalid TTS port: {0}")]
    InvalidTtsPort(u16),

    #[error("Invalid reference_intensity_db: {0}. Must be a finite number")]
    InvalidReferenceIntensity(f64),

    #[error("Invalid max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    #[error("Invalid rate range: min_rate ({0}) must be positive and below max_rate ({1})")]
    InvalidRateRange(f64, f64),

    #[error("Invalid {feature} entrainment configuration: {source}")]
    InvalidEntrainment {
        feature: Feature,
        #[source]
        source: EntrainmentError,
    },
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. entrain.yaml in the working directory
    /// 3. entrain.local.yaml (local overrides, optional)
    /// 4. Environment variables (ENTRAIN_* prefix, `__` between sections)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("entrain.yaml"))
            .merge(Yaml::file("entrain.local.yaml"))
            .merge(Env::prefixed("ENTRAIN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file; environment variables still win.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("ENTRAIN_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.tts.host.trim().is_empty() {
            return Err(ConfigError::EmptyTtsHost);
        }
        if config.tts.port == 0 {
            return Err(ConfigError::InvalidTtsPort(config.tts.port));
        }
        if !config.tts.reference_intensity_db.is_finite() {
            return Err(ConfigError::InvalidReferenceIntensity(config.tts.reference_intensity_db));
        }

        if config.search.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(config.search.max_iterations));
        }
        let (min_rate, max_rate) = (config.search.min_rate, config.search.max_rate);
        if !(min_rate > 0.0 && min_rate < max_rate && max_rate.is_finite()) {
            return Err(ConfigError::InvalidRateRange(min_rate, max_rate));
        }

        // Build each channel once so bad strategies fail at startup.
        for feature in Feature::ALL {
            FeatureChannel::from_config(feature, config.entrainment.for_feature(feature))
                .map_err(|source| ConfigError::InvalidEntrainment { feature, source })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{ComponentConfig, ComponentsConfig, FeatureConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tts.port, 59125);
        assert_eq!(config.search.max_iterations, 20);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
logging:
  level: debug
tts:
  host: mary.local
  voice: dfki-prudence
search:
  max_iterations: 5
entrainment:
  pitch:
    strategy: components
    min_bound: 80.0
    max_bound: 300.0
    components:
      - kind: local_similarity
        weight: 2
        distance: 10.0
      - kind: linear_convergence
        target: 0
        factor: 0.9
  rate:
    strategy: weighted
    default_value: 5.0
    first_k: 3
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.tts.host, "mary.local");
        assert_eq!(config.tts.voice.as_deref(), Some("dfki-prudence"));
        assert_eq!(config.search.max_iterations, 5);
        match &config.entrainment.pitch {
            FeatureConfig::Components(components) => {
                assert_eq!(components.components.len(), 2);
                assert_eq!(components.components[1].target, Some(0));
            }
            FeatureConfig::Weighted(_) => panic!("Expected components strategy"),
        }
        match &config.entrainment.rate {
            FeatureConfig::Weighted(weighted) => {
                assert_eq!(weighted.first_k, 3);
                assert!((weighted.global_weight - 0.3).abs() < f64::EPSILON);
            }
            FeatureConfig::Components(_) => panic!("Expected weighted strategy"),
        }

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_tts_endpoint() {
        let mut config = Config::default();
        config.tts.host = "  ".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyTtsHost
        ));

        let mut config = Config::default();
        config.tts.port = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidTtsPort(0)
        ));

        let mut config = Config::default();
        config.tts.reference_intensity_db = f64::NAN;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidReferenceIntensity(_)
        ));
    }

    #[test]
    fn test_validate_search_bounds() {
        let mut config = Config::default();
        config.search.max_iterations = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxIterations(0)
        ));

        let mut config = Config::default();
        config.search.min_rate = 9.0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidRateRange(_, _)
        ));
    }

    #[test]
    fn test_validate_entrainment_strategies() {
        let mut config = Config::default();
        config.entrainment.intensity = FeatureConfig::Components(ComponentsConfig {
            min_bound: 40.0,
            max_bound: 90.0,
            components: vec![ComponentConfig {
                kind: "mimicry".to_string(),
                ..Default::default()
            }],
        });

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidEntrainment { feature, source } => {
                assert_eq!(feature, Feature::Intensity);
                assert_eq!(source, EntrainmentError::UnknownComponentKind("mimicry".to_string()));
            }
            other => panic!("Expected InvalidEntrainment error, got {other:?}"),
        }
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(base_file, "logging:\n  level: info\n  format: json\ntts:\n  port: 5000").unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "logging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.logging.level, "debug", "Override should win for nested fields");
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
        assert_eq!(config.tts.port, 5000);
        assert_eq!(config.tts.host, "127.0.0.1", "Defaults fill the rest");
    }
}
