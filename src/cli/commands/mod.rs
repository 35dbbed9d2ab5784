//! CLI command implementations.

pub mod calibrate;
pub mod imitate;
pub mod replay;
pub mod simulate;
pub mod synthesize;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::models::Config;
use crate::domain::ports::{FeatureExtractor, SpeechSynthesizer, SyllableCounter};
use crate::infrastructure::analysis::{HeuristicSyllableCounter, PraatAnalyzer};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::tts::{MaryTtsClient, MaryTtsConfig};
use crate::services::{ConvergenceSearch, RateTable};

/// Rate table location used when none is configured.
pub const DEFAULT_RATE_TABLE: &str = "rate_table.json";

/// Load configuration from `--config` or the default file hierarchy.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Production adapters wired from configuration.
pub struct Adapters {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub extractor: Arc<dyn FeatureExtractor>,
    pub syllable_counter: Arc<dyn SyllableCounter>,
}

impl Adapters {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = MaryTtsClient::new(MaryTtsConfig::from(&config.tts))
            .context("Failed to create MaryTTS client")?;
        Ok(Self {
            synthesizer: Arc::new(client),
            extractor: Arc::new(PraatAnalyzer::from_config(&config.analysis)),
            syllable_counter: Arc::new(HeuristicSyllableCounter),
        })
    }

    pub fn search(&self, config: &Config) -> Result<ConvergenceSearch> {
        Ok(ConvergenceSearch::new(
            Arc::clone(&self.synthesizer),
            Arc::clone(&self.extractor),
            Arc::clone(&self.syllable_counter),
            load_rate_table(config)?,
            config.search.max_iterations,
        ))
    }
}

/// Configured rate table path, or the default one.
pub fn rate_table_path(config: &Config) -> PathBuf {
    config
        .search
        .rate_table_path
        .as_deref()
        .map_or_else(|| PathBuf::from(DEFAULT_RATE_TABLE), PathBuf::from)
}

/// Load the calibrated rate table, or start from an empty one.
pub fn load_rate_table(config: &Config) -> Result<RateTable> {
    let path = rate_table_path(config);
    if path.exists() {
        debug!(path = %path.display(), "loading rate table");
        return RateTable::load(&path);
    }
    if config.search.rate_table_path.is_some() {
        warn!(path = %path.display(), "rate table not found; searching from a zero modifier");
    }
    Ok(RateTable::empty(config.search.min_rate, config.search.max_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rate_table_path_defaults() {
        let config = Config::default();
        assert_eq!(rate_table_path(&config), PathBuf::from(DEFAULT_RATE_TABLE));
    }

    #[test]
    fn test_load_rate_table_from_configured_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rates.json");
        let mut table = RateTable::empty(3.0, 8.0);
        table.insert(5.0, 10);
        table.save(&path).unwrap();

        let mut config = Config::default();
        config.search.rate_table_path = Some(path.display().to_string());
        let loaded = load_rate_table(&config).unwrap();
        assert_eq!(loaded.lookup(5.0), Some(10));
    }

    #[test]
    fn test_missing_rate_table_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.search.rate_table_path = Some(dir.path().join("absent.json").display().to_string());
        let loaded = load_rate_table(&config).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.range(), (config.search.min_rate, config.search.max_rate));
    }
}
