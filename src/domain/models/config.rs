use serde::{Deserialize, Serialize};

use super::feature::Feature;

/// Main configuration structure for entrain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Speech synthesis server configuration
    #[serde(default)]
    pub tts: TtsConfig,

    /// Acoustic analysis tooling
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Closed-loop matching search
    #[serde(default)]
    pub search: SearchConfig,

    /// Per-feature entrainment strategies
    #[serde(default)]
    pub entrainment: EntrainmentConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// MaryTTS server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TtsConfig {
    #[serde(default = "default_tts_host")]
    pub host: String,

    #[serde(default = "default_tts_port")]
    pub port: u16,

    /// Locale passed to the server, e.g. `en_US`
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Voice name; the server default is used when unset
    #[serde(default = "default_voice")]
    pub voice: Option<String>,

    /// Directory synthesized audio is written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_tts_timeout_secs")]
    pub timeout_secs: u64,

    /// Mean intensity (dB) of the voice at neutral volume; intensity
    /// targets are sent as a gain relative to it
    #[serde(default = "default_reference_intensity_db")]
    pub reference_intensity_db: f64,
}

fn default_tts_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_tts_port() -> u16 {
    59125
}

fn default_locale() -> String {
    "en_US".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_voice() -> Option<String> {
    Some("cmu-rms-hsmm".to_string())
}

fn default_output_dir() -> String {
    "tmp".to_string()
}

const fn default_tts_timeout_secs() -> u64 {
    60
}

const fn default_reference_intensity_db() -> f64 {
    60.0
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            host: default_tts_host(),
            port: default_tts_port(),
            locale: default_locale(),
            voice: default_voice(),
            output_dir: default_output_dir(),
            timeout_secs: default_tts_timeout_secs(),
            reference_intensity_db: default_reference_intensity_db(),
        }
    }
}

/// Feature extraction tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisConfig {
    /// Path to the Praat executable
    #[serde(default = "default_praat_path")]
    pub praat_path: String,

    /// Praat script that writes `name,value` lines
    #[serde(default = "default_script_path")]
    pub script_path: String,
}

fn default_praat_path() -> String {
    "praat".to_string()
}

fn default_script_path() -> String {
    "misc/extract_features.praat".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            praat_path: default_praat_path(),
            script_path: default_script_path(),
        }
    }
}

/// Closed-loop matching search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    /// Upper bound on synthesize/measure rounds per search loop
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Slowest supported rate in syllables/second
    #[serde(default = "default_min_rate")]
    pub min_rate: f64,

    /// Fastest supported rate in syllables/second
    #[serde(default = "default_max_rate")]
    pub max_rate: f64,

    /// JSON rate table produced by `entrain calibrate`
    #[serde(default)]
    pub rate_table_path: Option<String>,

    #[serde(default = "default_true")]
    pub repeat_until_close: bool,
}

const fn default_max_iterations() -> u32 {
    20
}

const fn default_min_rate() -> f64 {
    3.0
}

const fn default_max_rate() -> f64 {
    8.0
}

const fn default_true() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            min_rate: default_min_rate(),
            max_rate: default_max_rate(),
            rate_table_path: None,
            repeat_until_close: default_true(),
        }
    }
}

/// Strategies for the three feature dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EntrainmentConfig {
    #[serde(default = "default_pitch_strategy")]
    pub pitch: FeatureConfig,

    #[serde(default = "default_rate_strategy")]
    pub rate: FeatureConfig,

    #[serde(default = "default_intensity_strategy")]
    pub intensity: FeatureConfig,
}

impl EntrainmentConfig {
    pub const fn for_feature(&self, feature: Feature) -> &FeatureConfig {
        match feature {
            Feature::Pitch => &self.pitch,
            Feature::Rate => &self.rate,
            Feature::Intensity => &self.intensity,
        }
    }
}

fn default_pitch_strategy() -> FeatureConfig {
    FeatureConfig::Weighted(WeightedConfig::with_default_value(120.0))
}

fn default_rate_strategy() -> FeatureConfig {
    FeatureConfig::Weighted(WeightedConfig::with_default_value(4.5))
}

fn default_intensity_strategy() -> FeatureConfig {
    FeatureConfig::Weighted(WeightedConfig::with_default_value(60.0))
}

impl Default for EntrainmentConfig {
    fn default() -> Self {
        Self {
            pitch: default_pitch_strategy(),
            rate: default_rate_strategy(),
            intensity: default_intensity_strategy(),
        }
    }
}

/// How one feature's response value is chosen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FeatureConfig {
    /// Global/local weighted entrainer over the turn history
    Weighted(WeightedConfig),
    /// Coordinated goal components
    Components(ComponentsConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WeightedConfig {
    /// Output value without any entrainment
    pub default_value: f64,

    #[serde(default = "default_global_weight")]
    pub global_weight: f64,

    #[serde(default = "default_local_weight")]
    pub local_weight: f64,

    /// Added to the global weight after every proposal
    #[serde(default)]
    pub global_delta: f64,

    /// Added to the local weight after every proposal
    #[serde(default)]
    pub local_delta: f64,

    /// Number of earliest user turns averaged for the global target
    #[serde(default = "default_first_k")]
    pub first_k: usize,
}

const fn default_global_weight() -> f64 {
    0.3
}

const fn default_local_weight() -> f64 {
    0.2
}

const fn default_first_k() -> usize {
    10
}

impl WeightedConfig {
    pub const fn with_default_value(default_value: f64) -> Self {
        Self {
            default_value,
            global_weight: default_global_weight(),
            local_weight: default_local_weight(),
            global_delta: 0.0,
            local_delta: 0.0,
            first_k: default_first_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ComponentsConfig {
    pub min_bound: f64,
    pub max_bound: f64,
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

/// Raw component description; validated when the component is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ComponentConfig {
    /// global_similarity, local_similarity, synchrony,
    /// linear_convergence or exponential_convergence
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,

    /// synchronize or desynchronize
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,

    /// Position in `components` of the direct component a scheduler adjusts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<usize>,
}
