//! Domain models

pub mod audio;
pub mod config;
pub mod feature;
pub mod search;
pub mod turn;

pub use audio::{AudioHandle, SynthesisRequest};
pub use config::{
    AnalysisConfig, ComponentConfig, ComponentsConfig, Config, EntrainmentConfig, FeatureConfig,
    LoggingConfig, SearchConfig, TtsConfig, WeightedConfig,
};
pub use feature::{Feature, FeatureKind, FeatureMap, FeatureRequest, TurnObservation};
pub use search::{SearchOutcome, SearchRequest, SearchTarget};
pub use turn::{Proposal, TurnIndex};
