//! Entrain - prosodic entrainment for synthesized dialogue
//!
//! Entrain decides how a spoken dialogue system should sound on its next
//! turn. It tracks the pitch, speech rate and intensity of both speakers,
//! proposes target values that converge toward (or synchronize with) the
//! user, and drives a speech synthesizer in a closed loop until the
//! realized audio matches those targets.
//!
//! # Architecture
//!
//! The crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits for
//!   synthesis, analysis and transcription
//! - **Service Layer** (`services`): turn tracking, entrainment strategies,
//!   the convergence search and the dialogue/transcript drivers
//! - **Infrastructure Layer** (`infrastructure`): MaryTTS, Praat,
//!   configuration and logging adapters
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```
//! use entrain::domain::models::WeightedConfig;
//! use entrain::services::{EntrainmentParams, Entrainer};
//!
//! let params = EntrainmentParams::from(&WeightedConfig::with_default_value(120.0));
//! let mut entrainer = Entrainer::new(params).unwrap();
//! entrainer.register_input(130.0, 1.0).unwrap();
//! let target = entrainer.propose_output();
//! assert!((target - 125.0).abs() < 1e-9);
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{EntrainmentError, SearchError};
pub use domain::models::{Config, Feature, SearchOutcome, SearchRequest, SearchTarget};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    ComponentCoordinator, ConvergenceSearch, DialogueSession, Entrainer, FeatureChannel,
    TurnTracker,
};
