//! Infrastructure layer module
//!
//! Adapters and ambient services around the entrainment core:
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - MaryTTS speech synthesis over HTTP
//! - Praat feature extraction and syllable counting
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod analysis;
pub mod config;
pub mod logging;
pub mod tts;
