//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces for the external collaborators
//! the entrainment core drives:
//! - SpeechSynthesizer: text/markup to audio
//! - FeatureExtractor: acoustic measurements of an audio file
//! - SyllableCounter: syllable counts of utterance text
//! - Transcriber: speech to text
//!
//! These traits keep the entrainment logic independent of specific servers
//! and analysis tools.

pub mod feature_extractor;
pub mod syllable_counter;
pub mod synthesizer;
pub mod transcriber;

pub use feature_extractor::FeatureExtractor;
pub use syllable_counter::SyllableCounter;
pub use synthesizer::SpeechSynthesizer;
pub use transcriber::Transcriber;
