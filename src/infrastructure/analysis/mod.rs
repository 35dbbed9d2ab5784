//! Acoustic analysis adapters

pub mod praat;
pub mod syllables;

pub use praat::{parse_feature_output, PraatAnalyzer};
pub use syllables::HeuristicSyllableCounter;
