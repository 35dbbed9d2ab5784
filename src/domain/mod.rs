//! Domain layer for entrain
//!
//! This module contains the prosodic models, errors and collaborator ports.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{
    AnalysisError, EntrainmentError, EntrainmentResult, SearchError, SynthesisError,
    TranscriptionError,
};
