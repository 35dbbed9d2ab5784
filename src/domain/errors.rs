//! Domain errors for the entrainment core and its collaborators.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::models::TurnIndex;

/// Errors raised by turn tracking, goal components and the coordinator.
#[derive(Debug, Error, PartialEq)]
pub enum EntrainmentError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Cannot generate a response without at least one direct component")]
    MissingDirectComponent,

    #[error("Component {component} has no distance parameter to schedule")]
    MissingDistance { component: usize },

    #[error("Unknown component: {0}")]
    UnknownComponent(usize),

    #[error("Unknown component kind: {0}")]
    UnknownComponentKind(String),

    #[error("Turn out of order: expected {expected}, got {actual}")]
    TurnOutOfOrder { expected: TurnIndex, actual: TurnIndex },

    #[error("A proposal for turn {0} is still waiting for its realized output")]
    ProposalPending(TurnIndex),

    #[error("No proposal was generated for turn {0}")]
    NoPendingProposal(TurnIndex),

    #[error("Cannot register a system turn before any user turn")]
    OutputBeforeInput,

    #[error("No user turn to respond to")]
    NoInput,
}

pub type EntrainmentResult<T> = Result<T, EntrainmentError>;

/// Errors raised by a speech synthesis backend.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Synthesis request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Synthesis server returned {status}; response kept at {}", .body_path.display())]
    Status { status: u16, body_path: PathBuf },

    #[error("I/O error while storing synthesized audio: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by acoustic feature extraction.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to spawn analysis process {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis process exited with {0}")]
    ProcessFailed(String),

    #[error("Malformed analysis output line: {0}")]
    MalformedOutput(String),

    #[error("Feature {0} missing from analysis output")]
    MissingFeature(String),

    #[error("I/O error during analysis: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a speech-to-text backend.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Transcription backend unavailable: {0}")]
    Unavailable(String),

    #[error("Transcription failed: {0}")]
    Failed(String),
}

/// Errors raised by the closed-loop rate/pitch search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Measured utterance has no syllables or zero duration")]
    NoSyllables,
}
