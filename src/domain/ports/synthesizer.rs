//! Speech synthesis port.

use async_trait::async_trait;

use crate::domain::errors::SynthesisError;
use crate::domain::models::{AudioHandle, SynthesisRequest};

/// Text/markup-to-audio backend.
///
/// Implementations keep whatever the backend answered, even on failure, so the
/// response can be inspected after a `SynthesisError::Status`.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioHandle, SynthesisError>;
}
