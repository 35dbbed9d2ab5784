use async_trait::async_trait;

use crate::domain::errors::TranscriptionError;
use crate::domain::models::AudioHandle;

/// Speech-to-text backend.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &AudioHandle) -> Result<String, TranscriptionError>;
}
