use async_trait::async_trait;

use crate::domain::errors::AnalysisError;

/// Counts the syllables of an utterance's text.
#[async_trait]
pub trait SyllableCounter: Send + Sync {
    async fn count_syllables(&self, text: &str) -> Result<u32, AnalysisError>;
}
