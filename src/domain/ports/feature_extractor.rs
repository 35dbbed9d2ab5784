//! Acoustic feature extraction port.

use async_trait::async_trait;

use crate::domain::errors::AnalysisError;
use crate::domain::models::{AudioHandle, FeatureMap, FeatureRequest};

/// Measures named scalar features (`pitch_mean`, `main_duration`, ...) of an audio file.
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    async fn measure(
        &self,
        audio: &AudioHandle,
        features: &FeatureRequest,
    ) -> Result<FeatureMap, AnalysisError>;
}
