//! Imitation of annotated system turns.
//!
//! Instead of entraining, every system turn is synthesized to reproduce the
//! rate, pitch and intensity written next to it in the transcript. User
//! turns and silences only advance the clock.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::domain::models::{SearchRequest, SearchTarget};
use crate::domain::ports::FeatureExtractor;

use super::convergence_search::{measure, ConvergenceSearch};
use super::dialogue::{FeatureValues, TurnReport};
use super::transcript::{FeatureLog, TranscriptEvent};

const SOURCE_PITCH_RANGE: (f64, f64) = (75.0, 500.0);
const TARGET_PITCH_RANGE: (f64, f64) = (50.0, 300.0);

/// Map a pitch linearly from the 75-500 Hz range onto the 50-300 Hz range.
pub fn scale_pitch(hz: f64) -> f64 {
    let (src_lo, src_hi) = SOURCE_PITCH_RANGE;
    let (dst_lo, dst_hi) = TARGET_PITCH_RANGE;
    ((hz - src_lo) / (src_hi - src_lo)).mul_add(dst_hi - dst_lo, dst_lo)
}

pub struct Imitator {
    search: ConvergenceSearch,
    extractor: Arc<dyn FeatureExtractor>,
    voice: Option<String>,
    repeat_until_close: bool,
    scale_pitch: bool,
}

impl Imitator {
    pub fn new(search: ConvergenceSearch, extractor: Arc<dyn FeatureExtractor>) -> Self {
        Self {
            search,
            extractor,
            voice: None,
            repeat_until_close: true,
            scale_pitch: false,
        }
    }

    #[must_use]
    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice;
        self
    }

    #[must_use]
    pub const fn with_repeat_until_close(mut self, repeat: bool) -> Self {
        self.repeat_until_close = repeat;
        self
    }

    /// Rescale annotated pitch targets before synthesis.
    #[must_use]
    pub const fn with_pitch_scaling(mut self, scale: bool) -> Self {
        self.scale_pitch = scale;
        self
    }

    /// Synthesize `text` to match `targets`.
    #[instrument(skip(self))]
    pub async fn imitate_turn(
        &self,
        text: &str,
        syllables: u32,
        targets: FeatureValues,
    ) -> Result<TurnReport> {
        let targets = FeatureValues {
            pitch: if self.scale_pitch {
                scale_pitch(targets.pitch)
            } else {
                targets.pitch
            },
            ..targets
        };
        let request = SearchRequest {
            text: text.to_string(),
            rate: SearchTarget::Value(targets.rate),
            pitch: SearchTarget::Value(targets.pitch),
            intensity: Some(targets.intensity),
            syllables: Some(syllables),
            voice: self.voice.clone(),
            repeat_until_close: self.repeat_until_close,
        };
        let outcome = self.search.run(&request).await.context("Synthesis search failed")?;
        let realized = measure(self.extractor.as_ref(), &outcome.audio, syllables)
            .await
            .context("Failed to measure imitated turn")?;

        let actuals = FeatureValues {
            pitch: realized.pitch,
            rate: realized.rate,
            intensity: realized.intensity,
        };
        info!(?targets, ?actuals, syntheses = outcome.syntheses, "system turn imitated");

        Ok(TurnReport {
            audio: outcome.audio,
            targets,
            actuals,
            duration_secs: realized.duration_secs,
            rate_modifier: outcome.rate_modifier,
            pitch_hz: outcome.pitch_hz,
            syntheses: outcome.syntheses,
        })
    }

    /// Imitate every annotated system turn of a transcript.
    pub async fn run(&self, events: &[TranscriptEvent]) -> Result<FeatureLog> {
        let mut log = FeatureLog::default();
        let mut elapsed = 0.0;
        for event in events {
            match event {
                TranscriptEvent::Silence { secs } => elapsed += secs,
                TranscriptEvent::User { end, .. } => elapsed = *end,
                TranscriptEvent::Imitation {
                    syllables,
                    targets,
                    text,
                } => {
                    let report = self.imitate_turn(text, *syllables, *targets).await?;
                    elapsed += report.duration_secs;
                    log.push(&report);
                }
                TranscriptEvent::System { text, .. } => {
                    warn!(text = %text, "system turn has no annotated targets; skipping");
                }
            }
            debug!(elapsed, "transcript event imitated");
        }
        Ok(log)
    }
}
