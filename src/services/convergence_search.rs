//! Closed-loop rate/pitch matching.
//!
//! Synthesizes, measures and nudges markup parameters until the measured
//! speech rate and pitch stop getting closer to their targets. The search is
//! a greedy hill-climb: the rate loop moves the rate modifier one percent
//! per round toward the target and stops at the first round that does not
//! beat the best rate error seen so far. A pitch loop of the same shape then
//! runs with the best rate modifier held fixed, unless some sample already
//! hit the pitch target exactly. Each loop is capped at `max_iterations`
//! rounds. Intensity is passed through to every synthesis unchanged.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::domain::errors::SearchError;
use crate::domain::models::{
    AudioHandle, FeatureRequest, SearchOutcome, SearchRequest, SynthesisRequest,
};
use crate::domain::ports::{FeatureExtractor, SpeechSynthesizer, SyllableCounter};

use super::rate_table::RateTable;

/// Acoustic values measured on one synthesized utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Syllables per second over the main (non-silent) duration.
    pub rate: f64,
    pub pitch: f64,
    pub intensity: f64,
    pub duration_secs: f64,
}

/// Measure rate, pitch and intensity of `audio` containing `syllables` syllables.
pub async fn measure(
    extractor: &dyn FeatureExtractor,
    audio: &AudioHandle,
    syllables: u32,
) -> Result<Measurement, SearchError> {
    let features = extractor.measure(audio, &FeatureRequest::prosody()).await?;
    let duration_secs = features.duration()?;
    if syllables == 0 || duration_secs <= 0.0 {
        return Err(SearchError::NoSyllables);
    }
    Ok(Measurement {
        rate: f64::from(syllables) / duration_secs,
        pitch: features.pitch_mean()?,
        intensity: features.intensity_mean()?,
        duration_secs,
    })
}

#[derive(Debug, Clone, Copy)]
struct Best<P> {
    param: P,
    error: f64,
    measured: f64,
}

impl<P: Copy> Best<P> {
    fn new(param: P, target: f64, measured: f64) -> Self {
        Self {
            param,
            error: (measured - target).abs(),
            measured,
        }
    }

    /// Record a sample if it strictly improves on the best error.
    fn offer(&mut self, param: P, target: f64, measured: f64) -> bool {
        let error = (measured - target).abs();
        if error < self.error {
            *self = Self {
                param,
                error,
                measured,
            };
            true
        } else {
            false
        }
    }
}

pub struct ConvergenceSearch {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    extractor: Arc<dyn FeatureExtractor>,
    syllable_counter: Arc<dyn SyllableCounter>,
    rate_table: RateTable,
    max_iterations: u32,
}

impl ConvergenceSearch {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        extractor: Arc<dyn FeatureExtractor>,
        syllable_counter: Arc<dyn SyllableCounter>,
        rate_table: RateTable,
        max_iterations: u32,
    ) -> Self {
        Self {
            synthesizer,
            extractor,
            syllable_counter,
            rate_table,
            max_iterations,
        }
    }

    pub const fn rate_table(&self) -> &RateTable {
        &self.rate_table
    }

    /// Initial rate modifier for a target rate, pinned to the table's range.
    pub fn initial_modifier(&self, rate: f64) -> i32 {
        self.rate_table.lookup(rate).unwrap_or(0)
    }

    #[instrument(skip(self, request), fields(rate = %request.rate, pitch = %request.pitch), err)]
    pub async fn run(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        let rate_modifier = request.rate.value().map(|rate| self.initial_modifier(rate));
        let pitch_hz = request.pitch.value();

        let (Some(target_rate), Some(target_pitch), true) = (
            request.rate.value(),
            request.pitch.value(),
            request.repeat_until_close,
        ) else {
            let audio = self.synthesize(request, rate_modifier, pitch_hz).await?;
            return Ok(SearchOutcome {
                audio,
                rate_modifier,
                pitch_hz,
                measured_rate: None,
                measured_pitch: None,
                syntheses: 1,
            });
        };

        let mut modifier = rate_modifier.unwrap_or(0);
        let mut pitch = target_pitch;
        let (syllables, first) = tokio::join!(
            self.syllables(request),
            self.synthesize(request, Some(modifier), Some(pitch))
        );
        let syllables = syllables?;
        let mut measured = measure(self.extractor.as_ref(), &first?, syllables).await?;
        let mut syntheses = 1;

        let mut best_rate = Best::new(modifier, target_rate, measured.rate);
        let mut best_pitch = Best::new(pitch, target_pitch, measured.pitch);
        debug!(modifier, pitch, rate = measured.rate, measured_pitch = measured.pitch, "initial sample");

        for iteration in 1..=self.max_iterations {
            modifier += if measured.rate < target_rate { 1 } else { -1 };
            pitch += target_pitch - measured.pitch;
            measured = self
                .sample(request, modifier, pitch, syllables, &mut syntheses)
                .await?;
            best_pitch.offer(pitch, target_pitch, measured.pitch);
            let improved = best_rate.offer(modifier, target_rate, measured.rate);
            debug!(iteration, modifier, rate = measured.rate, improved, "rate search step");
            if !improved {
                break;
            }
        }

        let modifier = best_rate.param;
        let mut pitch = best_pitch.param;
        let mut last_pitch = best_pitch.measured;
        let pitch_rounds = if best_pitch.error == 0.0 { 0 } else { self.max_iterations };
        for iteration in 1..=pitch_rounds {
            pitch += target_pitch - last_pitch;
            measured = self
                .sample(request, modifier, pitch, syllables, &mut syntheses)
                .await?;
            last_pitch = measured.pitch;
            let improved = best_pitch.offer(pitch, target_pitch, measured.pitch);
            debug!(iteration, pitch, measured_pitch = measured.pitch, improved, "pitch search step");
            if !improved {
                break;
            }
        }

        let audio = self
            .synthesize(request, Some(best_rate.param), Some(best_pitch.param))
            .await?;
        syntheses += 1;
        info!(
            rate_modifier = best_rate.param,
            pitch_hz = best_pitch.param,
            rate_error = best_rate.error,
            pitch_error = best_pitch.error,
            syntheses,
            "search converged"
        );

        Ok(SearchOutcome {
            audio,
            rate_modifier: Some(best_rate.param),
            pitch_hz: Some(best_pitch.param),
            measured_rate: Some(best_rate.measured),
            measured_pitch: Some(best_pitch.measured),
            syntheses,
        })
    }

    async fn syllables(&self, request: &SearchRequest) -> Result<u32, SearchError> {
        match request.syllables {
            Some(count) => Ok(count),
            None => Ok(self.syllable_counter.count_syllables(&request.text).await?),
        }
    }

    async fn synthesize(
        &self,
        request: &SearchRequest,
        rate_modifier: Option<i32>,
        pitch_hz: Option<f64>,
    ) -> Result<AudioHandle, SearchError> {
        let synthesis = SynthesisRequest {
            text: request.text.clone(),
            rate_modifier,
            pitch_hz,
            intensity_db: request.intensity,
            voice: request.voice.clone(),
        };
        Ok(self.synthesizer.synthesize(&synthesis).await?)
    }

    async fn sample(
        &self,
        request: &SearchRequest,
        modifier: i32,
        pitch: f64,
        syllables: u32,
        syntheses: &mut u32,
    ) -> Result<Measurement, SearchError> {
        let audio = self.synthesize(request, Some(modifier), Some(pitch)).await?;
        *syntheses += 1;
        measure(self.extractor.as_ref(), &audio, syllables).await
    }
}
