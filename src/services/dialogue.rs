//! Per-dialogue driver.
//!
//! A [`DialogueSession`] owns one [`FeatureChannel`] per prosodic feature and
//! runs the full turn cycle: register what the user said, propose targets,
//! synthesize a matching reply and feed the realized values back.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::domain::models::{
    AudioHandle, EntrainmentConfig, Feature, FeatureRequest, SearchRequest, SearchTarget,
};
use crate::domain::ports::{FeatureExtractor, SyllableCounter, Transcriber};

use super::convergence_search::{measure, ConvergenceSearch};
use super::feature_channel::FeatureChannel;

/// One value per prosodic feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureValues {
    pub pitch: f64,
    pub rate: f64,
    pub intensity: f64,
}

impl FeatureValues {
    pub const fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Pitch => self.pitch,
            Feature::Rate => self.rate,
            Feature::Intensity => self.intensity,
        }
    }
}

/// A user turn as registered with the channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTurn {
    pub transcript: Option<String>,
    pub syllables: u32,
    pub duration_secs: f64,
    pub values: FeatureValues,
}

/// Targets and realized values of one system turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub audio: AudioHandle,
    pub targets: FeatureValues,
    pub actuals: FeatureValues,
    pub duration_secs: f64,
    pub rate_modifier: Option<i32>,
    pub pitch_hz: Option<f64>,
    pub syntheses: u32,
}

pub struct DialogueSession {
    pitch: FeatureChannel,
    rate: FeatureChannel,
    intensity: FeatureChannel,
    search: ConvergenceSearch,
    extractor: Arc<dyn FeatureExtractor>,
    syllable_counter: Arc<dyn SyllableCounter>,
    transcriber: Option<Arc<dyn Transcriber>>,
    voice: Option<String>,
    repeat_until_close: bool,
}

impl DialogueSession {
    pub fn new(
        config: &EntrainmentConfig,
        search: ConvergenceSearch,
        extractor: Arc<dyn FeatureExtractor>,
        syllable_counter: Arc<dyn SyllableCounter>,
    ) -> Result<Self> {
        let channel = |feature: Feature| {
            FeatureChannel::from_config(feature, config.for_feature(feature))
                .with_context(|| format!("Invalid {feature} entrainment configuration"))
        };
        Ok(Self {
            pitch: channel(Feature::Pitch)?,
            rate: channel(Feature::Rate)?,
            intensity: channel(Feature::Intensity)?,
            search,
            extractor,
            syllable_counter,
            transcriber: None,
            voice: None,
            repeat_until_close: true,
        })
    }

    #[must_use]
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
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

    pub const fn channel(&self, feature: Feature) -> &FeatureChannel {
        match feature {
            Feature::Pitch => &self.pitch,
            Feature::Rate => &self.rate,
            Feature::Intensity => &self.intensity,
        }
    }

    fn channel_mut(&mut self, feature: Feature) -> &mut FeatureChannel {
        match feature {
            Feature::Pitch => &mut self.pitch,
            Feature::Rate => &mut self.rate,
            Feature::Intensity => &mut self.intensity,
        }
    }

    /// Register an annotated user utterance.
    pub fn observe_user_features(&mut self, values: FeatureValues, duration_secs: f64) -> Result<()> {
        for feature in Feature::ALL {
            self.channel_mut(feature)
                .register_input(values.get(feature), duration_secs)
                .with_context(|| format!("Failed to register user {feature}"))?;
        }
        Ok(())
    }

    /// Analyze a recorded user utterance and register its features.
    ///
    /// Transcription plus syllable counting and feature extraction run
    /// concurrently; neither depends on the other.
    #[instrument(skip(self, audio), fields(audio = %audio.path().display()))]
    pub async fn observe_user_audio(&mut self, audio: &AudioHandle) -> Result<UserTurn> {
        let transcriber = self
            .transcriber
            .clone()
            .ok_or_else(|| anyhow!("No transcriber configured for recorded user turns"))?;
        let counter = Arc::clone(&self.syllable_counter);

        let words = async {
            let text = transcriber.transcribe(audio).await?;
            let syllables = counter.count_syllables(&text).await?;
            Ok::<_, anyhow::Error>((text, syllables))
        };
        let request = FeatureRequest::prosody();
        let (words, features) = tokio::join!(words, self.extractor.measure(audio, &request));

        let (text, syllables) = words.context("Failed to transcribe user turn")?;
        let features = features.context("Failed to analyze user turn")?;
        let duration_secs = features.duration()?;
        let rate = if duration_secs > 0.0 {
            f64::from(syllables) / duration_secs
        } else {
            0.0
        };
        let values = FeatureValues {
            pitch: features.pitch_mean()?,
            rate,
            intensity: features.intensity_mean()?,
        };
        self.observe_user_features(values, duration_secs)?;
        info!(syllables, duration_secs, ?values, "user turn registered");

        Ok(UserTurn {
            transcript: Some(text),
            syllables,
            duration_secs,
            values,
        })
    }

    /// Current per-feature targets for the system's reply.
    pub fn propose(&mut self) -> Result<FeatureValues> {
        let mut propose = |feature: Feature| {
            self.channel_mut(feature)
                .propose()
                .with_context(|| format!("Failed to propose {feature} target"))
        };
        Ok(FeatureValues {
            pitch: propose(Feature::Pitch)?,
            rate: propose(Feature::Rate)?,
            intensity: propose(Feature::Intensity)?,
        })
    }

    /// Synthesize the system's reply to the latest user turn.
    #[instrument(skip(self))]
    pub async fn respond(&mut self, text: &str, syllables: Option<u32>) -> Result<TurnReport> {
        let targets = self.propose()?;
        let syllables = match syllables {
            Some(count) => count,
            None => self
                .syllable_counter
                .count_syllables(text)
                .await
                .context("Failed to count reply syllables")?,
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
            .context("Failed to measure synthesized reply")?;

        let actuals = FeatureValues {
            pitch: realized.pitch,
            rate: realized.rate,
            intensity: realized.intensity,
        };
        for feature in Feature::ALL {
            self.channel_mut(feature)
                .register_output(actuals.get(feature), realized.duration_secs)
                .with_context(|| format!("Failed to register realized {feature}"))?;
        }
        info!(?targets, ?actuals, syntheses = outcome.syntheses, "system turn realized");

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
}
