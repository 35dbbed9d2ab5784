//! Common test utilities for integration tests
//!
//! Provides a scripted voice that stands in for both the synthesizer and
//! the feature extractor, so searches run without MaryTTS or Praat.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use entrain::domain::errors::{AnalysisError, SynthesisError};
use entrain::domain::models::feature::names;
use entrain::domain::models::{AudioHandle, FeatureMap, FeatureRequest, SynthesisRequest};
use entrain::domain::ports::{FeatureExtractor, SpeechSynthesizer, SyllableCounter};

/// Acoustic response of the scripted voice to one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Response {
    pub rate: f64,
    pub pitch: f64,
    pub intensity: f64,
}

type Script = dyn Fn(&SynthesisRequest) -> Response + Send + Sync;

/// Synthesizer and extractor in one: every synthesized file is "measured"
/// by replaying the scripted response for the request that produced it.
pub struct ScriptedVoice {
    syllables: u32,
    script: Box<Script>,
    requests: Mutex<Vec<SynthesisRequest>>,
    files: Mutex<HashMap<AudioHandle, Response>>,
}

impl ScriptedVoice {
    /// `syllables` must match the syllable count the caller passes in, so
    /// the derived duration reproduces the scripted rate.
    pub fn new(
        syllables: u32,
        script: impl Fn(&SynthesisRequest) -> Response + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            syllables,
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
            files: Mutex::new(HashMap::new()),
        })
    }

    /// Voice that realizes every pitch request exactly and speeds up by
    /// `rate_per_percent` syllables/second per modifier percent.
    pub fn linear(syllables: u32, base_rate: f64, rate_per_percent: f64) -> Arc<Self> {
        Self::new(syllables, move |request| Response {
            rate: f64::from(request.rate_modifier.unwrap_or(0)).mul_add(rate_per_percent, base_rate),
            pitch: request.pitch_hz.unwrap_or(120.0),
            intensity: 60.0,
        })
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn modifiers(&self) -> Vec<Option<i32>> {
        self.requests().iter().map(|r| r.rate_modifier).collect()
    }

    /// Register a pre-recorded file with known features.
    pub fn add_recording(&self, path: &str, response: Response) -> AudioHandle {
        let audio = AudioHandle::new(path);
        self.files.lock().unwrap().insert(audio.clone(), response);
        audio
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedVoice {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioHandle, SynthesisError> {
        let response = (self.script)(request);
        let audio = {
            let mut requests = self.requests.lock().unwrap();
            let audio = AudioHandle::new(format!("scripted/{}.wav", requests.len()));
            requests.push(request.clone());
            audio
        };
        self.files.lock().unwrap().insert(audio.clone(), response);
        Ok(audio)
    }
}

#[async_trait]
impl FeatureExtractor for ScriptedVoice {
    async fn measure(
        &self,
        audio: &AudioHandle,
        _features: &FeatureRequest,
    ) -> Result<FeatureMap, AnalysisError> {
        let response = self
            .files
            .lock()
            .unwrap()
            .get(audio)
            .copied()
            .ok_or_else(|| AnalysisError::MissingFeature(audio.path().display().to_string()))?;
        let mut features = FeatureMap::new();
        features.insert(names::PITCH_MEAN, response.pitch);
        features.insert(names::INTENSITY_MEAN, response.intensity);
        features.insert(names::MAIN_DURATION, f64::from(self.syllables) / response.rate);
        Ok(features)
    }
}

/// Syllable counter returning a fixed count and recording its inputs.
pub struct FixedSyllables {
    count: u32,
    calls: Mutex<Vec<String>>,
}

impl FixedSyllables {
    pub fn new(count: u32) -> Arc<Self> {
        Arc::new(Self {
            count,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SyllableCounter for FixedSyllables {
    async fn count_syllables(&self, text: &str) -> Result<u32, AnalysisError> {
        self.calls.lock().unwrap().push(text.to_string());
        Ok(self.count)
    }
}

/// Setup test logging
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
