//! MaryTTS HTTP client.
//!
//! Posts an SSML document to the server's `/process` endpoint and streams
//! the response into a uniquely named wav file. The response body is kept
//! even when the server reports an error, since MaryTTS explains failures
//! in the body.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::SynthesisError;
use crate::domain::models::{AudioHandle, SynthesisRequest, TtsConfig};
use crate::domain::ports::SpeechSynthesizer;

use super::ssml::{prosody_document, Prosody};

#[derive(Debug, Clone)]
pub struct MaryTtsConfig {
    /// Server root, e.g. `http://127.0.0.1:59125`
    pub base_url: String,
    pub locale: String,
    /// Used when a request names no voice
    pub default_voice: Option<String>,
    pub output_dir: PathBuf,
    pub timeout: Duration,
    /// Intensity (dB) that maps to an unchanged volume
    pub reference_intensity_db: f64,
}

impl Default for MaryTtsConfig {
    fn default() -> Self {
        Self::from(&TtsConfig::default())
    }
}

impl From<&TtsConfig> for MaryTtsConfig {
    fn from(config: &TtsConfig) -> Self {
        Self {
            base_url: format!("http://{}:{}", config.host, config.port),
            locale: config.locale.clone(),
            default_voice: config.voice.clone(),
            output_dir: PathBuf::from(&config.output_dir),
            timeout: Duration::from_secs(config.timeout_secs),
            reference_intensity_db: config.reference_intensity_db,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaryTtsClient {
    http: Client,
    config: MaryTtsConfig,
}

impl MaryTtsClient {
    pub fn new(config: MaryTtsConfig) -> Result<Self, SynthesisError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub const fn config(&self) -> &MaryTtsConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/process", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechSynthesizer for MaryTtsClient {
    #[instrument(
        skip(self, request),
        fields(rate = ?request.rate_modifier, pitch = ?request.pitch_hz, intensity = ?request.intensity_db),
        err
    )]
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioHandle, SynthesisError> {
        let prosody = Prosody {
            rate_modifier: request.rate_modifier,
            pitch_hz: request.pitch_hz,
            volume_db: request
                .intensity_db
                .map(|target| target - self.config.reference_intensity_db),
        };
        let markup = prosody_document(&request.text, &self.config.locale, prosody);
        let mut params = vec![
            ("INPUT_TEXT", markup.as_str()),
            ("INPUT_TYPE", "SSML"),
            ("OUTPUT_TYPE", "AUDIO"),
            ("LOCALE", self.config.locale.as_str()),
            ("AUDIO", "WAVE_FILE"),
        ];
        if let Some(voice) = request.voice.as_ref().or(self.config.default_voice.as_ref()) {
            params.push(("VOICE", voice.as_str()));
        }

        let response = self.http.post(self.endpoint()).form(&params).send().await?;
        let status = response.status();

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let path = self.config.output_dir.join(format!("{}.wav", Uuid::new_v4()));
        let mut file = tokio::fs::File::create(&path).await?;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), path = %path.display(), "synthesis server returned an error");
            return Err(SynthesisError::Status {
                status: status.as_u16(),
                body_path: path,
            });
        }

        debug!(path = %path.display(), "synthesized audio written");
        Ok(AudioHandle::new(path))
    }
}
