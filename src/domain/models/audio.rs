//! Audio handles and synthesis requests exchanged with the synthesis backend.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Reference to an audio file produced by synthesis or recorded from a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioHandle {
    path: PathBuf,
}

impl AudioHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parameters for one synthesis call.
///
/// `rate_modifier` is a markup percentage (e.g. `+12%`), `pitch_hz` an
/// absolute pitch request and `intensity_db` an absolute mean intensity the
/// backend turns into a volume change. `None` leaves the voice default in
/// place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub rate_modifier: Option<i32>,
    pub pitch_hz: Option<f64>,
    #[serde(default)]
    pub intensity_db: Option<f64>,
    pub voice: Option<String>,
}

impl SynthesisRequest {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate_modifier: None,
            pitch_hz: None,
            intensity_db: None,
            voice: None,
        }
    }

    #[must_use]
    pub const fn with_rate_modifier(mut self, modifier: i32) -> Self {
        self.rate_modifier = Some(modifier);
        self
    }

    #[must_use]
    pub const fn with_pitch(mut self, pitch_hz: f64) -> Self {
        self.pitch_hz = Some(pitch_hz);
        self
    }

    #[must_use]
    pub const fn with_intensity(mut self, intensity_db: Option<f64>) -> Self {
        self.intensity_db = intensity_db;
        self
    }

    #[must_use]
    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice;
        self
    }
}
