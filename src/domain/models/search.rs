//! Request and result types of the closed-loop rate/pitch search.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::audio::AudioHandle;

/// Target for one searched dimension; `Default` leaves the voice untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SearchTarget {
    #[default]
    Default,
    Value(f64),
}

impl SearchTarget {
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Default => None,
            Self::Value(v) => Some(v),
        }
    }
}

impl FromStr for SearchTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("default") {
            return Ok(Self::Default);
        }
        trimmed
            .trim_end_matches("Hz")
            .parse::<f64>()
            .map(Self::Value)
            .map_err(|_| format!("expected a number or \"default\", got {s:?}"))
    }
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for SearchTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Default => serializer.serialize_str("default"),
            Self::Value(v) => serializer.serialize_f64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for SearchTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Self::Value(v)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// One matching request: text plus rate (syllables/second) and pitch (Hz)
/// targets. The intensity target (dB) is not searched, only requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub text: String,
    pub rate: SearchTarget,
    pub pitch: SearchTarget,
    #[serde(default)]
    pub intensity: Option<f64>,
    /// Syllable count of `text`, if already known.
    pub syllables: Option<u32>,
    pub voice: Option<String>,
    /// When false, synthesize once with the initial guess.
    pub repeat_until_close: bool,
}

/// Committed result of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub audio: AudioHandle,
    pub rate_modifier: Option<i32>,
    pub pitch_hz: Option<f64>,
    /// Rate and pitch measured on the best-seen samples, if measured.
    pub measured_rate: Option<f64>,
    pub measured_pitch: Option<f64>,
    /// Number of synthesis calls, including the committed one.
    pub syntheses: u32,
}
