//! Prosodic feature dimensions and measured feature values.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::AnalysisError;

/// Feature dimension an entrainment channel operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Mean fundamental frequency in Hz.
    Pitch,
    /// Speech rate in syllables per second.
    Rate,
    /// Mean intensity in dB.
    Intensity,
}

impl Feature {
    pub const ALL: [Self; 3] = [Self::Pitch, Self::Rate, Self::Intensity];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pitch => "pitch",
            Self::Rate => "rate",
            Self::Intensity => "intensity",
        }
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("expected pitch, rate or intensity, got {s:?}"))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed utterance (or merged set of utterances) within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnObservation {
    pub value: f64,
    pub duration_secs: f64,
}

impl TurnObservation {
    pub const fn new(value: f64, duration_secs: f64) -> Self {
        Self {
            value,
            duration_secs,
        }
    }

    /// Duration-weighted mean of two observations of the same turn.
    pub fn merge(self, other: Self) -> Self {
        let total = self.duration_secs + other.duration_secs;
        if total <= 0.0 {
            // No duration to weigh by; the later observation wins.
            return Self::new(other.value, total.max(0.0));
        }
        Self {
            value: self
                .value
                .mul_add(self.duration_secs, other.value * other.duration_secs)
                / total,
            duration_secs: total,
        }
    }
}

/// Groups of features the analysis backend can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Rate,
    Pitch,
    Intensity,
    Durations,
    JitterShimmer,
}

/// Set of feature groups requested from a single measurement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureRequest(BTreeSet<FeatureKind>);

impl FeatureRequest {
    pub fn new(kinds: impl IntoIterator<Item = FeatureKind>) -> Self {
        Self(kinds.into_iter().collect())
    }

    /// Pitch, intensity and durations; what a realized turn needs.
    pub fn prosody() -> Self {
        Self::new([
            FeatureKind::Pitch,
            FeatureKind::Intensity,
            FeatureKind::Durations,
        ])
    }

    pub fn contains(&self, kind: FeatureKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = FeatureKind> + '_ {
        self.0.iter().copied()
    }
}

/// Names of the scalar features produced by the analysis script.
pub mod names {
    pub const PITCH_MEAN: &str = "pitch_mean";
    pub const INTENSITY_MEAN: &str = "intensity_mean";
    pub const MAIN_DURATION: &str = "main_duration";
}

/// Named scalar features measured from one audio file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMap(HashMap<String, f64>);

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Result<f64, AnalysisError> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| AnalysisError::MissingFeature(name.to_string()))
    }

    pub fn pitch_mean(&self) -> Result<f64, AnalysisError> {
        self.get(names::PITCH_MEAN)
    }

    pub fn intensity_mean(&self) -> Result<f64, AnalysisError> {
        self.get(names::INTENSITY_MEAN)
    }

    pub fn duration(&self) -> Result<f64, AnalysisError> {
        self.get(names::MAIN_DURATION)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for FeatureMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
