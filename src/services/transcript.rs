//! Annotated transcript replay.
//!
//! A transcript is a plain text file with one event per line:
//!
//! ```text
//! 0 <seconds>                                          silence
//! 1 <start> <end> <intensity> <pitch> <syllables>      user turn
//! 2 <syllables> <text...>                              system turn
//! ```
//!
//! Imitation transcripts annotate system turns with their own targets
//! instead:
//!
//! ```text
//! 2 <syllables> <intensity> <pitch> <rate> <text...>   system turn
//! ```
//!
//! Syllable counts may be written as decimals and are rounded.
//!
//! User turns are registered with the session as annotated features; system
//! turns are synthesized through the session and their targets and realized
//! values collected into a [`FeatureLog`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::models::Feature;

use super::dialogue::{DialogueSession, FeatureValues, TurnReport};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Unknown event type {0:?}")]
    UnknownEvent(String),

    #[error("Event {event} expects {expected} fields")]
    MissingFields { event: &'static str, expected: usize },

    #[error("Invalid number {0:?}")]
    InvalidNumber(String),

    #[error("Invalid syllable count {0:?}")]
    InvalidSyllables(String),

    #[error("User turn ends before it starts")]
    NegativeDuration,
}

/// Layout of system-turn lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptKind {
    /// `2 <syllables> <text...>`; targets come from entrainment.
    #[default]
    Dialogue,
    /// `2 <syllables> <intensity> <pitch> <rate> <text...>`
    Imitation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEvent {
    Silence {
        secs: f64,
    },
    User {
        start: f64,
        end: f64,
        intensity: f64,
        pitch: f64,
        syllables: u32,
    },
    System {
        syllables: u32,
        text: String,
    },
    /// System turn with annotated targets to reproduce.
    Imitation {
        syllables: u32,
        targets: FeatureValues,
        text: String,
    },
}

impl TranscriptEvent {
    /// Annotated features of a user turn and its duration.
    pub fn user_features(&self) -> Option<(FeatureValues, f64)> {
        match *self {
            Self::User {
                start,
                end,
                intensity,
                pitch,
                syllables,
            } => {
                let duration = end - start;
                let rate = if duration > 0.0 {
                    f64::from(syllables) / duration
                } else {
                    0.0
                };
                Some((
                    FeatureValues {
                        pitch,
                        rate,
                        intensity,
                    },
                    duration,
                ))
            }
            _ => None,
        }
    }
}

fn number<T: FromStr>(field: &str) -> Result<T, TranscriptError> {
    field
        .parse()
        .map_err(|_| TranscriptError::InvalidNumber(field.to_string()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn syllables(field: &str) -> Result<u32, TranscriptError> {
    let count: f64 = number(field)?;
    if !count.is_finite() || count < 0.0 || count > f64::from(u32::MAX) {
        return Err(TranscriptError::InvalidSyllables(field.to_string()));
    }
    Ok(count.round() as u32)
}

impl FromStr for TranscriptEvent {
    type Err = TranscriptError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        Self::parse_as(line, TranscriptKind::Dialogue)
    }
}

impl TranscriptEvent {
    pub fn parse_as(line: &str, kind: TranscriptKind) -> Result<Self, TranscriptError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match (kind, fields.as_slice()) {
            (TranscriptKind::Imitation, ["2", count, intensity, pitch, rate, words @ ..])
                if !words.is_empty() =>
            {
                Ok(Self::Imitation {
                    syllables: syllables(count)?,
                    targets: FeatureValues {
                        pitch: number(pitch)?,
                        rate: number(rate)?,
                        intensity: number(intensity)?,
                    },
                    text: words.join(" "),
                })
            }
            (TranscriptKind::Imitation, ["2", ..]) => Err(TranscriptError::MissingFields {
                event: "system",
                expected: 5,
            }),
            (_, fields) => Self::parse_common(fields),
        }
    }

    fn parse_common(fields: &[&str]) -> Result<Self, TranscriptError> {
        match fields {
            ["0", secs, ..] => Ok(Self::Silence { secs: number(secs)? }),
            ["0", ..] => Err(TranscriptError::MissingFields {
                event: "silence",
                expected: 1,
            }),
            ["1", start, end, intensity, pitch, count, ..] => {
                let start: f64 = number(start)?;
                let end: f64 = number(end)?;
                if end < start {
                    return Err(TranscriptError::NegativeDuration);
                }
                Ok(Self::User {
                    start,
                    end,
                    intensity: number(intensity)?,
                    pitch: number(pitch)?,
                    syllables: syllables(count)?,
                })
            }
            ["1", ..] => Err(TranscriptError::MissingFields {
                event: "user",
                expected: 5,
            }),
            ["2", count, words @ ..] if !words.is_empty() => Ok(Self::System {
                syllables: syllables(count)?,
                text: words.join(" "),
            }),
            ["2", ..] => Err(TranscriptError::MissingFields {
                event: "system",
                expected: 2,
            }),
            [other, ..] => Err(TranscriptError::UnknownEvent((*other).to_string())),
            [] => Err(TranscriptError::UnknownEvent(String::new())),
        }
    }
}

/// Parse a dialogue transcript, skipping blank and malformed lines.
pub fn parse(content: &str) -> Vec<TranscriptEvent> {
    parse_as(content, TranscriptKind::Dialogue)
}

pub fn parse_as(content: &str, kind: TranscriptKind) -> Vec<TranscriptEvent> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| match TranscriptEvent::parse_as(line, kind) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(line = index + 1, error = %e, "skipping transcript line");
                None
            }
        })
        .collect()
}

pub fn load(path: &Path, kind: TranscriptKind) -> Result<Vec<TranscriptEvent>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {}", path.display()))?;
    Ok(parse_as(&content, kind))
}

/// Target and realized values of every system turn, per feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureLog {
    pub turns: Vec<LoggedTurn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoggedTurn {
    pub targets: FeatureValues,
    pub actuals: FeatureValues,
}

impl From<&TurnReport> for LoggedTurn {
    fn from(report: &TurnReport) -> Self {
        Self {
            targets: report.targets,
            actuals: report.actuals,
        }
    }
}

impl FeatureLog {
    pub fn push(&mut self, report: &TurnReport) {
        self.turns.push(report.into());
    }

    pub fn targets(&self, feature: Feature) -> Vec<f64> {
        self.turns.iter().map(|t| t.targets.get(feature)).collect()
    }

    pub fn actuals(&self, feature: Feature) -> Vec<f64> {
        self.turns.iter().map(|t| t.actuals.get(feature)).collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl fmt::Display for FeatureLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |values: Vec<f64>| {
            values
                .iter()
                .map(|v| format!("{v:.2}"))
                .collect::<Vec<_>>()
                .join(" ")
        };
        for feature in Feature::ALL {
            let prefix = &feature.as_str()[..1];
            writeln!(f, "{prefix}_tgt: {}", join(self.targets(feature)))?;
            writeln!(f, "{prefix}_act: {}", join(self.actuals(feature)))?;
        }
        Ok(())
    }
}

/// Drive a session through a transcript.
pub async fn replay(session: &mut DialogueSession, events: &[TranscriptEvent]) -> Result<FeatureLog> {
    let mut log = FeatureLog::default();
    let mut elapsed = 0.0;
    for event in events {
        match event {
            TranscriptEvent::Silence { secs } => elapsed += secs,
            TranscriptEvent::User { end, .. } => {
                if let Some((values, duration)) = event.user_features() {
                    session.observe_user_features(values, duration)?;
                    elapsed = *end;
                }
            }
            // Annotated targets are ignored; the session entrains instead.
            TranscriptEvent::System { syllables, text }
            | TranscriptEvent::Imitation { syllables, text, .. } => {
                let report = session.respond(text, Some(*syllables)).await?;
                elapsed += report.duration_secs;
                log.push(&report);
            }
        }
        debug!(elapsed, "transcript event replayed");
    }
    Ok(log)
}
