//! Speech-rate modifier table.
//!
//! Maps a target rate in syllables/second, in 0.1 buckets, to the markup
//! rate percentage that produced the closest measured rate during
//! calibration. Targets outside the supported range are pinned to the
//! nearest bound before lookup.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::errors::SearchError;
use crate::domain::models::SynthesisRequest;
use crate::domain::ports::{FeatureExtractor, SpeechSynthesizer};

use super::convergence_search::measure;

const BUCKETS_PER_UNIT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    min_rate: f64,
    max_rate: f64,
    /// Bucket (rate * 10) to rate modifier in percent.
    modifiers: BTreeMap<u32, i32>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self::empty(3.0, 8.0)
    }
}

impl RateTable {
    pub const fn empty(min_rate: f64, max_rate: f64) -> Self {
        Self {
            min_rate,
            max_rate,
            modifiers: BTreeMap::new(),
        }
    }

    /// Nearest bucket for `rate`, after pinning it to the supported range.
    pub fn bucket(&self, rate: f64) -> u32 {
        let pinned = if rate.is_nan() {
            self.min_rate
        } else {
            rate.min(self.max_rate).max(self.min_rate)
        };
        (pinned * BUCKETS_PER_UNIT).round().max(0.0) as u32
    }

    pub fn insert(&mut self, rate: f64, modifier: i32) {
        let bucket = self.bucket(rate);
        self.modifiers.insert(bucket, modifier);
    }

    /// Modifier for `rate`, falling back to the closest populated bucket.
    pub fn lookup(&self, rate: f64) -> Option<i32> {
        let bucket = self.bucket(rate);
        if let Some(modifier) = self.modifiers.get(&bucket) {
            return Some(*modifier);
        }
        let below = self.modifiers.range(..bucket).next_back();
        let above = self.modifiers.range(bucket..).next();
        match (below, above) {
            (Some((lo, lo_mod)), Some((hi, hi_mod))) => {
                if bucket - lo <= hi - bucket {
                    Some(*lo_mod)
                } else {
                    Some(*hi_mod)
                }
            }
            (Some((_, modifier)), None) | (None, Some((_, modifier))) => Some(*modifier),
            (None, None) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub const fn range(&self) -> (f64, f64) {
        (self.min_rate, self.max_rate)
    }

    /// Entries as (rate, modifier) pairs in ascending rate order.
    pub fn entries(&self) -> impl Iterator<Item = (f64, i32)> + '_ {
        self.modifiers
            .iter()
            .map(|(bucket, modifier)| (f64::from(*bucket) / BUCKETS_PER_UNIT, *modifier))
    }

    /// Build a table from calibration samples.
    ///
    /// Every bucket in range takes the modifier whose measured rate is
    /// nearest to it; the earlier sample wins a tie.
    pub fn from_samples(min_rate: f64, max_rate: f64, samples: &[RateSample]) -> Self {
        let mut table = Self::empty(min_rate, max_rate);
        if samples.is_empty() {
            return table;
        }
        let first = table.bucket(min_rate);
        let last = table.bucket(max_rate);
        for bucket in first..=last {
            let rate = f64::from(bucket) / BUCKETS_PER_UNIT;
            let nearest = samples.iter().fold(None::<&RateSample>, |best, sample| match best {
                Some(b) if (b.rate - rate).abs() <= (sample.rate - rate).abs() => Some(b),
                _ => Some(sample),
            });
            if let Some(sample) = nearest {
                table.modifiers.insert(bucket, sample.modifier);
            }
        }
        table
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rate table {}", path.display()))?;
        let table: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse rate table {}", path.display()))?;
        table
            .validate()
            .with_context(|| format!("Invalid rate table {}", path.display()))?;
        debug!(path = %path.display(), entries = table.len(), "loaded rate table");
        Ok(table)
    }

    /// Same range rule as the `search` config section.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_rate > 0.0 && self.min_rate < self.max_rate && self.max_rate.is_finite()) {
            anyhow::bail!(
                "rate range must satisfy 0 < min_rate < max_rate, got {}..{}",
                self.min_rate,
                self.max_rate
            );
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(self).context("Failed to serialize rate table")?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write rate table {}", path.display()))
    }
}

/// Measured rate for one rate modifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSample {
    pub modifier: i32,
    pub rate: f64,
}

/// Sweeps rate modifiers over a calibration sentence.
pub struct RateCalibrator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    extractor: Arc<dyn FeatureExtractor>,
    voice: Option<String>,
}

impl RateCalibrator {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        extractor: Arc<dyn FeatureExtractor>,
        voice: Option<String>,
    ) -> Self {
        Self {
            synthesizer,
            extractor,
            voice,
        }
    }

    pub async fn sample(
        &self,
        text: &str,
        syllables: u32,
        modifier: i32,
    ) -> Result<RateSample, SearchError> {
        let request = SynthesisRequest::plain(text)
            .with_rate_modifier(modifier)
            .with_voice(self.voice.clone());
        let audio = self.synthesizer.synthesize(&request).await?;
        let measured = measure(self.extractor.as_ref(), &audio, syllables).await?;
        Ok(RateSample {
            modifier,
            rate: measured.rate,
        })
    }

    /// Synthesize `text` once per modifier and collect the measured rates.
    ///
    /// Failed samples are logged and skipped. `on_sample` is called after
    /// every attempt, successful or not.
    pub async fn sweep(
        &self,
        text: &str,
        syllables: u32,
        modifiers: impl IntoIterator<Item = i32>,
        mut on_sample: impl FnMut(i32),
    ) -> Vec<RateSample> {
        let mut samples = Vec::new();
        for modifier in modifiers {
            match self.sample(text, syllables, modifier).await {
                Ok(sample) => {
                    debug!(modifier, rate = sample.rate, "calibration sample");
                    samples.push(sample);
                }
                Err(e) => warn!(modifier, error = %e, "skipping calibration sample"),
            }
            on_sample(modifier);
        }
        info!(samples = samples.len(), "calibration sweep finished");
        samples
    }
}
