//! Feature extraction through a Praat script.
//!
//! The script is run as `praat --run <script> <wav> <out> <flags...>` and
//! writes one `name,value` pair per line to `<out>`. Flags are `1`/`0` for
//! pitch, intensity, durations and jitter/shimmer, in that order.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::domain::errors::AnalysisError;
use crate::domain::models::{AnalysisConfig, AudioHandle, FeatureKind, FeatureMap, FeatureRequest};
use crate::domain::ports::FeatureExtractor;

#[derive(Debug, Clone)]
pub struct PraatAnalyzer {
    praat_path: PathBuf,
    script_path: PathBuf,
}

impl PraatAnalyzer {
    pub fn new(praat_path: impl Into<PathBuf>, script_path: impl Into<PathBuf>) -> Self {
        Self {
            praat_path: praat_path.into(),
            script_path: script_path.into(),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(&config.praat_path, &config.script_path)
    }

    fn flags(request: &FeatureRequest) -> [&'static str; 4] {
        // Rate is derived from durations and syllable counts.
        let durations = request.contains(FeatureKind::Durations) || request.contains(FeatureKind::Rate);
        [
            request.contains(FeatureKind::Pitch),
            request.contains(FeatureKind::Intensity),
            durations,
            request.contains(FeatureKind::JitterShimmer),
        ]
        .map(|on| if on { "1" } else { "0" })
    }
}

fn output_path(audio: &Path) -> PathBuf {
    let stem = audio
        .file_stem()
        .map_or_else(|| "audio".into(), |s| s.to_string_lossy().into_owned());
    audio.with_file_name(format!("{stem}_features.txt"))
}

/// Parse `name,value` lines; undefined values are left out of the map.
pub fn parse_feature_output(content: &str) -> Result<FeatureMap, AnalysisError> {
    let mut features = FeatureMap::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (name, value) = line
            .split_once(',')
            .ok_or_else(|| AnalysisError::MalformedOutput(line.to_string()))?;
        let (name, value) = (name.trim(), value.trim());
        if value == "--undefined--" {
            debug!(feature = name, "feature undefined");
            continue;
        }
        let value: f64 = value
            .parse()
            .map_err(|_| AnalysisError::MalformedOutput(line.to_string()))?;
        features.insert(name, value);
    }
    Ok(features)
}

#[async_trait]
impl FeatureExtractor for PraatAnalyzer {
    #[instrument(skip(self, request), fields(audio = %audio.path().display()), err)]
    async fn measure(
        &self,
        audio: &AudioHandle,
        request: &FeatureRequest,
    ) -> Result<FeatureMap, AnalysisError> {
        let out = output_path(audio.path());
        let output = Command::new(&self.praat_path)
            .arg("--run")
            .arg(&self.script_path)
            .arg(audio.path())
            .arg(&out)
            .args(Self::flags(request))
            .output()
            .await
            .map_err(|source| AnalysisError::Spawn {
                program: self.praat_path.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnalysisError::ProcessFailed(format!(
                "{}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let content = tokio::fs::read_to_string(&out).await?;
        tokio::fs::remove_file(&out).await?;
        let features = parse_feature_output(&content)?;
        debug!(count = features.len(), "features extracted");
        Ok(features)
    }
}
