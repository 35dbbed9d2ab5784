//! Implementation of the `entrain replay` command.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::cli::types::ReplayArgs;
use crate::services::{transcript, DialogueSession, FeatureLog, TranscriptKind};

use super::{load_config, Adapters};

impl CommandOutput for FeatureLog {
    fn to_human(&self) -> String {
        format!(
            "Synthesized {} system turn(s)\n{}",
            self.len(),
            TableFormatter::new().format_feature_log(self)
        )
    }
}

pub async fn execute(args: ReplayArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let adapters = Adapters::from_config(&config)?;
    let events = transcript::load(&args.transcript, TranscriptKind::Dialogue)?;

    let mut session = DialogueSession::new(
        &config.entrainment,
        adapters.search(&config)?,
        Arc::clone(&adapters.extractor),
        Arc::clone(&adapters.syllable_counter),
    )?
    .with_voice(args.voice.or_else(|| config.tts.voice.clone()))
    .with_repeat_until_close(config.search.repeat_until_close && !args.no_search);

    let log = transcript::replay(&mut session, &events)
        .await
        .with_context(|| format!("Failed to replay {}", args.transcript.display()))?;

    output(&log, json_mode);
    Ok(())
}
