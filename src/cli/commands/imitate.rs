//! Implementation of the `entrain imitate` command.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::cli::output::output;
use crate::cli::types::ImitateArgs;
use crate::services::{transcript, Imitator, TranscriptKind};

use super::{load_config, Adapters};

pub async fn execute(args: ImitateArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let adapters = Adapters::from_config(&config)?;
    let events = transcript::load(&args.transcript, TranscriptKind::Imitation)?;

    let imitator = Imitator::new(adapters.search(&config)?, Arc::clone(&adapters.extractor))
        .with_voice(args.voice.or_else(|| config.tts.voice.clone()))
        .with_repeat_until_close(config.search.repeat_until_close && !args.no_search)
        .with_pitch_scaling(args.scale_pitch);

    let log = imitator
        .run(&events)
        .await
        .with_context(|| format!("Failed to imitate {}", args.transcript.display()))?;

    output(&log, json_mode);
    Ok(())
}
