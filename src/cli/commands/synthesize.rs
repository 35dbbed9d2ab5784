//! Implementation of the `entrain synthesize` command.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::cli::types::SynthesizeArgs;
use crate::domain::models::{SearchOutcome, SearchRequest};

use super::{load_config, Adapters};

impl CommandOutput for SearchOutcome {
    fn to_human(&self) -> String {
        TableFormatter::new().format_search_outcome(self)
    }
}

pub async fn execute(args: SynthesizeArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let adapters = Adapters::from_config(&config)?;
    let search = adapters.search(&config)?;

    let request = SearchRequest {
        text: args.text,
        rate: args.rate,
        pitch: args.pitch,
        intensity: args.intensity,
        syllables: args.syllables,
        voice: args.voice.or_else(|| config.tts.voice.clone()),
        repeat_until_close: config.search.repeat_until_close && !args.no_search,
    };
    let outcome = search.run(&request).await.context("Synthesis search failed")?;

    output(&outcome, json_mode);
    Ok(())
}
