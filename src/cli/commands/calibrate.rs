//! Implementation of the `entrain calibrate` command.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::Path;
use tracing::info;

use crate::cli::models::CalibrationReport;
use crate::cli::output::progress::hidden_progress_bar;
use crate::cli::output::{create_progress_bar, output, CommandOutput, ProgressBarExt, TableFormatter};
use crate::cli::types::CalibrateArgs;
use crate::services::{RateCalibrator, RateTable};

use super::{load_config, rate_table_path, Adapters};

impl CommandOutput for CalibrationReport {
    fn to_human(&self) -> String {
        format!(
            "Calibrated {} of {} modifier(s) at {}; table written to {}\n{}",
            self.samples,
            self.attempted,
            self.calibrated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.path,
            TableFormatter::new().format_rate_table(&self.table)
        )
    }
}

/// Modifiers from `min` to `max` inclusive in `step` increments.
pub fn modifier_sweep(min: i32, max: i32, step: u32) -> Result<Vec<i32>> {
    if min > max {
        bail!("Minimum modifier {min} exceeds maximum {max}");
    }
    let step = usize::try_from(step.max(1)).context("Modifier step out of range")?;
    Ok((min..=max).step_by(step).collect())
}

pub async fn execute(args: CalibrateArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let adapters = Adapters::from_config(&config)?;
    let modifiers = modifier_sweep(args.min_modifier, args.max_modifier, args.step)?;

    let syllables = match args.syllables {
        Some(count) => count,
        None => adapters
            .syllable_counter
            .count_syllables(&args.text)
            .await
            .context("Failed to count calibration syllables")?,
    };

    let calibrator = RateCalibrator::new(
        adapters.synthesizer.clone(),
        adapters.extractor.clone(),
        config.tts.voice.clone(),
    );
    let total = modifiers.len() as u64;
    let pb = if json_mode {
        hidden_progress_bar(total)
    } else {
        create_progress_bar(total)
    };
    let samples = calibrator
        .sweep(&args.text, syllables, modifiers.iter().copied(), |modifier| {
            pb.set_message(format!("{modifier:+}%"));
            pb.inc(1);
        })
        .await;

    if samples.is_empty() {
        pb.finish_warning("no usable samples");
        bail!("Calibration produced no usable samples; is the synthesizer running?");
    }
    pb.finish_success(format!("{} sample(s)", samples.len()));

    let table = RateTable::from_samples(config.search.min_rate, config.search.max_rate, &samples);
    let path = args.output.unwrap_or_else(|| rate_table_path(&config));
    table.save(&path)?;
    info!(path = %path.display(), buckets = table.len(), "rate table saved");

    output(
        &CalibrationReport {
            path: path.display().to_string(),
            calibrated_at: Utc::now(),
            attempted: modifiers.len(),
            samples: samples.len(),
            table,
        },
        json_mode,
    );
    Ok(())
}
