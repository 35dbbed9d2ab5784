//! Implementation of the `entrain simulate` command.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use crate::cli::models::{Simulation, SimulationStep};
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::cli::types::SimulateArgs;
use crate::domain::models::EntrainmentConfig;
use crate::services::FeatureChannel;

use super::load_config;

impl CommandOutput for Simulation {
    fn to_human(&self) -> String {
        format!(
            "Simulated {} turn(s) of {} entrainment\n{}",
            self.steps.len(),
            self.feature,
            TableFormatter::new().format_simulation(self)
        )
    }
}

/// Feed user values through one feature's strategy.
///
/// Each system turn speaks exactly its target, so the realized output fed
/// back is the proposal itself.
pub fn simulate(config: &EntrainmentConfig, args: &SimulateArgs) -> Result<Simulation> {
    let mut channel = FeatureChannel::from_config(args.feature, config.for_feature(args.feature))
        .with_context(|| format!("Invalid {} entrainment configuration", args.feature))?;

    let mut steps = Vec::with_capacity(args.values.len());
    for (index, &input) in args.values.iter().enumerate() {
        channel
            .register_input(input, args.duration)
            .with_context(|| format!("Failed to register user value {input}"))?;
        let target = channel.propose().context("Failed to propose a target")?;
        channel
            .register_output(target, args.duration)
            .context("Failed to register system output")?;
        debug!(turn = index + 1, input, target, "simulated turn");
        steps.push(SimulationStep {
            turn: index + 1,
            input,
            target,
        });
    }

    Ok(Simulation {
        feature: args.feature,
        steps,
    })
}

pub fn execute(args: SimulateArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let simulation = simulate(&config.entrainment, &args)?;
    output(&simulation, json_mode);
    Ok(())
}
