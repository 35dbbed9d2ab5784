//! Table output formatting for CLI commands
//!
//! Tabulates simulations, search outcomes, rate tables and transcript logs
//! using comfy-table. Deviations from targets are color-coded when the
//! terminal supports it.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use crate::cli::models::Simulation;
use crate::domain::models::{Feature, SearchOutcome};
use crate::services::{FeatureLog, RateTable};

/// Relative deviation still shown as on target.
const ON_TARGET: f64 = 0.05;

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    pub fn format_simulation(&self, simulation: &Simulation) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Turn", "Input", "Target"]));
        for step in &simulation.steps {
            table.add_row(vec![
                Cell::new(step.turn),
                Cell::new(format!("{:.2}", step.input)),
                Cell::new(format!("{:.2}", step.target)).fg(Color::Cyan),
            ]);
        }
        table.to_string()
    }

    pub fn format_search_outcome(&self, outcome: &SearchOutcome) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Field", "Value"]));
        let optional = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        table.add_row(vec![Cell::new("Audio"), Cell::new(outcome.audio.path().display())]);
        table.add_row(vec![
            Cell::new("Rate modifier"),
            Cell::new(outcome.rate_modifier.map_or_else(|| "-".to_string(), |m| format!("{m:+}%"))),
        ]);
        table.add_row(vec![Cell::new("Pitch request"), Cell::new(optional(outcome.pitch_hz))]);
        table.add_row(vec![Cell::new("Measured rate"), Cell::new(optional(outcome.measured_rate))]);
        table.add_row(vec![
            Cell::new("Measured pitch"),
            Cell::new(optional(outcome.measured_pitch)),
        ]);
        table.add_row(vec![Cell::new("Syntheses"), Cell::new(outcome.syntheses)]);
        table.to_string()
    }

    pub fn format_rate_table(&self, rates: &RateTable) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Rate (syll/s)", "Modifier"]));
        for (rate, modifier) in rates.entries() {
            table.add_row(vec![Cell::new(format!("{rate:.1}")), Cell::new(format!("{modifier:+}%"))]);
        }
        table.to_string()
    }

    pub fn format_feature_log(&self, log: &FeatureLog) -> String {
        let mut table = self.create_base_table();
        let mut columns = vec!["Turn".to_string()];
        for feature in Feature::ALL {
            columns.push(format!("{feature} target"));
            columns.push(format!("{feature} actual"));
        }
        table.set_header(columns.iter().map(|c| Cell::new(c).add_attribute(Attribute::Bold)));

        for (index, turn) in log.turns.iter().enumerate() {
            let mut row = vec![Cell::new(index + 1)];
            for feature in Feature::ALL {
                let target = turn.targets.get(feature);
                let actual = turn.actuals.get(feature);
                row.push(Cell::new(format!("{target:.2}")));
                row.push(self.deviation_cell(target, actual));
            }
            table.add_row(row);
        }
        table.to_string()
    }

    fn deviation_cell(&self, target: f64, actual: f64) -> Cell {
        let cell = Cell::new(format!("{actual:.2}"));
        if !self.use_colors {
            return cell;
        }
        let deviation = if target == 0.0 {
            actual.abs()
        } else {
            ((actual - target) / target).abs()
        };
        if deviation <= ON_TARGET {
            cell.fg(Color::Green)
        } else {
            cell.fg(Color::Yellow)
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if let Some(width) = self.max_width {
            table.set_width(width);
        }
        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}
