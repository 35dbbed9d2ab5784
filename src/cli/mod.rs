//! Command-line interface
//!
//! `types` holds the clap definitions, `commands` one module per
//! subcommand, `output` the table/JSON rendering.

pub mod commands;
pub mod models;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

/// Report a failed command and exit with status 1.
///
/// JSON mode prints `{"error": ..., "causes": [...]}` on stdout so scripted
/// callers always get parseable output.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": causes,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
