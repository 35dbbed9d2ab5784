//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::models::{Feature, SearchTarget};

#[derive(Parser)]
#[command(name = "entrain")]
#[command(about = "Prosodic entrainment for synthesized dialogue", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to entrain.yaml + entrain.local.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one feature's entrainment strategy over a sequence of user values
    Simulate(SimulateArgs),

    /// Synthesize text at a target rate and pitch
    Synthesize(SynthesizeArgs),

    /// Build a speech-rate modifier table by sweeping the synthesizer
    Calibrate(CalibrateArgs),

    /// Replay an annotated transcript, synthesizing every system turn
    Replay(ReplayArgs),

    /// Synthesize system turns to match the targets annotated on them
    Imitate(ImitateArgs),
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// User feature values, one per turn
    #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
    pub values: Vec<f64>,

    /// Feature whose strategy is used: pitch, rate or intensity
    #[arg(short, long, default_value = "pitch")]
    pub feature: Feature,

    /// Duration of every turn in seconds
    #[arg(short, long, default_value = "1.0")]
    pub duration: f64,
}

#[derive(Args, Debug)]
pub struct SynthesizeArgs {
    /// Text to speak
    pub text: String,

    /// Target rate in syllables/second, or "default"
    #[arg(short, long, default_value = "default")]
    pub rate: SearchTarget,

    /// Target pitch in Hz (e.g. 130 or 130Hz), or "default"
    #[arg(short, long, default_value = "default")]
    pub pitch: SearchTarget,

    /// Target mean intensity in dB; the voice's own volume when omitted
    #[arg(short, long)]
    pub intensity: Option<f64>,

    /// Syllable count of the text; estimated when omitted
    #[arg(short, long)]
    pub syllables: Option<u32>,

    /// Voice name; the configured voice when omitted
    #[arg(short, long)]
    pub voice: Option<String>,

    /// Synthesize once with the initial guess instead of searching
    #[arg(long)]
    pub no_search: bool,
}

#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// Calibration sentence
    #[arg(
        short,
        long,
        default_value = "The quick brown fox jumps over the lazy dog near the river bank."
    )]
    pub text: String,

    /// Syllable count of the sentence; estimated when omitted
    #[arg(short, long)]
    pub syllables: Option<u32>,

    /// Slowest rate modifier in percent
    #[arg(long, default_value = "-50", allow_negative_numbers = true)]
    pub min_modifier: i32,

    /// Fastest rate modifier in percent
    #[arg(long, default_value = "100", allow_negative_numbers = true)]
    pub max_modifier: i32,

    /// Modifier step in percent
    #[arg(long, default_value = "1")]
    pub step: u32,

    /// Where to write the table; the configured path when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Annotated transcript file
    pub transcript: PathBuf,

    /// Voice name; the configured voice when omitted
    #[arg(short, long)]
    pub voice: Option<String>,

    /// Synthesize each reply once instead of searching
    #[arg(long)]
    pub no_search: bool,
}

#[derive(Args, Debug)]
pub struct ImitateArgs {
    /// Transcript with `2 <syllables> <intensity> <pitch> <rate> <text...>` system turns
    pub transcript: PathBuf,

    /// Voice name; the configured voice when omitted
    #[arg(short, long)]
    pub voice: Option<String>,

    /// Synthesize each turn once instead of searching
    #[arg(long)]
    pub no_search: bool,

    /// Rescale annotated pitch from 75-500 Hz onto 50-300 Hz
    #[arg(long)]
    pub scale_pitch: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::parse_from(["entrain", "simulate", "-f", "rate", "4.5", "5.0", "3.8"]);
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.feature, Feature::Rate);
                assert_eq!(args.values, vec![4.5, 5.0, 3.8]);
            }
            _ => panic!("Expected simulate"),
        }
    }

    #[test]
    fn test_parse_synthesize_targets() {
        let cli = Cli::parse_from([
            "entrain", "--json", "synthesize", "Hello there", "--rate", "5.2", "--pitch", "140Hz", "-i", "68",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Synthesize(args) => {
                assert_eq!(args.rate, SearchTarget::Value(5.2));
                assert_eq!(args.pitch, SearchTarget::Value(140.0));
                assert_eq!(args.intensity, Some(68.0));
                assert!(!args.no_search);
            }
            _ => panic!("Expected synthesize"),
        }
    }

    #[test]
    fn test_parse_imitate_flags() {
        let cli = Cli::parse_from(["entrain", "imitate", "turns.txt", "--scale-pitch", "-v", "cmu-rms-hsmm"]);
        match cli.command {
            Commands::Imitate(args) => {
                assert_eq!(args.transcript, PathBuf::from("turns.txt"));
                assert!(args.scale_pitch);
                assert!(!args.no_search);
                assert_eq!(args.voice.as_deref(), Some("cmu-rms-hsmm"));
            }
            _ => panic!("Expected imitate"),
        }
    }

    #[test]
    fn test_parse_calibrate_negative_bounds() {
        let cli = Cli::parse_from(["entrain", "calibrate", "--min-modifier", "-30", "--step", "5"]);
        match cli.command {
            Commands::Calibrate(args) => {
                assert_eq!(args.min_modifier, -30);
                assert_eq!(args.step, 5);
            }
            _ => panic!("Expected calibrate"),
        }
    }
}
