//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::domain::model::{TimeRange, TimeSpec};

/// Arguments for the transcode command
#[derive(Args, Debug)]
pub struct TranscodeArgs {
    /// Video files to convert in place (originals are archived)
    #[arg(short, long = "in", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,
}

/// Arguments for the keyframes command
#[derive(Args, Debug)]
pub struct KeyframesArgs {
    /// Input video file path
    #[arg(short, long = "in")]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Input video file path
    #[arg(short, long = "in")]
    pub input: PathBuf,

    /// Start time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub start: String,

    /// End time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub end: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Input video file path
    #[arg(short, long = "in")]
    pub input: PathBuf,

    /// Range to keep as START-END, repeatable; kept in the given order
    #[arg(short, long = "range", required = true, value_parser = parse_range)]
    pub ranges: Vec<TimeRange>,

    /// Write here instead of replacing the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Source timestamps (e.g. screenshot marks) to translate onto the exported timeline, repeatable
    #[arg(long = "remap", value_parser = parse_time)]
    pub remap: Vec<f64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_time(value: &str) -> Result<f64, String> {
    TimeSpec::parse(value)
        .map(|time| time.as_seconds())
        .map_err(|e| e.to_string())
}

fn parse_range(value: &str) -> Result<TimeRange, String> {
    TimeRange::parse(value).map_err(|e| e.to_string())
}
