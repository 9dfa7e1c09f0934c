//! CLI module for reelvault
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::AppConfig;

pub mod args;
pub mod commands;

/// reelvault - video library processing
///
/// Converts files into a broadly compatible H.264/AAC MP4 in place and cuts
/// keyframe-aligned segments without re-encoding.
#[derive(Parser, Debug)]
#[command(name = "reelvault")]
#[command(about = "reelvault - compatibility transcoding and lossless segment export")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: $REELVAULT_CONFIG or ./reelvault.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Root for archive and working directories
    #[arg(long, global = true)]
    pub staged_path: Option<PathBuf>,

    /// ffmpeg binary
    #[arg(long, global = true)]
    pub ffmpeg: Option<PathBuf>,

    /// ffprobe binary
    #[arg(long, global = true)]
    pub ffprobe: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Layer command-line flags over the loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if self.json_logs {
            config.log.json = true;
        }
        if let Some(path) = &self.staged_path {
            config.staged_path = path.clone();
        }
        if let Some(path) = &self.ffmpeg {
            config.ffmpeg_path = path.clone();
        }
        if let Some(path) = &self.ffprobe {
            config.ffprobe_path = path.clone();
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert files to H.264/AAC MP4 in place, one at a time
    Transcode(args::TranscodeArgs),
    /// List the keyframe timestamps of a file
    Keyframes(args::KeyframesArgs),
    /// Show the keyframe-aligned cut for a time range
    Plan(args::PlanArgs),
    /// Keep only the given ranges of a file, without re-encoding
    Export(args::ExportArgs),
}
