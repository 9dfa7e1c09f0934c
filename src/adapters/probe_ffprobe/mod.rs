//! FFprobe adapter for media file probing
//!
//! This module provides duration and keyframe probing through the external
//! `ffprobe` binary.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::ports::*;

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    runner: Arc<dyn ProcessRunner>,
    ffprobe_path: PathBuf,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(runner: Arc<dyn ProcessRunner>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            ffprobe_path: ffprobe_path.into(),
        }
    }

    async fn run_probe(&self, invocation: ProcessInvocation, what: &str) -> Result<String, DomainError> {
        let output = self.runner.run(&invocation).await.map_err(|e| match e {
            DomainError::Spawn { program, message } => {
                DomainError::Probe(format!("could not start {}: {}", program, message))
            }
            other => other,
        })?;

        if !output.success() {
            return Err(DomainError::Probe(format!(
                "{} probe exited with code {:?}: {}",
                what,
                output.exit_code,
                output.stderr_tail(5)
            )));
        }

        Ok(output.stdout)
    }
}

/// Parse `pts_time,flags` CSV lines into sorted, deduplicated keyframe times.
///
/// Lines without a `K` flag or with an unparseable timestamp (`N/A`) are
/// dropped. Input order is not trusted.
pub fn parse_keyframe_csv(output: &str) -> Vec<f64> {
    let mut keyframes: Vec<f64> = output
        .lines()
        .filter_map(|line| {
            let mut fields = line.trim().split(',');
            let timestamp = fields.next()?.trim();
            let flags = fields.next()?;
            if !flags.contains('K') {
                return None;
            }
            timestamp.parse::<f64>().ok().filter(|t| t.is_finite())
        })
        .collect();

    keyframes.sort_by(f64::total_cmp);
    keyframes.dedup();
    keyframes
}

/// Parse the bare `format=duration` value printed by ffprobe
pub fn parse_duration(output: &str) -> Option<f64> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|duration| duration.is_finite() && *duration > 0.0)
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe_duration(&self, file_path: &Path) -> Result<f64, DomainError> {
        let invocation = ProcessInvocation::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .path_arg(file_path);

        let stdout = self.run_probe(invocation, "duration").await?;
        parse_duration(&stdout).ok_or_else(|| {
            DomainError::Probe(format!(
                "unusable duration '{}' for {}",
                stdout.trim(),
                file_path.display()
            ))
        })
    }

    async fn probe_keyframes(&self, file_path: &Path) -> Result<Vec<f64>, DomainError> {
        let invocation = ProcessInvocation::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "packet=pts_time,flags",
                "-of",
                "csv=p=0",
            ])
            .path_arg(file_path);

        let stdout = self.run_probe(invocation, "keyframe").await?;
        let keyframes = parse_keyframe_csv(&stdout);

        if keyframes.is_empty() {
            warn!(path = %file_path.display(), "No keyframes detected, cuts will not be GOP-aligned");
        } else {
            debug!(path = %file_path.display(), count = keyframes.len(), "Keyframe index built");
        }

        Ok(keyframes)
    }
}
