//! FFmpeg execution adapter
//!
//! Compatibility transcodes, stream-copy segment extraction and concat-demuxer
//! joins, all delegated to the external `ffmpeg` binary.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::adapters::toml_config::EncoderSettings;
use crate::domain::errors::*;
use crate::domain::rules::ProgressRules;
use crate::ports::*;
use crate::utils::time::{format_seconds_arg, progress_elapsed};

/// FFmpeg-based execution adapter
pub struct FFmpegAdapter {
    runner: Arc<dyn ProcessRunner>,
    probe: Arc<dyn ProbePort>,
    ffmpeg_path: PathBuf,
    encoder: EncoderSettings,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        probe: Arc<dyn ProbePort>,
        ffmpeg_path: impl Into<PathBuf>,
        encoder: EncoderSettings,
    ) -> Self {
        Self {
            runner,
            probe,
            ffmpeg_path: ffmpeg_path.into(),
            encoder,
        }
    }

    /// Arguments for the compatibility transcode
    fn transcode_invocation(&self, input: &Path, output: &Path) -> ProcessInvocation {
        let crf = self.encoder.crf.to_string();
        ProcessInvocation::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-nostats", "-v", "error", "-y", "-i"])
            .path_arg(input)
            .args(["-c:v", self.encoder.video_codec.as_str()])
            .args(["-c:a", self.encoder.audio_codec.as_str()])
            .args(["-pix_fmt", self.encoder.pixel_format.as_str()])
            .args(["-preset", self.encoder.preset.as_str()])
            .args(["-crf", crf.as_str()])
            .args(["-movflags", "+faststart"])
            .args(["-progress", "pipe:1"])
            .args(["-f", self.encoder.container.as_str()])
            .path_arg(output)
    }

    fn extract_invocation(&self, input: &Path, start: f64, duration: f64, output: &Path) -> ProcessInvocation {
        ProcessInvocation::new(&self.ffmpeg_path)
            .args(["-v", "error", "-ss"])
            .arg(format_seconds_arg(start))
            .arg("-i")
            .path_arg(input)
            .arg("-t")
            .arg(format_seconds_arg(duration))
            .args(["-c", "copy", "-avoid_negative_ts", "make_zero", "-map", "0", "-y"])
            .path_arg(output)
    }

    fn concat_invocation(&self, manifest: &Path, output: &Path) -> ProcessInvocation {
        ProcessInvocation::new(&self.ffmpeg_path)
            .args(["-v", "error", "-f", "concat", "-safe", "0", "-i"])
            .path_arg(manifest)
            .args(["-c", "copy", "-y"])
            .path_arg(output)
    }
}

#[async_trait]
impl ExecutePort for FFmpegAdapter {
    async fn transcode_to_compat(
        &self,
        input: &Path,
        output: &Path,
        on_progress: &ProgressFn,
    ) -> Result<(), DomainError> {
        let total_duration = match self.probe.probe_duration(input).await {
            Ok(duration) => duration,
            Err(e) => {
                warn!(path = %input.display(), "Could not get duration, progress will not be reported: {}", e);
                0.0
            }
        };

        info!(path = %input.display(), output = %output.display(), total_duration, "Starting compatibility transcode");

        let invocation = self.transcode_invocation(input, output);
        let mut on_line = |line: &str| {
            if let Some(elapsed) = progress_elapsed(line) {
                if let Some(percent) = ProgressRules::percent(elapsed, total_duration) {
                    on_progress(percent);
                }
            }
        };

        let result = self
            .runner
            .run_streaming(&invocation, &mut on_line)
            .await
            .map_err(|e| DomainError::Transcode(e.to_string()))?;

        if !result.success() {
            error!(path = %input.display(), exit_code = ?result.exit_code, "ffmpeg stderr:\n{}", result.stderr);
            return Err(DomainError::Transcode(format!(
                "ffmpeg exited with code {:?}: {}",
                result.exit_code,
                result.stderr_tail(5)
            )));
        }

        debug!(path = %input.display(), "ffmpeg stderr:\n{}", result.stderr);
        info!(path = %input.display(), "Successfully transcoded to {}", output.display());
        Ok(())
    }

    async fn extract_segment(
        &self,
        input: &Path,
        start: f64,
        duration: f64,
        output: &Path,
    ) -> Result<(), DomainError> {
        debug!(path = %input.display(), start, duration, output = %output.display(), "Extracting segment");

        let result = self
            .runner
            .run(&self.extract_invocation(input, start, duration, output))
            .await
            .map_err(|e| DomainError::Extract {
                code: None,
                detail: e.to_string(),
            })?;

        if !result.success() {
            return Err(DomainError::Extract {
                code: result.exit_code,
                detail: result.stderr_tail(5),
            });
        }
        Ok(())
    }

    async fn concat_files(&self, manifest: &Path, output: &Path) -> Result<(), DomainError> {
        debug!(manifest = %manifest.display(), output = %output.display(), "Concatenating segments");

        let result = self
            .runner
            .run(&self.concat_invocation(manifest, output))
            .await
            .map_err(|e| DomainError::Concat {
                code: None,
                detail: e.to_string(),
            })?;

        if !result.success() {
            return Err(DomainError::Concat {
                code: result.exit_code,
                detail: result.stderr_tail(5),
            });
        }
        Ok(())
    }
}
