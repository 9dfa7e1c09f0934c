// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// A single external program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ProcessInvocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument
    pub fn path_arg(self, path: &Path) -> Self {
        let arg = path.to_string_lossy().to_string();
        self.arg(arg)
    }

    /// Program name used in logs and errors
    pub fn program_name(&self) -> String {
        display_name_of(&self.program)
    }
}

/// Exit status and captured output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Last few stderr lines, for error messages
    pub fn stderr_tail(&self, max_lines: usize) -> String {
        let lines: Vec<&str> = self
            .stderr
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        let start = lines.len().saturating_sub(max_lines);
        lines[start..].join("\n")
    }
}

/// Port for spawning the external encoder/prober binaries
///
/// `Err` is reserved for failures to start or wait on the process. A process
/// that ran and exited non-zero is an `Ok` output with a failing exit code.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion, capturing stdout and stderr
    async fn run(&self, invocation: &ProcessInvocation) -> Result<ProcessOutput, DomainError>;

    /// Run to completion, handing each stdout line to `on_line` as it arrives
    async fn run_streaming(
        &self,
        invocation: &ProcessInvocation,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<ProcessOutput, DomainError>;
}

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Total container duration in seconds
    async fn probe_duration(&self, file_path: &Path) -> Result<f64, DomainError>;

    /// Ascending, deduplicated keyframe timestamps of the first video stream
    async fn probe_keyframes(&self, file_path: &Path) -> Result<Vec<f64>, DomainError>;
}

/// Progress callback, receives whole percentages in `[0, 100]`
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

/// Port for video execution and processing
#[async_trait]
pub trait ExecutePort: Send + Sync {
    /// Re-encode into a broadly compatible H.264/AAC MP4
    async fn transcode_to_compat(
        &self,
        input: &Path,
        output: &Path,
        on_progress: &ProgressFn,
    ) -> Result<(), DomainError>;

    /// Stream-copy `duration` seconds starting at `start`
    async fn extract_segment(
        &self,
        input: &Path,
        start: f64,
        duration: f64,
        output: &Path,
    ) -> Result<(), DomainError>;

    /// Stream-copy the files listed in a concat manifest into one output
    async fn concat_files(&self, manifest: &Path, output: &Path) -> Result<(), DomainError>;
}

/// Port resolving working and archive directories
///
/// Every accessor creates its directory when it does not exist yet.
#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Scratch area for in-progress transcode outputs
    async fn scratch_directory(&self) -> Result<PathBuf, DomainError>;

    /// Originals displaced by a successful transcode
    async fn archive_directory(&self) -> Result<PathBuf, DomainError>;

    /// Originals displaced by an in-place export
    async fn edited_directory(&self) -> Result<PathBuf, DomainError>;

    /// Root for per-export working directories
    async fn export_work_directory(&self) -> Result<PathBuf, DomainError>;
}

/// Port pushing task list snapshots to observers
///
/// Called while queue state is locked: implementations must return quickly
/// and must not call back into the queue.
pub trait NotifyPort: Send + Sync {
    fn publish(&self, snapshot: &[Task]);
}
