//! Scripted stand-in for the ffmpeg/ffprobe binaries.
//!
//! Each "run" is answered from the invocation's arguments and produces the
//! files a real run would, with readable contents that tests can assert on.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reelvault_cli::adapters::{EncoderSettings, FFmpegAdapter, FFprobeAdapter, LocalStorageAdapter};
use reelvault_cli::ports::*;
use reelvault_cli::*;
use tempfile::TempDir;
use tokio::sync::Semaphore;

pub struct FakeRunner {
    pub keyframes_csv: String,
    pub duration: String,
    pub fail_transcode: HashSet<String>,
    pub fail_concat: bool,
    pub fail_keyframes: bool,
    pub gate: Semaphore,
    pub invocations: Mutex<Vec<ProcessInvocation>>,
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self {
            keyframes_csv: "0.000000,K_\n2.000000,__\n5.000000,K_\n10.000000,K_\n15.000000,K_\n".to_string(),
            duration: "20.000000\n".to_string(),
            fail_transcode: HashSet::new(),
            fail_concat: false,
            fail_keyframes: false,
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
            invocations: Mutex::new(Vec::new()),
        }
    }
}

impl FakeRunner {
    /// Encodes wait for `release` before they start
    pub fn gated() -> Self {
        Self {
            gate: Semaphore::new(0),
            ..Self::default()
        }
    }

    pub fn release(&self, encodes: usize) {
        self.gate.add_permits(encodes);
    }

    pub fn invocations(&self) -> Vec<ProcessInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    fn answer_probe(&self, args: &[String]) -> ProcessOutput {
        let stdout = if args.iter().any(|a| a == "format=duration") {
            self.duration.clone()
        } else if self.fail_keyframes {
            return failed(1, "moov atom not found");
        } else {
            self.keyframes_csv.clone()
        };
        ok(stdout)
    }

    async fn answer_ffmpeg(
        &self,
        args: &[String],
        on_line: Option<&mut (dyn for<'a> FnMut(&'a str) + Send)>,
    ) -> ProcessOutput {
        let input = PathBuf::from(value_after(args, "-i"));
        let output = PathBuf::from(args.last().cloned().unwrap_or_default());

        if args.iter().any(|a| a == "concat") {
            if self.fail_concat {
                return failed(1, "Invalid data found when processing input");
            }
            let manifest = std::fs::read_to_string(&input).unwrap();
            let mut joined = String::new();
            for line in manifest.lines() {
                let quoted = line.strip_prefix("file '").unwrap().strip_suffix('\'').unwrap();
                let path = quoted.replace(r"'\''", "'");
                joined.push_str(&std::fs::read_to_string(path).unwrap());
            }
            std::fs::write(&output, joined).unwrap();
            return ok(String::new());
        }

        if args.iter().any(|a| a == "-progress") {
            let permit = self.gate.acquire().await.unwrap();
            permit.forget();

            let name = input.file_name().unwrap().to_string_lossy().to_string();
            if self.fail_transcode.contains(&name) {
                return failed(1, "Error while decoding stream #0:0");
            }
            if let Some(on_line) = on_line {
                for line in [
                    "frame=10",
                    "out_time=00:00:02.000000",
                    "progress=continue",
                    "out_time=00:00:01.000000",
                    "out_time=00:00:10.000000",
                    "out_time=N/A",
                    "out_time=00:00:19.990000",
                    "progress=end",
                ] {
                    on_line(line);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
            let original = std::fs::read_to_string(&input).unwrap();
            std::fs::write(&output, format!("h264[{}]", original)).unwrap();
            return ok(String::new());
        }

        let start = value_after(args, "-ss");
        let duration = value_after(args, "-t");
        std::fs::write(&output, format!("[{}+{}]", start, duration)).unwrap();
        ok(String::new())
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, invocation: &ProcessInvocation) -> Result<ProcessOutput, DomainError> {
        self.invocations.lock().unwrap().push(invocation.clone());
        Ok(match invocation.program_name().as_str() {
            "ffprobe" => self.answer_probe(&invocation.args),
            _ => self.answer_ffmpeg(&invocation.args, None).await,
        })
    }

    async fn run_streaming(
        &self,
        invocation: &ProcessInvocation,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<ProcessOutput, DomainError> {
        self.invocations.lock().unwrap().push(invocation.clone());
        Ok(self.answer_ffmpeg(&invocation.args, Some(on_line)).await)
    }
}

fn value_after(args: &[String], flag: &str) -> String {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
        .unwrap_or_default()
}

fn ok(stdout: String) -> ProcessOutput {
    ProcessOutput {
        exit_code: Some(0),
        stdout,
        stderr: String::new(),
    }
}

fn failed(code: i32, stderr: &str) -> ProcessOutput {
    ProcessOutput {
        exit_code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// Adapters wired over a fake runner inside a scratch directory
pub struct Harness {
    pub temp_dir: TempDir,
    pub runner: Arc<FakeRunner>,
    pub probe: Arc<dyn ProbePort>,
    pub executor: Arc<dyn ExecutePort>,
    pub storage: Arc<dyn StoragePort>,
}

impl Harness {
    pub fn new(runner: FakeRunner) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let runner = Arc::new(runner);
        let probe: Arc<dyn ProbePort> = Arc::new(FFprobeAdapter::new(
            Arc::clone(&runner) as Arc<dyn ProcessRunner>,
            "ffprobe",
        ));
        let executor: Arc<dyn ExecutePort> = Arc::new(FFmpegAdapter::new(
            Arc::clone(&runner) as Arc<dyn ProcessRunner>,
            Arc::clone(&probe),
            "ffmpeg",
            EncoderSettings::default(),
        ));
        let storage: Arc<dyn StoragePort> =
            Arc::new(LocalStorageAdapter::new(temp_dir.path().join("staged")));
        Self {
            temp_dir,
            runner,
            probe,
            executor,
            storage,
        }
    }

    pub fn staged(&self, sub: &str) -> PathBuf {
        self.temp_dir.path().join("staged").join(sub)
    }

    /// Create a fake video whose content is its own name
    pub fn video(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join("library").join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, name).unwrap();
        path
    }
}

pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}
