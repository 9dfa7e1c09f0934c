// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::rules::TimelineRemapper;

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Create a new TimeSpec from hours, minutes, seconds, milliseconds
    pub fn from_components(hours: u32, minutes: u32, seconds: u32, milliseconds: u32) -> Self {
        let total_seconds = hours as f64 * 3600.0
            + minutes as f64 * 60.0
            + seconds as f64
            + milliseconds as f64 / 1000.0;
        Self {
            seconds: total_seconds,
        }
    }

    /// Parse time string in various formats
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(DomainError::BadArgs(format!(
                    "Time must be a non-negative number: {}",
                    trimmed
                )));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        match parts.as_slice() {
            [minutes, seconds] => {
                let minutes = minutes
                    .parse::<u32>()
                    .map_err(|_| DomainError::BadArgs(format!("Invalid minutes in '{}'", trimmed)))?;
                let seconds = Self::parse_seconds_field(seconds, trimmed)?;
                Ok(Self::from_seconds(minutes as f64 * 60.0 + seconds))
            }
            [hours, minutes, seconds] => {
                let hours = hours
                    .parse::<u32>()
                    .map_err(|_| DomainError::BadArgs(format!("Invalid hours in '{}'", trimmed)))?;
                let minutes = minutes
                    .parse::<u32>()
                    .map_err(|_| DomainError::BadArgs(format!("Invalid minutes in '{}'", trimmed)))?;
                if minutes >= 60 {
                    return Err(DomainError::BadArgs(format!(
                        "Minutes must be less than 60 in '{}'",
                        trimmed
                    )));
                }
                let seconds = Self::parse_seconds_field(seconds, trimmed)?;
                Ok(Self::from_seconds(
                    hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
                ))
            }
            _ => Err(DomainError::BadArgs(format!(
                "Invalid time format '{}'. Supported formats: seconds (e.g., 123.45), MM:SS.ms (e.g., 2:30.5), HH:MM:SS.ms (e.g., 1:02:30.5)",
                trimmed
            ))),
        }
    }

    fn parse_seconds_field(field: &str, whole: &str) -> Result<f64, DomainError> {
        let seconds = field
            .parse::<f64>()
            .map_err(|_| DomainError::BadArgs(format!("Invalid seconds in '{}'", whole)))?;
        if !(0.0..60.0).contains(&seconds) {
            return Err(DomainError::BadArgs(format!(
                "Seconds must be less than 60 in '{}'",
                whole
            )));
        }
        Ok(seconds)
    }

    /// Convert to seconds
    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ms = (self.seconds * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let millis = total_ms % 1000;

        if hours > 0 {
            write!(f, "{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
        } else {
            write!(f, "{:02}:{:02}.{:03}", minutes, seconds, millis)
        }
    }
}

/// Lifecycle state of a transcode task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Pending and processing tasks count as in-flight for duplicate detection
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Processing)
    }

    /// Completed and failed tasks are removed by a clear
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.pad(label)
    }
}

/// One file's transcode lifecycle as seen by observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Queue-assigned identifier, unique for the lifetime of the queue
    pub id: u64,
    pub source_path: PathBuf,
    pub display_name: String,
    pub status: TaskStatus,
    /// 0-100
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    /// Create a new pending task for a source file
    pub fn new(id: u64, source_path: impl Into<PathBuf>) -> Self {
        let source_path = source_path.into();
        let display_name = display_name_of(&source_path);
        Self {
            id,
            source_path,
            display_name,
            status: TaskStatus::Pending,
            progress: 0,
            error: None,
        }
    }
}

/// File name component used for display, falling back to the full path
pub fn display_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// A logical time range requested by the user, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    /// Create a validated range (`0 <= start < end`)
    pub fn new(start: f64, end: f64) -> Result<Self, DomainError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(DomainError::BadArgs(
                "Range bounds must be finite numbers".to_string(),
            ));
        }
        if start < 0.0 {
            return Err(DomainError::BadArgs(format!(
                "Range start cannot be negative: {}",
                start
            )));
        }
        if start >= end {
            return Err(DomainError::BadArgs(format!(
                "Range start ({}) must be less than end ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse `START-END` where each bound is any `TimeSpec` format
    pub fn parse(range_str: &str) -> Result<Self, DomainError> {
        let (start, end) = range_str.trim().split_once('-').ok_or_else(|| {
            DomainError::BadArgs(format!(
                "Invalid range '{}'. Expected START-END, e.g. 00:03-00:12.5",
                range_str
            ))
        })?;
        let start = TimeSpec::parse(start)?;
        let end = TimeSpec::parse(end)?;
        Self::new(start.as_seconds(), end.as_seconds())
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// GOP-safe cut boundaries derived from a requested range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalRange {
    pub physical_start: f64,
    pub physical_end: f64,
    /// How far into the extracted segment the requested start lies
    pub logical_offset: f64,
}

impl PhysicalRange {
    pub fn duration(&self) -> f64 {
        self.physical_end - self.physical_start
    }
}

/// Request for the segment export pipeline
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub source_path: PathBuf,
    /// Ranges to keep, in playback order
    pub ranges: Vec<TimeRange>,
    /// Write the result here instead of replacing the source
    pub output_path: Option<PathBuf>,
}

/// Result of a finished export
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub output_path: PathBuf,
    /// Where the original went when the source was replaced in place
    pub archived_original: Option<PathBuf>,
    pub ranges: Vec<PhysicalRange>,
    /// Sum of the physical segment durations
    pub duration: f64,
}

impl ExportReport {
    /// Carry timestamps from the source timeline onto the exported one.
    ///
    /// Returns `(old, new)` pairs; timestamps that were cut away are dropped.
    pub fn remap(&self, timestamps: &[f64]) -> Vec<(f64, f64)> {
        TimelineRemapper::new(&self.ranges).remap_all(timestamps)
    }
}
