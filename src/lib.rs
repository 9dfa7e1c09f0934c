//! reelvault library
//!
//! Processing core of a personal video library: a single-lane queue that
//! converts files into a broadly compatible H.264/AAC MP4 in place, and a
//! keyframe-aligned export pipeline that cuts and joins segments with stream
//! copy. All media work is delegated to external `ffmpeg`/`ffprobe` binaries.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use adapters::{AppConfig, BroadcastNotifier};
pub use app::{AppContainer, DefaultAppContainer, ExportInteractor, TranscodeQueue};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::model::{ExportReport, ExportRequest, PhysicalRange, Task, TaskStatus, TimeRange};
pub use planner::SegmentPlanner;
