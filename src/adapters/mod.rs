// Adapters - External system implementations

pub mod broadcast_notify;
pub mod exec_ffmpeg;
pub mod probe_ffprobe;
pub mod process_tokio;
pub mod storage_local;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use broadcast_notify::BroadcastNotifier;
pub use exec_ffmpeg::FFmpegAdapter;
pub use probe_ffprobe::FFprobeAdapter;
pub use process_tokio::TokioProcessRunner;
pub use storage_local::LocalStorageAdapter;
pub use toml_config::{AppConfig, EncoderSettings, LogSettings};
pub use tracing_log::init_logging;
