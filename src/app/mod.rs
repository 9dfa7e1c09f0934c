// Application layer - Use case interactors

pub mod container;
pub mod export_interactor;
pub mod transcode_queue;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use export_interactor::ExportInteractor;
pub use transcode_queue::TranscodeQueue;
