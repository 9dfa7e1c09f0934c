use std::sync::Arc;

use crate::adapters::{
    AppConfig, BroadcastNotifier, FFmpegAdapter, FFprobeAdapter, LocalStorageAdapter,
    TokioProcessRunner,
};
use crate::app::{export_interactor::ExportInteractor, transcode_queue::TranscodeQueue};
use crate::domain::errors::DomainError;
use crate::planner::SegmentPlanner;
use crate::ports::{ExecutePort, NotifyPort, ProbePort, ProcessRunner, StoragePort};

pub trait AppContainer: Send + Sync {
    fn transcode_queue(&self) -> TranscodeQueue;
    fn export_interactor(&self) -> Arc<ExportInteractor>;
    fn probe(&self) -> Arc<dyn ProbePort>;
    fn planner(&self) -> SegmentPlanner;
    fn notifier(&self) -> Arc<BroadcastNotifier>;
}

pub struct DefaultAppContainer {
    transcode_queue: TranscodeQueue,
    export_interactor: Arc<ExportInteractor>,
    probe_port: Arc<dyn ProbePort>,
    notifier: Arc<BroadcastNotifier>,
}

impl DefaultAppContainer {
    /// Wire the production adapters. Must be called inside a tokio runtime.
    pub fn new(config: &AppConfig) -> Result<Self, DomainError> {
        let runner = Arc::new(TokioProcessRunner::new()) as Arc<dyn ProcessRunner>;
        let probe_port = Arc::new(FFprobeAdapter::new(
            Arc::clone(&runner),
            config.ffprobe_path.clone(),
        )) as Arc<dyn ProbePort>;
        let execute_port = Arc::new(FFmpegAdapter::new(
            Arc::clone(&runner),
            Arc::clone(&probe_port),
            config.ffmpeg_path.clone(),
            config.encoder.clone(),
        )) as Arc<dyn ExecutePort>;
        let storage_port =
            Arc::new(LocalStorageAdapter::new(config.staged_path.clone())) as Arc<dyn StoragePort>;
        let notifier = Arc::new(BroadcastNotifier::default());

        let transcode_queue = TranscodeQueue::new(
            Arc::clone(&execute_port),
            Arc::clone(&storage_port),
            Arc::clone(&notifier) as Arc<dyn NotifyPort>,
        )?;

        let export_interactor = Arc::new(ExportInteractor::new(
            Arc::clone(&probe_port),
            Arc::clone(&execute_port),
            Arc::clone(&storage_port),
            SegmentPlanner::new(),
        ));

        Ok(Self {
            transcode_queue,
            export_interactor,
            probe_port,
            notifier,
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn transcode_queue(&self) -> TranscodeQueue {
        self.transcode_queue.clone()
    }

    fn export_interactor(&self) -> Arc<ExportInteractor> {
        Arc::clone(&self.export_interactor)
    }

    fn probe(&self) -> Arc<dyn ProbePort> {
        Arc::clone(&self.probe_port)
    }

    fn planner(&self) -> SegmentPlanner {
        SegmentPlanner::new()
    }

    fn notifier(&self) -> Arc<BroadcastNotifier> {
        Arc::clone(&self.notifier)
    }
}
