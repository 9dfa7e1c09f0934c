// Transcode queue - Serialized background transcoding with archive-then-replace

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::fs::{remove_dir_if_empty, remove_file_quietly, replace_with_archive, timestamp_token, FileTimes};

/// Single-lane transcode queue.
///
/// At most one task is processing at any time; pending tasks run in
/// submission order. Every state change is published to the notifier as a
/// full snapshot while the state lock is held, so observers see changes in
/// the order they happened.
#[derive(Clone)]
pub struct TranscodeQueue {
    inner: Arc<Inner>,
}

struct Inner {
    executor: Arc<dyn ExecutePort>,
    storage: Arc<dyn StoragePort>,
    notifier: Arc<dyn NotifyPort>,
    state: Mutex<QueueState>,
    idle: Notify,
    runtime: Handle,
}

#[derive(Default)]
struct QueueState {
    tasks: Vec<Task>,
    busy: bool,
    next_id: u64,
}

/// A task that has been marked processing and handed to a worker
#[derive(Debug, Clone)]
struct Job {
    id: u64,
    source_path: PathBuf,
}

impl QueueState {
    /// Mark the first pending task processing, unless something is already running
    fn claim_next(&mut self) -> Option<Job> {
        if self.busy {
            return None;
        }
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.status == TaskStatus::Pending)?;
        task.status = TaskStatus::Processing;
        task.progress = 0;
        self.busy = true;
        Some(Job {
            id: task.id,
            source_path: task.source_path.clone(),
        })
    }

    fn is_idle(&self) -> bool {
        !self.busy && !self.tasks.iter().any(|task| task.status.is_active())
    }
}

impl TranscodeQueue {
    /// Create a queue bound to the current tokio runtime
    pub fn new(
        executor: Arc<dyn ExecutePort>,
        storage: Arc<dyn StoragePort>,
        notifier: Arc<dyn NotifyPort>,
    ) -> Result<Self, DomainError> {
        let runtime = Handle::try_current()
            .map_err(|e| DomainError::Runtime(format!("Transcode queue needs a tokio runtime: {}", e)))?;

        Ok(Self {
            inner: Arc::new(Inner {
                executor,
                storage,
                notifier,
                state: Mutex::new(QueueState::default()),
                idle: Notify::new(),
                runtime,
            }),
        })
    }

    /// Submit a file for transcoding.
    ///
    /// Returns the new task id, or `None` when the path is already pending or
    /// processing.
    pub fn enqueue(&self, source_path: impl AsRef<Path>) -> Option<u64> {
        let source_path = absolute_path(source_path.as_ref());

        let (id, job) = {
            let mut state = self.inner.lock();
            let duplicate = state
                .tasks
                .iter()
                .any(|task| task.status.is_active() && task.source_path == source_path);
            if duplicate {
                debug!(path = %source_path.display(), "Already queued, ignoring");
                return None;
            }

            state.next_id += 1;
            let id = state.next_id;
            state.tasks.push(Task::new(id, source_path.clone()));
            self.inner.publish(&state);
            info!(task_id = id, path = %source_path.display(), "Queued for transcoding");

            let job = state.claim_next();
            if job.is_some() {
                self.inner.publish(&state);
            }
            (id, job)
        };

        if let Some(job) = job {
            let inner = Arc::clone(&self.inner);
            self.inner.runtime.spawn(Inner::drive(inner, job));
        }
        Some(id)
    }

    /// Drop completed and failed tasks, keeping active ones
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.tasks.retain(|task| !task.status.is_terminal());
        self.inner.publish(&state);
    }

    /// Ordered copy of the task list
    pub fn snapshot(&self) -> Vec<Task> {
        self.inner.lock().tasks.clone()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.lock().is_idle()
    }

    /// Resolve once nothing is pending or processing
    pub async fn wait_until_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // State is only written in short non-panicking sections
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &QueueState) {
        self.notifier.publish(&state.tasks);
    }

    /// Worker loop: run a job, record its outcome and pick up the next one
    /// under a single lock acquisition.
    async fn drive(inner: Arc<Inner>, first: Job) {
        let mut job = first;
        loop {
            let worker = Arc::clone(&inner);
            let running = job.clone();
            let outcome = match inner.runtime.spawn(async move { worker.process(&running).await }).await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(DomainError::Runtime(format!("Transcode worker aborted: {}", join_err))),
            };

            match inner.finish_and_claim_next(job.id, outcome) {
                Some(next) => job = next,
                None => break,
            }
        }
    }

    fn finish_and_claim_next(&self, id: u64, outcome: Result<(), DomainError>) -> Option<Job> {
        let mut state = self.lock();

        if let Some(task) = state.tasks.iter_mut().find(|task| task.id == id) {
            match outcome {
                Ok(()) => {
                    task.status = TaskStatus::Completed;
                    task.progress = 100;
                    info!(task_id = id, path = %task.source_path.display(), "Transcode completed");
                }
                Err(err) => {
                    task.status = TaskStatus::Failed;
                    task.error = Some(err.to_string());
                    error!(task_id = id, path = %task.source_path.display(), "Transcode failed: {}", err);
                }
            }
        }
        state.busy = false;
        self.publish(&state);

        let next = state.claim_next();
        if next.is_some() {
            self.publish(&state);
        } else {
            self.idle.notify_waiters();
        }
        next
    }

    /// Raise the progress of a processing task; lower or equal values are ignored
    fn update_progress(&self, id: u64, percent: u8) {
        let mut state = self.lock();
        let Some(task) = state
            .tasks
            .iter_mut()
            .find(|task| task.id == id && task.status == TaskStatus::Processing)
        else {
            return;
        };
        let percent = percent.min(100);
        if percent <= task.progress {
            return;
        }
        task.progress = percent;
        self.publish(&state);
    }

    async fn process(self: &Arc<Self>, job: &Job) -> Result<(), DomainError> {
        let source = job.source_path.as_path();
        info!(task_id = job.id, path = %source.display(), "Transcoding");

        let times = FileTimes::capture(source).await?;
        let scratch = self.storage.scratch_directory().await?;
        let temp_path = scratch.join(format!(
            "transcoded_{}_{}",
            timestamp_token(),
            display_name_of(source)
        ));

        let result = self.transcode_and_replace(job.id, source, &temp_path, times).await;
        if result.is_err() {
            remove_file_quietly(&temp_path).await;
        }
        remove_dir_if_empty(&scratch).await;
        result
    }

    async fn transcode_and_replace(
        self: &Arc<Self>,
        id: u64,
        source: &Path,
        temp_path: &Path,
        times: FileTimes,
    ) -> Result<(), DomainError> {
        let reporter = Arc::clone(self);
        let on_progress = move |percent: u8| reporter.update_progress(id, percent);
        self.executor
            .transcode_to_compat(source, temp_path, &on_progress)
            .await?;

        let archive_dir = self.storage.archive_directory().await?;
        let archived = replace_with_archive(source, temp_path, &archive_dir).await?;
        debug!(task_id = id, archived = %archived.display(), "Original archived");

        if let Err(e) = times.restore(source).await {
            warn!(task_id = id, path = %source.display(), "Could not restore timestamps: {}", e);
        }
        Ok(())
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests;
