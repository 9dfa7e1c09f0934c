use super::*;

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;

use crate::adapters::LocalStorageAdapter;

/// Executor that writes a marker file and reports a few progress steps.
/// Encodes block on the gate until a permit is available.
struct GatedExecutor {
    gate: Semaphore,
    fail_names: HashSet<String>,
    steps: Vec<u8>,
}

impl GatedExecutor {
    fn open() -> Self {
        Self {
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
            fail_names: HashSet::new(),
            steps: vec![10, 50, 40, 90],
        }
    }

    fn closed() -> Self {
        Self {
            gate: Semaphore::new(0),
            ..Self::open()
        }
    }

    fn failing(name: &str) -> Self {
        let mut executor = Self::open();
        executor.fail_names.insert(name.to_string());
        executor
    }
}

#[async_trait]
impl ExecutePort for GatedExecutor {
    async fn transcode_to_compat(
        &self,
        input: &Path,
        output: &Path,
        on_progress: &ProgressFn,
    ) -> Result<(), DomainError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| DomainError::Runtime(e.to_string()))?;
        permit.forget();

        let name = display_name_of(input);
        tokio::fs::write(output, format!("transcoded {}", name))
            .await
            .map_err(|e| DomainError::fs("write", output, e))?;
        for step in &self.steps {
            on_progress(*step);
        }
        if self.fail_names.contains(&name) {
            return Err(DomainError::Transcode(format!("exit code 1: cannot encode {}", name)));
        }
        Ok(())
    }

    async fn extract_segment(&self, _: &Path, _: f64, _: f64, _: &Path) -> Result<(), DomainError> {
        Ok(())
    }

    async fn concat_files(&self, _: &Path, _: &Path) -> Result<(), DomainError> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    snapshots: Mutex<Vec<Vec<Task>>>,
}

impl RecordingNotifier {
    fn snapshots(&self) -> Vec<Vec<Task>> {
        self.snapshots.lock().unwrap().clone()
    }
}

impl NotifyPort for RecordingNotifier {
    fn publish(&self, snapshot: &[Task]) {
        self.snapshots.lock().unwrap().push(snapshot.to_vec());
    }
}

struct Fixture {
    temp_dir: TempDir,
    executor: Arc<GatedExecutor>,
    notifier: Arc<RecordingNotifier>,
    queue: TranscodeQueue,
}

impl Fixture {
    fn new(executor: GatedExecutor) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let executor = Arc::new(executor);
        let notifier = Arc::new(RecordingNotifier::default());
        let storage = Arc::new(LocalStorageAdapter::new(temp_dir.path().join("staged")));
        let queue = TranscodeQueue::new(
            Arc::clone(&executor) as Arc<dyn ExecutePort>,
            storage,
            Arc::clone(&notifier) as Arc<dyn NotifyPort>,
        )
        .unwrap();
        Self {
            temp_dir,
            executor,
            notifier,
            queue,
        }
    }

    fn video(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, format!("original {}", name)).unwrap();
        path
    }

    async fn settle(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.queue.wait_until_idle())
            .await
            .expect("queue did not drain");
    }
}

fn statuses(tasks: &[Task]) -> Vec<TaskStatus> {
    tasks.iter().map(|task| task.status).collect()
}

#[test]
fn test_new_requires_runtime() {
    let temp_dir = TempDir::new().unwrap();
    let result = TranscodeQueue::new(
        Arc::new(GatedExecutor::open()),
        Arc::new(LocalStorageAdapter::new(temp_dir.path())),
        Arc::new(RecordingNotifier::default()),
    );
    assert!(matches!(result, Err(DomainError::Runtime(_))));
}

#[tokio::test]
async fn test_duplicate_enqueue_is_noop() {
    let fixture = Fixture::new(GatedExecutor::closed());
    let video = fixture.video("a.mp4");

    assert!(fixture.queue.enqueue(&video).is_some());
    assert!(fixture.queue.enqueue(&video).is_none());

    let tasks = fixture.queue.snapshot();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].display_name, "a.mp4");
    assert_eq!(tasks[0].status, TaskStatus::Processing);

    fixture.executor.gate.add_permits(1);
    fixture.settle().await;
}

#[tokio::test]
async fn test_single_task_processing_in_fifo_order() {
    let fixture = Fixture::new(GatedExecutor::closed());
    let a = fixture.video("a.mp4");
    let b = fixture.video("b.mp4");
    let c = fixture.video("c.mp4");

    fixture.queue.enqueue(&a);
    fixture.queue.enqueue(&b);
    fixture.queue.enqueue(&c);
    assert_eq!(
        statuses(&fixture.queue.snapshot()),
        vec![TaskStatus::Processing, TaskStatus::Pending, TaskStatus::Pending]
    );
    assert!(!fixture.queue.is_idle());

    fixture.executor.gate.add_permits(3);
    fixture.settle().await;

    let snapshots = fixture.notifier.snapshots();
    for snapshot in &snapshots {
        let processing = snapshot
            .iter()
            .filter(|task| task.status == TaskStatus::Processing)
            .count();
        assert!(processing <= 1);
    }

    let mut started = Vec::new();
    for snapshot in &snapshots {
        for task in snapshot {
            if task.status == TaskStatus::Processing && !started.contains(&task.id) {
                started.push(task.id);
            }
        }
    }
    let ids: Vec<u64> = fixture.queue.snapshot().iter().map(|task| task.id).collect();
    assert_eq!(started, ids);
    assert!(fixture
        .queue
        .snapshot()
        .iter()
        .all(|task| task.status == TaskStatus::Completed && task.progress == 100));
}

#[tokio::test]
async fn test_success_replaces_original_and_archives_it() {
    let fixture = Fixture::new(GatedExecutor::open());
    let video = fixture.video("clip.mov");

    fixture.queue.enqueue(&video);
    fixture.settle().await;

    assert_eq!(std::fs::read_to_string(&video).unwrap(), "transcoded clip.mov");
    let archived = fixture.temp_dir.path().join("staged/transcoded/clip.mov");
    assert_eq!(std::fs::read_to_string(archived).unwrap(), "original clip.mov");
    assert!(!fixture.temp_dir.path().join("staged/transcode_work").exists());
}

#[tokio::test]
async fn test_failure_keeps_original_and_cleans_scratch() {
    let fixture = Fixture::new(GatedExecutor::failing("bad.mp4"));
    let video = fixture.video("bad.mp4");

    fixture.queue.enqueue(&video);
    fixture.settle().await;

    let tasks = fixture.queue.snapshot();
    assert_eq!(tasks[0].status, TaskStatus::Failed);
    assert!(tasks[0].error.as_deref().unwrap().contains("cannot encode bad.mp4"));
    assert_eq!(std::fs::read_to_string(&video).unwrap(), "original bad.mp4");
    assert!(!fixture.temp_dir.path().join("staged/transcode_work").exists());
}

#[tokio::test]
async fn test_failure_does_not_stop_scheduler() {
    let fixture = Fixture::new(GatedExecutor::failing("bad.mp4"));
    let bad = fixture.video("bad.mp4");
    let good = fixture.video("good.mp4");

    fixture.queue.enqueue(&bad);
    fixture.queue.enqueue(&good);
    fixture.settle().await;

    assert_eq!(
        statuses(&fixture.queue.snapshot()),
        vec![TaskStatus::Failed, TaskStatus::Completed]
    );
}

#[tokio::test]
async fn test_missing_source_fails_task() {
    let fixture = Fixture::new(GatedExecutor::open());
    let missing = fixture.temp_dir.path().join("gone.mp4");

    fixture.queue.enqueue(&missing);
    fixture.settle().await;

    let tasks = fixture.queue.snapshot();
    assert_eq!(tasks[0].status, TaskStatus::Failed);
    assert!(tasks[0].error.is_some());
}

#[tokio::test]
async fn test_resubmission_after_terminal_state_creates_new_task() {
    let fixture = Fixture::new(GatedExecutor::open());
    let video = fixture.video("a.mp4");

    let first = fixture.queue.enqueue(&video).unwrap();
    fixture.settle().await;
    let second = fixture.queue.enqueue(&video).unwrap();
    fixture.settle().await;

    assert_ne!(first, second);
    assert_eq!(
        statuses(&fixture.queue.snapshot()),
        vec![TaskStatus::Completed, TaskStatus::Completed]
    );
}

#[tokio::test]
async fn test_clear_keeps_active_tasks() {
    let fixture = Fixture::new(GatedExecutor::closed());
    let a = fixture.video("a.mp4");
    let b = fixture.video("b.mp4");
    let c = fixture.video("c.mp4");

    fixture.queue.enqueue(&a);
    fixture.executor.gate.add_permits(1);
    tokio::time::timeout(Duration::from_secs(5), async {
        while fixture.queue.snapshot()[0].status != TaskStatus::Completed {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    fixture.queue.enqueue(&b);
    fixture.queue.enqueue(&c);
    fixture.queue.clear();

    let tasks = fixture.queue.snapshot();
    assert_eq!(statuses(&tasks), vec![TaskStatus::Processing, TaskStatus::Pending]);
    assert_eq!(tasks[0].source_path, b);

    let last = fixture.notifier.snapshots().pop().unwrap();
    assert_eq!(last, tasks);

    fixture.executor.gate.add_permits(2);
    fixture.settle().await;
}

#[tokio::test]
async fn test_progress_is_monotonic_and_bounded() {
    let fixture = Fixture::new(GatedExecutor::open());
    let video = fixture.video("a.mp4");

    let id = fixture.queue.enqueue(&video).unwrap();
    fixture.settle().await;

    let mut last = 0u8;
    let mut seen = Vec::new();
    for snapshot in fixture.notifier.snapshots() {
        let task = snapshot.iter().find(|task| task.id == id).unwrap();
        assert!(task.progress <= 100);
        if task.status == TaskStatus::Processing {
            assert!(task.progress >= last);
            last = task.progress;
            if seen.last() != Some(&task.progress) {
                seen.push(task.progress);
            }
        }
    }
    // The regression from 50 to 40 is dropped
    assert_eq!(seen, vec![0, 10, 50, 90]);
}

#[tokio::test]
async fn test_wait_until_idle_on_empty_queue() {
    let fixture = Fixture::new(GatedExecutor::open());
    assert!(fixture.queue.is_idle());
    fixture.settle().await;
}
