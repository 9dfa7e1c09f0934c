//! Command implementations

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::app::AppContainer;
use crate::cli::args::{ExportArgs, KeyframesArgs, PlanArgs, TranscodeArgs};
use crate::cli::Commands;
use crate::domain::model::{ExportRequest, Task, TaskStatus, TimeRange, TimeSpec};

/// Dispatch a parsed command
pub async fn run(command: Commands, container: &dyn AppContainer) -> Result<()> {
    match command {
        Commands::Transcode(args) => transcode(args, container).await,
        Commands::Keyframes(args) => keyframes(args, container).await,
        Commands::Plan(args) => plan(args, container).await,
        Commands::Export(args) => export(args, container).await,
    }
}

/// Execute the transcode command
pub async fn transcode(args: TranscodeArgs, container: &dyn AppContainer) -> Result<()> {
    let queue = container.transcode_queue();
    let mut receiver = container.notifier().subscribe();

    let reporter = tokio::spawn(async move {
        let mut last_seen: HashMap<u64, (TaskStatus, u8)> = HashMap::new();
        loop {
            match receiver.recv().await {
                Ok(snapshot) => report_changes(&snapshot, &mut last_seen),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Progress reporter skipped {} updates", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    for input in &args.inputs {
        if queue.enqueue(input).is_none() {
            warn!(path = %input.display(), "Listed more than once, skipping");
        }
    }
    queue.wait_until_idle().await;
    reporter.abort();

    let tasks = queue.snapshot();
    let failed: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Failed)
        .collect();

    for task in &tasks {
        match &task.error {
            Some(error) => println!("{:<10} {} ({})", task.status, task.source_path.display(), error),
            None => println!("{:<10} {}", task.status, task.source_path.display()),
        }
    }

    if !failed.is_empty() {
        bail!("{} of {} files failed to transcode", failed.len(), tasks.len());
    }
    info!("Transcoded {} files", tasks.len());
    Ok(())
}

fn report_changes(snapshot: &[Task], last_seen: &mut HashMap<u64, (TaskStatus, u8)>) {
    for task in snapshot {
        let current = (task.status, task.progress);
        if last_seen.insert(task.id, current) == Some(current) {
            continue;
        }
        match task.status {
            TaskStatus::Processing => {
                info!(task_id = task.id, percent = task.progress, "{}", task.display_name)
            }
            TaskStatus::Completed => info!(task_id = task.id, "{} done", task.display_name),
            TaskStatus::Failed => warn!(task_id = task.id, "{} failed", task.display_name),
            TaskStatus::Pending => {}
        }
    }
}

/// Execute the keyframes command
pub async fn keyframes(args: KeyframesArgs, container: &dyn AppContainer) -> Result<()> {
    let keyframes = container
        .probe()
        .probe_keyframes(&args.input)
        .await
        .with_context(|| format!("Failed to read keyframes of {}", args.input.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&keyframes)
            .context("Failed to serialize keyframes to JSON")?;
        println!("{}", json);
        return Ok(());
    }

    if keyframes.is_empty() {
        println!("No keyframes found; cuts will be exact");
        return Ok(());
    }
    for keyframe in &keyframes {
        println!("{:>12.3}  {}", keyframe, TimeSpec::from_seconds(*keyframe));
    }
    println!("{} keyframes", keyframes.len());
    Ok(())
}

/// Execute the plan command
pub async fn plan(args: PlanArgs, container: &dyn AppContainer) -> Result<()> {
    let start = TimeSpec::parse(&args.start)
        .map_err(|e| anyhow::anyhow!("Invalid start time '{}': {}", args.start, e))?;
    let end = TimeSpec::parse(&args.end)
        .map_err(|e| anyhow::anyhow!("Invalid end time '{}': {}", args.end, e))?;
    let range = TimeRange::new(start.as_seconds(), end.as_seconds())?;

    let keyframes = container
        .probe()
        .probe_keyframes(&args.input)
        .await
        .with_context(|| format!("Failed to read keyframes of {}", args.input.display()))?;
    let physical = container.planner().plan(&keyframes, range.start, range.end);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&physical)?);
    } else {
        println!("Requested: {} - {}", start, end);
        println!(
            "Cut:       {} - {} (offset {:.3}s)",
            TimeSpec::from_seconds(physical.physical_start),
            TimeSpec::from_seconds(physical.physical_end),
            physical.logical_offset
        );
    }
    Ok(())
}

/// Execute the export command
pub async fn export(args: ExportArgs, container: &dyn AppContainer) -> Result<()> {
    let request = ExportRequest {
        source_path: args.input.clone(),
        ranges: args.ranges,
        output_path: args.output,
    };

    let report = container
        .export_interactor()
        .export(request)
        .await
        .with_context(|| format!("Failed to export {}", args.input.display()))?;

    let remapped = report.remap(&args.remap);

    if args.json {
        let json = serde_json::json!({
            "report": report,
            "remapped": remapped
                .iter()
                .map(|(old, new)| serde_json::json!({ "source": old, "export": new }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("Output: {}", report.output_path.display());
    if let Some(archived) = &report.archived_original {
        println!("Original archived at: {}", archived.display());
    }
    for (index, range) in report.ranges.iter().enumerate() {
        println!(
            "  #{} {} - {}",
            index,
            TimeSpec::from_seconds(range.physical_start),
            TimeSpec::from_seconds(range.physical_end)
        );
    }
    println!("Duration: {}", TimeSpec::from_seconds(report.duration));

    for timestamp in &args.remap {
        match remapped.iter().find(|(old, _)| old == timestamp) {
            Some((_, new)) => println!(
                "  {} -> {}",
                TimeSpec::from_seconds(*timestamp),
                TimeSpec::from_seconds(*new)
            ),
            None => println!("  {} -> cut", TimeSpec::from_seconds(*timestamp)),
        }
    }
    Ok(())
}
