// Export interactor - Keyframe-aligned multi-range export with lossless concat

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::planner::SegmentPlanner;
use crate::ports::*;
use crate::utils::fs::{move_file, replace_with_archive, timestamp_token};

const MANIFEST_NAME: &str = "concat_list.txt";
const FALLBACK_EXTENSION: &str = "mp4";

/// Interactor for the segment export use case
pub struct ExportInteractor {
    probe_port: Arc<dyn ProbePort>,
    execute_port: Arc<dyn ExecutePort>,
    storage_port: Arc<dyn StoragePort>,
    planner: SegmentPlanner,
}

impl ExportInteractor {
    /// Create new export interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        execute_port: Arc<dyn ExecutePort>,
        storage_port: Arc<dyn StoragePort>,
        planner: SegmentPlanner,
    ) -> Self {
        Self {
            probe_port,
            execute_port,
            storage_port,
            planner,
        }
    }

    /// Cut the requested ranges out of the source and join them.
    ///
    /// Without an output path the source is replaced in place and the
    /// original goes to the edited directory.
    pub async fn export(&self, request: ExportRequest) -> Result<ExportReport, DomainError> {
        let ranges = validate_ranges(&request.ranges)?;
        let source = std::path::absolute(&request.source_path)
            .map_err(|e| DomainError::fs("resolve", &request.source_path, e))?;
        tokio::fs::metadata(&source)
            .await
            .map_err(|e| DomainError::fs("read", &source, e))?;

        let output_path = match request.output_path {
            Some(output) => {
                let output = std::path::absolute(&output)
                    .map_err(|e| DomainError::fs("resolve", &output, e))?;
                if is_same_file(&source, &output).await {
                    None
                } else {
                    Some(output)
                }
            }
            None => None,
        };

        info!(
            path = %source.display(),
            ranges = ranges.len(),
            in_place = output_path.is_none(),
            "Starting export"
        );

        let work_root = self.storage_port.export_work_directory().await?;
        let work_dir = work_root.join(format!("{}_{}", file_stem_of(&source), timestamp_token()));
        tokio::fs::create_dir_all(&work_dir)
            .await
            .map_err(|e| DomainError::fs("create directory", &work_dir, e))?;

        let result = self
            .export_in(&source, &ranges, output_path.as_deref(), &work_dir)
            .await;

        if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
            debug!(path = %work_dir.display(), "Work directory cleanup failed: {}", e);
        }

        if let Ok(report) = &result {
            info!(
                output = %report.output_path.display(),
                duration = report.duration,
                "Export completed"
            );
        }
        result
    }

    async fn export_in(
        &self,
        source: &Path,
        ranges: &[TimeRange],
        output_path: Option<&Path>,
        work_dir: &Path,
    ) -> Result<ExportReport, DomainError> {
        let keyframes = self.probe_port.probe_keyframes(source).await?;
        if keyframes.is_empty() {
            warn!(path = %source.display(), "No keyframes found, cutting at the requested times");
        }

        let physical: Vec<PhysicalRange> = ranges
            .iter()
            .map(|range| cover_request(self.planner.plan(&keyframes, range.start, range.end), range))
            .collect();

        let extension = source
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());

        let mut segments = Vec::with_capacity(physical.len());
        for (index, range) in physical.iter().enumerate() {
            let segment = work_dir.join(format!("seg_{}.{}", index, extension));
            debug!(
                index,
                start = range.physical_start,
                duration = range.duration(),
                "Extracting segment"
            );
            self.execute_port
                .extract_segment(source, range.physical_start, range.duration(), &segment)
                .await?;
            segments.push(segment);
        }

        let manifest = work_dir.join(MANIFEST_NAME);
        tokio::fs::write(&manifest, concat_manifest(&segments))
            .await
            .map_err(|e| DomainError::fs("write", &manifest, e))?;

        let joined = work_dir.join(display_name_of(source));
        self.execute_port.concat_files(&manifest, &joined).await?;

        let (final_path, archived_original) = match output_path {
            Some(output) => {
                if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| DomainError::fs("create directory", parent, e))?;
                }
                move_file(&joined, output).await?;
                (output.to_path_buf(), None)
            }
            None => {
                let edited = self.storage_port.edited_directory().await?;
                let archived = replace_with_archive(source, &joined, &edited).await?;
                (source.to_path_buf(), Some(archived))
            }
        };

        let duration = physical.iter().map(PhysicalRange::duration).sum();
        Ok(ExportReport {
            output_path: final_path,
            archived_original,
            ranges: physical,
            duration,
        })
    }
}

fn validate_ranges(ranges: &[TimeRange]) -> Result<Vec<TimeRange>, DomainError> {
    if ranges.is_empty() {
        return Err(DomainError::BadArgs(
            "At least one time range is required".to_string(),
        ));
    }
    ranges
        .iter()
        .map(|range| TimeRange::new(range.start, range.end))
        .collect()
}

/// Stretch a planned cut so it contains the whole request. Only matters when
/// the request reaches outside the first or last keyframe.
fn cover_request(planned: PhysicalRange, requested: &TimeRange) -> PhysicalRange {
    let physical_start = planned.physical_start.min(requested.start);
    PhysicalRange {
        physical_start,
        physical_end: planned.physical_end.max(requested.end),
        logical_offset: requested.start - physical_start,
    }
}

/// Concat demuxer input: one `file '<path>'` line per segment
pub fn concat_manifest(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|segment| {
            let escaped = segment.to_string_lossy().replace('\'', r"'\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

/// Whether `output` names the source file, under any spelling
async fn is_same_file(source: &Path, output: &Path) -> bool {
    if source == output {
        return true;
    }
    // A path that does not exist yet cannot be the existing source
    match (
        tokio::fs::canonicalize(source).await,
        tokio::fs::canonicalize(output).await,
    ) {
        (Ok(source), Ok(output)) => source == output,
        _ => false,
    }
}

fn file_stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "export".to_string())
}
