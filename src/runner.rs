//! Batch rendering across a bounded worker pool.
//!
//! Every template is an independent job: there is no ordering between jobs
//! and a failing job never stops its siblings. [`run_batch`] returns only
//! after every job has finished.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::debug;

use crate::error::ProcessError;
use crate::processor::{FileReport, Renderer};
use crate::settings::Resolve;

/// Result of a single template job
#[derive(Debug)]
pub struct FileResult {
    /// Template this result belongs to
    pub path: PathBuf,
    /// Success or failure status
    pub status: FileStatus,
    /// Time taken for this job
    pub duration: Duration,
}

/// Job outcome
#[derive(Debug)]
pub enum FileStatus {
    /// Output written
    Written(FileReport),
    /// Failed with error
    Failed(ProcessError),
}

/// Aggregated batch counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    pub failed: usize,
    pub unresolved: usize,
    pub bytes_written: u64,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.written + self.failed
    }
}

/// Build the worker pool; `jobs` is clamped to at least one thread
pub fn build_pool(jobs: usize) -> Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .thread_name(|idx| format!("tmpl-worker-{idx}"))
        .build()
}

/// Render a single template, capturing failure at the job boundary
pub fn render_job<R: Resolve + ?Sized>(renderer: &Renderer<'_, R>, path: &Path) -> FileResult {
    let start = Instant::now();

    let status = match renderer.render_file(path) {
        Ok(report) => FileStatus::Written(report),
        Err(e) => {
            println!("Failed to process {}: {e}", path.display());
            FileStatus::Failed(e)
        }
    };

    let duration = start.elapsed();
    debug!("{} done in {:?}", path.display(), duration);

    FileResult {
        path: path.to_path_buf(),
        status,
        duration,
    }
}

/// Render every template on `pool` and wait for all of them
pub fn run_batch<R: Resolve + ?Sized>(
    paths: &[PathBuf],
    renderer: &Renderer<'_, R>,
    pool: &ThreadPool,
) -> Vec<FileResult> {
    pool.install(|| {
        paths
            .par_iter()
            .map(|path| render_job(renderer, path))
            .collect()
    })
}

/// Aggregate counters over a finished batch
pub fn collect_results(results: &[FileResult]) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for result in results {
        match &result.status {
            FileStatus::Written(report) => {
                summary.written += 1;
                summary.unresolved += report.unresolved.len();
                summary.bytes_written += report.bytes_written;
            }
            FileStatus::Failed(_) => summary.failed += 1,
        }
    }

    summary
}
