use crate::Config;
use crate::error::{BatchError, ProcessError};
use crate::pipeline::{ProcessOutcome, process_one};
use crate::watermark::Watermarker;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub discovered: usize,
    pub watermarked: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, outcome: &ProcessOutcome) {
        match outcome {
            ProcessOutcome::Watermarked { .. } => self.watermarked += 1,
            ProcessOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} discovered, {} watermarked, {} skipped, {} failed",
            self.discovered, self.watermarked, self.skipped, self.failed
        )
    }
}

fn is_tiff(name: &str) -> bool {
    let lower = name.to_lowercase();
    !name.starts_with('.') && (lower.ends_with(".tif") || lower.ends_with(".tiff"))
}

/// List the TIFF files directly inside `directory`, sorted by file name.
pub fn discover_tiff_files(directory: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| BatchError::InputDirectory {
            path: directory.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && let Some(name) = entry.file_name().to_str()
            && is_tiff(name)
        {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Watermark every TIFF file in the configured input directory.
///
/// Files run on blocking worker threads, `batch.jobs` at a time. Unless
/// `batch.fail_fast` is set, a failing file is logged and counted and the
/// batch carries on; a malformed capture timestamp counts as a skip. An
/// aborted batch returns only after in-flight files have finished writing.
pub async fn run_batch(config: &Config) -> Result<BatchSummary, BatchError> {
    let files = discover_tiff_files(&config.input.directory)?;
    let total = files.len();
    info!("Found {} TIFF files", total);

    let mut summary = BatchSummary {
        discovered: total,
        ..BatchSummary::default()
    };
    if files.is_empty() {
        return Ok(summary);
    }

    let watermarker = Arc::new(Watermarker::new(&config.watermark).map_err(BatchError::Asset)?);
    let config = Arc::new(config.clone());
    let jobs = config.batch.jobs.max(1);
    debug!("Processing with {} worker(s)", jobs);

    let mut pending = files.into_iter();
    let mut tasks = JoinSet::new();
    let mut done = 0;

    loop {
        while tasks.len() < jobs {
            let Some(path) = pending.next() else {
                break;
            };
            let config = Arc::clone(&config);
            let watermarker = Arc::clone(&watermarker);
            tasks.spawn_blocking(move || {
                let result = process_one(&path, &config, &watermarker);
                (path, result)
            });
        }

        let Some(joined) = tasks.join_next().await else {
            break;
        };
        let (path, result) = joined?;
        done += 1;
        let name = display_name(&path);

        match result {
            Ok(outcome) => {
                info!("[{}/{}] {}: {}", done, total, name, outcome);
                summary.record(&outcome);
            }
            Err(e) if config.batch.fail_fast => {
                error!("[{}/{}] {}: {}", done, total, name, e);
                // Queued files are cancelled; files already on a worker thread
                // can't be, so wait for them before reporting the abort.
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                return Err(BatchError::Aborted { path, source: e });
            }
            Err(e @ ProcessError::MetadataParse { .. }) => {
                warn!("[{}/{}] {}: skipped, {}", done, total, name, e);
                summary.skipped += 1;
            }
            Err(e) => {
                error!("[{}/{}] {}: {}", done, total, name, e);
                summary.failed += 1;
            }
        }
    }

    info!("Batch finished: {}", summary);
    Ok(summary)
}
