use crate::Config;
use crate::error::ProcessError;
use crate::metadata::extract_display_string;
use crate::watermark::{Watermarker, apply_watermark};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Watermarked { output: PathBuf, text: String },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No capture timestamp in the file's metadata
    NoTimestamp,
    /// Output file already present and overwriting is disabled
    OutputExists,
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Watermarked { text, .. } => write!(f, "watermarked with {:?}", text),
            Self::Skipped(SkipReason::NoTimestamp) => write!(f, "skipped, no capture timestamp"),
            Self::Skipped(SkipReason::OutputExists) => write!(f, "skipped, output exists"),
        }
    }
}

/// Where watermarked files for this configuration end up.
pub fn output_directory(config: &Config) -> PathBuf {
    config.input.directory.join(&config.input.output_subdir)
}

/// Watermark a single file. Does no logging beyond `debug!` and touches the
/// filesystem only to read `path` and write its output.
pub fn process_one(
    path: &Path,
    config: &Config,
    watermarker: &Watermarker,
) -> Result<ProcessOutcome, ProcessError> {
    let Some(text) = extract_display_string(path, &config.watermark)? else {
        return Ok(ProcessOutcome::Skipped(SkipReason::NoTimestamp));
    };

    let output_dir = output_directory(config);
    if !config.batch.overwrite
        && let Some(name) = path.file_name()
        && output_dir.join(name).exists()
    {
        debug!("Not overwriting existing output for {}", path.display());
        return Ok(ProcessOutcome::Skipped(SkipReason::OutputExists));
    }

    let output = apply_watermark(path, &text, &output_dir, watermarker)?;
    Ok(ProcessOutcome::Watermarked { output, text })
}
