use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod batch;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod startup_checks;
pub mod watermark;

pub use batch::{BatchSummary, discover_tiff_files, run_batch};
pub use error::{BatchError, ProcessError};
pub use pipeline::{ProcessOutcome, SkipReason, process_one};
pub use watermark::Watermarker;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub watermark: WatermarkConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory scanned (non-recursively) for `.tif`/`.tiff` files
    pub directory: PathBuf,
    /// Output location, relative to `directory`
    pub output_subdir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub prefix: String,
    /// Always put a space between prefix and timestamp, even for an empty prefix
    pub join_with_space: bool,
    pub font_path: PathBuf,
    pub font_size: u32,
    /// Distance in pixels from the right and bottom edges
    pub margin: u32,
    pub fill: [u8; 4],
    pub missing_timestamp: MissingTimestamp,
    /// Also consider DateTimeDigitized and DateTime when DateTimeOriginal is absent
    pub fallback_tags: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingTimestamp {
    /// Leave the file out of the output entirely
    #[default]
    Skip,
    /// Watermark with the prefix alone
    PrefixOnly,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    pub overwrite: bool,
    /// Abort on the first failing file instead of counting it and moving on
    pub fail_fast: bool,
    /// Number of files processed concurrently
    pub jobs: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            output_subdir: "output".to_string(),
        }
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            prefix: "Date Taken:".to_string(),
            join_with_space: true,
            font_path: PathBuf::from("static/DejaVuSans.ttf"),
            font_size: 40,
            margin: 10,
            fill: [255, 255, 255, 128],
            missing_timestamp: MissingTimestamp::Skip,
            fallback_tags: false,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            overwrite: true,
            fail_fast: false,
            jobs: 1,
        }
    }
}
