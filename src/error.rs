use std::path::PathBuf;
use thiserror::Error;

/// Failure while processing a single input file.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Malformed capture timestamp {value:?} in {}: {source}", path.display())]
    MetadataParse {
        path: PathBuf,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Font file {} could not be read: {source}", path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Font file {} is not a usable font: {source}", path.display())]
    InvalidFont {
        path: PathBuf,
        #[source]
        source: ab_glyph::InvalidFont,
    },

    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failure of the batch as a whole.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Cannot read input directory {}: {source}", path.display())]
    InputDirectory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Asset(ProcessError),

    #[error("Batch aborted at {}: {source}", path.display())]
    Aborted {
        path: PathBuf,
        #[source]
        source: ProcessError,
    },

    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
