use crate::Config;
use crate::pipeline::output_directory;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Input directory does not exist: {0}")]
    InputDirectoryMissing(PathBuf),

    #[error("Input directory is not accessible: {0}")]
    InputDirectoryUnreadable(#[from] std::io::Error),

    #[error("Font file missing: {0}")]
    FontMissing(PathBuf),
}

impl StartupCheckError {
    /// Whether the batch cannot possibly succeed.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::InputDirectoryMissing(_) | Self::InputDirectoryUnreadable(_)
        )
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let input_dir = &config.input.directory;
    if !input_dir.is_dir() {
        error!("Input directory does not exist: {:?}", input_dir);
        errors.push(StartupCheckError::InputDirectoryMissing(input_dir.clone()));
    } else {
        info!("Input directory exists: {:?}", input_dir);

        match tokio::fs::read_dir(input_dir).await {
            Ok(_) => info!("Input directory is accessible"),
            Err(e) => {
                error!("Input directory is not accessible: {}", e);
                errors.push(StartupCheckError::InputDirectoryUnreadable(e));
            }
        }
    }

    let font_path = &config.watermark.font_path;
    if font_path.is_file() {
        info!("Font file found: {:?}", font_path);
    } else {
        warn!("Font file missing: {:?}", font_path);
        errors.push(StartupCheckError::FontMissing(font_path.clone()));
    }

    let output_dir = output_directory(config);
    if output_dir.exists() {
        if config.batch.overwrite {
            info!(
                "Output directory exists, files with matching names will be replaced: {:?}",
                output_dir
            );
        } else {
            info!(
                "Output directory exists, existing files will be kept: {:?}",
                output_dir
            );
        }
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
