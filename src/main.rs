use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use tiffstamp::{Config, run_batch, startup_checks};

/// Stamp the capture date onto every TIFF in a directory
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing the TIFF files
    directory: Option<PathBuf>,

    /// TOML configuration file; command line options take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Text placed before the date
    #[arg(long)]
    prefix: Option<String>,

    /// TrueType/OpenType font used for the watermark
    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(long)]
    font_size: Option<u32>,

    /// Distance from the bottom-right corner in pixels
    #[arg(long)]
    margin: Option<u32>,

    /// Text colour as r,g,b,a
    #[arg(long, value_parser = parse_rgba)]
    fill: Option<[u8; 4]>,

    /// Output directory name, created inside the input directory
    #[arg(long)]
    output_subdir: Option<String>,

    /// Number of files processed at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Keep files that already exist in the output directory
    #[arg(long)]
    no_overwrite: bool,

    /// Stop at the first file that fails
    #[arg(long)]
    fail_fast: bool,

    /// Don't put a space before the date when the prefix is empty
    #[arg(long)]
    no_leading_space: bool,

    /// Fall back to DateTimeDigitized and DateTime when DateTimeOriginal is absent
    #[arg(long)]
    fallback_tags: bool,
}

fn parse_rgba(value: &str) -> Result<[u8; 4], String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid colour component: {}", e))?;
    parts
        .try_into()
        .map_err(|_| "expected four comma-separated values: r,g,b,a".to_string())
}

impl Cli {
    fn load_config(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => {
                let config_content = std::fs::read_to_string(path)?;
                info!("Configuration loaded from: {:?}", path);
                toml_edit::de::from_str::<Config>(&config_content)?
            }
            None => Config::default(),
        };

        if let Some(directory) = &self.directory {
            config.input.directory = directory.clone();
        }
        if let Some(output_subdir) = &self.output_subdir {
            config.input.output_subdir = output_subdir.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.watermark.prefix = prefix.clone();
        }
        if let Some(font) = &self.font {
            config.watermark.font_path = font.clone();
        }
        if let Some(font_size) = self.font_size {
            config.watermark.font_size = font_size;
        }
        if let Some(margin) = self.margin {
            config.watermark.margin = margin;
        }
        if let Some(fill) = self.fill {
            config.watermark.fill = fill;
        }
        if let Some(jobs) = self.jobs {
            config.batch.jobs = jobs;
        }
        if self.no_overwrite {
            config.batch.overwrite = false;
        }
        if self.fail_fast {
            config.batch.fail_fast = true;
        }
        if self.no_leading_space {
            config.watermark.join_with_space = false;
        }
        if self.fallback_tags {
            config.watermark.fallback_tags = true;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.load_config()?;
    match toml_edit::ser::to_string_pretty(&config) {
        Ok(effective) => debug!("Effective configuration:\n{}", effective),
        Err(e) => debug!("Could not render effective configuration: {}", e),
    }

    info!("Input directory: {:?}", config.input.directory);
    info!(
        "Watermark font: {:?} at {}px",
        config.watermark.font_path, config.watermark.font_size
    );

    if let Err(errors) = startup_checks::perform_startup_checks(&config).await {
        for error in &errors {
            tracing::error!("Startup check failed: {}", error);
        }
        if errors.iter().any(|e| e.is_critical()) {
            tracing::error!("Critical startup check failed, exiting");
            return Err("Critical startup check failed".into());
        }
        // A missing font only matters once there is something to watermark
        tracing::warn!("Non-critical startup checks failed, continuing");
    }

    let summary = run_batch(&config).await?;
    if !summary.is_success() {
        tracing::error!("{} file(s) failed", summary.failed);
        std::process::exit(1);
    }

    Ok(())
}
