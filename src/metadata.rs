use crate::error::ProcessError;
use crate::{MissingTimestamp, WatermarkConfig};
use chrono::NaiveDateTime;
use image::ImageReader;
use std::fmt;
use std::path::Path;
use tracing::{debug, trace};

/// EXIF datetime format: "2005:07:30 07:22:46"
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Capture date/time of a photograph, as recorded by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CaptureTimestamp(pub NaiveDateTime);

impl fmt::Display for CaptureTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DISPLAY_FORMAT))
    }
}

/// Parse a raw EXIF datetime value. NUL padding and surrounding whitespace are
/// ignored, nothing else is tolerated.
pub fn parse_exif_datetime(raw: &str) -> Result<CaptureTimestamp, chrono::ParseError> {
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(trimmed, EXIF_DATETIME_FORMAT).map(CaptureTimestamp)
}

/// Join prefix and timestamp into the text that gets rendered.
///
/// With `join_with_space` the separator is always present, so an empty prefix
/// yields a leading space.
pub fn display_string(
    prefix: &str,
    timestamp: &CaptureTimestamp,
    join_with_space: bool,
) -> String {
    if join_with_space || !prefix.is_empty() {
        format!("{} {}", prefix, timestamp)
    } else {
        timestamp.to_string()
    }
}

fn raw_tag_value(entry: &rexif::ExifEntry) -> String {
    match &entry.value {
        rexif::TagValue::Ascii(s) => s.clone(),
        _ => entry.value_more_readable.to_string(),
    }
}

/// Check that `image_path` holds an image the decoder can at least size up.
fn ensure_readable_image(image_path: &Path) -> Result<(), ProcessError> {
    let decode_error = |source| ProcessError::Decode {
        path: image_path.to_path_buf(),
        source,
    };
    ImageReader::open(image_path)
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .into_dimensions()
        .map_err(decode_error)?;
    Ok(())
}

/// Read the capture timestamp of the file at `image_path`.
///
/// Returns `Ok(None)` when a readable image has no EXIF block or the tag is
/// absent. A file that is not a readable image, or a tag that is present but
/// malformed, is an error.
pub fn extract_capture_timestamp(
    image_path: &Path,
    fallback_tags: bool,
) -> Result<Option<CaptureTimestamp>, ProcessError> {
    let exif = match rexif::parse_file(image_path) {
        Ok(exif) => Some(exif),
        Err(rexif::ExifError::IoError(e)) => {
            return Err(ProcessError::Decode {
                path: image_path.to_path_buf(),
                source: image::ImageError::IoError(e),
            });
        }
        Err(e) => {
            trace!("No EXIF data for {}: {}", image_path.display(), e);
            None
        }
    };

    let date_fields: &[rexif::ExifTag] = if fallback_tags {
        &[
            rexif::ExifTag::DateTimeOriginal,
            rexif::ExifTag::DateTimeDigitized,
            rexif::ExifTag::DateTime,
        ]
    } else {
        &[rexif::ExifTag::DateTimeOriginal]
    };

    for field in date_fields {
        if let Some(entry) = exif
            .iter()
            .flat_map(|exif| exif.entries.iter())
            .find(|e| e.tag == *field)
        {
            let raw = raw_tag_value(entry);
            let timestamp =
                parse_exif_datetime(&raw).map_err(|source| ProcessError::MetadataParse {
                    path: image_path.to_path_buf(),
                    value: raw.clone(),
                    source,
                })?;
            debug!("Found capture date in {:?}: {}", field, timestamp);
            return Ok(Some(timestamp));
        }
    }

    // rexif gives up on readable images that merely lack EXIF, so only a
    // container the decoder rejects counts as corrupt.
    ensure_readable_image(image_path)?;
    Ok(None)
}

/// Build the watermark text for `image_path`, or `None` when the file should
/// not be watermarked.
pub fn extract_display_string(
    image_path: &Path,
    config: &WatermarkConfig,
) -> Result<Option<String>, ProcessError> {
    match extract_capture_timestamp(image_path, config.fallback_tags)? {
        Some(timestamp) => Ok(Some(display_string(
            &config.prefix,
            &timestamp,
            config.join_with_space,
        ))),
        None => match config.missing_timestamp {
            MissingTimestamp::PrefixOnly if !config.prefix.is_empty() => {
                Ok(Some(config.prefix.clone()))
            }
            _ => Ok(None),
        },
    }
}
