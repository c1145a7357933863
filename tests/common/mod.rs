#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tiffstamp::Config;

const ASCII: u16 = 2;
const SHORT: u16 = 3;
const LONG: u16 = 4;

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_PHOTOMETRIC: u16 = 262;
const TAG_STRIP_OFFSETS: u16 = 273;
const TAG_SAMPLES_PER_PIXEL: u16 = 277;
const TAG_ROWS_PER_STRIP: u16 = 278;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;
const TAG_EXIF_IFD: u16 = 34665;
const TAG_DATE_TIME_ORIGINAL: u16 = 36867;

/// Parameters for a hand-built, uncompressed little-endian TIFF.
pub struct TiffFixture {
    pub width: u16,
    pub height: u16,
    /// 1 for greyscale, 3 for RGB
    pub channels: u16,
    pub value: u8,
    /// Raw DateTimeOriginal value; `None` leaves out the EXIF sub-IFD entirely
    pub date_time_original: Option<String>,
}

impl Default for TiffFixture {
    fn default() -> Self {
        Self {
            width: 240,
            height: 120,
            channels: 3,
            value: 60,
            date_time_original: Some("2023:05:14 10:30:00".to_string()),
        }
    }
}

fn entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&value.to_le_bytes());
}

impl TiffFixture {
    pub fn with_date(date: &str) -> Self {
        Self {
            date_time_original: Some(date.to_string()),
            ..Self::default()
        }
    }

    pub fn without_exif() -> Self {
        Self {
            date_time_original: None,
            ..Self::default()
        }
    }

    /// File layout, each block starting on an even offset:
    ///
    /// 1. 8-byte header pointing at IFD0
    /// 2. IFD0 entries (sorted by tag, Exif IFD pointer last)
    /// 3. BitsPerSample array, RGB only (three SHORTs don't fit inline)
    /// 4. Exif IFD with the single DateTimeOriginal entry, if any
    /// 5. NUL-terminated date string, padded to even length
    /// 6. One uncompressed pixel strip covering the whole image
    pub fn to_bytes(&self) -> Vec<u8> {
        let rgb = self.channels == 3;
        let entry_count: u32 = if self.date_time_original.is_some() { 10 } else { 9 };

        let ifd0_offset: u32 = 8;
        let ifd0_len = 2 + 12 * entry_count + 4;
        let bits_offset = ifd0_offset + ifd0_len;
        let bits_len = if rgb { 6 } else { 0 };
        let exif_offset = bits_offset + bits_len;

        let mut date = self
            .date_time_original
            .as_ref()
            .map(|d| {
                let mut bytes = d.as_bytes().to_vec();
                bytes.push(0);
                bytes
            })
            .unwrap_or_default();
        if date.len() % 2 == 1 {
            date.push(0);
        }
        let exif_len = if self.date_time_original.is_some() { 2 + 12 + 4 } else { 0 };
        let date_offset = exif_offset + exif_len;
        let pixel_offset = date_offset + date.len() as u32;
        let pixel_len =
            u32::from(self.width) * u32::from(self.height) * u32::from(self.channels);

        let mut out = Vec::new();
        out.extend_from_slice(b"II");
        out.extend_from_slice(&42u16.to_le_bytes());
        out.extend_from_slice(&ifd0_offset.to_le_bytes());

        out.extend_from_slice(&(entry_count as u16).to_le_bytes());
        entry(&mut out, TAG_IMAGE_WIDTH, SHORT, 1, u32::from(self.width));
        entry(&mut out, TAG_IMAGE_LENGTH, SHORT, 1, u32::from(self.height));
        if rgb {
            entry(&mut out, TAG_BITS_PER_SAMPLE, SHORT, 3, bits_offset);
        } else {
            entry(&mut out, TAG_BITS_PER_SAMPLE, SHORT, 1, 8);
        }
        entry(&mut out, TAG_COMPRESSION, SHORT, 1, 1);
        entry(&mut out, TAG_PHOTOMETRIC, SHORT, 1, if rgb { 2 } else { 1 });
        entry(&mut out, TAG_STRIP_OFFSETS, LONG, 1, pixel_offset);
        entry(&mut out, TAG_SAMPLES_PER_PIXEL, SHORT, 1, u32::from(self.channels));
        entry(&mut out, TAG_ROWS_PER_STRIP, LONG, 1, u32::from(self.height));
        entry(&mut out, TAG_STRIP_BYTE_COUNTS, LONG, 1, pixel_len);
        if self.date_time_original.is_some() {
            entry(&mut out, TAG_EXIF_IFD, LONG, 1, exif_offset);
        }
        out.extend_from_slice(&0u32.to_le_bytes());

        if rgb {
            for _ in 0..3 {
                out.extend_from_slice(&8u16.to_le_bytes());
            }
        }

        if self.date_time_original.is_some() {
            out.extend_from_slice(&1u16.to_le_bytes());
            let count = self.date_time_original.as_ref().map_or(0, |d| d.len() + 1) as u32;
            entry(&mut out, TAG_DATE_TIME_ORIGINAL, ASCII, count, date_offset);
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&date);
        }

        assert_eq!(out.len() as u32, pixel_offset);
        out.resize(out.len() + pixel_len as usize, self.value);
        out
    }

    pub fn write(&self, path: &Path) {
        std::fs::write(path, self.to_bytes()).unwrap();
    }
}

pub fn font_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static/DejaVuSans.ttf")
}

pub fn test_config(directory: &Path) -> Config {
    let mut config = Config::default();
    config.input.directory = directory.to_path_buf();
    config.watermark.font_path = font_path();
    config.watermark.font_size = 24;
    config
}
