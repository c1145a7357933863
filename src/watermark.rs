use crate::WatermarkConfig;
use crate::error::ProcessError;
use ab_glyph::{FontVec, PxScale};
use image::{ColorType, DynamicImage, ImageBuffer, ImageFormat, ImageReader, Pixel, Rgba, imageops};
use imageproc::definitions::Clamp;
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-left corner of the rendered text. Not clamped to the image, so either
/// coordinate can be negative when the text is wider or taller than the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
}

/// Anchor a `text_width` x `text_height` box to the bottom-right corner.
pub fn compute_placement(
    width: u32,
    height: u32,
    text_width: u32,
    text_height: u32,
    margin: u32,
) -> Placement {
    Placement {
        x: i64::from(width) - i64::from(text_width) - i64::from(margin),
        y: i64::from(height) - i64::from(text_height) - i64::from(margin),
    }
}

/// Load a TrueType/OpenType font from disk.
pub fn load_font(path: &Path) -> Result<FontVec, ProcessError> {
    let font_data = std::fs::read(path).map_err(|source| ProcessError::Asset {
        path: path.to_path_buf(),
        source,
    })?;
    FontVec::try_from_vec(font_data).map_err(|source| ProcessError::InvalidFont {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders watermark text onto images. Holds the loaded font, so build it once
/// per batch and share it.
pub struct Watermarker {
    font: FontVec,
    scale: PxScale,
    margin: u32,
    fill: Rgba<u8>,
}

impl Watermarker {
    pub fn new(config: &WatermarkConfig) -> Result<Self, ProcessError> {
        let font = load_font(&config.font_path)?;
        debug!(
            "Loaded watermark font {} at {}px",
            config.font_path.display(),
            config.font_size
        );
        Ok(Self::with_font(
            font,
            config.font_size as f32,
            config.margin,
            config.fill,
        ))
    }

    pub fn with_font(font: FontVec, font_size: f32, margin: u32, fill: [u8; 4]) -> Self {
        Self {
            font,
            scale: PxScale::from(font_size),
            margin,
            fill: Rgba(fill),
        }
    }

    /// Rendered bounding box of `text` as (width, height).
    pub fn measure(&self, text: &str) -> (u32, u32) {
        text_size(self.scale, &self.font, text)
    }

    pub fn placement(&self, width: u32, height: u32, text: &str) -> Placement {
        let (text_width, text_height) = self.measure(text);
        compute_placement(width, height, text_width, text_height, self.margin)
    }

    /// Composite `text` over `image` and return the result in the source's
    /// colour type.
    pub fn render(&self, image: &DynamicImage, text: &str) -> DynamicImage {
        let original = image.color();
        let placement = self.placement(image.width(), image.height(), text);

        let composited = if original.bytes_per_pixel() > original.channel_count() {
            let fill = widen_fill(self.fill);
            let mut base = image.to_rgba16();
            self.composite(&mut base, fill, clear(fill), placement, text);
            DynamicImage::ImageRgba16(base)
        } else {
            let mut base = image.to_rgba8();
            self.composite(&mut base, self.fill, clear(self.fill), placement, text);
            DynamicImage::ImageRgba8(base)
        };

        restore_color_type(composited, original)
    }

    fn composite<P>(
        &self,
        base: &mut ImageBuffer<P, Vec<P::Subpixel>>,
        fill: P,
        clear: P,
        placement: Placement,
        text: &str,
    ) where
        P: Pixel,
        P::Subpixel: Into<f32> + Clamp<f32>,
    {
        // The overlay starts out tinted with the fill colour at zero alpha, so
        // antialiased edges only vary in alpha.
        let mut overlay = ImageBuffer::from_pixel(base.width(), base.height(), clear);

        draw_text_mut(
            &mut overlay,
            fill,
            to_i32(placement.x),
            to_i32(placement.y),
            self.scale,
            &self.font,
            text,
        );

        imageops::overlay(base, &overlay, 0, 0);
    }
}

fn to_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn clear<T: Copy + Default>(fill: Rgba<T>) -> Rgba<T> {
    Rgba([fill[0], fill[1], fill[2], T::default()])
}

fn widen_fill(fill: Rgba<u8>) -> Rgba<u16> {
    Rgba(fill.0.map(|c| u16::from(c) * 257))
}

/// Convert the composited RGBA buffer back to the source colour type. Sources
/// with grey+alpha come back as RGBA.
fn restore_color_type(composited: DynamicImage, original: ColorType) -> DynamicImage {
    match original {
        ColorType::L8 => DynamicImage::ImageLuma8(composited.to_luma8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(composited.to_rgb8()),
        ColorType::La8 | ColorType::Rgba8 => DynamicImage::ImageRgba8(composited.to_rgba8()),
        ColorType::L16 => DynamicImage::ImageLuma16(composited.to_luma16()),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(composited.to_rgb16()),
        ColorType::La16 | ColorType::Rgba16 => DynamicImage::ImageRgba16(composited.to_rgba16()),
        ColorType::Rgb32F => DynamicImage::ImageRgb32F(composited.to_rgb32f()),
        ColorType::Rgba32F => DynamicImage::ImageRgba32F(composited.to_rgba32f()),
        _ => composited,
    }
}

/// Decode `image_path`, watermark it with `text` and write the result to
/// `output_dir` under the same file name. Existing files are overwritten.
pub fn apply_watermark(
    image_path: &Path,
    text: &str,
    output_dir: &Path,
    watermarker: &Watermarker,
) -> Result<PathBuf, ProcessError> {
    let decode_error = |source| ProcessError::Decode {
        path: image_path.to_path_buf(),
        source,
    };
    let image = ImageReader::open(image_path)
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(decode_error)?;

    debug!(
        "Watermarking {} ({}x{}, {:?})",
        image_path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    let watermarked = watermarker.render(&image, text);

    std::fs::create_dir_all(output_dir).map_err(|source| ProcessError::CreateOutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let file_name = image_path.file_name().unwrap_or(image_path.as_os_str());
    let output_path = output_dir.join(file_name);
    watermarked
        .save_with_format(&output_path, ImageFormat::Tiff)
        .map_err(|source| ProcessError::Write {
            path: output_path.clone(),
            source,
        })?;

    Ok(output_path)
}
