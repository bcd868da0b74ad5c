//! Manip pipeline operations.
//!
//! Pure functions over [`DynamicImage`]s: nothing here touches the
//! filesystem. Decoding and encoding work on in-memory buffers so callers
//! decide where bytes come from and where they go.

use crate::error::{ErrorKind, Result};
use crate::settings::{Align, CropConfig, MAX_DIMENSION, ScaleConfig, ScaleStrategy};
use crate::{ImageFormat, Manip};
use exn::ResultExt;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage};
use std::io::Cursor;
use tracing::instrument;

const FILTER: FilterType = FilterType::Lanczos3;

/// Decode an image, guessing its format from the content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).or_raise(|| ErrorKind::Decode)
}

/// Encode an image in the given format.
///
/// Color types the target format can't represent are converted first: JPEG
/// has no alpha channel, GIF is always written as RGBA.
#[instrument(skip(image), fields(width = image.width(), height = image.height(), output_size))]
pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let converted = match (format, image.color()) {
        (ImageFormat::Jpeg, ColorType::L8 | ColorType::Rgb8) => None,
        (ImageFormat::Jpeg, ColorType::L16 | ColorType::La8 | ColorType::La16) => {
            Some(DynamicImage::ImageLuma8(image.to_luma8()))
        },
        (ImageFormat::Jpeg, _) => Some(DynamicImage::ImageRgb8(image.to_rgb8())),
        (ImageFormat::Gif, ColorType::Rgba8) => None,
        (ImageFormat::Gif, _) => Some(DynamicImage::ImageRgba8(image.to_rgba8())),
        (ImageFormat::Png, ColorType::Rgb32F | ColorType::Rgba32F) => {
            Some(DynamicImage::ImageRgba16(image.to_rgba16()))
        },
        (ImageFormat::Png, _) => None,
    };
    let image = converted.as_ref().unwrap_or(image);
    let mut output = Cursor::new(Vec::new());
    image
        .write_to(&mut output, format.as_image_format())
        .or_raise(|| ErrorKind::Encode(format.to_string()))?;
    let output = output.into_inner();
    tracing::Span::current().record("output_size", output.len());
    Ok(output)
}

/// Run every configured step of `manip` over `image`, in order: scale, crop,
/// then black and white. Unconfigured steps are skipped entirely.
pub fn apply(image: DynamicImage, manip: &Manip) -> DynamicImage {
    let mut image = image;
    if manip.scale.is_configured() {
        image = scale(&image, &manip.scale);
    }
    if manip.crop.is_configured() {
        image = crop(&image, &manip.crop);
    }
    if manip.black_and_white {
        image = black_and_white(&image);
    }
    image
}

/// Scale an image to new dimensions.
///
/// When both dimensions are set the image is resized to exactly that size.
/// Otherwise it is shrunk to fit within the target box, keeping its aspect
/// ratio; fitting never enlarges an image.
pub fn scale(image: &DynamicImage, config: &ScaleConfig) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let target = |value: Option<f64>, current: u32| -> u32 {
        let scaled = match (config.strategy, value) {
            (_, None) => current as f64,
            (ScaleStrategy::Absolute, Some(pixels)) => pixels,
            (ScaleStrategy::Relative, Some(factor)) => current as f64 * factor,
        };
        scaled.round().clamp(1.0, f64::from(MAX_DIMENSION)) as u32
    };
    let (new_width, new_height) = (target(config.horizontal, width), target(config.vertical, height));
    tracing::debug!(width, height, new_width, new_height, strategy = ?config.strategy, "Scaling image");

    match (config.horizontal, config.vertical) {
        (Some(_), Some(_)) => {
            if (new_width, new_height) == (width, height) {
                return image.clone();
            }
            image.resize_exact(new_width, new_height, FILTER)
        },
        _ => {
            let (box_width, box_height) = (new_width.min(width), new_height.min(height));
            if (box_width, box_height) == (width, height) {
                return image.clone();
            }
            image.resize(box_width, box_height, FILTER)
        },
    }
}

/// Offset of a window of `window` pixels inside `total` pixels.
fn offset(align: Align, total: u32, window: u32) -> u32 {
    match align {
        Align::Start => 0,
        Align::Middle => (total - window) / 2,
        Align::End => total - window,
    }
}

/// Crop an image to new dimensions around an anchor.
///
/// Dimensions that are unset, or larger than the image, keep the image's
/// own size along that axis.
pub fn crop(image: &DynamicImage, config: &CropConfig) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let crop_width = config.horizontal.unwrap_or(width).min(width);
    let crop_height = config.vertical.unwrap_or(height).min(height);
    let (align_x, align_y) = config.anchor.alignment();
    let x = offset(align_x, width, crop_width);
    let y = offset(align_y, height, crop_height);
    tracing::debug!(width, height, crop_width, crop_height, x, y, anchor = ?config.anchor, "Cropping image");
    image.crop_imm(x, y, crop_width, crop_height)
}

/// Convert an image to single-channel luminance.
pub fn black_and_white(image: &DynamicImage) -> DynamicImage {
    tracing::debug!("Converting image to black and white");
    DynamicImage::ImageLuma8(image.to_luma8())
}
