//! Forces arbitrary raster images into the exact square the classifier
//! expects: scale the short side to `target`, then center-crop the long side.

use std::path::Path;

use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageError, ImageFormat};

use crate::error::{AppError, Result};

/// Bicubic resampling.
pub const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

/// Longest accepted ratio between the long and the short side.
pub const MAX_ASPECT_RATIO: u32 = 20;

/// Geometry of a normalization, computed without touching pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailPlan {
    /// Already `target`×`target`.
    Keep,
    /// Resize to `scaled_*`, then take a `target`×`target` window at `(crop_x, crop_y)`.
    Transform {
        scaled_width: u32,
        scaled_height: u32,
        crop_x: u32,
        crop_y: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    Unchanged,
    Rewritten,
}

/// Returns `None` for degenerate (zero-sized) inputs.
pub fn plan(width: u32, height: u32, target: u32) -> Option<ThumbnailPlan> {
    if width == 0 || height == 0 || target == 0 {
        return None;
    }
    if width == target && height == target {
        return Some(ThumbnailPlan::Keep);
    }
    if width == height {
        return Some(ThumbnailPlan::Transform {
            scaled_width: target,
            scaled_height: target,
            crop_x: 0,
            crop_y: 0,
        });
    }

    // Long side after scaling the short side to `target`; always > target.
    let scale_long = |short: u32, long: u32| -> u32 {
        let ratio = short as f64 / target as f64;
        ((long as f64 / ratio).round() as u32).max(target)
    };

    if width < height {
        let scaled_height = scale_long(width, height);
        Some(ThumbnailPlan::Transform {
            scaled_width: target,
            scaled_height,
            crop_x: 0,
            crop_y: (scaled_height - target) / 2,
        })
    } else {
        let scaled_width = scale_long(height, width);
        Some(ThumbnailPlan::Transform {
            scaled_width,
            scaled_height: target,
            crop_x: (scaled_width - target) / 2,
            crop_y: 0,
        })
    }
}

/// Region of the source that lands in the thumbnail: the plan's crop window
/// mapped back through the scale, as `(x, y, width, height)`.
pub fn source_window(width: u32, height: u32, plan: ThumbnailPlan, target: u32) -> (u32, u32, u32, u32) {
    match plan {
        ThumbnailPlan::Keep => (0, 0, width, height),
        ThumbnailPlan::Transform { scaled_width, scaled_height, crop_x, crop_y } => {
            let back = |offset: u32, len: u32, scaled: u32| -> (u32, u32) {
                let s = len as f64 / scaled as f64;
                let start = ((offset as f64 * s).round() as u32).min(len - 1);
                let span = ((target as f64 * s).round() as u32).clamp(1, len - start);
                (start, span)
            };
            let (x, w) = back(crop_x, width, scaled_width);
            let (y, h) = back(crop_y, height, scaled_height);
            (x, y, w, h)
        }
    }
}

/// Applies a plan to a decoded image.
///
/// The crop happens on the source and only that window is resampled, so the
/// work is bounded by `target`×`target` whatever the aspect ratio.
pub fn apply(image: &DynamicImage, plan: ThumbnailPlan, target: u32) -> DynamicImage {
    if plan == ThumbnailPlan::Keep {
        return image.clone();
    }
    let (width, height) = image.dimensions();
    let (x, y, w, h) = source_window(width, height, plan, target);
    image
        .crop_imm(x, y, w, h)
        .resize_exact(target, target, RESAMPLE_FILTER)
}

/// Converts to a pixel layout the encoder for `format` accepts.
fn encodable(image: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        ImageFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8()),
        ImageFormat::Bmp if image.color().has_alpha() => DynamicImage::ImageRgba8(image.to_rgba8()),
        ImageFormat::Bmp => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ if matches!(image.color(), ColorType::Rgb32F | ColorType::Rgba32F) => {
            DynamicImage::ImageRgba16(image.to_rgba16())
        }
        _ => image,
    }
}

/// Normalizes the image at `path` in place.
///
/// A file that is already `target`×`target` is left byte-identical.
/// Otherwise it is rewritten in the format its extension names, falling back
/// to the format sniffed from its content. Images more than
/// [`MAX_ASPECT_RATIO`] times longer than wide (or the reverse) are refused.
pub fn make_thumbnail(path: &Path, target: u32) -> Result<ThumbnailOutcome> {
    let reader = image::io::Reader::open(path)?.with_guessed_format()?;
    let sniffed = reader.format();
    let img = reader.decode().map_err(|source| AppError::DecodeFailure {
        path: path.to_path_buf(),
        source,
    })?;

    let (width, height) = img.dimensions();
    let failure = AppError::ThumbnailFailure { width, height, target };
    if width.max(height) > width.min(height).saturating_mul(MAX_ASPECT_RATIO) {
        return Err(failure);
    }
    let plan = plan(width, height, target).ok_or(failure)?;
    if plan == ThumbnailPlan::Keep {
        return Ok(ThumbnailOutcome::Unchanged);
    }

    let format = ImageFormat::from_path(path)
        .ok()
        .or(sniffed)
        .ok_or(AppError::ThumbnailFailure { width, height, target })?;
    let thumb = encodable(apply(&img, plan, target), format);
    thumb.save_with_format(path, format).map_err(|e| match e {
        ImageError::IoError(io) => AppError::Io(io),
        other => {
            log::warn!("encoding {} as {:?}: {}", path.display(), format, other);
            AppError::ThumbnailFailure { width, height, target }
        }
    })?;

    log::debug!(
        "normalized {} from {}x{} to {}x{}",
        path.display(), width, height, target, target
    );
    Ok(ThumbnailOutcome::Rewritten)
}
