//! The draw pass.
//!
//! Composes every monitor's image into one buffer covering the virtual screen.
//! The buffer and the per-monitor copies are owned by a single pass and are
//! dropped on every exit path, including errors.

use crate::backend::Rgb;
use crate::loader::SourceImage;
use common::placement::{self, Placement};
use common::{ImageMode, Monitor, Result, WallpaperError};
use image::RgbaImage;

/// What a draw pass put where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorPlacement {
    pub monitor: Monitor,
    pub image_index: usize,
    pub placement: Placement,
}

/// Allocate a `width`x`height` buffer filled with `color`.
pub fn allocate_buffer(width: u32, height: u32, color: Rgb) -> Result<RgbaImage> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .filter(|&n| n > 0)
        .ok_or_else(|| {
            WallpaperError::Allocation(format!("cannot allocate buffer of {width}x{height}"))
        })?;

    let mut raw = Vec::new();
    raw.try_reserve_exact(len).map_err(|_| {
        WallpaperError::Allocation(format!("cannot allocate buffer of {width}x{height}"))
    })?;
    raw.resize(len, 0);

    let fill = [color.r, color.g, color.b, 255];
    for pixel in raw.chunks_exact_mut(4) {
        pixel.copy_from_slice(&fill);
    }

    RgbaImage::from_raw(width, height, raw)
        .ok_or_else(|| WallpaperError::Allocation("cannot allocate buffer".to_string()))
}

/// Copy an image into a freshly allocated buffer.
fn clone_image(source: &RgbaImage) -> Result<RgbaImage> {
    let mut raw = Vec::new();
    raw.try_reserve_exact(source.as_raw().len())
        .map_err(|_| WallpaperError::Decode("cannot clone image".to_string()))?;
    raw.extend_from_slice(source.as_raw());

    RgbaImage::from_raw(source.width(), source.height(), raw)
        .ok_or_else(|| WallpaperError::Decode("cannot clone image".to_string()))
}

/// Lanczos3 resize using fast_image_resize
fn resize_image_fast(image: &RgbaImage, target_width: u32, target_height: u32) -> Result<RgbaImage> {
    use fast_image_resize as fr;

    let src = fr::images::Image::from_vec_u8(
        image.width(),
        image.height(),
        image.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| WallpaperError::Decode(format!("cannot resample image: {e}")))?;

    let mut dst = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(
            &src,
            &mut dst,
            &fr::ResizeOptions::new()
                .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3)),
        )
        .map_err(|e| WallpaperError::Decode(format!("cannot resample image: {e}")))?;

    RgbaImage::from_raw(target_width, target_height, dst.into_vec())
        .ok_or_else(|| WallpaperError::Decode("cannot resample image".to_string()))
}

/// Blend `image` onto `buffer` as laid out by `placement`.
fn blend(buffer: &mut RgbaImage, image: &RgbaImage, placement: &Placement) -> Result<()> {
    let (width, height) = (placement.width as u32, placement.height as u32);

    if image.dimensions() == (width, height) {
        image::imageops::overlay(buffer, image, placement.x as i64, placement.y as i64);
    } else {
        let scaled = resize_image_fast(image, width, height)?;
        image::imageops::overlay(buffer, &scaled, placement.x as i64, placement.y as i64);
    }

    Ok(())
}

/// Compose `images` onto a `width`x`height` buffer, one image per monitor.
///
/// Monitor `i` shows image `i % images.len()`. Returns the finished buffer
/// and the placement used for every monitor.
pub fn compose(
    images: &[SourceImage],
    monitors: &[Monitor],
    (width, height): (u32, u32),
    background: Rgb,
    mode: ImageMode,
    rotate: bool,
) -> Result<(RgbaImage, Vec<MonitorPlacement>)> {
    let mut buffer = allocate_buffer(width, height, background)?;
    let mut placements = Vec::with_capacity(monitors.len());

    for (i, monitor) in monitors.iter().enumerate() {
        let Some(index) = placement::image_index_for(i, images.len()) else {
            return Err(WallpaperError::Decode("no image to draw".to_string()));
        };
        let source = &images[index];

        let mut tile = clone_image(source.pixels())?;
        let placement = placement::place(
            tile.width() as i32,
            tile.height() as i32,
            monitor,
            mode,
            rotate,
        );
        if placement.rotated {
            tile = image::imageops::rotate90(&tile);
        }

        log::debug!(
            "Monitor {} ({}): image {} at {}x{}+{}+{}{}",
            i,
            monitor,
            index,
            placement.width,
            placement.height,
            placement.x,
            placement.y,
            if placement.rotated { " (rotated)" } else { "" }
        );

        if placement.is_visible() {
            blend(&mut buffer, &tile, &placement)?;
        } else {
            log::debug!("Monitor {}: nothing to blend", i);
        }

        placements.push(MonitorPlacement {
            monitor: *monitor,
            image_index: index,
            placement,
        });
    }

    Ok((buffer, placements))
}
