//! Mask and channel rendering
//!
//! Writes PNG files in place of an interactive plotting surface: predicted
//! and ground-truth masks on a fixed `[0, 1]` ramp, feature channels
//! normalised to their own value range.

use crate::{Error, Result};
use image::{Rgb, RgbImage};
use ndarray::{ArrayView2, ArrayView3, Axis};
use std::path::Path;

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

/// Three-stop perceptual ramp (dark violet, teal, yellow) over `[0, 1]`.
fn colormap(v: f32) -> Rgb<u8> {
    const LOW: [u8; 3] = [68, 1, 84];
    const MID: [u8; 3] = [33, 145, 140];
    const HIGH: [u8; 3] = [253, 231, 37];

    let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    let (t, lo, hi) = if v < 0.5 {
        (v / 0.5, LOW, MID)
    } else {
        ((v - 0.5) / 0.5, MID, HIGH)
    };
    Rgb([
        lerp(lo[0], hi[0], t),
        lerp(lo[1], hi[1], t),
        lerp(lo[2], hi[2], t),
    ])
}

fn write_png(path: &Path, values: ArrayView2<'_, f32>, min: f32, max: f32) -> Result<()> {
    let (height, width) = values.dim();
    let span = (max - min).max(f32::EPSILON);
    let img = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        colormap((values[[y as usize, x as usize]] - min) / span)
    });
    img.save(path)
        .map_err(|e| Error::Serialization(format!("PNG write failed for {}: {e}", path.display())))
}

/// Render a binary/probability mask on the fixed `[0, 1]` ramp.
pub fn save_mask_png(path: &Path, mask: ArrayView2<'_, f32>) -> Result<()> {
    write_png(path, mask, 0.0, 1.0)
}

/// Render a feature channel normalised to its own min/max.
pub fn save_channel_png(path: &Path, channel: ArrayView2<'_, f32>) -> Result<()> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in channel.iter() {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if min > max {
        min = 0.0;
        max = 1.0;
    }
    write_png(path, channel, min, max)
}

/// Dump every channel and the mask of one sample, before and after
/// augmentation, into `dir`.
pub(crate) fn save_augment_debug<'a>(
    dir: &Path,
    index: usize,
    image_before: ArrayView3<'a, f32>,
    mask_before: ArrayView3<'_, f32>,
    image_after: ArrayView3<'a, f32>,
    mask_after: ArrayView3<'_, f32>,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    for (label, image) in [("before", image_before), ("after", image_after)] {
        for channel in 0..image.dim().0 {
            save_channel_png(
                &dir.join(format!("sample_{index}_ch{channel}_{label}.png")),
                image.index_axis(Axis(0), channel),
            )?;
        }
    }
    save_mask_png(
        &dir.join(format!("sample_{index}_mask_before.png")),
        mask_before.index_axis(Axis(0), 0),
    )?;
    save_mask_png(
        &dir.join(format!("sample_{index}_mask_after.png")),
        mask_after.index_axis(Axis(0), 0),
    )?;
    Ok(())
}
