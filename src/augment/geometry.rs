//! Geometric transforms
//!
//! All transforms operate on channel-first `[C, H, W]` arrays and treat the
//! mask exactly like the image geometrically, so labels stay aligned. Border
//! handling is reflect-101 (edge pixel not repeated); images are resampled
//! bilinearly, masks with nearest-neighbour so they stay binary.

use super::MaskTransform;
use ndarray::{s, Array3};
use rand::{Rng, RngCore};

// RandomShiftScaleRotate

/// Randomly translate, scale and rotate the pair around the image centre
/// with probability `p`.
///
/// Shift is drawn per axis as a fraction of the side length from
/// `[-shift_limit, shift_limit]`, scale from `[1 - scale_limit,
/// 1 + scale_limit]`, rotation in degrees from `[-rotate_limit,
/// rotate_limit]`.
#[derive(Debug, Clone)]
pub struct ShiftScaleRotate {
    pub shift_limit: f64,
    pub scale_limit: f64,
    pub rotate_limit: f64,
    pub p: f64,
}

impl ShiftScaleRotate {
    pub fn new(shift_limit: f64, scale_limit: f64, rotate_limit: f64, p: f64) -> Self {
        Self {
            shift_limit,
            scale_limit,
            rotate_limit,
            p,
        }
    }
}

impl Default for ShiftScaleRotate {
    fn default() -> Self {
        Self::new(0.0625, 0.1, 45.0, 0.5)
    }
}

impl MaskTransform for ShiftScaleRotate {
    fn apply(
        &self,
        image: Array3<f32>,
        mask: Array3<f32>,
        rng: &mut dyn RngCore,
    ) -> (Array3<f32>, Array3<f32>) {
        if rng.gen::<f64>() >= self.p {
            return (image, mask);
        }

        let (_, height, width) = image.dim();
        let angle = rng
            .gen_range(-self.rotate_limit..=self.rotate_limit)
            .to_radians();
        let scale = 1.0 + rng.gen_range(-self.scale_limit..=self.scale_limit);
        let dx = rng.gen_range(-self.shift_limit..=self.shift_limit) * width as f64;
        let dy = rng.gen_range(-self.shift_limit..=self.shift_limit) * height as f64;

        let warped_image = warp(&image, angle, scale, dx, dy, false);
        let warped_mask = warp(&mask, angle, scale, dx, dy, true);
        (warped_image, warped_mask)
    }
}

// RandomHorizontalFlip

/// Flip the pair along the width axis with probability `p`.
#[derive(Debug, Clone)]
pub struct HorizontalFlip {
    pub p: f64,
}

impl HorizontalFlip {
    pub fn new(p: f64) -> Self {
        Self { p }
    }
}

impl Default for HorizontalFlip {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl MaskTransform for HorizontalFlip {
    fn apply(
        &self,
        image: Array3<f32>,
        mask: Array3<f32>,
        rng: &mut dyn RngCore,
    ) -> (Array3<f32>, Array3<f32>) {
        if rng.gen::<f64>() >= self.p {
            return (image, mask);
        }
        (
            image.slice(s![.., .., ..;-1]).to_owned(),
            mask.slice(s![.., .., ..;-1]).to_owned(),
        )
    }
}

// RandomVerticalFlip

/// Flip the pair along the height axis with probability `p`.
#[derive(Debug, Clone)]
pub struct VerticalFlip {
    pub p: f64,
}

impl VerticalFlip {
    pub fn new(p: f64) -> Self {
        Self { p }
    }
}

impl Default for VerticalFlip {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl MaskTransform for VerticalFlip {
    fn apply(
        &self,
        image: Array3<f32>,
        mask: Array3<f32>,
        rng: &mut dyn RngCore,
    ) -> (Array3<f32>, Array3<f32>) {
        if rng.gen::<f64>() >= self.p {
            return (image, mask);
        }
        (
            image.slice(s![.., ..;-1, ..]).to_owned(),
            mask.slice(s![.., ..;-1, ..]).to_owned(),
        )
    }
}

// Affine resampling

/// Inverse-map every output pixel through the affine transform and resample.
fn warp(
    source: &Array3<f32>,
    angle: f64,
    scale: f64,
    dx: f64,
    dy: f64,
    nearest: bool,
) -> Array3<f32> {
    let (channels, height, width) = source.dim();
    let cy = (height as f64 - 1.0) / 2.0;
    let cx = (width as f64 - 1.0) / 2.0;
    let cos = angle.cos();
    let sin = angle.sin();

    let mut out = Array3::zeros((channels, height, width));
    for y in 0..height {
        for x in 0..width {
            let tx = x as f64 - dx - cx;
            let ty = y as f64 - dy - cy;
            let sx = (tx * cos + ty * sin) / scale + cx;
            let sy = (-tx * sin + ty * cos) / scale + cy;
            for ch in 0..channels {
                out[[ch, y, x]] = if nearest {
                    sample_nearest(source, ch, sy, sx)
                } else {
                    sample_bilinear(source, ch, sy, sx)
                };
            }
        }
    }
    out
}

/// Reflect an index into `[0, len)` without repeating the edge pixel.
fn reflect_101(index: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let mut i = index % period;
    if i < 0 {
        i += period;
    }
    if i >= len as isize {
        i = period - i;
    }
    i as usize
}

fn sample_nearest(source: &Array3<f32>, channel: usize, sy: f64, sx: f64) -> f32 {
    let (_, height, width) = source.dim();
    let y = reflect_101(sy.round() as isize, height);
    let x = reflect_101(sx.round() as isize, width);
    source[[channel, y, x]]
}

fn sample_bilinear(source: &Array3<f32>, channel: usize, sy: f64, sx: f64) -> f32 {
    let (_, height, width) = source.dim();
    let y0 = sy.floor();
    let x0 = sx.floor();
    let fy = (sy - y0) as f32;
    let fx = (sx - x0) as f32;

    let y0i = reflect_101(y0 as isize, height);
    let y1i = reflect_101(y0 as isize + 1, height);
    let x0i = reflect_101(x0 as isize, width);
    let x1i = reflect_101(x0 as isize + 1, width);

    let top = source[[channel, y0i, x0i]] * (1.0 - fx) + source[[channel, y0i, x1i]] * fx;
    let bottom = source[[channel, y1i, x0i]] * (1.0 - fx) + source[[channel, y1i, x1i]] * fx;
    top * (1.0 - fy) + bottom * fy
}
