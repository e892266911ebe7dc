//! Dataset augmentation
//!
//! Label-preserving geometric transforms applied jointly to an image and its
//! mask, plus the [`augmentation`] pass that doubles a dataset by appending
//! one transformed copy of every sample.

mod geometry;

pub use geometry::{HorizontalFlip, ShiftScaleRotate, VerticalFlip};

use crate::data::TensorDataset;
use crate::{viz, Result};
use ndarray::{Array3, Array4, Axis};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::path::Path;

/// Seed of the per-call transform generator.
///
/// Seeded once per [`augmentation`] call, not per sample: the sequence of
/// transform choices across samples is fixed, while parameters still vary
/// from sample to sample as the generator advances.
pub const AUGMENT_SEED: u64 = 7;

/// A random transform applied jointly to an image `[C, H, W]` and its mask
/// `[1, H, W]`, sampling its parameters from `rng`.
pub trait MaskTransform {
    fn apply(
        &self,
        image: Array3<f32>,
        mask: Array3<f32>,
        rng: &mut dyn RngCore,
    ) -> (Array3<f32>, Array3<f32>);
}

/// Chain of transforms applied in order.
pub struct Compose {
    transforms: Vec<Box<dyn MaskTransform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn MaskTransform>>) -> Self {
        Self { transforms }
    }

    /// Apply every transform in order to the image/mask pair.
    pub fn apply(
        &self,
        mut image: Array3<f32>,
        mut mask: Array3<f32>,
        rng: &mut dyn RngCore,
    ) -> (Array3<f32>, Array3<f32>) {
        for transform in &self.transforms {
            let (i, m) = transform.apply(image, mask, rng);
            image = i;
            mask = m;
        }
        (image, mask)
    }
}

/// The fixed composition used by [`augmentation`]: shift/scale/rotate, then
/// horizontal and vertical flips, each with probability 0.5.
pub fn default_transforms() -> Compose {
    Compose::new(vec![
        Box::new(ShiftScaleRotate::default()),
        Box::new(HorizontalFlip::default()),
        Box::new(VerticalFlip::default()),
    ])
}

/// Expand a dataset by appending one randomly transformed copy per sample.
///
/// Returns a dataset of twice the input size, original samples first. Each
/// sample is transformed independently and sequentially. With `viz_dir` set,
/// writes per-channel before/after PNGs for every sample; a debug path, not
/// meant for large datasets.
pub fn augmentation(dataset: &TensorDataset, viz_dir: Option<&Path>) -> Result<TensorDataset> {
    let transforms = default_transforms();
    let mut rng = StdRng::seed_from_u64(AUGMENT_SEED);

    let n = dataset.len();
    let channels = dataset.channels();
    let (height, width) = dataset.spatial();
    let mut augmented_features = Array4::zeros((n, channels, height, width));
    let mut augmented_masks = Array4::zeros((n, 1, height, width));

    for i in 0..n {
        let (image, mask) = dataset.sample(i);
        let (aug_image, aug_mask) = transforms.apply(image.to_owned(), mask.to_owned(), &mut rng);

        if let Some(dir) = viz_dir {
            viz::save_augment_debug(dir, i, image, mask, aug_image.view(), aug_mask.view())?;
        }

        augmented_features
            .index_axis_mut(Axis(0), i)
            .assign(&aug_image);
        augmented_masks.index_axis_mut(Axis(0), i).assign(&aug_mask);
    }

    let augmented = TensorDataset::new(augmented_features, augmented_masks)?;
    let expanded = dataset.concat(&augmented)?;
    println!("Augmentation finished");
    Ok(expanded)
}
