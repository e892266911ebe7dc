//! Paired tensor datasets
//!
//! A [`TensorDataset`] keeps a batch of multi-channel feature rasters aligned
//! with their single-channel ground-truth masks and hands out ordered batch
//! views for the epoch runners.

mod io;
mod split;

pub use io::{load_data, load_tensor, save_tensor};
pub use split::train_test;

use crate::{Error, Result};
use ndarray::{concatenate, s, Array4, ArrayView3, ArrayView4, Axis};

/// Aligned feature/mask pairs.
///
/// Features are `[N, C, H, W]`, masks are `[N, 1, H, W]`. Both sequences have
/// the same length and share spatial dimensions; this is checked once at
/// construction and relied on everywhere else.
#[derive(Debug, Clone)]
pub struct TensorDataset {
    features: Array4<f32>,
    masks: Array4<f32>,
}

impl TensorDataset {
    /// Build a dataset from parallel feature and mask arrays.
    ///
    /// Fails with [`Error::ShapeMismatch`] if the sample counts differ, the
    /// spatial dimensions differ, or the masks carry more than one channel.
    pub fn new(features: Array4<f32>, masks: Array4<f32>) -> Result<Self> {
        let (n, _, h, w) = features.dim();
        let (mn, mc, mh, mw) = masks.dim();
        if mn != n || mc != 1 || mh != h || mw != w {
            return Err(Error::ShapeMismatch {
                expected: vec![n, 1, h, w],
                got: vec![mn, mc, mh, mw],
            });
        }
        Ok(Self { features, masks })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.features.dim().0
    }

    /// True if the dataset holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of feature channels per sample.
    pub fn channels(&self) -> usize {
        self.features.dim().1
    }

    /// Spatial dimensions `(height, width)`.
    pub fn spatial(&self) -> (usize, usize) {
        let (_, _, h, w) = self.features.dim();
        (h, w)
    }

    /// View over all features, `[N, C, H, W]`.
    pub fn features(&self) -> ArrayView4<'_, f32> {
        self.features.view()
    }

    /// View over all masks, `[N, 1, H, W]`.
    pub fn masks(&self) -> ArrayView4<'_, f32> {
        self.masks.view()
    }

    /// Feature/mask views of sample `index`.
    pub fn sample(&self, index: usize) -> (ArrayView3<'_, f32>, ArrayView3<'_, f32>) {
        (
            self.features.index_axis(Axis(0), index),
            self.masks.index_axis(Axis(0), index),
        )
    }

    /// Ordered, non-shuffling batch iterator. A batch size of zero is
    /// treated as one; the last batch may be short.
    pub fn batches(&self, batch_size: usize) -> Batches<'_> {
        Batches {
            dataset: self,
            batch_size: batch_size.max(1),
            start: 0,
        }
    }

    /// Materialize an independent dataset from the given sample indices.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            masks: self.masks.select(Axis(0), indices),
        }
    }

    /// Concatenate two datasets along the sample axis, `self` first.
    pub fn concat(&self, other: &TensorDataset) -> Result<Self> {
        let features = concatenate(Axis(0), &[self.features.view(), other.features.view()])
            .map_err(|_| Error::ShapeMismatch {
                expected: self.features.shape().to_vec(),
                got: other.features.shape().to_vec(),
            })?;
        let masks = concatenate(Axis(0), &[self.masks.view(), other.masks.view()]).map_err(
            |_| Error::ShapeMismatch {
                expected: self.masks.shape().to_vec(),
                got: other.masks.shape().to_vec(),
            },
        )?;
        Ok(Self { features, masks })
    }
}

/// Iterator over `(features, masks)` batch views in dataset order.
pub struct Batches<'a> {
    dataset: &'a TensorDataset,
    batch_size: usize,
    start: usize,
}

impl<'a> Iterator for Batches<'a> {
    type Item = (ArrayView4<'a, f32>, ArrayView4<'a, f32>);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.dataset.len();
        if self.start >= n {
            return None;
        }
        let end = (self.start + self.batch_size).min(n);
        let range = self.start..end;
        self.start = end;
        Some((
            self.dataset.features.slice(s![range.clone(), .., .., ..]),
            self.dataset.masks.slice(s![range, .., .., ..]),
        ))
    }
}
