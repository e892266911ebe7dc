//! Trait seams for the external model and optimizer collaborators
//!
//! The crate never implements a network architecture or an autograd engine.
//! Training is driven through [`SegmentationModel`], whose `train_step` owns
//! the forward/backward/update mechanics, and [`Optimizer`], of which the
//! epoch loop only ever reads and mutates per-group learning rates.

use crate::train::Loss;
use crate::Result;
use ndarray::{Array4, ArrayView4};
use std::path::Path;

/// A single optimizer parameter group with a mutable learning rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamGroup {
    pub lr: f32,
}

impl ParamGroup {
    /// Create a parameter group with the given learning rate.
    pub fn new(lr: f32) -> Self {
        Self { lr }
    }
}

/// Trait for optimizers bound to a model's parameters.
///
/// The optimizer is constructed by the caller against a concrete model; the
/// training driver only adjusts learning rates on its parameter groups.
pub trait Optimizer {
    /// All parameter groups, in the order the model registered them.
    fn param_groups(&self) -> &[ParamGroup];

    /// Mutable access to the parameter groups.
    fn param_groups_mut(&mut self) -> &mut [ParamGroup];

    /// Learning rate of the first parameter group.
    fn lr(&self) -> f32 {
        self.param_groups().first().map(|g| g.lr).unwrap_or(0.0)
    }

    /// Set the learning rate of the first parameter group.
    fn set_lr(&mut self, lr: f32) {
        if let Some(group) = self.param_groups_mut().first_mut() {
            group.lr = lr;
        }
    }
}

/// Trait for segmentation models driven by the epoch runners.
///
/// Images are `[B, C, H, W]` feature batches, masks are `[B, 1, H, W]`
/// single-channel ground truth. Predictions share the mask shape with values
/// in `[0, 1]`.
pub trait SegmentationModel {
    /// Run one optimisation step over a batch and return the predictions the
    /// step was computed from, for loss/metric logging.
    fn train_step(
        &mut self,
        images: ArrayView4<'_, f32>,
        masks: ArrayView4<'_, f32>,
        loss: &dyn Loss,
        optimizer: &mut dyn Optimizer,
    ) -> Result<Array4<f32>>;

    /// Inference pass without gradient bookkeeping.
    fn predict(&self, images: ArrayView4<'_, f32>) -> Result<Array4<f32>>;

    /// Serialize the full model snapshot to `path`.
    fn save(&self, path: &Path) -> Result<()>;

    /// Restore a snapshot previously written by [`SegmentationModel::save`].
    fn load(path: &Path) -> Result<Self>
    where
        Self: Sized;
}
