//! Loss functions for segmentation training

use ndarray::ArrayView4;

/// Trait for loss functions over prediction/target mask batches.
///
/// Both arguments are `[B, 1, H, W]` with values in `[0, 1]`. The returned
/// value is the scalar batch loss; gradient bookkeeping stays inside the
/// model's `train_step`.
pub trait Loss {
    /// Compute the scalar loss for a batch.
    fn value(&self, predictions: ArrayView4<'_, f32>, targets: ArrayView4<'_, f32>) -> f32;

    /// Name of the loss function, as it appears in epoch logs.
    fn name(&self) -> &str;
}

/// Soft Dice loss.
///
/// `L = 1 - (2·Σ(p·t) + eps) / (Σp + Σt + eps)`
///
/// # Example
///
/// ```
/// use segmentar::train::{DiceLoss, Loss};
/// use ndarray::Array4;
///
/// let loss = DiceLoss::default();
/// let perfect = Array4::from_elem((1, 1, 4, 4), 1.0);
/// assert!(loss.value(perfect.view(), perfect.view()) < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct DiceLoss {
    /// Smoothing term keeping the ratio defined on empty masks.
    pub eps: f32,
}

impl Default for DiceLoss {
    fn default() -> Self {
        Self { eps: 1.0 }
    }
}

impl DiceLoss {
    fn soft_dice(&self, predictions: ArrayView4<'_, f32>, targets: ArrayView4<'_, f32>) -> f32 {
        let intersection: f32 = (&predictions * &targets).sum();
        let total = predictions.sum() + targets.sum();
        (2.0 * intersection + self.eps) / (total + self.eps)
    }
}

impl Loss for DiceLoss {
    fn value(&self, predictions: ArrayView4<'_, f32>, targets: ArrayView4<'_, f32>) -> f32 {
        1.0 - self.soft_dice(predictions, targets)
    }

    fn name(&self) -> &str {
        "dice_loss"
    }
}

/// Combined cross-entropy and Dice loss.
///
/// `L = 0.5·BCE + 0.5·(1 - dice)`, where BCE keeps per-pixel gradients
/// informative and the Dice term counters the class imbalance of sparse
/// water masks.
#[derive(Debug, Clone)]
pub struct XEDiceLoss {
    /// Weight of the cross-entropy term; the Dice term gets `1 - weight`.
    pub xe_weight: f32,
    dice: DiceLoss,
}

impl Default for XEDiceLoss {
    fn default() -> Self {
        Self {
            xe_weight: 0.5,
            dice: DiceLoss::default(),
        }
    }
}

impl XEDiceLoss {
    fn bce(predictions: ArrayView4<'_, f32>, targets: ArrayView4<'_, f32>) -> f32 {
        let eps = 1e-7_f32;
        let mut sum = 0.0;
        let mut count = 0usize;
        for (&p, &t) in predictions.iter().zip(targets.iter()) {
            let p = p.clamp(eps, 1.0 - eps);
            sum -= t * p.ln() + (1.0 - t) * (1.0 - p).ln();
            count += 1;
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }
}

impl Loss for XEDiceLoss {
    fn value(&self, predictions: ArrayView4<'_, f32>, targets: ArrayView4<'_, f32>) -> f32 {
        let xe = Self::bce(predictions, targets);
        let dice = self.dice.value(predictions, targets);
        self.xe_weight * xe + (1.0 - self.xe_weight) * dice
    }

    fn name(&self) -> &str {
        "xe_dice_loss"
    }
}
