//! Evaluation metrics for segmentation masks

use ndarray::ArrayView4;

/// Trait for evaluation metrics over prediction/target mask batches.
pub trait Metric {
    /// Compute the metric given predictions and targets, both `[B, 1, H, W]`.
    fn compute(&self, predictions: ArrayView4<'_, f32>, targets: ArrayView4<'_, f32>) -> f32;

    /// Name of the metric, as it appears in epoch logs.
    fn name(&self) -> &str;

    /// Whether higher values are better (true) or lower (false).
    fn higher_is_better(&self) -> bool {
        true
    }
}

/// Counts of thresholded pixel agreement shared by the metrics below.
fn confusion(
    predictions: ArrayView4<'_, f32>,
    targets: ArrayView4<'_, f32>,
    threshold: f32,
) -> (f32, f32, f32) {
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut fn_ = 0.0;
    for (&p, &t) in predictions.iter().zip(targets.iter()) {
        let p = (p >= threshold) as u8 as f32;
        let t = (t > 0.5) as u8 as f32;
        tp += p * t;
        fp += p * (1.0 - t);
        fn_ += (1.0 - p) * t;
    }
    (tp, fp, fn_)
}

/// Intersection-over-union (Jaccard index) of thresholded predictions.
#[derive(Debug, Clone)]
pub struct IoUScore {
    /// Prediction binarization threshold.
    pub threshold: f32,
    eps: f32,
}

impl IoUScore {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            eps: 1e-7,
        }
    }
}

impl Default for IoUScore {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Metric for IoUScore {
    fn compute(&self, predictions: ArrayView4<'_, f32>, targets: ArrayView4<'_, f32>) -> f32 {
        let (tp, fp, fn_) = confusion(predictions, targets, self.threshold);
        (tp + self.eps) / (tp + fp + fn_ + self.eps)
    }

    fn name(&self) -> &str {
        "iou_score"
    }
}

/// F-beta score of thresholded predictions (beta = 1 gives F1).
#[derive(Debug, Clone)]
pub struct FScore {
    pub beta: f32,
    /// Prediction binarization threshold.
    pub threshold: f32,
    eps: f32,
}

impl FScore {
    pub fn new(beta: f32, threshold: f32) -> Self {
        Self {
            beta,
            threshold,
            eps: 1e-7,
        }
    }
}

impl Default for FScore {
    fn default() -> Self {
        Self::new(1.0, 0.5)
    }
}

impl Metric for FScore {
    fn compute(&self, predictions: ArrayView4<'_, f32>, targets: ArrayView4<'_, f32>) -> f32 {
        let (tp, fp, fn_) = confusion(predictions, targets, self.threshold);
        let beta2 = self.beta * self.beta;
        ((1.0 + beta2) * tp + self.eps) / ((1.0 + beta2) * tp + beta2 * fn_ + fp + self.eps)
    }

    fn name(&self) -> &str {
        "fscore"
    }
}
