//! Fit configuration and epoch logs

use std::collections::BTreeMap;
use std::fmt;

/// Epoch indices at which an intermediate checkpoint is written.
///
/// A fixed list, not scaled to the configured epoch count.
pub const DEFAULT_CHECKPOINT_EPOCHS: [usize; 5] = [10, 20, 30, 40, 50];

/// Learning rate applied to the first parameter group late in training.
pub const DEFAULT_LATE_LR: f32 = 2e-6;

/// Fraction of the epoch budget after which the learning rate drops.
pub const DEFAULT_LR_DROP_FRACTION: f64 = 0.8;

/// Fraction of the fit dataset kept for training (the rest validates).
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.95;

/// Configuration bundle for [`crate::ModelExplorer::fit`].
///
/// The checkpoint epochs, the late learning rate and the drop point default
/// to the historical policy above; override them only when deliberately
/// departing from it.
#[derive(Clone, Debug)]
pub struct FitConfig {
    /// Training batch size.
    pub batch_size: usize,

    /// Number of epochs to run.
    pub epochs: usize,

    /// Fraction of samples kept for the training half of the internal split.
    pub train_fraction: f64,

    /// Fraction of `epochs` after which the first param group drops to
    /// `late_lr`.
    pub lr_drop_fraction: f64,

    /// Learning rate applied at the drop point.
    pub late_lr: f32,

    /// Epoch indices that write an intermediate checkpoint.
    pub checkpoint_epochs: Vec<usize>,

    /// Print per-epoch progress to stdout.
    pub verbose: bool,
}

impl FitConfig {
    /// Create a configuration with the default policy.
    pub fn new(batch_size: usize, epochs: usize) -> Self {
        Self {
            batch_size,
            epochs,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            lr_drop_fraction: DEFAULT_LR_DROP_FRACTION,
            late_lr: DEFAULT_LATE_LR,
            checkpoint_epochs: DEFAULT_CHECKPOINT_EPOCHS.to_vec(),
            verbose: true,
        }
    }

    /// Override the intermediate checkpoint epochs.
    pub fn with_checkpoint_epochs(mut self, epochs: Vec<usize>) -> Self {
        self.checkpoint_epochs = epochs;
        self
    }

    /// Override the late learning rate.
    pub fn with_late_lr(mut self, lr: f32) -> Self {
        self.late_lr = lr;
        self
    }

    /// Silence per-epoch progress output.
    pub fn quiet(mut self) -> Self {
        self.verbose = false;
        self
    }

    /// Epoch index at which the learning rate drops.
    pub fn lr_drop_epoch(&self) -> usize {
        (self.epochs as f64 * self.lr_drop_fraction).round() as usize
    }
}

/// Aggregated results of one epoch pass: mean loss plus one mean value per
/// configured metric, keyed by metric name.
#[derive(Clone, Debug, Default)]
pub struct EpochLogs {
    pub loss: f32,
    pub metrics: BTreeMap<String, f32>,
}

impl fmt::Display for EpochLogs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loss: {:.4}", self.loss)?;
        for (name, value) in &self.metrics {
            write!(f, ", {name}: {value:.4}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config = FitConfig::new(16, 40);
        assert_eq!(config.checkpoint_epochs, vec![10, 20, 30, 40, 50]);
        assert_eq!(config.late_lr, 2e-6);
        assert_eq!(config.train_fraction, 0.95);
        assert!(config.verbose);
    }

    #[test]
    fn test_lr_drop_epoch_rounds() {
        assert_eq!(FitConfig::new(1, 40).lr_drop_epoch(), 32);
        assert_eq!(FitConfig::new(1, 37).lr_drop_epoch(), 30); // 29.6 rounds up
        assert_eq!(FitConfig::new(1, 3).lr_drop_epoch(), 2);
    }

    #[test]
    fn test_builder_overrides() {
        let config = FitConfig::new(4, 10)
            .with_checkpoint_epochs(vec![2, 4])
            .with_late_lr(1e-7)
            .quiet();
        assert_eq!(config.checkpoint_epochs, vec![2, 4]);
        assert_eq!(config.late_lr, 1e-7);
        assert!(!config.verbose);
    }

    #[test]
    fn test_epoch_logs_display() {
        let mut logs = EpochLogs {
            loss: 0.5,
            metrics: BTreeMap::new(),
        };
        logs.metrics.insert("iou_score".to_string(), 0.75);
        assert_eq!(logs.to_string(), "loss: 0.5000, iou_score: 0.7500");
    }
}
