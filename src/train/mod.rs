//! Training loop components
//!
//! This module provides the pieces the explorer wires together:
//! - Loss functions (Dice, XE+Dice)
//! - Epoch runners (TrainEpoch, ValidEpoch)
//! - Metrics (IoU, F-score)
//! - Fit configuration with the checkpoint/learning-rate policy
//!
//! # Example
//!
//! ```no_run
//! use segmentar::train::{FitConfig, IoUScore, Metric};
//!
//! let config = FitConfig::new(16, 40);
//! let metrics: Vec<Box<dyn Metric>> = vec![Box::new(IoUScore::default())];
//! // explorer.fit(&train, model, &mut optimizer, &metrics, &config, &mut rng)
//! ```

mod config;
mod epoch;
mod loss;
mod metrics;

pub use config::{EpochLogs, FitConfig};
pub use epoch::{TrainEpoch, ValidEpoch};
pub use loss::{DiceLoss, Loss, XEDiceLoss};
pub use metrics::{FScore, IoUScore, Metric};
