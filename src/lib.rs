//! # Segmentar: Segmentation Training Orchestration
//!
//! Segmentar drives binary image-segmentation training over multi-channel
//! radar rasters: dataset loading and splitting, geometric augmentation, a
//! fixed-epoch training loop with a checkpoint/learning-rate policy, and
//! validation with mask visualization. The network architecture, optimizer
//! state and gradient mechanics stay behind trait seams supplied by the
//! caller.
//!
//! ## Architecture
//!
//! - **explorer**: `ModelExplorer` orchestration (fit, validate)
//! - **model**: `SegmentationModel` / `Optimizer` trait seams
//! - **train**: Epoch runners, losses (Dice, XE+Dice), metrics (IoU, F-score)
//! - **data**: Paired tensor datasets, random splits, SafeTensors persistence
//! - **augment**: Joint image/mask geometric transforms
//! - **viz**: PNG mask rendering
//!
//! ## Example
//!
//! ```no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use segmentar::train::{FitConfig, IoUScore, Metric};
//! use segmentar::{ModelExplorer, TensorDataset};
//!
//! # fn run<M: segmentar::SegmentationModel, O: segmentar::Optimizer>(
//! #     model: M, mut optimizer: O,
//! # ) -> segmentar::Result<()> {
//! let (features, masks) = ModelExplorer::load_data("x.safetensors", "y.safetensors")?;
//! let dataset = TensorDataset::new(features, masks)?;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let (train, _test) = ModelExplorer::train_test(&dataset, 0.8, &mut rng)?;
//! let train = ModelExplorer::augmentation(&train, None)?;
//!
//! let explorer = ModelExplorer::new("runs/flood");
//! let metrics: Vec<Box<dyn Metric>> = vec![Box::new(IoUScore::default())];
//! let config = FitConfig::new(16, 40);
//! let _model = explorer.fit(&train, model, &mut optimizer, &metrics, &config, &mut rng)?;
//! # Ok(())
//! # }
//! ```

pub mod augment;
pub mod data;
pub mod error;
pub mod explorer;
pub mod model;
pub mod train;
pub mod viz;

// Re-export commonly used types
pub use data::TensorDataset;
pub use error::{Error, Result};
pub use explorer::{binarize, ModelExplorer, BEST_MODEL_FILE, PROM_MODEL_FILE};
pub use model::{Optimizer, ParamGroup, SegmentationModel};
