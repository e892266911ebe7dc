//! Model explorer: training and validation orchestration
//!
//! [`ModelExplorer`] wires the pieces together: split the incoming dataset,
//! drive the epoch runners, apply the learning-rate and checkpoint policy,
//! and persist/restore models in a caller-owned working directory.
//!
//! The working directory only ever receives the fixed checkpoint filenames
//! and visualization PNGs; last write wins, nothing is cleaned up.

use crate::augment;
use crate::data::{self, TensorDataset};
use crate::model::{Optimizer, SegmentationModel};
use crate::train::{DiceLoss, FitConfig, Loss, Metric, TrainEpoch, ValidEpoch};
use crate::{viz, Error, Result};
use ndarray::{Array2, Array4, ArrayView2, Axis};
use rand::Rng;
use std::path::{Path, PathBuf};

/// Final checkpoint filename inside the working directory.
pub const BEST_MODEL_FILE: &str = "best_model.pth";

/// Intermediate checkpoint filename inside the working directory.
pub const PROM_MODEL_FILE: &str = "prom.pth";

/// Number of random samples rendered when validating with visualization.
const VIS_SAMPLES: usize = 5;

/// Orchestrates training, validation and dataset shaping for segmentation
/// models.
pub struct ModelExplorer {
    working_dir: PathBuf,
    loss: Box<dyn Loss>,
}

impl ModelExplorer {
    /// Create an explorer rooted at `working_dir`.
    ///
    /// The Dice loss is shared by every model the explorer drives.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            loss: Box::new(DiceLoss::default()),
        }
    }

    /// Swap the shared loss, e.g. for [`crate::train::XEDiceLoss`].
    pub fn with_loss(mut self, loss: Box<dyn Loss>) -> Self {
        self.loss = loss;
        self
    }

    /// The caller-owned directory checkpoints and PNGs are written into.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Train `model` on `train` for the configured number of epochs.
    ///
    /// Splits off a validation holdout (`config.train_fraction`), then runs
    /// one training and one validation pass per epoch. At
    /// `config.lr_drop_epoch()` the first parameter group drops to
    /// `config.late_lr`; at each epoch index in `config.checkpoint_epochs`
    /// the model is checkpointed to `prom.pth`. The final model lands in
    /// `best_model.pth` and is returned. Any model or I/O failure aborts the
    /// run.
    pub fn fit<M, R>(
        &self,
        train: &TensorDataset,
        mut model: M,
        optimizer: &mut dyn Optimizer,
        metrics: &[Box<dyn Metric>],
        config: &FitConfig,
        rng: &mut R,
    ) -> Result<M>
    where
        M: SegmentationModel,
        R: Rng + ?Sized,
    {
        let best_path = self.working_dir.join(BEST_MODEL_FILE);
        let prom_path = self.working_dir.join(PROM_MODEL_FILE);

        let (train_set, valid_set) = data::train_test(train, config.train_fraction, rng)?;
        let lr_drop_epoch = config.lr_drop_epoch();

        for epoch in 0..config.epochs {
            if config.verbose {
                println!("\nEpoch: {epoch}");
            }

            let train_logs = TrainEpoch::new(
                &mut model,
                self.loss.as_ref(),
                metrics,
                optimizer,
                config.verbose,
            )
            .run(train_set.batches(config.batch_size))?;
            let valid_logs =
                ValidEpoch::new(&model, self.loss.as_ref(), metrics).run(valid_set.batches(1))?;

            if config.verbose {
                println!("train: {train_logs}");
                println!("valid: {valid_logs}");
            }

            if epoch == lr_drop_epoch {
                optimizer.set_lr(config.late_lr);
            }
            if config.checkpoint_epochs.contains(&epoch) {
                model.save(&prom_path)?;
            }
        }

        model.save(&best_path)?;
        println!("Model saved!");
        Ok(model)
    }

    /// Score a model on the full test set, optionally rendering a handful of
    /// predictions first.
    ///
    /// Loads the model from `model_path` unless one is passed in. With `vis`
    /// set, draws five random samples, binarizes each prediction
    /// (see [`binarize`]) and writes predicted/ground-truth mask PNGs into
    /// the working directory. Always finishes with one validation pass at
    /// batch size 1, printing the aggregate logs; nothing is returned.
    pub fn validate<M, R>(
        &self,
        test: &TensorDataset,
        model_path: &Path,
        model: Option<M>,
        threshold: Option<f32>,
        metrics: &[Box<dyn Metric>],
        vis: bool,
        rng: &mut R,
    ) -> Result<()>
    where
        M: SegmentationModel,
        R: Rng + ?Sized,
    {
        let model = match model {
            Some(model) => model,
            None => M::load(model_path)?,
        };

        if vis {
            if test.is_empty() {
                return Err(Error::InvalidParameter(
                    "cannot visualize an empty test set".to_string(),
                ));
            }
            for _ in 0..VIS_SAMPLES {
                let n = rng.gen_range(0..test.len());
                let (features, truth) = test.sample(n);

                let batch = features.insert_axis(Axis(0));
                let prediction = model.predict(batch)?;
                let predicted_mask = binarize(
                    prediction.index_axis(Axis(0), 0).index_axis(Axis(0), 0),
                    threshold,
                );

                viz::save_mask_png(
                    &self.working_dir.join(format!("sample_{n}_pred.png")),
                    predicted_mask.view(),
                )?;
                viz::save_mask_png(
                    &self.working_dir.join(format!("sample_{n}_truth.png")),
                    truth.index_axis(Axis(0), 0),
                )?;
            }
        }

        let logs = ValidEpoch::new(&model, self.loss.as_ref(), metrics).run(test.batches(1))?;
        println!("test: {logs}");
        Ok(())
    }

    /// Load a persisted feature/label tensor pair.
    pub fn load_data(
        features_path: impl AsRef<Path>,
        target_path: impl AsRef<Path>,
    ) -> Result<(Array4<f32>, Array4<f32>)> {
        data::load_data(features_path, target_path)
    }

    /// Randomly partition a dataset into train and test subsets.
    pub fn train_test<R: Rng + ?Sized>(
        dataset: &TensorDataset,
        train_size: f64,
        rng: &mut R,
    ) -> Result<(TensorDataset, TensorDataset)> {
        data::train_test(dataset, train_size, rng)
    }

    /// Double a dataset by appending randomly transformed copies.
    pub fn augmentation(
        dataset: &TensorDataset,
        viz_dir: Option<&Path>,
    ) -> Result<TensorDataset> {
        augment::augmentation(dataset, viz_dir)
    }
}

/// Binarize one predicted mask: round without a threshold, hard cut with one
/// (values at or above the threshold become 1).
pub fn binarize(prediction: ArrayView2<'_, f32>, threshold: Option<f32>) -> Array2<f32> {
    match threshold {
        None => prediction.mapv(|v| v.round()),
        Some(t) => prediction.mapv(|v| if v >= t { 1.0 } else { 0.0 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_binarize_rounds_without_threshold() {
        let pred = Array2::from_shape_vec((1, 4), vec![0.4, 0.5, 0.6, 0.0]).unwrap();
        let mask = binarize(pred.view(), None);
        assert_eq!(mask.as_slice().unwrap(), &[0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_binarize_with_threshold_is_inclusive() {
        let pred = Array2::from_shape_vec((1, 3), vec![0.69, 0.7, 0.95]).unwrap();
        let mask = binarize(pred.view(), Some(0.7));
        assert_eq!(mask.as_slice().unwrap(), &[0.0, 1.0, 1.0]);
    }
}
