//! End-to-end fit/validate runs against stub collaborators.

use ndarray::{Array4, ArrayView4};
use rand::rngs::StdRng;
use rand::SeedableRng;
use segmentar::train::{FitConfig, IoUScore, Loss, Metric};
use segmentar::{
    Error, ModelExplorer, Optimizer, ParamGroup, Result, SegmentationModel, TensorDataset,
    BEST_MODEL_FILE, PROM_MODEL_FILE,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tempfile::tempdir;

/// Constant-mask model that counts steps and records the learning rate it
/// was driven with.
#[derive(Serialize, Deserialize)]
struct StubModel {
    value: f32,
    steps: usize,
    #[serde(skip)]
    lr_seen: Vec<f32>,
}

impl StubModel {
    fn new(value: f32) -> Self {
        Self {
            value,
            steps: 0,
            lr_seen: Vec::new(),
        }
    }
}

impl SegmentationModel for StubModel {
    fn train_step(
        &mut self,
        _images: ArrayView4<'_, f32>,
        masks: ArrayView4<'_, f32>,
        _loss: &dyn Loss,
        optimizer: &mut dyn Optimizer,
    ) -> Result<Array4<f32>> {
        self.steps += 1;
        self.lr_seen.push(optimizer.lr());
        Ok(Array4::from_elem(masks.dim(), self.value))
    }

    fn predict(&self, images: ArrayView4<'_, f32>) -> Result<Array4<f32>> {
        let (batch, _, height, width) = images.dim();
        Ok(Array4::from_elem((batch, 1, height, width), self.value))
    }

    fn save(&self, path: &Path) -> Result<()> {
        let payload =
            serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        let payload = std::fs::read_to_string(path)?;
        serde_json::from_str(&payload).map_err(|e| Error::Serialization(e.to_string()))
    }
}

struct StubOptimizer {
    groups: Vec<ParamGroup>,
}

impl StubOptimizer {
    fn new(lr: f32) -> Self {
        Self {
            groups: vec![ParamGroup::new(lr)],
        }
    }
}

impl Optimizer for StubOptimizer {
    fn param_groups(&self) -> &[ParamGroup] {
        &self.groups
    }

    fn param_groups_mut(&mut self) -> &mut [ParamGroup] {
        &mut self.groups
    }
}

/// 20 samples, 2 channels, 8x8: a 0.95 split keeps 19 for training, which at
/// batch size 4 gives 5 steps per epoch.
fn dataset() -> TensorDataset {
    let features =
        Array4::from_shape_fn((20, 2, 8, 8), |(s, c, h, w)| (s + c + h + w) as f32 / 40.0);
    let masks = Array4::from_shape_fn((20, 1, 8, 8), |(_, _, h, w)| ((h + w) % 2) as f32);
    TensorDataset::new(features, masks).unwrap()
}

fn metrics() -> Vec<Box<dyn Metric>> {
    vec![Box::new(IoUScore::default())]
}

#[test]
fn fit_writes_final_checkpoint_only_for_short_runs() {
    let dir = tempdir().unwrap();
    let explorer = ModelExplorer::new(dir.path());
    let mut optimizer = StubOptimizer::new(1e-3);
    let config = FitConfig::new(4, 5).quiet();
    let mut rng = StdRng::seed_from_u64(1);

    let model = explorer
        .fit(
            &dataset(),
            StubModel::new(1.0),
            &mut optimizer,
            &metrics(),
            &config,
            &mut rng,
        )
        .unwrap();

    assert!(dir.path().join(BEST_MODEL_FILE).exists());
    assert!(!dir.path().join(PROM_MODEL_FILE).exists());
    assert_eq!(model.steps, 5 * 5);
}

#[test]
fn fit_writes_intermediate_checkpoint_after_epoch_ten() {
    let dir = tempdir().unwrap();
    let explorer = ModelExplorer::new(dir.path());
    let mut optimizer = StubOptimizer::new(1e-3);
    let config = FitConfig::new(4, 12).quiet();
    let mut rng = StdRng::seed_from_u64(1);

    explorer
        .fit(
            &dataset(),
            StubModel::new(1.0),
            &mut optimizer,
            &metrics(),
            &config,
            &mut rng,
        )
        .unwrap();

    let prom = dir.path().join(PROM_MODEL_FILE);
    assert!(prom.exists());
    // Written at the end of epoch index 10, i.e. after 11 epochs of 5 steps.
    let snapshot = StubModel::load(&prom).unwrap();
    assert_eq!(snapshot.steps, 11 * 5);
}

#[test]
fn fit_drops_lr_after_the_configured_epoch_and_not_before() {
    let dir = tempdir().unwrap();
    let explorer = ModelExplorer::new(dir.path());
    let mut optimizer = StubOptimizer::new(1e-3);
    let config = FitConfig::new(4, 10).quiet();
    assert_eq!(config.lr_drop_epoch(), 8);
    let mut rng = StdRng::seed_from_u64(1);

    let model = explorer
        .fit(
            &dataset(),
            StubModel::new(1.0),
            &mut optimizer,
            &metrics(),
            &config,
            &mut rng,
        )
        .unwrap();

    let steps_per_epoch = 5;
    for (step, &lr) in model.lr_seen.iter().enumerate() {
        let epoch = step / steps_per_epoch;
        if epoch <= 8 {
            assert_eq!(lr, 1e-3, "epoch {epoch} ran before the drop");
        } else {
            assert_eq!(lr, 2e-6, "epoch {epoch} ran after the drop");
        }
    }
    assert_eq!(optimizer.lr(), 2e-6);
}

#[test]
fn validate_loads_checkpoint_and_renders_masks() {
    let dir = tempdir().unwrap();
    let explorer = ModelExplorer::new(dir.path());
    let mut optimizer = StubOptimizer::new(1e-3);
    let config = FitConfig::new(4, 2).quiet();
    let mut rng = StdRng::seed_from_u64(5);

    explorer
        .fit(
            &dataset(),
            StubModel::new(1.0),
            &mut optimizer,
            &metrics(),
            &config,
            &mut rng,
        )
        .unwrap();

    explorer
        .validate::<StubModel, _>(
            &dataset(),
            &dir.path().join(BEST_MODEL_FILE),
            None,
            Some(0.5),
            &metrics(),
            true,
            &mut rng,
        )
        .unwrap();

    let pngs = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext == "png")
                .unwrap_or(false)
        })
        .count();
    assert!(pngs >= 2, "expected rendered mask PNGs, found {pngs}");
}

#[test]
fn validate_accepts_an_in_memory_model() {
    let dir = tempdir().unwrap();
    let explorer = ModelExplorer::new(dir.path());
    let mut rng = StdRng::seed_from_u64(5);

    // No checkpoint on disk; the supplied model must be used as-is.
    explorer
        .validate(
            &dataset(),
            Path::new("does_not_exist.pth"),
            Some(StubModel::new(1.0)),
            None,
            &metrics(),
            false,
            &mut rng,
        )
        .unwrap();
}

#[test]
fn validate_fails_fast_on_a_missing_checkpoint() {
    let dir = tempdir().unwrap();
    let explorer = ModelExplorer::new(dir.path());
    let mut rng = StdRng::seed_from_u64(5);

    let result = explorer.validate::<StubModel, _>(
        &dataset(),
        &dir.path().join("absent.pth"),
        None,
        None,
        &metrics(),
        false,
        &mut rng,
    );
    assert!(result.is_err());
}

#[test]
fn fit_fails_fast_when_the_working_dir_is_missing() {
    let dir = tempdir().unwrap();
    let explorer = ModelExplorer::new(dir.path().join("nested/missing"));
    let mut optimizer = StubOptimizer::new(1e-3);
    let config = FitConfig::new(4, 1).quiet();
    let mut rng = StdRng::seed_from_u64(1);

    let result = explorer.fit(
        &dataset(),
        StubModel::new(1.0),
        &mut optimizer,
        &metrics(),
        &config,
        &mut rng,
    );
    assert!(matches!(result, Err(Error::Io(_))));
}
