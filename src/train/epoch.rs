//! Epoch runners
//!
//! `TrainEpoch` drives one optimisation pass over a batch loader, `ValidEpoch`
//! one inference pass; both aggregate mean loss and metric values into
//! [`EpochLogs`].

use super::{EpochLogs, Loss, Metric};
use crate::model::{Optimizer, SegmentationModel};
use crate::Result;
use ndarray::ArrayView4;

/// Print a running-loss line every this many steps when verbose.
const LOG_INTERVAL: usize = 10;

fn mean_logs(
    loss_sum: f32,
    metric_sums: &[f32],
    num_batches: usize,
    metrics: &[Box<dyn Metric>],
) -> EpochLogs {
    let mut logs = EpochLogs::default();
    if num_batches == 0 {
        return logs;
    }
    let n = num_batches as f32;
    logs.loss = loss_sum / n;
    for (metric, sum) in metrics.iter().zip(metric_sums) {
        logs.metrics.insert(metric.name().to_string(), sum / n);
    }
    logs
}

/// One training pass over a batch loader.
pub struct TrainEpoch<'a, M: SegmentationModel> {
    model: &'a mut M,
    loss: &'a dyn Loss,
    metrics: &'a [Box<dyn Metric>],
    optimizer: &'a mut dyn Optimizer,
    verbose: bool,
}

impl<'a, M: SegmentationModel> TrainEpoch<'a, M> {
    pub fn new(
        model: &'a mut M,
        loss: &'a dyn Loss,
        metrics: &'a [Box<dyn Metric>],
        optimizer: &'a mut dyn Optimizer,
        verbose: bool,
    ) -> Self {
        Self {
            model,
            loss,
            metrics,
            optimizer,
            verbose,
        }
    }

    /// Run the epoch over `batches`, returning the aggregated logs.
    pub fn run<'d, I>(&mut self, batches: I) -> Result<EpochLogs>
    where
        I: Iterator<Item = (ArrayView4<'d, f32>, ArrayView4<'d, f32>)>,
    {
        let mut loss_sum = 0.0;
        let mut metric_sums = vec![0.0f32; self.metrics.len()];
        let mut num_batches = 0usize;

        for (step, (images, masks)) in batches.enumerate() {
            let predictions = self
                .model
                .train_step(images, masks, self.loss, self.optimizer)?;
            loss_sum += self.loss.value(predictions.view(), masks);
            for (sum, metric) in metric_sums.iter_mut().zip(self.metrics) {
                *sum += metric.compute(predictions.view(), masks);
            }
            num_batches += 1;

            if self.verbose && (step + 1) % LOG_INTERVAL == 0 {
                println!(
                    "  step {}: {}: {:.4}",
                    step + 1,
                    self.loss.name(),
                    loss_sum / num_batches as f32
                );
            }
        }

        Ok(mean_logs(loss_sum, &metric_sums, num_batches, self.metrics))
    }
}

/// One inference pass over a batch loader.
pub struct ValidEpoch<'a, M: SegmentationModel> {
    model: &'a M,
    loss: &'a dyn Loss,
    metrics: &'a [Box<dyn Metric>],
}

impl<'a, M: SegmentationModel> ValidEpoch<'a, M> {
    pub fn new(model: &'a M, loss: &'a dyn Loss, metrics: &'a [Box<dyn Metric>]) -> Self {
        Self {
            model,
            loss,
            metrics,
        }
    }

    /// Run the epoch over `batches`, returning the aggregated logs.
    pub fn run<'d, I>(&self, batches: I) -> Result<EpochLogs>
    where
        I: Iterator<Item = (ArrayView4<'d, f32>, ArrayView4<'d, f32>)>,
    {
        let mut loss_sum = 0.0;
        let mut metric_sums = vec![0.0f32; self.metrics.len()];
        let mut num_batches = 0usize;

        for (images, masks) in batches {
            let predictions = self.model.predict(images)?;
            loss_sum += self.loss.value(predictions.view(), masks);
            for (sum, metric) in metric_sums.iter_mut().zip(self.metrics) {
                *sum += metric.compute(predictions.view(), masks);
            }
            num_batches += 1;
        }

        Ok(mean_logs(loss_sum, &metric_sums, num_batches, self.metrics))
    }
}
