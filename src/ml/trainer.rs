// ============================================================
// Layer 5 — Training Loop
// ============================================================
// One training step:
//
//   check shapes/ids → drop memory slots (noise) → forward →
//   mean cross-entropy → NaN check → backward →
//   clip each gradient to norm 40 → Adam update
//
// Epochs follow a linear start: raw attention scores for the
// first `linear_start_epochs`, softmax attention afterwards.
// Validation always runs in Eval mode on the inner backend.
//
//   lr(epoch) = lr * anneal_rate ^ floor((epoch - 1) / anneal_every)
//
// Key Burn insight:
//   - Training uses MyBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on MyInnerBackend (NdArray)
//   - Validation batches must also live on MyInnerBackend
//
// Reference: Burn Book §5, Sukhbaatar et al. (2015) §4.2

use anyhow::{bail, Result};
use burn::{
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{MemoryBatch, MemoryBatcher},
    dataset::{MemoryDataset, MemorySample},
    source::{BatchSource, EpochBatches},
    vectorizer::Vectorizer,
};
use crate::error::MemNetError;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::loss::accuracy;
use crate::ml::mode::RunMode;
use crate::ml::model::{MemN2N, MemN2NConfig};
use crate::ml::noise::NoiseInjector;
use crate::ml::optim::build_optimizer;

type MyBackend      = burn::backend::Autodiff<burn::backend::NdArray>;
type MyInnerBackend = burn::backend::NdArray;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    pub loss:     f64,
    pub accuracy: f64,
}

/// Owns everything that changes during training.
pub struct MemoryNetTrainer<B: AutodiffBackend, O> {
    model: MemN2N<B>,
    optim: O,
    noise: NoiseInjector,
    step:  usize,
}

pub fn build_trainer<B: AutodiffBackend>(
    config: &MemN2NConfig,
    device: &B::Device,
    seed:   u64,
) -> crate::error::Result<MemoryNetTrainer<B, impl Optimizer<MemN2N<B>, B>>> {
    let model = config.init::<B>(device)?;
    let noise = NoiseInjector::from_config(config, seed);
    Ok(MemoryNetTrainer::new(model, build_optimizer::<B>(), noise))
}

impl<B, O> MemoryNetTrainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<MemN2N<B>, B>,
{
    pub fn new(model: MemN2N<B>, optim: O, noise: NoiseInjector) -> Self {
        Self { model, optim, noise, step: 0 }
    }

    pub fn model(&self) -> &MemN2N<B> {
        &self.model
    }

    pub fn into_model(self) -> MemN2N<B> {
        self.model
    }

    /// Number of parameter updates applied so far.
    pub fn steps(&self) -> usize {
        self.step
    }

    /// Reports the loss and accuracy measured before the update.
    /// On error the parameters are left untouched.
    pub fn train_step(
        &mut self,
        batch: MemoryBatch<B>,
        mode:  RunMode,
        lr:    f64,
    ) -> crate::error::Result<StepOutput> {
        self.model.check_batch(&batch.stories, &batch.questions, Some(&batch.answers))?;

        let stories        = self.noise.apply(batch.stories, mode);
        let (loss, logits) = self.model.forward_loss(
            stories,
            batch.questions,
            batch.answers.clone(),
            mode,
        );

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
        if !loss_val.is_finite() {
            return Err(MemNetError::NonFiniteLoss { step: self.step });
        }
        let acc = accuracy(logits, batch.answers);

        // Backward pass + clipped Adam update
        let grads  = loss.backward();
        let grads  = GradientsParams::from_grads(grads, &self.model);
        self.model = self.optim.step(lr, self.model.clone(), grads);
        self.step += 1;

        tracing::debug!("step {} | loss={:.4} | acc={:.3}", self.step, loss_val, acc);
        Ok(StepOutput { loss: loss_val, accuracy: acc })
    }

    /// Eval-mode loss and accuracy with no update.
    pub fn evaluate(
        &self,
        batch: MemoryBatch<B::InnerBackend>,
    ) -> crate::error::Result<StepOutput> {
        evaluate_batch(&self.model.valid(), batch)
    }
}

pub fn evaluate_batch<B: Backend>(
    model: &MemN2N<B>,
    batch: MemoryBatch<B>,
) -> crate::error::Result<StepOutput> {
    model.check_batch(&batch.stories, &batch.questions, Some(&batch.answers))?;
    let (loss, logits) = model.forward_loss(
        batch.stories,
        batch.questions,
        batch.answers.clone(),
        RunMode::Eval,
    );
    Ok(StepOutput {
        loss:     loss.into_scalar().elem::<f64>(),
        accuracy: accuracy(logits, batch.answers),
    })
}

// ─── Schedule ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct TrainingSchedule {
    pub learning_rate:       f64,
    /// 0 disables annealing
    pub anneal_every:        usize,
    pub anneal_rate:         f64,
    pub linear_start_epochs: usize,
}

impl TrainingSchedule {
    pub fn from_config(cfg: &TrainConfig) -> Self {
        Self {
            learning_rate:       cfg.lr,
            anneal_every:        cfg.anneal_every,
            anneal_rate:         cfg.anneal_rate,
            linear_start_epochs: cfg.linear_start_epochs,
        }
    }

    /// Epochs are numbered from 1.
    pub fn mode(&self, epoch: usize) -> RunMode {
        if epoch <= self.linear_start_epochs {
            RunMode::TrainRaw
        } else {
            RunMode::TrainSoftmax
        }
    }

    pub fn learning_rate(&self, epoch: usize) -> f64 {
        if self.anneal_every == 0 {
            return self.learning_rate;
        }
        let decays = epoch.saturating_sub(1) / self.anneal_every;
        self.learning_rate * self.anneal_rate.powi(decays as i32)
    }
}

/// Running sums for one pass over a dataset. Batch means are
/// weighted by batch size, so a short final batch counts per example.
#[derive(Default)]
struct EpochTotals {
    loss:     f64,
    acc:      f64,
    examples: usize,
}

impl EpochTotals {
    fn add(&mut self, out: StepOutput, examples: usize) {
        self.loss     += out.loss * examples as f64;
        self.acc      += out.accuracy * examples as f64;
        self.examples += examples;
    }

    fn mean_loss(&self) -> f64 {
        if self.examples > 0 { self.loss / self.examples as f64 } else { f64::NAN }
    }

    fn mean_acc(&self) -> f64 {
        if self.examples > 0 { self.acc / self.examples as f64 } else { 0.0 }
    }
}

// ─── Epoch loop ──────────────────────────────────────────────

pub struct TrainingReport {
    pub history: Vec<EpochMetrics>,
    /// Final parameters on the inner backend, ready for inference
    pub model:   MemN2N<MyInnerBackend>,
}

pub fn run_training(
    cfg:           &TrainConfig,
    model_cfg:     &MemN2NConfig,
    shapes:        Vectorizer,
    train_samples: Vec<MemorySample>,
    val_samples:   Vec<MemorySample>,
    metrics:       &MetricsLogger,
) -> Result<TrainingReport> {
    if train_samples.is_empty() {
        bail!("No training samples");
    }
    if cfg.batch_size == 0 {
        bail!("batch_size must be positive");
    }

    let device = burn::backend::ndarray::NdArrayDevice::default();
    tracing::info!("Using NdArray device: {:?}", device);
    MyBackend::seed(cfg.seed);

    // ── Build model + optimiser ───────────────────────────────────────────────
    let mut trainer = build_trainer::<MyBackend>(model_cfg, &device, cfg.seed)?;
    tracing::info!(
        "Model ready: {} hops, hdim={}, memsize={}, vocab={}",
        model_cfg.num_hops, model_cfg.hdim, model_cfg.memsize, model_cfg.vocab_size,
    );

    // ── Batch sources ─────────────────────────────────────────────────────────
    let mut train_source = EpochBatches::new(
        MemoryDataset::new(train_samples),
        MemoryBatcher::<MyBackend>::new(device.clone(), shapes),
        Some(cfg.seed),
    );
    let mut val_source = EpochBatches::new(
        MemoryDataset::new(val_samples),
        MemoryBatcher::<MyInnerBackend>::new(device.clone(), shapes),
        None,
    );
    tracing::info!(
        "Batches of {} from {} train / {} validation samples",
        cfg.batch_size,
        train_source.sample_count(),
        val_source.sample_count(),
    );

    let schedule    = TrainingSchedule::from_config(cfg);
    let mut history = Vec::with_capacity(cfg.epochs);

    for epoch in 1..=cfg.epochs {
        let mode = schedule.mode(epoch);
        let lr   = schedule.learning_rate(epoch);

        // ── Training phase ────────────────────────────────────────────────────
        let mut train = EpochTotals::default();
        train_source.reset();
        while let Some(batch) = train_source.next_batch(cfg.batch_size) {
            let examples = batch.len();
            train.add(trainer.train_step(batch, mode, lr)?, examples);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let mut val = EpochTotals::default();
        val_source.reset();
        while let Some(batch) = val_source.next_batch(cfg.batch_size) {
            let examples = batch.len();
            val.add(trainer.evaluate(batch)?, examples);
        }

        let m = EpochMetrics {
            epoch,
            mode,
            learning_rate: lr,
            train_loss:    train.mean_loss(),
            train_acc:     train.mean_acc(),
            val_loss:      val.mean_loss(),
            val_acc:       val.mean_acc(),
        };

        println!(
            "Epoch {:>3}/{} | mode={} | lr={:.5} | train_loss={:.4} | train_acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs, mode.code(), lr,
            m.train_loss, m.train_acc * 100.0,
            m.val_loss, m.val_acc * 100.0,
        );

        metrics.log(&m)?;
        history.push(m);
    }

    tracing::info!(
        "Training complete after {} steps, metrics in '{}'",
        trainer.steps(),
        metrics.csv_path().display(),
    );
    Ok(TrainingReport { history, model: trainer.into_model().valid() })
}
