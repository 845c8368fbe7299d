// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load stories (bAbI or synthetic) (Layer 4 - data)
//   Step 2: Build vocabulary                 (Layer 4 - data)
//   Step 3: Fit shapes and vectorise         (Layer 4 - data)
//   Step 4: Split train/validation           (Layer 4 - data)
//   Step 5: Build model config               (Layer 5 - ml)
//   Step 6: Save config, open metrics log    (Layer 6 - infra)
//   Step 7: Run training loop                (Layer 5 - ml)
//   Step 8: Predict a few validation answers (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use burn::data::dataloader::batcher::Batcher;
use serde::{Deserialize, Serialize};

use crate::data::{
    babi::BabiLoader,
    batcher::MemoryBatcher,
    splitter::split_train_val,
    synthetic::SyntheticTask,
    vectorizer::Vectorizer,
    vocab::Vocabulary,
};
use crate::domain::traits::ExampleSource;
use crate::infra::{config_store::ConfigStore, metrics::{EpochMetrics, MetricsLogger}};
use crate::ml::{inferencer::Inferencer, model::MemN2NConfig, trainer::run_training};

type InferBackend = burn::backend::NdArray;

const PREVIEW_EXAMPLES: usize = 5;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Missing JSON fields
// take their value from Default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// bAbI task file or directory of .txt files
    pub train_file:              Option<String>,
    pub synthetic:               bool,
    pub synthetic_examples:      usize,
    pub synthetic_max_sentences: usize,
    pub output_dir:              String,
    pub hdim:                    usize,
    pub num_hops:                usize,
    /// Upper bound on memory slots; longer stories keep their latest sentences
    pub max_memsize:             usize,
    pub batch_size:              usize,
    pub epochs:                  usize,
    pub lr:                      f64,
    pub anneal_every:            usize,
    pub anneal_rate:             f64,
    pub linear_start_epochs:     usize,
    pub val_fraction:            f64,
    pub seed:                    u64,
    pub init_std:                f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_file:              None,
            synthetic:               false,
            synthetic_examples:      1000,
            synthetic_max_sentences: 8,
            output_dir:              "runs".to_string(),
            hdim:                    20,
            num_hops:                3,
            max_memsize:             50,
            batch_size:              32,
            epochs:                  60,
            lr:                      0.01,
            anneal_every:            25,
            anneal_rate:             0.5,
            linear_start_epochs:     0,
            val_fraction:            0.1,
            seed:                    42,
            init_std:                0.1,
        }
    }
}

/// What a finished run hands back to the CLI.
pub struct TrainSummary {
    pub history:     Vec<EpochMetrics>,
    pub vocab_size:  usize,
    pub shapes:      Vectorizer,
    /// (predicted, expected) answer words for a few held-out examples
    pub predictions: Vec<(String, String)>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    fn source(&self) -> Result<Box<dyn ExampleSource>> {
        let cfg = &self.config;
        if cfg.synthetic {
            return Ok(Box::new(SyntheticTask::new(
                cfg.synthetic_examples,
                cfg.synthetic_max_sentences,
                cfg.seed,
            )));
        }
        match &cfg.train_file {
            Some(path) => Ok(Box::new(BabiLoader::new(path))),
            None => bail!("No training data: pass --train-file or --synthetic"),
        }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;

        // ── Step 1: Load stories ──────────────────────────────────────────────
        let examples = self.source()?.load_all()?;
        if examples.is_empty() {
            bail!("Training data contains no questions");
        }
        tracing::info!("Loaded {} examples", examples.len());

        // ── Step 2: Vocabulary (id 0 = padding) ───────────────────────────────
        let vocab = Vocabulary::build(&examples);
        tracing::info!("Vocabulary: {} tokens", vocab.len());

        // ── Step 3: Fixed shapes + vectorisation ──────────────────────────────
        let shapes  = Vectorizer::fit(&examples, cfg.max_memsize);
        let samples = shapes
            .vectorize_all(&examples, &vocab)
            .context("Failed to vectorise examples")?;

        // ── Step 4: Train / validation split ──────────────────────────────────
        let (train_samples, val_samples) =
            split_train_val(samples, 1.0 - cfg.val_fraction, cfg.seed);
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        // ── Step 5: Model config ──────────────────────────────────────────────
        // Answers are single vocabulary words, so every token is a candidate
        let model_cfg = MemN2NConfig::new(
            cfg.hdim,
            cfg.num_hops,
            shapes.memsize,
            shapes.sentence_size,
            shapes.qlen,
            vocab.len(),
            vocab.len(),
        )
        .with_init_std(cfg.init_std);
        model_cfg.validate()?;

        // ── Step 6: Record config, open metrics log ───────────────────────────
        ConfigStore::new(&cfg.output_dir)?.save(cfg)?;
        let metrics = MetricsLogger::new(&cfg.output_dir)?;

        // ── Step 7: Run training loop (Layer 5) ───────────────────────────────
        let preview: Vec<_> = val_samples
            .iter()
            .chain(train_samples.iter())
            .take(PREVIEW_EXAMPLES)
            .cloned()
            .collect();
        let report = run_training(cfg, &model_cfg, shapes, train_samples, val_samples, &metrics)?;

        // ── Step 8: Sample predictions ────────────────────────────────────────
        let batch = MemoryBatcher::<InferBackend>::new(Default::default(), shapes).batch(preview);
        let predictions = Inferencer::new(report.model).predict_words(batch, &vocab)?;

        Ok(TrainSummary {
            history: report.history,
            vocab_size: vocab.len(),
            shapes,
            predictions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            synthetic:          true,
            synthetic_examples: 40,
            output_dir:         dir.display().to_string(),
            hdim:               8,
            num_hops:           2,
            batch_size:         16,
            epochs:             2,
            val_fraction:       0.25,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_synthetic_run_end_to_end() {
        let dir     = tempfile::tempdir().unwrap();
        let summary = TrainUseCase::new(synthetic_config(dir.path())).execute().unwrap();

        assert_eq!(summary.history.len(), 2);
        assert_eq!(summary.predictions.len(), PREVIEW_EXAMPLES);
        assert!(summary.shapes.memsize <= 50);
        assert!(dir.path().join("train_config.json").exists());
        assert!(dir.path().join("metrics.csv").exists());
    }

    #[test]
    fn test_missing_data_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            output_dir: dir.path().display().to_string(),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).execute().err().unwrap();
        assert!(err.to_string().contains("No training data"));
    }

    #[test]
    fn test_babi_file_source() {
        let dir  = tempfile::tempdir().unwrap();
        let file = dir.path().join("qa1_train.txt");
        std::fs::write(
            &file,
            "1 Mary moved to the bathroom.\n\
             2 John went to the hallway.\n\
             3 Where is Mary? \tbathroom\t1\n\
             1 Daniel went back to the hallway.\n\
             2 Where is Daniel? \thallway\t1\n",
        ).unwrap();

        let cfg = TrainConfig {
            train_file:   Some(file.display().to_string()),
            output_dir:   dir.path().join("out").display().to_string(),
            hdim:         4,
            num_hops:     1,
            epochs:       1,
            val_fraction: 0.0,
            ..TrainConfig::default()
        };
        let summary = TrainUseCase::new(cfg).execute().unwrap();
        assert_eq!(summary.history.len(), 1);
        assert_eq!(summary.shapes.memsize, 2);
        assert_eq!(summary.predictions.len(), 2);
    }
}
