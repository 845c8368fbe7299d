// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `encode`, and all
// their configurable flags.
//
// Training flags are optional: a flag that is given overrides
// the value from `--config` (or the built-in default).
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a memory network on bAbI files or a synthetic task
    Train(TrainArgs),

    /// Print the position-encoding matrix
    Encode(EncodeArgs),
}

#[derive(Args, Debug, Default)]
pub struct TrainArgs {
    /// JSON file with a TrainConfig; flags below override it
    #[arg(long)]
    pub config: Option<String>,

    /// bAbI task file, or a directory of .txt task files
    #[arg(long)]
    pub train_file: Option<String>,

    /// Train on a generated "where is X" task instead of a file
    #[arg(long)]
    pub synthetic: bool,

    /// Number of generated examples for --synthetic
    #[arg(long)]
    pub synthetic_examples: Option<usize>,

    /// Where train_config.json and metrics.csv are written
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Embedding / hidden dimension
    #[arg(long)]
    pub hdim: Option<usize>,

    /// Number of memory hops
    #[arg(long)]
    pub num_hops: Option<usize>,

    /// Memory slots kept per story (most recent sentences)
    #[arg(long)]
    pub max_memsize: Option<usize>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub epochs: Option<usize>,

    /// Initial learning rate
    #[arg(long)]
    pub lr: Option<f64>,

    /// Multiply the learning rate by --anneal-rate every N epochs (0 = never)
    #[arg(long)]
    pub anneal_every: Option<usize>,

    #[arg(long)]
    pub anneal_rate: Option<f64>,

    /// Epochs trained with raw (un-normalised) attention before softmax
    #[arg(long)]
    pub linear_start_epochs: Option<usize>,

    /// Fraction of examples held out for validation
    #[arg(long)]
    pub val_fraction: Option<f64>,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl TrainArgs {
    /// Overlay every flag that was given onto `base`.
    pub fn apply_to(self, base: TrainConfig) -> TrainConfig {
        TrainConfig {
            train_file:          self.train_file.or(base.train_file),
            synthetic:           self.synthetic || base.synthetic,
            synthetic_examples:  self.synthetic_examples.unwrap_or(base.synthetic_examples),
            output_dir:          self.output_dir.unwrap_or(base.output_dir),
            hdim:                self.hdim.unwrap_or(base.hdim),
            num_hops:            self.num_hops.unwrap_or(base.num_hops),
            max_memsize:         self.max_memsize.unwrap_or(base.max_memsize),
            batch_size:          self.batch_size.unwrap_or(base.batch_size),
            epochs:              self.epochs.unwrap_or(base.epochs),
            lr:                  self.lr.unwrap_or(base.lr),
            anneal_every:        self.anneal_every.unwrap_or(base.anneal_every),
            anneal_rate:         self.anneal_rate.unwrap_or(base.anneal_rate),
            linear_start_epochs: self.linear_start_epochs.unwrap_or(base.linear_start_epochs),
            val_fraction:        self.val_fraction.unwrap_or(base.val_fraction),
            seed:                self.seed.unwrap_or(base.seed),
            ..base
        }
    }
}

/// Flags only, on top of the defaults.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        a.apply_to(TrainConfig::default())
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Number of word positions (rows)
    #[arg(long)]
    pub length: usize,

    /// Embedding dimension (columns)
    #[arg(long)]
    pub dim: usize,
}
