// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`  — trains a memory network and reports metrics
//   2. `encode` — prints the position-encoding matrix
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{bail, Result};
use clap::Parser;
use std::path::Path;
use commands::{Commands, EncodeArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "memn2n",
    version = "0.1.0",
    about = "Train an end-to-end memory network on bAbI-style question answering."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch. Routes only, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => run_train(args),
            Commands::Encode(args) => run_encode(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::infra::config_store::load_config_file;

    let base = match &args.config {
        Some(path) => {
            tracing::info!("Loading config from '{}'", path);
            load_config_file(Path::new(path))?
        }
        None => TrainConfig::default(),
    };
    let cfg = args.apply_to(base);

    let summary = TrainUseCase::new(cfg.clone()).execute()?;

    if let Some(last) = summary.history.last() {
        println!(
            "\nFinished {} epochs | vocab={} | memsize={} | final val_acc={:.1}%",
            last.epoch,
            summary.vocab_size,
            summary.shapes.memsize,
            last.val_acc * 100.0,
        );
    }
    println!("Sample predictions:");
    for (predicted, expected) in &summary.predictions {
        let mark = if predicted == expected { "✓" } else { "✗" };
        println!("  {mark} predicted={predicted:<12} expected={expected}");
    }
    println!("Config and metrics written to '{}'", cfg.output_dir);
    Ok(())
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    use crate::ml::position::position_encoding;

    if args.length == 0 || args.dim == 0 {
        bail!("--length and --dim must be positive");
    }
    let table = position_encoding(args.length, args.dim);
    for row in table.chunks(args.dim) {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:.4}")).collect();
        println!("{}", cells.join(" "));
    }
    Ok(())
}
