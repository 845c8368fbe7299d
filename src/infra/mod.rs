// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File output shared by the training workflow:
//
//   config_store.rs — TrainConfig as JSON
//                     Loads `--config` files and records the
//                     resolved config next to the run's output.
//
//   metrics.rs      — Training metrics logging
//                     Writes epoch-level metrics (loss,
//                     accuracy, mode, learning rate) to a CSV
//                     file for later analysis and plotting.
//
// Reference: Rust Book §9 (Error Handling with anyhow)

/// TrainConfig JSON persistence
pub mod config_store;

/// Training metrics CSV logger
pub mod metrics;
