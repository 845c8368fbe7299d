// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn tensor code lives here. The data layer only builds
// integer batches; everything that computes on them is below.
//
//   position.rs   — position-encoding matrix (sentence and question)
//   embedding.rs  — embedding lookups with a zeroed padding row
//   mode.rs       — run modes: raw attention, softmax, eval
//   noise.rs      — random memory-slot dropout while training
//   model.rs      — MemN2N: question encoding, hops, answer logits
//   loss.rs       — cross-entropy, predictions, accuracy
//   optim.rs      — Adam with per-tensor gradient-norm clipping
//   trainer.rs    — training step, schedule, epoch loop
//   inferencer.rs — predictions from a trained model
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Sukhbaatar et al. (2015) End-To-End Memory Networks

pub mod position;

pub mod embedding;

pub mod mode;

pub mod noise;

/// Multi-hop memory network architecture
pub mod model;

pub mod loss;

pub mod optim;

/// Training step and epoch loop with validation
pub mod trainer;

pub mod inferencer;
