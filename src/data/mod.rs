// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw task text and fixed-shape tensors:
//
//   bAbI files / synthetic task
//       │
//       ▼
//   BabiLoader / SyntheticTask  → tokenised StoryExamples
//       │
//       ▼
//   Vocabulary                  → word ↔ id, id 0 = padding
//       │
//       ▼
//   Vectorizer                  → padded MemorySamples
//       │
//       ▼
//   MemoryDataset + splitter    → train / validation sets
//       │
//       ▼
//   MemoryBatcher               → [b,m,s] / [b,q] / [b] tensors
//       │
//       ▼
//   EpochBatches                → next_batch(batch_size)

/// Parses bAbI task files
pub mod babi;

/// Generates a synthetic "where is X" task
pub mod synthetic;

/// Word-level vocabulary with a reserved padding id
pub mod vocab;

/// Pads and truncates examples to the model's fixed shapes
pub mod vectorizer;

/// Implements Burn's Dataset trait for vectorised samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// The next_batch contract and its epoch-based implementation
pub mod source;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
