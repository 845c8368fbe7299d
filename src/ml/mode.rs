// ============================================================
// Layer 5 — Run Mode
// ============================================================
// Selects how a forward pass behaves:
//
//   code | mode          | memory noise | attention weights
//   -----+---------------+--------------+------------------
//     0  | TrainRaw      | yes          | raw dot products
//     1  | TrainSoftmax  | yes          | softmax(scores)
//    ≥2  | Eval          | no           | softmax(scores)
//
// TrainRaw is the "linear start" phase: attention scores are
// used directly as weights, without normalisation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    TrainRaw,
    TrainSoftmax,
    Eval,
}

impl RunMode {
    pub fn code(self) -> u32 {
        match self {
            RunMode::TrainRaw     => 0,
            RunMode::TrainSoftmax => 1,
            RunMode::Eval         => 2,
        }
    }

    /// Memory-slot noise is applied in both training modes.
    pub fn is_noisy(self) -> bool {
        self.code() < 2
    }

    /// Attention scores go through softmax in every mode except TrainRaw.
    pub fn uses_softmax(self) -> bool {
        self.code() > 0
    }
}
