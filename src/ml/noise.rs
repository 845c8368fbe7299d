// ============================================================
// Layer 5 — Memory Noise Injector
// ============================================================
// Random memory-slot dropout used while training.
//
// One uniform draw per memory slot; a slot survives when the
// draw exceeds the threshold (0.1), otherwise every token in
// that slot is replaced by the padding id. The same mask is
// shared by every example in the batch and resampled on every
// call. Eval mode passes the stories through untouched.

use burn::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::ml::mode::RunMode;
use crate::ml::model::MemN2NConfig;

pub struct NoiseInjector {
    rng:            StdRng,
    drop_threshold: f64,
}

impl NoiseInjector {
    pub fn new(seed: u64, drop_threshold: f64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), drop_threshold }
    }

    /// Uses the model's `drop_threshold`.
    pub fn from_config(config: &MemN2NConfig, seed: u64) -> Self {
        Self::new(seed, config.drop_threshold)
    }

    /// Draw a fresh keep/drop decision for each of `memsize` slots.
    pub fn sample_keep_mask(&mut self, memsize: usize) -> Vec<bool> {
        (0..memsize)
            .map(|_| self.rng.gen::<f64>() > self.drop_threshold)
            .collect()
    }

    /// stories: [batch, memsize, sentence_size]
    pub fn apply<B: Backend>(
        &mut self,
        stories: Tensor<B, 3, Int>,
        mode:    RunMode,
    ) -> Tensor<B, 3, Int> {
        if !mode.is_noisy() {
            return stories;
        }
        let [batch, memsize, sentence_size] = stories.dims();
        let keep = self.sample_keep_mask(memsize);
        tracing::trace!(
            "noise: dropped {} of {} memory slots",
            keep.iter().filter(|k| !**k).count(),
            memsize
        );

        let keep_flat: Vec<i32> = keep.iter().map(|&k| k as i32).collect();
        let mask = Tensor::<B, 1, Int>::from_ints(keep_flat.as_slice(), &stories.device())
            .reshape([1, memsize, 1])
            .expand([batch, memsize, sentence_size]);
        stories * mask
    }
}
