// ============================================================
// Layer 4 — Batch Source
// ============================================================
// The contract between the data pipeline and the trainer:
// `next_batch(batch_size)` hands out fixed-shape, vocabulary
// indexed tensors until the epoch is exhausted.

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    prelude::*,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::batcher::{MemoryBatch, MemoryBatcher};
use crate::data::dataset::MemoryDataset;

pub trait BatchSource<B: Backend> {
    /// Up to `batch_size` examples, or None when the epoch is done.
    fn next_batch(&mut self, batch_size: usize) -> Option<MemoryBatch<B>>;
}

/// Walks a dataset once per epoch, optionally in shuffled order.
/// The last batch of an epoch may be smaller than `batch_size`.
pub struct EpochBatches<B: Backend> {
    dataset: MemoryDataset,
    batcher: MemoryBatcher<B>,
    order:   Vec<usize>,
    cursor:  usize,
    rng:     Option<StdRng>,
}

impl<B: Backend> EpochBatches<B> {
    pub fn new(dataset: MemoryDataset, batcher: MemoryBatcher<B>, shuffle_seed: Option<u64>) -> Self {
        let mut source = Self {
            order: (0..dataset.len()).collect(),
            dataset,
            batcher,
            cursor: 0,
            rng: shuffle_seed.map(StdRng::seed_from_u64),
        };
        source.reset();
        source
    }

    /// Rewind to the start of a new epoch, reshuffling if enabled.
    pub fn reset(&mut self) {
        self.cursor = 0;
        if let Some(rng) = self.rng.as_mut() {
            self.order.shuffle(rng);
        }
    }

    pub fn sample_count(&self) -> usize {
        self.dataset.len()
    }
}

impl<B: Backend> BatchSource<B> for EpochBatches<B> {
    fn next_batch(&mut self, batch_size: usize) -> Option<MemoryBatch<B>> {
        if batch_size == 0 || self.cursor >= self.order.len() {
            return None;
        }
        let end   = (self.cursor + batch_size).min(self.order.len());
        let items = self.order[self.cursor..end]
            .iter()
            .filter_map(|&i| self.dataset.get(i))
            .collect();
        self.cursor = end;
        Some(self.batcher.batch(items))
    }
}
