use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One fully vectorised and padded example.
/// `story` is row-major [memsize, sentence_size]; 0 is padding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySample {
    pub story:    Vec<u32>,
    pub question: Vec<u32>,
    pub answer:   u32,
}

pub struct MemoryDataset {
    samples: Vec<MemorySample>,
}

impl MemoryDataset {
    pub fn new(samples: Vec<MemorySample>) -> Self { Self { samples } }

}

impl Dataset<MemorySample> for MemoryDataset {
    fn get(&self, index: usize) -> Option<MemorySample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
