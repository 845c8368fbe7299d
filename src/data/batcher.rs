// ============================================================
// Layer 4 — Memory Batcher
// ============================================================
// Implements Burn's Batcher trait: stacks padded MemorySamples
// into the three integer tensors the model consumes.
//
//   stories   [batch, memsize, sentence_size]
//   questions [batch, qlen]
//   answers   [batch]
//
// Samples are already padded, so each tensor is built from one
// flat Vec and reshaped.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::MemorySample;
use crate::data::vectorizer::Vectorizer;

#[derive(Debug, Clone)]
pub struct MemoryBatch<B: Backend> {
    pub stories:   Tensor<B, 3, Int>,
    pub questions: Tensor<B, 2, Int>,
    pub answers:   Tensor<B, 1, Int>,
}

impl<B: Backend> MemoryBatch<B> {
    pub fn len(&self) -> usize {
        self.answers.dims()[0]
    }
}

#[derive(Clone, Debug)]
pub struct MemoryBatcher<B: Backend> {
    pub device: B::Device,
    shapes:     Vectorizer,
}

impl<B: Backend> MemoryBatcher<B> {
    pub fn new(device: B::Device, shapes: Vectorizer) -> Self {
        Self { device, shapes }
    }
}

impl<B: Backend> Batcher<MemorySample, MemoryBatch<B>> for MemoryBatcher<B> {
    fn batch(&self, items: Vec<MemorySample>) -> MemoryBatch<B> {
        let batch_size = items.len();
        let Vectorizer { memsize, sentence_size, qlen } = self.shapes;

        let story_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.story.iter().map(|&x| x as i32))
            .collect();
        let question_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.question.iter().map(|&x| x as i32))
            .collect();
        let answers: Vec<i32> = items.iter().map(|s| s.answer as i32).collect();

        let stories = Tensor::<B, 1, Int>::from_ints(story_flat.as_slice(), &self.device)
            .reshape([batch_size, memsize, sentence_size]);
        let questions = Tensor::<B, 1, Int>::from_ints(question_flat.as_slice(), &self.device)
            .reshape([batch_size, qlen]);
        let answers = Tensor::<B, 1, Int>::from_ints(answers.as_slice(), &self.device);

        MemoryBatch { stories, questions, answers }
    }
}
