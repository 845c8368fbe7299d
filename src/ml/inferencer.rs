// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Answers questions with a trained model: Eval mode, no noise,
// no gold answers needed.
use burn::prelude::*;

use crate::data::batcher::MemoryBatch;
use crate::data::vocab::Vocabulary;
use crate::error::Result;
use crate::ml::loss::predictions;
use crate::ml::mode::RunMode;
use crate::ml::model::MemN2N;

pub struct Inferencer<B: Backend> {
    model: MemN2N<B>,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: MemN2N<B>) -> Self {
        Self { model }
    }

    /// One candidate id per example.
    pub fn predict(
        &self,
        stories:   Tensor<B, 3, Int>,
        questions: Tensor<B, 2, Int>,
    ) -> Result<Vec<u32>> {
        self.model.check_batch(&stories, &questions, None)?;
        let logits = self.model.forward(stories, questions, RunMode::Eval);
        Ok(predictions(logits)
            .into_data()
            .iter::<i64>()
            .map(|id| id as u32)
            .collect())
    }

    /// Predicted answers as words, paired with the gold answer.
    pub fn predict_words(
        &self,
        batch: MemoryBatch<B>,
        vocab: &Vocabulary,
    ) -> Result<Vec<(String, String)>> {
        let predicted = self.predict(batch.stories, batch.questions)?;
        let gold: Vec<u32> = batch
            .answers
            .into_data()
            .iter::<i64>()
            .map(|id| id as u32)
            .collect();

        let word = |id: u32| vocab.token(id).unwrap_or("<unk>").to_string();
        Ok(predicted
            .into_iter()
            .zip(gold)
            .map(|(p, g)| (word(p), word(g)))
            .collect())
    }
}
