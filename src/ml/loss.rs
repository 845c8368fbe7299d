// ============================================================
// Layer 5 — Loss and Accuracy
// ============================================================
// loss     = mean over the batch of sparse cross-entropy(logits, answer)
// accuracy = fraction of examples whose argmax logit is the answer
//
// argmax is taken on the logits directly; softmax is monotonic,
// so it would pick the same candidate.

use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};

/// logits: [batch, num_candidates], answers: [batch] → [1]
pub fn cross_entropy<B: Backend>(
    logits:  Tensor<B, 2>,
    answers: Tensor<B, 1, Int>,
) -> Tensor<B, 1> {
    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, answers)
}

/// Predicted candidate id per example: [batch]
pub fn predictions<B: Backend>(logits: Tensor<B, 2>) -> Tensor<B, 1, Int> {
    let [batch, _] = logits.dims();
    // argmax(1) keeps the reduced dim: [batch, 1]
    logits.argmax(1).reshape([batch])
}

pub fn accuracy<B: Backend>(logits: Tensor<B, 2>, answers: Tensor<B, 1, Int>) -> f64 {
    let [batch, _] = logits.dims();
    if batch == 0 {
        return 0.0;
    }
    let correct: i64 = predictions(logits)
        .equal(answers)
        .int().sum().into_scalar().elem::<i64>();
    correct as f64 / batch as f64
}
