// ============================================================
// Layer 5 — Masked Embedding Lookup
// ============================================================
// Every embedding table reserves row 0 for the padding token.
// The stored row may hold anything (it is randomly initialised
// like every other row) but a lookup must always return zeros.
//
// The table is multiplied by a constant mask whose first row is
// zero before each lookup. The mask also blocks gradients into
// row 0, so the optimizer never moves it.

use burn::prelude::*;
use burn::tensor::module::embedding;

/// Padding token id, shared by every table.
pub const PAD_ID: usize = 0;

/// `[vocab_size, dim]` mask: zeros in row `PAD_ID`, ones elsewhere.
pub fn padding_mask<B: Backend>(
    vocab_size: usize,
    dim:        usize,
    device:     &B::Device,
) -> Tensor<B, 2> {
    let mut mask = vec![1.0f32; vocab_size * dim];
    let pad_row  = PAD_ID * dim;
    mask[pad_row..pad_row + dim].iter_mut().for_each(|v| *v = 0.0);
    Tensor::<B, 1>::from_floats(mask.as_slice(), device).reshape([vocab_size, dim])
}

/// Look up `ids: [rows, len]` in `table: [vocab_size, dim]`,
/// returning `[rows, len, dim]` with padding ids mapped to zero.
pub fn masked_lookup<B: Backend>(
    table: Tensor<B, 2>,
    mask:  Tensor<B, 2>,
    ids:   Tensor<B, 2, Int>,
) -> Tensor<B, 3> {
    embedding(table * mask, ids)
}
