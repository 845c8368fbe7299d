// ============================================================
// Layer 5 — Position Encoding
// ============================================================
// Fixed multiplicative weights that make the bag-of-words sum
// over a sentence sensitive to word order.
//
// For word position j in [1, L] and embedding dimension i in [1, D]:
//
//   raw   = (i - (D+1)/2) * (j - (L+1)/2)
//   value = 1 + 4 * raw / (D * L)
//
// The table is a pure function of (L, D). The model builds it
// once at construction and never trains it.
//
// Reference: Sukhbaatar et al. (2015) End-To-End Memory Networks, §4.1

use burn::prelude::*;

/// Row-major `[len, dim]` position-encoding table.
pub fn position_encoding(len: usize, dim: usize) -> Vec<f32> {
    let mut table = Vec::with_capacity(len * dim);
    let len_center = (len as f32 + 1.0) / 2.0;
    let dim_center = (dim as f32 + 1.0) / 2.0;
    let scale      = (dim * len) as f32;

    for j in 1..=len {
        for i in 1..=dim {
            let raw = (i as f32 - dim_center) * (j as f32 - len_center);
            table.push(1.0 + 4.0 * raw / scale);
        }
    }
    table
}

/// The same table as a `[len, dim]` tensor on `device`.
pub fn position_encoding_tensor<B: Backend>(
    len:    usize,
    dim:    usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let table = position_encoding(len, dim);
    Tensor::<B, 1>::from_floats(table.as_slice(), device).reshape([len, dim])
}
