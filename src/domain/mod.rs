// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types for the question-answering task:
// stories made of sentences, a question, and a one-word answer.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs, enums, and traits

// A story with its question and answer, still as words
pub mod story;

// Core abstractions (traits) that other layers implement
pub mod traits;
