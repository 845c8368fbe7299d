// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================

use anyhow::Result;
use crate::domain::story::StoryExample;

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that can produce tokenised QA examples.
///
/// Implementations:
///   - BabiLoader    → reads bAbI task files
///   - SyntheticTask → generates "where is X" stories in memory
pub trait ExampleSource {
    /// Load all available examples from this source.
    fn load_all(&self) -> Result<Vec<StoryExample>>;
}
