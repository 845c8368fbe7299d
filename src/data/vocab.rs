// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Word-level vocabulary built from the training corpus.
//
//   id 0        → "<pad>"   (always embeds to the zero vector)
//   id 1..V-1   → corpus words, most frequent first,
//                 ties broken alphabetically
//
// Answers are ordinary vocabulary words, so an answer's
// candidate id is its vocabulary id and num_candidates = V.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::story::StoryExample;
use crate::error::{MemNetError, Result};

pub const PAD_TOKEN: &str = "<pad>";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    words: Vec<String>,
    ids:   HashMap<String, u32>,
}

impl Vocabulary {
    /// Build from every token of every example.
    pub fn build(examples: &[StoryExample]) -> Self {
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for token in examples.iter().flat_map(|ex| ex.tokens()) {
            if token != PAD_TOKEN {
                *freq.entry(token).or_insert(0) += 1;
            }
        }

        let mut counted: Vec<(&str, usize)> = freq.into_iter().collect();
        counted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let words = std::iter::once(PAD_TOKEN)
            .chain(counted.into_iter().map(|(w, _)| w))
            .map(String::from);
        let vocab = Self::from_words(words);

        tracing::info!("Vocabulary built with {} words (including padding)", vocab.len());
        vocab
    }

    fn from_words(words: impl IntoIterator<Item = String>) -> Self {
        let words: Vec<String> = words.into_iter().collect();
        let ids = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32))
            .collect();
        Self { words, ids }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn id(&self, token: &str) -> Result<u32> {
        self.ids
            .get(token)
            .copied()
            .ok_or_else(|| MemNetError::UnknownToken(token.to_string()))
    }

    pub fn token(&self, id: u32) -> Option<&str> {
        self.words.get(id as usize).map(String::as_str)
    }

    pub fn encode(&self, tokens: &[String]) -> Result<Vec<u32>> {
        tokens.iter().map(|t| self.id(t)).collect()
    }
}
