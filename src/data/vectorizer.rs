// ============================================================
// Layer 4 — Vectorizer
// ============================================================
// Turns word-level examples into the fixed-shape id arrays the
// model consumes:
//
//   story    → memsize × sentence_size ids
//   question → qlen ids
//   answer   → one id
//
// Long stories keep their most recent `memsize` sentences.
// Sentences and questions are truncated or right-padded with 0.
// Unused memory slots are all-padding.

use crate::data::dataset::MemorySample;
use crate::data::vocab::Vocabulary;
use crate::domain::story::StoryExample;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vectorizer {
    pub memsize:       usize,
    pub sentence_size: usize,
    pub qlen:          usize,
}

impl Vectorizer {
    pub fn new(memsize: usize, sentence_size: usize, qlen: usize) -> Self {
        Self { memsize, sentence_size, qlen }
    }

    /// Smallest shapes that hold the corpus without truncating words,
    /// with the memory capped at `max_memsize` sentences.
    pub fn fit(examples: &[StoryExample], max_memsize: usize) -> Self {
        let longest_story = examples.iter().map(|e| e.sentences.len()).max().unwrap_or(0);
        let sentence_size = examples.iter().map(StoryExample::longest_sentence).max().unwrap_or(0);
        let qlen          = examples.iter().map(|e| e.question.len()).max().unwrap_or(0);

        let fitted = Self::new(
            longest_story.min(max_memsize).max(1),
            sentence_size.max(1),
            qlen.max(1),
        );
        tracing::info!(
            "Vectorizer shapes: memsize={} sentence_size={} qlen={} (longest story {})",
            fitted.memsize, fitted.sentence_size, fitted.qlen, longest_story
        );
        fitted
    }

    pub fn vectorize(&self, example: &StoryExample, vocab: &Vocabulary) -> Result<MemorySample> {
        let mut story = vec![0u32; self.memsize * self.sentence_size];
        let skip      = example.sentences.len().saturating_sub(self.memsize);

        for (slot, sentence) in example.sentences.iter().skip(skip).enumerate() {
            let ids   = vocab.encode(sentence)?;
            let start = slot * self.sentence_size;
            for (offset, id) in ids.into_iter().take(self.sentence_size).enumerate() {
                story[start + offset] = id;
            }
        }

        let mut question = vocab.encode(&example.question)?;
        question.resize(self.qlen, 0);

        Ok(MemorySample {
            story,
            question,
            answer: vocab.id(&example.answer)?,
        })
    }

    pub fn vectorize_all(
        &self,
        examples: &[StoryExample],
        vocab:    &Vocabulary,
    ) -> Result<Vec<MemorySample>> {
        let lost = examples.iter().filter(|e| self.drops_support(e)).count();
        if lost > 0 {
            tracing::warn!(
                "{} of {} examples lose a supporting fact to memsize={}",
                lost,
                examples.len(),
                self.memsize,
            );
        }
        examples.iter().map(|e| self.vectorize(e, vocab)).collect()
    }

    /// True when truncating to the latest `memsize` sentences removes
    /// one of the example's supporting facts.
    pub fn drops_support(&self, example: &StoryExample) -> bool {
        let skip = example.sentences.len().saturating_sub(self.memsize);
        example.supporting_facts.iter().any(|&fact| fact < skip)
    }
}
