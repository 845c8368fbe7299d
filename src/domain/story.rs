// ============================================================
// Layer 3 — StoryExample Domain Type
// ============================================================
// One reading-comprehension example before vectorisation:
//
//   Story:    "mary moved to the bathroom"
//             "john went to the hallway"
//   Question: "where is mary"
//   Answer:   "bathroom"
//   Support:  [0]   (index of the sentence that answers it)

use serde::{Deserialize, Serialize};

/// A tokenised story/question/answer triple.
/// Every token is already lowercased with punctuation stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryExample {
    /// Statements seen so far in the story, oldest first
    pub sentences: Vec<Vec<String>>,

    pub question: Vec<String>,

    pub answer: String,

    /// Indices into `sentences` of the facts that support the answer
    pub supporting_facts: Vec<usize>,
}

impl StoryExample {
    pub fn new(
        sentences: Vec<Vec<String>>,
        question:  Vec<String>,
        answer:    impl Into<String>,
    ) -> Self {
        Self {
            sentences,
            question,
            answer: answer.into(),
            supporting_facts: Vec::new(),
        }
    }

    pub fn with_supporting_facts(mut self, facts: Vec<usize>) -> Self {
        self.supporting_facts = facts;
        self
    }

    /// Every token in the example: sentences, question, then answer.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.sentences
            .iter()
            .flatten()
            .chain(self.question.iter())
            .map(String::as_str)
            .chain(std::iter::once(self.answer.as_str()))
    }

    pub fn longest_sentence(&self) -> usize {
        self.sentences.iter().map(Vec::len).max().unwrap_or(0)
    }
}
