// ============================================================
// Layer 4 — bAbI Task Loader
// ============================================================
// Reads the bAbI question-answering format:
//
//   1 Mary moved to the bathroom.
//   2 John went to the hallway.
//   3 Where is Mary? 	bathroom	1
//   4 Daniel went back to the hallway.
//   ...
//   1 Sandra travelled to the office.      ← id 1 starts a new story
//
// Every line starts with its id inside the story. Lines with
// tabs are questions: "question?<TAB>answer<TAB>supporting ids".
// A question sees every statement of its story read so far.
//
// Reference: Weston et al. (2015) Towards AI-Complete Question Answering

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::{Path, PathBuf}};

use crate::domain::story::StoryExample;
use crate::domain::traits::ExampleSource;
use crate::error::MemNetError;

/// Loads bAbI examples from one task file or from every `.txt`
/// file in a directory (sorted by name).
pub struct BabiLoader {
    path: PathBuf,
}

impl BabiLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn task_files(&self) -> Result<Vec<PathBuf>> {
        if !self.path.is_dir() {
            return Ok(vec![self.path.clone()]);
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)
            .with_context(|| format!("Cannot read directory '{}'", self.path.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("txt") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl ExampleSource for BabiLoader {
    fn load_all(&self) -> Result<Vec<StoryExample>> {
        let mut examples = Vec::new();
        for file in self.task_files()? {
            let loaded = load_task_file(&file)?;
            tracing::debug!("Loaded: {} ({} examples)", file.display(), loaded.len());
            examples.extend(loaded);
        }
        tracing::info!("Loaded {} bAbI examples from '{}'", examples.len(), self.path.display());
        Ok(examples)
    }
}

fn load_task_file(path: &Path) -> Result<Vec<StoryExample>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    parse_babi(&text).with_context(|| format!("Malformed bAbI file '{}'", path.display()))
}

/// Parse bAbI task text into examples, one per question line.
pub fn parse_babi(text: &str) -> std::result::Result<Vec<StoryExample>, MemNetError> {
    let mut examples = Vec::new();
    let mut story: Vec<Vec<String>> = Vec::new();
    // line id → index into `story`
    let mut line_index: HashMap<usize, usize> = HashMap::new();

    for (n, raw) in text.lines().enumerate() {
        let line_no = n + 1;
        let line    = raw.trim();
        if line.is_empty() {
            continue;
        }

        let (id, rest) = line.split_once(' ').ok_or_else(|| MemNetError::Parse {
            line:   line_no,
            reason: "expected '<id> <text>'".to_string(),
        })?;
        let id: usize = id.parse().map_err(|_| MemNetError::Parse {
            line:   line_no,
            reason: format!("invalid line id '{id}'"),
        })?;

        if id == 1 {
            story.clear();
            line_index.clear();
        }

        if rest.contains('\t') {
            let mut fields = rest.split('\t');
            let question = fields.next().unwrap_or_default();
            let answer   = fields.next().map(str::trim).filter(|a| !a.is_empty()).ok_or_else(|| {
                MemNetError::Parse { line: line_no, reason: "question without answer".to_string() }
            })?;
            let support  = fields.next().unwrap_or_default();

            let mut facts = Vec::new();
            for fact in support.split_whitespace() {
                let fact_id: usize = fact.parse().map_err(|_| MemNetError::Parse {
                    line:   line_no,
                    reason: format!("invalid supporting fact '{fact}'"),
                })?;
                match line_index.get(&fact_id) {
                    Some(&index) => facts.push(index),
                    None => tracing::warn!("line {line_no}: supporting fact {fact_id} is not a statement"),
                }
            }

            examples.push(
                StoryExample::new(story.clone(), tokenize(question), answer.to_lowercase())
                    .with_supporting_facts(facts),
            );
        } else {
            line_index.insert(id, story.len());
            story.push(tokenize(rest));
        }
    }

    Ok(examples)
}

/// Lowercase, split on whitespace, strip trailing sentence punctuation.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c| c == '.' || c == '?').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TASK: &str = "\
1 Mary moved to the bathroom.
2 John went to the hallway.
3 Where is Mary? \tbathroom\t1
4 Daniel went back to the hallway.
5 Sandra moved to the garden.
6 Where is Daniel? \thallway\t4
1 Sandra travelled to the office.
2 Where is Sandra? \toffice\t1
";

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Where is Mary? "), vec!["where", "is", "mary"]);
        assert_eq!(tokenize("Mary moved to the bathroom."), vec!["mary", "moved", "to", "the", "bathroom"]);
    }

    #[test]
    fn test_parses_questions_with_context() {
        let examples = parse_babi(TASK).unwrap();
        assert_eq!(examples.len(), 3);

        assert_eq!(examples[0].sentences.len(), 2);
        assert_eq!(examples[0].answer, "bathroom");
        assert_eq!(examples[0].supporting_facts, vec![0]);

        // Question lines are not part of the story
        assert_eq!(examples[1].sentences.len(), 4);
        assert_eq!(examples[1].supporting_facts, vec![2]);
        assert_eq!(examples[1].question, vec!["where", "is", "daniel"]);
    }

    #[test]
    fn test_id_one_starts_new_story() {
        let examples = parse_babi(TASK).unwrap();
        assert_eq!(examples[2].sentences, vec![tokenize("Sandra travelled to the office.")]);
        assert_eq!(examples[2].supporting_facts, vec![0]);
    }

    #[test]
    fn test_rejects_bad_line_id() {
        let err = parse_babi("x Mary went home.").unwrap_err();
        assert!(matches!(err, MemNetError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_rejects_question_without_answer() {
        let err = parse_babi("1 Mary went home.\n2 Where is Mary?\t\t1").unwrap_err();
        assert!(matches!(err, MemNetError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_loads_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["qa1_train.txt", "qa2_train.txt"] {
            let mut f = fs::File::create(dir.path().join(name)).unwrap();
            f.write_all(TASK.as_bytes()).unwrap();
        }
        fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let examples = BabiLoader::new(dir.path()).load_all().unwrap();
        assert_eq!(examples.len(), 6);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BabiLoader::new(dir.path().join("nope.txt")).load_all().is_err());
    }
}
