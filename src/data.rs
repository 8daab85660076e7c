// src/data.rs

//! Loading of the two static data files: the question bank and the
//! learning-topic catalog. Both are read once and then shared read-only.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::models::{question::Question, topic::LearningTopics};

/// Bytes of source text kept on each side of a parse error.
const CONTEXT_RADIUS: usize = 50;

/// Why a data file could not be loaded.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadError {
    /// The file could not be read at all.
    Fetch { path: String, message: String },
    /// The file was read but is not valid JSON for its schema.
    Parse {
        path: String,
        message: String,
        line: usize,
        column: usize,
        context: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Fetch { path, message } => {
                write!(f, "failed to load {}: {}", path, message)
            }
            LoadError::Parse { path, message, .. } => {
                write!(f, "JSON format error in {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Ordered, read-only question list with an id index.
#[derive(Debug, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
    by_id: HashMap<String, usize>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        let mut by_id = HashMap::with_capacity(questions.len());
        for (idx, q) in questions.iter().enumerate() {
            if let Some(problem) = q.consistency_problem() {
                tracing::warn!("Question {} is inconsistent: {}", q.id, problem);
            }
            if by_id.insert(q.id.clone(), idx).is_some() {
                tracing::warn!("Duplicate question id {}, lookups resolve to the last one", q.id);
            }
        }
        Self { questions, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.by_id.get(id).map(|&idx| &self.questions[idx])
    }

    pub fn at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

pub async fn load_questions(path: &Path) -> Result<QuestionBank, LoadError> {
    let questions: Vec<Question> = load_json(path).await?;
    tracing::info!("Loaded {} questions from {}", questions.len(), path.display());
    Ok(QuestionBank::new(questions))
}

pub async fn load_topics(path: &Path) -> Result<LearningTopics, LoadError> {
    let topics: LearningTopics = load_json(path).await?;
    tracing::info!("Loaded {} catalog years from {}", topics.years.len(), path.display());
    Ok(topics)
}

async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        tracing::error!("Failed to read {}: {:?}", path.display(), e);
        LoadError::Fetch {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    })?;

    parse_json(path, &text)
}

fn parse_json<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T, LoadError> {
    serde_json::from_str(text).map_err(|e| {
        let context = error_context(text, e.line(), e.column());
        tracing::error!("JSON parse error in {}: {}", path.display(), e);
        tracing::error!("Context around error: {}", context);
        LoadError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
            line: e.line(),
            column: e.column(),
            context,
        }
    })
}

/// Source text around a 1-based line/column position.
fn error_context(text: &str, line: usize, column: usize) -> String {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let pos = floor_boundary(text, line_start + column.saturating_sub(1));

    let start = floor_boundary(text, pos.saturating_sub(CONTEXT_RADIUS));
    let end = ceil_boundary(text, pos + CONTEXT_RADIUS);
    text[start..end].to_string()
}

fn floor_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[derive(Debug, Clone)]
struct Loaded {
    questions: Result<Arc<QuestionBank>, LoadError>,
    topics: Result<Arc<LearningTopics>, LoadError>,
}

/// What a successful reload picked up.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadOutcome {
    pub questions: usize,
    pub catalog_years: Option<usize>,
    pub catalog_error: Option<LoadError>,
}

/// Shared handle to the last load of both data files.
///
/// A failed load is kept as an error value and reported to whoever asks;
/// `reload` retries both files.
pub struct DataHandle {
    questions_path: PathBuf,
    topics_path: PathBuf,
    loaded: RwLock<Loaded>,
}

impl DataHandle {
    pub async fn load(questions_path: PathBuf, topics_path: PathBuf) -> Self {
        let loaded = Self::read(&questions_path, &topics_path).await;
        Self {
            questions_path,
            topics_path,
            loaded: RwLock::new(loaded),
        }
    }

    /// Handle over data that is already in memory.
    pub fn from_parts(questions: QuestionBank, topics: LearningTopics) -> Self {
        Self {
            questions_path: PathBuf::new(),
            topics_path: PathBuf::new(),
            loaded: RwLock::new(Loaded {
                questions: Ok(Arc::new(questions)),
                topics: Ok(Arc::new(topics)),
            }),
        }
    }

    async fn read(questions_path: &Path, topics_path: &Path) -> Loaded {
        let (questions, topics) = tokio::join!(load_questions(questions_path), load_topics(topics_path));
        Loaded {
            questions: questions.map(Arc::new),
            topics: topics.map(Arc::new),
        }
    }

    /// Re-reads both files. Fails only when the question bank could not be
    /// loaded; a catalog failure is reported in the outcome.
    pub async fn reload(&self) -> Result<ReloadOutcome, LoadError> {
        let fresh = Self::read(&self.questions_path, &self.topics_path).await;
        let outcome = match &fresh.questions {
            Ok(bank) => Ok(ReloadOutcome {
                questions: bank.len(),
                catalog_years: fresh.topics.as_ref().map(|t| t.years.len()).ok(),
                catalog_error: fresh.topics.as_ref().err().cloned(),
            }),
            Err(e) => Err(e.clone()),
        };
        *self.loaded.write().await = fresh;
        outcome
    }

    pub async fn questions(&self) -> Result<Arc<QuestionBank>, LoadError> {
        self.loaded.read().await.questions.clone()
    }

    pub async fn topics(&self) -> Result<Arc<LearningTopics>, LoadError> {
        self.loaded.read().await.topics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_position_and_context() {
        let text = "[\n  {\"id\": \"q1\",\n   \"year\": }\n]";
        let err = parse_json::<Vec<Question>>(Path::new("questions.json"), text).unwrap_err();

        match err {
            LoadError::Parse { line, context, .. } => {
                assert_eq!(line, 3);
                assert!(context.contains("\"year\": }"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn error_context_stays_on_char_boundaries() {
        let text = "設問".repeat(40);
        let ctx = error_context(&text, 1, 61);
        assert!(!ctx.is_empty());
        assert!(ctx.len() <= 2 * CONTEXT_RADIUS + 3);
    }

    #[tokio::test]
    async fn missing_file_is_a_fetch_error() {
        let err = load_questions(Path::new("/nonexistent/questions.json")).await.unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
    }

    #[tokio::test]
    async fn handle_reports_failed_load_per_request() {
        let handle = DataHandle::load(
            PathBuf::from("/nonexistent/questions.json"),
            PathBuf::from("/nonexistent/learningTopics.json"),
        )
        .await;

        assert!(handle.questions().await.is_err());
        assert!(handle.topics().await.is_err());
        assert!(handle.reload().await.is_err());
    }

    #[tokio::test]
    async fn reload_succeeds_when_only_the_catalog_fails() {
        let dir = std::env::temp_dir().join(format!("quiz-reload-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let questions = dir.join("questions.json");
        tokio::fs::write(&questions, "[]").await.unwrap();

        let handle = DataHandle::load(questions, dir.join("missing.json")).await;
        let outcome = handle.reload().await.unwrap();

        assert_eq!(outcome.questions, 0);
        assert_eq!(outcome.catalog_years, None);
        assert!(matches!(outcome.catalog_error, Some(LoadError::Fetch { .. })));
        assert!(handle.questions().await.is_ok());
        assert!(handle.topics().await.is_err());
    }
}
