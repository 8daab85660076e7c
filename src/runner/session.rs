// src/runner/session.rs

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::data::QuestionBank;
use crate::models::progress::{ProgressRecord, ProgressSummary};
use crate::models::question::{Language, Question};
use crate::runner::filter::{QuizFilter, theme_options};
use crate::runner::persistence;
use crate::store::{KeyValueStore, StorageError};

#[derive(Debug)]
pub enum SessionError {
    /// The active filter matches no question.
    NoQuestions,
    /// The current question already has an answer and is locked.
    AlreadyAnswered(String),
    InvalidChoice { index: usize, choices: usize },
    Storage(StorageError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoQuestions => f.write_str("no questions match the current filter"),
            SessionError::AlreadyAnswered(id) => write!(f, "question {} has already been answered", id),
            SessionError::InvalidChoice { index, choices } => {
                write!(f, "choice {} does not exist ({} choices)", index, choices)
            }
            SessionError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        SessionError::Storage(err)
    }
}

/// Outcome of an answer, as shown under the choices.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResult {
    pub selected_index: usize,
    pub correct: bool,
    pub correct_choice_index: usize,
    pub message: String,
    pub explanation: String,
    pub source_url: Option<String>,
    pub source_label: Option<String>,
}

impl AnswerResult {
    fn new(q: &Question, selected_index: usize, lang: Language) -> Self {
        let correct = q.is_correct(selected_index);
        let source_url = q.source().map(String::from);
        Self {
            selected_index,
            correct,
            correct_choice_index: q.correct_choice_index,
            message: lang.result_label(correct).to_string(),
            explanation: q.explanation(lang).to_string(),
            source_label: source_url.as_ref().map(|_| lang.source_label().to_string()),
            source_url,
        }
    }
}

/// The question card.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub theme: String,
    pub difficulty: String,
    pub tags: Vec<String>,
    /// 1-based position inside the filtered set.
    pub number: usize,
    pub total: usize,
    pub text: String,
    pub choices: Vec<String>,
    /// Answered questions are shown with their result and accept no input.
    pub locked: bool,
    pub result: Option<AnswerResult>,
}

/// A wrong latest answer inside the current filter.
#[derive(Debug, Clone, Serialize)]
pub struct IncorrectAnswer {
    pub id: String,
    pub theme: String,
    pub text: String,
    pub selected_index: usize,
    pub selected_choice: Option<String>,
    pub correct_choice: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub filter: QuizFilter,
    pub language: Language,
    pub language_label: &'static str,
    pub theme_options: Vec<String>,
    pub question: Option<QuestionView>,
    pub progress: ProgressSummary,
}

/// State of one quiz page: what is filtered, where we are and what the
/// user has answered so far.
pub struct QuizSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
    bank: Arc<QuestionBank>,
    filter: QuizFilter,
    order: Vec<usize>,
    position: usize,
    language: Language,
    user_name: Option<String>,
    progress: ProgressRecord,
}

impl QuizSession {
    /// Loads the current user's progress and applies `filter`.
    pub async fn open<R: Rng + Send>(
        bank: Arc<QuestionBank>,
        store: &dyn KeyValueStore,
        filter: QuizFilter,
        rng: &mut R,
    ) -> Result<Self, StorageError> {
        let user_name = persistence::current_user_name(store).await?;
        let progress = persistence::load_progress(store, user_name.as_deref()).await?;
        let now = Utc::now();

        let mut session = Self {
            id: Uuid::new_v4(),
            started_at: now,
            last_active: now,
            bank,
            filter: QuizFilter::default(),
            order: Vec::new(),
            position: 0,
            language: Language::default(),
            user_name,
            progress,
        };
        session.apply_filter(store, filter, rng).await?;

        tracing::debug!(
            "Opened quiz session {} for {} with {} questions",
            session.id,
            session.user_name.as_deref().unwrap_or("anonymous"),
            session.order.len()
        );
        Ok(session)
    }

    /// Re-filters (and reshuffles in random mode), then restores the saved
    /// position for the new combination.
    pub async fn apply_filter<R: Rng + Send>(
        &mut self,
        store: &dyn KeyValueStore,
        filter: QuizFilter,
        rng: &mut R,
    ) -> Result<(), StorageError> {
        self.order = filter.arrange(&self.bank, rng);
        self.filter = filter;

        let saved = persistence::load_position(store, &self.filter).await?;
        self.position = if saved < self.order.len() { saved } else { 0 };
        self.touch();
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn filter(&self) -> &QuizFilter {
        &self.filter
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn progress(&self) -> &ProgressRecord {
        &self.progress
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    fn current_question(&self) -> Option<&Question> {
        self.order
            .get(self.position)
            .and_then(|&idx| self.bank.at(idx))
    }

    fn filtered(&self) -> impl Iterator<Item = &Question> {
        self.order.iter().filter_map(|&idx| self.bank.at(idx))
    }

    /// The question card at the current position, if the filter matched any.
    pub fn current(&self) -> Option<QuestionView> {
        let q = self.current_question()?;
        let lang = self.language;
        let result = self
            .progress
            .entry(&q.id)
            .map(|a| AnswerResult::new(q, a.selected_index, lang));

        Some(QuestionView {
            id: q.id.clone(),
            theme: q.theme.clone(),
            difficulty: q.difficulty.clone(),
            tags: q.tags.clone(),
            number: self.position + 1,
            total: self.order.len(),
            text: q.text(lang).to_string(),
            choices: q.choices(lang).to_vec(),
            locked: result.is_some(),
            result,
        })
    }

    /// Answers the current question and persists the progress record.
    pub async fn select(
        &mut self,
        store: &dyn KeyValueStore,
        selected_index: usize,
    ) -> Result<AnswerResult, SessionError> {
        let lang = self.language;
        let (id, result) = {
            let q = self.current_question().ok_or(SessionError::NoQuestions)?;
            if self.progress.entry(&q.id).is_some() {
                return Err(SessionError::AlreadyAnswered(q.id.clone()));
            }
            let choices = q.choices(lang).len();
            if selected_index >= choices {
                return Err(SessionError::InvalidChoice {
                    index: selected_index,
                    choices,
                });
            }
            (q.id.clone(), AnswerResult::new(q, selected_index, lang))
        };

        self.progress.record_answer(&id, selected_index, result.correct);
        persistence::save_progress(store, self.user_name.as_deref(), &self.progress).await?;
        self.touch();

        tracing::debug!("Session {} answered {} with {} (correct: {})", self.id, id, selected_index, result.correct);
        Ok(result)
    }

    /// Advances one question, wrapping to the start, and remembers the
    /// position for the current filter.
    pub async fn next(&mut self, store: &dyn KeyValueStore) -> Result<Option<QuestionView>, SessionError> {
        self.position += 1;
        if self.position >= self.order.len() {
            self.position = 0;
        }
        persistence::save_position(store, &self.filter, self.position).await?;
        self.touch();
        Ok(self.current())
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.touch();
    }

    pub fn toggle_language(&mut self) -> Language {
        self.set_language(self.language.toggled());
        self.language
    }

    /// Switches to another learner and loads their progress. A blank name
    /// leaves both the session and the stored user name as they are.
    pub async fn switch_user(&mut self, store: &dyn KeyValueStore, name: &str) -> Result<(), StorageError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }

        persistence::set_current_user_name(store, name).await?;
        self.progress = persistence::load_progress(store, Some(name)).await?;
        self.user_name = Some(name.to_string());
        self.touch();
        Ok(())
    }

    /// Clears this user's progress and every saved position.
    pub async fn reset(&mut self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        persistence::reset_progress(store, self.user_name.as_deref()).await?;
        self.progress = ProgressRecord::default();
        self.position = 0;
        self.touch();
        Ok(())
    }

    pub fn summary(&self) -> ProgressSummary {
        self.progress.summary(self.filtered().map(|q| q.id.as_str()))
    }

    pub fn incorrect_answers(&self) -> Vec<IncorrectAnswer> {
        let lang = self.language;
        self.filtered()
            .filter_map(|q| {
                let answer = self.progress.entry(&q.id).filter(|a| !a.correct)?;
                let choices = q.choices(lang);
                Some(IncorrectAnswer {
                    id: q.id.clone(),
                    theme: q.theme.clone(),
                    text: q.text(lang).to_string(),
                    selected_index: answer.selected_index,
                    selected_choice: choices.get(answer.selected_index).cloned(),
                    correct_choice: choices.get(q.correct_choice_index).cloned(),
                })
            })
            .collect()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            started_at: self.started_at,
            user_name: self.user_name.clone(),
            filter: self.filter.clone(),
            language: self.language,
            language_label: self.language.display_name(),
            theme_options: theme_options(&self.bank, &self.filter.year, &self.filter.category),
            question: self.current(),
            progress: self.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::models::progress::AnswerEntry;
    use crate::models::question::fixtures::question;
    use crate::runner::filter::{Mode, Selector};
    use crate::store::MemoryStore;

    fn bank() -> Arc<QuestionBank> {
        Arc::new(QuestionBank::new(vec![
            question("q1", "Year1", "governance", "承認フロー", 1),
            question("q2", "Year1", "governance", "承認フロー", 0),
            question("q3", "Year1", "business", "報連相", 2),
        ]))
    }

    fn governance() -> QuizFilter {
        QuizFilter {
            category: Selector::only("governance"),
            ..Default::default()
        }
    }

    async fn open(store: &MemoryStore, filter: QuizFilter) -> QuizSession {
        let mut rng = StdRng::seed_from_u64(3);
        QuizSession::open(bank(), store, filter, &mut rng).await.unwrap()
    }

    #[tokio::test]
    async fn correct_answer_is_recorded_and_persisted() {
        let store = MemoryStore::new();
        let mut session = open(&store, QuizFilter::default()).await;

        let result = session.select(&store, 1).await.unwrap();

        assert!(result.correct);
        assert_eq!(result.message, "✓ 正解");
        assert_eq!(
            session.progress(),
            &ProgressRecord {
                answered: vec![AnswerEntry {
                    id: "q1".to_string(),
                    selected_index: 1,
                    correct: true
                }],
                correct: 1,
                total: 1,
            }
        );
        let stored = persistence::load_progress(&store, None).await.unwrap();
        assert_eq!(&stored, session.progress());
    }

    #[tokio::test]
    async fn answered_question_is_locked_on_render() {
        let store = MemoryStore::new();
        let mut session = open(&store, QuizFilter::default()).await;
        session.select(&store, 0).await.unwrap();

        let view = session.current().unwrap();
        assert!(view.locked);
        let result = view.result.unwrap();
        assert!(!result.correct);
        assert_eq!(result.correct_choice_index, 1);

        let again = session.select(&store, 1).await;
        assert!(matches!(again, Err(SessionError::AlreadyAnswered(id)) if id == "q1"));

        // a fresh visit sees the stored answer and stays locked
        let reopened = open(&store, QuizFilter::default()).await;
        assert!(reopened.current().unwrap().locked);
    }

    #[tokio::test]
    async fn out_of_range_choice_is_rejected() {
        let store = MemoryStore::new();
        let mut session = open(&store, QuizFilter::default()).await;

        let err = session.select(&store, 4).await.unwrap_err();

        assert!(matches!(err, SessionError::InvalidChoice { index: 4, choices: 4 }));
        assert_eq!(session.progress().total, 0);
    }

    #[tokio::test]
    async fn next_wraps_and_position_is_restored_per_filter() {
        let store = MemoryStore::new();
        let mut session = open(&store, governance()).await;
        assert_eq!(session.len(), 2);

        assert_eq!(session.next(&store).await.unwrap().unwrap().id, "q2");
        assert_eq!(session.next(&store).await.unwrap().unwrap().id, "q1");
        session.next(&store).await.unwrap();

        let reopened = open(&store, governance()).await;
        assert_eq!(reopened.position(), 1);

        // a different combination starts from the top
        let other = open(&store, QuizFilter::default()).await;
        assert_eq!(other.position(), 0);
    }

    #[tokio::test]
    async fn stale_position_past_the_end_falls_back_to_zero() {
        let store = MemoryStore::new();
        store.set(&governance().index_key(), "9").await.unwrap();

        let session = open(&store, governance()).await;

        assert_eq!(session.position(), 0);
    }

    #[tokio::test]
    async fn empty_filter_has_no_question() {
        let store = MemoryStore::new();
        let filter = QuizFilter {
            year: Selector::only("Year3"),
            ..Default::default()
        };
        let mut session = open(&store, filter).await;

        assert!(session.current().is_none());
        assert!(matches!(session.select(&store, 0).await, Err(SessionError::NoQuestions)));
        assert!(session.next(&store).await.unwrap().is_none());
        assert_eq!(session.summary().accuracy, 0);
    }

    #[tokio::test]
    async fn summary_ignores_answers_outside_filter() {
        let store = MemoryStore::new();
        let mut everything = open(&store, QuizFilter::default()).await;
        everything.select(&store, 1).await.unwrap();
        everything.next(&store).await.unwrap();
        everything.next(&store).await.unwrap();
        everything.select(&store, 0).await.unwrap();

        let business = open(
            &store,
            QuizFilter {
                category: Selector::only("business"),
                ..Default::default()
            },
        )
        .await;
        let summary = business.summary();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.answered, 1);
        assert_eq!(summary.correct, 0);
        assert_eq!(business.incorrect_answers()[0].id, "q3");
        assert_eq!(everything.summary().accuracy, 50);
    }

    #[tokio::test]
    async fn language_switch_changes_rendered_text() {
        let store = MemoryStore::new();
        let mut session = open(&store, QuizFilter::default()).await;

        assert_eq!(session.current().unwrap().choices[0], "ア");
        assert_eq!(session.toggle_language(), Language::En);
        let view = session.current().unwrap();
        assert_eq!(view.text, "Question q1");
        assert_eq!(view.choices[0], "A");
    }

    #[tokio::test]
    async fn switch_user_loads_their_progress_and_reset_clears_it() {
        let store = MemoryStore::new();
        let mut session = open(&store, QuizFilter::default()).await;
        session.switch_user(&store, "hana").await.unwrap();
        session.select(&store, 1).await.unwrap();

        session.switch_user(&store, "ken").await.unwrap();
        assert_eq!(session.progress().total, 0);

        session.switch_user(&store, "hana").await.unwrap();
        assert_eq!(session.progress().total, 1);

        session.reset(&store).await.unwrap();
        assert_eq!(session.progress().total, 0);
        assert_eq!(store.get("quizProgress_hana").await.unwrap(), None);
    }

    #[tokio::test]
    async fn blank_switch_keeps_session_and_stored_user_in_step() {
        let store = MemoryStore::new();
        let mut session = open(&store, QuizFilter::default()).await;
        session.switch_user(&store, "hana").await.unwrap();
        session.select(&store, 1).await.unwrap();

        session.switch_user(&store, "   ").await.unwrap();

        assert_eq!(session.user_name(), Some("hana"));
        assert_eq!(persistence::current_user_name(&store).await.unwrap().as_deref(), Some("hana"));
        assert_eq!(session.progress().total, 1);
    }

    #[tokio::test]
    async fn random_mode_keeps_the_filtered_ids() {
        let store = MemoryStore::new();
        let session = open(
            &store,
            QuizFilter {
                mode: Mode::Random,
                ..Default::default()
            },
        )
        .await;

        let mut ids: Vec<String> = session.filtered().map(|q| q.id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["q1", "q2", "q3"]);
    }
}
