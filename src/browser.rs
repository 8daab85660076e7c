// src/browser.rs

//! Admin view over the question bank and the stored learner progress.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::QuestionBank;
use crate::models::progress::ProgressRecord;
use crate::models::question::Question;
use crate::runner::filter::Selector;
use crate::store::keys::progress_owner;
use crate::store::{KeyValueStore, StorageError};

/// Search box plus the three dropdowns of the admin table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub year: Selector,
    #[serde(default)]
    pub category: Selector,
    #[serde(default)]
    pub difficulty: Selector,
}

/// Row of the admin table.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionRow {
    pub id: String,
    pub year: String,
    pub category: String,
    pub theme: String,
    pub difficulty: String,
    pub tags: Vec<String>,
}

impl From<&Question> for QuestionRow {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            year: q.year.clone(),
            category: q.category.clone(),
            theme: q.theme.clone(),
            difficulty: q.difficulty.clone(),
            tags: q.tags.clone(),
        }
    }
}

fn searchable_text(q: &Question) -> String {
    [q.id.as_str(), q.theme.as_str(), q.learning_goal_ja.as_str(), q.learning_goal_en.as_str()]
        .into_iter()
        .chain(q.tags.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl AdminQuery {
    pub fn matches(&self, q: &Question) -> bool {
        if !(self.year.matches(&q.year)
            && self.category.matches(&q.category)
            && self.difficulty.matches(&q.difficulty))
        {
            return false;
        }

        match self.search.as_deref().filter(|s| !s.is_empty()) {
            Some(term) => searchable_text(q).contains(&term.to_lowercase()),
            None => true,
        }
    }
}

pub fn search<'a>(bank: &'a QuestionBank, query: &AdminQuery) -> Vec<&'a Question> {
    bank.questions().iter().filter(|q| query.matches(q)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionStats {
    pub total: usize,
    pub by_year: Vec<CountEntry>,
    pub by_category: Vec<CountEntry>,
}

fn count_by<'a>(questions: impl Iterator<Item = &'a str>) -> Vec<CountEntry> {
    let mut counts: Vec<CountEntry> = Vec::new();
    for label in questions {
        match counts.iter_mut().find(|c| c.label == label) {
            Some(entry) => entry.count += 1,
            None => counts.push(CountEntry {
                label: label.to_string(),
                count: 1,
            }),
        }
    }
    counts
}

pub fn question_stats(bank: &QuestionBank) -> QuestionStats {
    QuestionStats {
        total: bank.len(),
        by_year: count_by(bank.questions().iter().map(|q| q.year.as_str())),
        by_category: count_by(bank.questions().iter().map(|q| q.category.as_str())),
    }
}

/// Completion of one category for one learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryStatus {
    pub category: String,
    pub answered: usize,
    pub total: usize,
    pub status: CompletionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct LearnerSummary {
    /// `None` for the anonymous record.
    pub name: Option<String>,
    pub answered: usize,
    pub correct: usize,
    pub categories: Vec<CategoryStatus>,
}

/// Every stored progress record, keyed by owner.
async fn stored_progress(store: &dyn KeyValueStore) -> Result<Vec<(Option<String>, ProgressRecord)>, StorageError> {
    let mut records = Vec::new();
    for key in store.keys().await? {
        let Some(owner) = progress_owner(&key) else {
            continue;
        };
        let owner = owner.map(String::from);
        if let Some(raw) = store.get(&key).await? {
            records.push((owner, ProgressRecord::from_stored(&raw)));
        }
    }
    Ok(records)
}

/// Per-learner answered/correct counts and per-category completion.
pub async fn learner_overview(
    store: &dyn KeyValueStore,
    bank: &QuestionBank,
) -> Result<Vec<LearnerSummary>, StorageError> {
    let categories = count_by(bank.questions().iter().map(|q| q.category.as_str()));

    let learners = stored_progress(store)
        .await?
        .into_iter()
        .map(|(name, progress)| {
            let known: Vec<(&Question, bool)> = progress
                .answered
                .iter()
                .filter_map(|a| bank.get(&a.id).map(|q| (q, a.correct)))
                .collect();

            let categories = categories
                .iter()
                .map(|c| {
                    let answered = known.iter().filter(|(q, _)| q.category == c.label).count();
                    let status = if answered == 0 {
                        CompletionStatus::NotStarted
                    } else if answered >= c.count {
                        CompletionStatus::Completed
                    } else {
                        CompletionStatus::InProgress
                    };
                    CategoryStatus {
                        category: c.label.clone(),
                        answered,
                        total: c.count,
                        status,
                    }
                })
                .collect();

            LearnerSummary {
                name,
                answered: known.len(),
                correct: known.iter().filter(|(_, correct)| *correct).count(),
                categories,
            }
        })
        .collect();

    Ok(learners)
}

/// Average score and learner count for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    /// Percentage of correct latest answers, 0 when nobody answered.
    pub average: f64,
    /// Learners with at least one answer in the category.
    pub learner_count: usize,
}

/// Per-category averages over every stored learner.
pub async fn category_stats(store: &dyn KeyValueStore, bank: &QuestionBank) -> Result<Vec<CategoryStat>, StorageError> {
    let records = stored_progress(store).await?;

    let stats = count_by(bank.questions().iter().map(|q| q.category.as_str()))
        .into_iter()
        .map(|c| {
            let mut answered = 0usize;
            let mut correct = 0usize;
            let mut learner_count = 0usize;

            for (_, progress) in &records {
                let in_category: Vec<bool> = progress
                    .answered
                    .iter()
                    .filter(|a| bank.get(&a.id).is_some_and(|q| q.category == c.label))
                    .map(|a| a.correct)
                    .collect();
                if in_category.is_empty() {
                    continue;
                }
                learner_count += 1;
                answered += in_category.len();
                correct += in_category.iter().filter(|ok| **ok).count();
            }

            CategoryStat {
                category: c.label,
                average: if answered == 0 { 0.0 } else { correct as f64 * 100.0 / answered as f64 },
                learner_count,
            }
        })
        .collect();

    Ok(stats)
}

#[derive(Debug, Clone, Serialize)]
pub struct IncorrectStat {
    pub question_id: String,
    pub theme: String,
    pub category: String,
    pub incorrect_count: usize,
}

/// Questions most often answered wrong, counting each learner's latest answer.
pub async fn top_incorrect(
    store: &dyn KeyValueStore,
    bank: &QuestionBank,
    limit: usize,
) -> Result<Vec<IncorrectStat>, StorageError> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for (_, progress) in stored_progress(store).await? {
        for answer in progress.answered.iter().filter(|a| !a.correct) {
            *counts.entry(answer.id.clone()).or_default() += 1;
        }
    }

    let mut ranked: Vec<IncorrectStat> = counts
        .into_iter()
        .filter_map(|(id, count)| {
            let q = bank.get(&id)?;
            Some(IncorrectStat {
                question_id: id,
                theme: q.theme.clone(),
                category: q.category.clone(),
                incorrect_count: count,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.incorrect_count
            .cmp(&a.incorrect_count)
            .then_with(|| a.question_id.cmp(&b.question_id))
    });
    ranked.truncate(limit);
    Ok(ranked)
}
