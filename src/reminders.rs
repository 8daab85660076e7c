// src/reminders.rs

//! Reminders for learners who have not started every category, and the log
//! of reminders sent.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::browser::{CompletionStatus, LearnerSummary, learner_overview};
use crate::data::QuestionBank;
use crate::store::keys::NOTIFICATION_LOGS;
use crate::store::{KeyValueStore, StorageError};

pub const DEFAULT_MESSAGE: &str = "リマインド通知を送信しました";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationLog {
    pub sent_at: DateTime<Utc>,
    pub to_name: String,
    #[serde(default)]
    pub topic: Option<String>,
    pub message: String,
}

#[derive(Debug)]
pub enum ReminderError {
    NoRecipients,
    Storage(StorageError),
}

impl fmt::Display for ReminderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderError::NoRecipients => f.write_str("送信先が選択されていません。"),
            ReminderError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ReminderError {}

impl From<StorageError> for ReminderError {
    fn from(err: StorageError) -> Self {
        ReminderError::Storage(err)
    }
}

/// Named learners with at least one category they have not started.
pub async fn reminder_candidates(
    store: &dyn KeyValueStore,
    bank: &QuestionBank,
) -> Result<Vec<LearnerSummary>, StorageError> {
    let candidates = learner_overview(store, bank)
        .await?
        .into_iter()
        .filter(|l| l.name.is_some())
        .filter(|l| l.categories.iter().any(|c| c.status == CompletionStatus::NotStarted))
        .collect();

    Ok(candidates)
}

async fn load_logs(store: &dyn KeyValueStore) -> Result<Vec<NotificationLog>, StorageError> {
    let Some(raw) = store.get(NOTIFICATION_LOGS).await? else {
        return Ok(Vec::new());
    };

    Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!("Discarding malformed notification log: {}", e);
        Vec::new()
    }))
}

/// Records one reminder per recipient. Blank names are skipped; at least one
/// real recipient is required. A blank message gets the default text.
pub async fn send_reminders(
    store: &dyn KeyValueStore,
    names: &[String],
    message: Option<&str>,
) -> Result<Vec<NotificationLog>, ReminderError> {
    let recipients: Vec<&str> = names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()).collect();
    if recipients.is_empty() {
        return Err(ReminderError::NoRecipients);
    }

    let message = message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MESSAGE);
    let now = Utc::now();

    let sent: Vec<NotificationLog> = recipients
        .into_iter()
        .map(|name| NotificationLog {
            sent_at: now,
            to_name: name.to_string(),
            topic: None,
            message: message.to_string(),
        })
        .collect();

    let mut logs = load_logs(store).await?;
    logs.extend(sent.iter().cloned());
    let raw = serde_json::to_string(&logs).map_err(|e| StorageError::Backend(e.to_string()))?;
    store.set(NOTIFICATION_LOGS, &raw).await?;

    tracing::info!("Recorded {} reminders", sent.len());
    Ok(sent)
}

/// Every recorded reminder, newest first.
pub async fn notification_logs(store: &dyn KeyValueStore) -> Result<Vec<NotificationLog>, StorageError> {
    let mut logs = load_logs(store).await?;
    // stable sort on a reversed list keeps later entries first within one send
    logs.reverse();
    logs.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
    Ok(logs)
}
