// src/store/keys.rs

//! Storage key layout. These names are shared with the browser pages, so
//! they must not change.

pub const CURRENT_USER_NAME: &str = "currentUserName";

/// Anonymous progress key; named users get `quizProgress_<name>`.
pub const PROGRESS_PREFIX: &str = "quizProgress";

/// Per-filter position keys: `quizIndex_<year>_<category>_<theme>_<mode>`.
pub const INDEX_PREFIX: &str = "quizIndex_";

/// JSON array of reminder notifications sent from the admin page.
pub const NOTIFICATION_LOGS: &str = "notificationLogs";

pub fn progress_key(user_name: Option<&str>) -> String {
    match user_name {
        Some(name) if !name.is_empty() => format!("{}_{}", PROGRESS_PREFIX, name),
        _ => PROGRESS_PREFIX.to_string(),
    }
}

/// Reverses [`progress_key`]. `Some(None)` is the anonymous record,
/// `None` means the key is not a progress key at all.
pub fn progress_owner(key: &str) -> Option<Option<&str>> {
    if key == PROGRESS_PREFIX {
        return Some(None);
    }
    key.strip_prefix(PROGRESS_PREFIX)
        .and_then(|rest| rest.strip_prefix('_'))
        .map(Some)
}
