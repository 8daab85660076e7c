// src/models/progress.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Latest answer a user gave to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub id: String,
    pub selected_index: usize,
    pub correct: bool,
}

/// Per-user progress, stored as JSON under `quizProgress[_<name>]`.
///
/// `answered` holds at most one entry per question id. `total` counts
/// distinct questions ever answered and `correct` is adjusted by delta when
/// an answer is overwritten, so it always reflects the latest answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub answered: Vec<AnswerEntry>,
    #[serde(default)]
    pub correct: i64,
    #[serde(default)]
    pub total: i64,
}

/// What [`ProgressRecord::record_answer`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First answer for this id; `total` was incremented.
    Added,
    /// An earlier answer was overwritten in place.
    Replaced { was_correct: bool },
}

impl ProgressRecord {
    /// Parses a stored record. Anything malformed yields an empty record.
    pub fn from_stored(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Discarding malformed progress record: {}", e);
                Self::default()
            }
        }
    }

    pub fn entry(&self, question_id: &str) -> Option<&AnswerEntry> {
        self.answered.iter().find(|a| a.id == question_id)
    }

    pub fn record_answer(&mut self, question_id: &str, selected_index: usize, correct: bool) -> RecordOutcome {
        let entry = AnswerEntry {
            id: question_id.to_string(),
            selected_index,
            correct,
        };

        match self.answered.iter().position(|a| a.id == question_id) {
            Some(pos) => {
                let was_correct = self.answered[pos].correct;
                if was_correct && !correct {
                    self.correct -= 1;
                } else if !was_correct && correct {
                    self.correct += 1;
                }
                self.answered[pos] = entry;
                RecordOutcome::Replaced { was_correct }
            }
            None => {
                self.answered.push(entry);
                self.total += 1;
                if correct {
                    self.correct += 1;
                }
                RecordOutcome::Added
            }
        }
    }

    /// Counts restricted to the given question ids (the active filter).
    pub fn summary<'a, I>(&self, question_ids: I) -> ProgressSummary
    where
        I: IntoIterator<Item = &'a str>,
    {
        let in_filter: HashSet<&str> = question_ids.into_iter().collect();

        let mut answered = 0;
        let mut correct = 0;
        for entry in &self.answered {
            if in_filter.contains(entry.id.as_str()) {
                answered += 1;
                if entry.correct {
                    correct += 1;
                }
            }
        }

        ProgressSummary {
            total: in_filter.len(),
            answered,
            correct,
            accuracy: accuracy_percent(correct, answered),
        }
    }
}

/// Progress numbers shown next to the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    /// Questions in the current filter.
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    /// Rounded percentage, 0 when nothing was answered.
    pub accuracy: u32,
}

/// round(100 * correct / answered), halves rounded up.
pub fn accuracy_percent(correct: usize, answered: usize) -> u32 {
    if answered == 0 {
        return 0;
    }
    ((200 * correct + answered) / (2 * answered)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_correct_answer_counts_once() {
        let mut progress = ProgressRecord::default();

        let outcome = progress.record_answer("q1", 1, true);

        assert_eq!(outcome, RecordOutcome::Added);
        assert_eq!(
            progress,
            ProgressRecord {
                answered: vec![AnswerEntry {
                    id: "q1".to_string(),
                    selected_index: 1,
                    correct: true
                }],
                correct: 1,
                total: 1,
            }
        );
    }

    #[test]
    fn reanswer_overwrites_in_place_and_keeps_total() {
        let mut progress = ProgressRecord::default();
        progress.record_answer("q1", 1, true);

        let outcome = progress.record_answer("q1", 0, false);

        assert_eq!(outcome, RecordOutcome::Replaced { was_correct: true });
        assert_eq!(progress.total, 1);
        assert_eq!(progress.correct, 0);
        assert_eq!(progress.answered.len(), 1);
        assert_eq!(progress.answered[0].selected_index, 0);

        progress.record_answer("q1", 1, true);
        assert_eq!(progress.total, 1);
        assert_eq!(progress.correct, 1);
    }

    #[test]
    fn same_correctness_overwrite_leaves_correct_alone() {
        let mut progress = ProgressRecord::default();
        progress.record_answer("q1", 0, false);
        progress.record_answer("q1", 2, false);

        assert_eq!(progress.correct, 0);
        assert_eq!(progress.entry("q1").unwrap().selected_index, 2);
    }

    #[test]
    fn summary_only_counts_questions_in_filter() {
        let mut progress = ProgressRecord::default();
        progress.record_answer("q1", 1, true);
        progress.record_answer("q2", 0, false);
        progress.record_answer("outside", 1, true);

        let summary = progress.summary(["q1", "q2", "q3"]);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.answered, 2);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.accuracy, 50);
    }

    #[test]
    fn accuracy_rounds_to_nearest() {
        assert_eq!(accuracy_percent(0, 0), 0);
        assert_eq!(accuracy_percent(1, 3), 33);
        assert_eq!(accuracy_percent(2, 3), 67);
        assert_eq!(accuracy_percent(1, 8), 13);
        assert_eq!(accuracy_percent(3, 3), 100);
    }

    #[test]
    fn malformed_stored_record_becomes_empty() {
        assert_eq!(ProgressRecord::from_stored("{not json"), ProgressRecord::default());
        assert_eq!(ProgressRecord::from_stored("[1,2]"), ProgressRecord::default());

        let parsed = ProgressRecord::from_stored(
            r#"{"answered":[{"id":"q1","selectedIndex":2,"correct":false}],"correct":0,"total":1}"#,
        );
        assert_eq!(parsed.total, 1);
        assert_eq!(parsed.answered[0].selected_index, 2);
    }
}
