// src/models/question.rs

use serde::{Deserialize, Serialize};

/// One record of `questions.json`.
///
/// Every text field exists in Japanese (`_ja`) and English (`_en`); the
/// classification fields (`year`, `category`, `theme`, `difficulty`) are
/// matched by exact string equality when filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub year: String,
    pub category: String,
    pub theme: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub tags: Vec<String>,

    pub question_ja: String,
    pub question_en: String,
    pub choices_ja: Vec<String>,
    pub choices_en: Vec<String>,

    /// Index into both choice lists.
    pub correct_choice_index: usize,

    #[serde(default)]
    pub explanation_ja: String,
    #[serde(default)]
    pub explanation_en: String,
    #[serde(default)]
    pub learning_goal_ja: String,
    #[serde(default)]
    pub learning_goal_en: String,
    #[serde(default)]
    pub common_misconception_ja: String,
    #[serde(default)]
    pub common_misconception_en: String,
    #[serde(default)]
    pub source_url: Option<String>,
}

/// Display language of the quiz runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ja,
    En,
}

impl Language {
    pub fn toggled(self) -> Self {
        match self {
            Language::Ja => Language::En,
            Language::En => Language::Ja,
        }
    }

    /// Label shown on the language toggle.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Ja => "日本語",
            Language::En => "English",
        }
    }

    pub fn result_label(self, correct: bool) -> &'static str {
        match (self, correct) {
            (Language::Ja, true) => "✓ 正解",
            (Language::Ja, false) => "✗ 不正解",
            (Language::En, true) => "✓ Correct",
            (Language::En, false) => "✗ Incorrect",
        }
    }

    pub fn source_label(self) -> &'static str {
        match self {
            Language::Ja => "根拠リンク →",
            Language::En => "Source Link →",
        }
    }
}

impl Question {
    pub fn text(&self, lang: Language) -> &str {
        match lang {
            Language::Ja => &self.question_ja,
            Language::En => &self.question_en,
        }
    }

    pub fn choices(&self, lang: Language) -> &[String] {
        match lang {
            Language::Ja => &self.choices_ja,
            Language::En => &self.choices_en,
        }
    }

    pub fn explanation(&self, lang: Language) -> &str {
        match lang {
            Language::Ja => &self.explanation_ja,
            Language::En => &self.explanation_en,
        }
    }

    pub fn is_correct(&self, selected_index: usize) -> bool {
        selected_index == self.correct_choice_index
    }

    /// Non-empty source URL, if any.
    pub fn source(&self) -> Option<&str> {
        self.source_url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Checks that both choice lists line up and contain the correct index.
    /// Returns a description of the first problem found.
    pub fn consistency_problem(&self) -> Option<String> {
        if self.choices_ja.len() != self.choices_en.len() {
            return Some(format!(
                "choice lists differ in length ({} ja / {} en)",
                self.choices_ja.len(),
                self.choices_en.len()
            ));
        }
        if self.correct_choice_index >= self.choices_ja.len() {
            return Some(format!(
                "correct_choice_index {} out of range for {} choices",
                self.correct_choice_index,
                self.choices_ja.len()
            ));
        }
        None
    }
}

/// One choice line of the admin detail view.
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceLine {
    pub text: String,
    pub correct: bool,
}

/// Every field of a question, laid out for the admin detail modal.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    pub id: String,
    pub year: String,
    pub category: String,
    pub theme: String,
    pub difficulty: String,
    pub tags: Vec<String>,
    pub learning_goal_ja: String,
    pub learning_goal_en: String,
    pub common_misconception_ja: String,
    pub common_misconception_en: String,
    pub question_ja: String,
    pub choices_ja: Vec<ChoiceLine>,
    pub explanation_ja: String,
    pub question_en: String,
    pub choices_en: Vec<ChoiceLine>,
    pub explanation_en: String,
    pub source_url: Option<String>,
}

impl From<&Question> for QuestionDetail {
    fn from(q: &Question) -> Self {
        let mark = |choices: &[String]| {
            choices
                .iter()
                .enumerate()
                .map(|(idx, text)| ChoiceLine {
                    text: text.clone(),
                    correct: idx == q.correct_choice_index,
                })
                .collect()
        };

        Self {
            id: q.id.clone(),
            year: q.year.clone(),
            category: q.category.clone(),
            theme: q.theme.clone(),
            difficulty: q.difficulty.clone(),
            tags: q.tags.clone(),
            learning_goal_ja: q.learning_goal_ja.clone(),
            learning_goal_en: q.learning_goal_en.clone(),
            common_misconception_ja: q.common_misconception_ja.clone(),
            common_misconception_en: q.common_misconception_en.clone(),
            question_ja: q.question_ja.clone(),
            choices_ja: mark(&q.choices_ja),
            explanation_ja: q.explanation_ja.clone(),
            question_en: q.question_en.clone(),
            choices_en: mark(&q.choices_en),
            explanation_en: q.explanation_en.clone(),
            source_url: q.source().map(String::from),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Question;

    /// Minimal bilingual question for unit tests.
    pub fn question(id: &str, year: &str, category: &str, theme: &str, correct: usize) -> Question {
        Question {
            id: id.to_string(),
            year: year.to_string(),
            category: category.to_string(),
            theme: theme.to_string(),
            difficulty: "basic".to_string(),
            tags: vec!["tag-".to_string() + id],
            question_ja: format!("{} の設問", id),
            question_en: format!("Question {}", id),
            choices_ja: vec!["ア".into(), "イ".into(), "ウ".into(), "エ".into()],
            choices_en: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_choice_index: correct,
            explanation_ja: "解説".to_string(),
            explanation_en: "Explanation".to_string(),
            learning_goal_ja: "目標".to_string(),
            learning_goal_en: format!("Goal of {}", id),
            common_misconception_ja: String::new(),
            common_misconception_en: String::new(),
            source_url: Some("https://example.com/policy".to_string()),
        }
    }
}
