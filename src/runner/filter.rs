// src/runner/filter.rs

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::QuestionBank;
use crate::models::question::Question;
use crate::store::keys::INDEX_PREFIX;

/// Wildcard value of every filter dropdown.
pub const ALL: &str = "all";

/// A filter dropdown value: the `all` wildcard or one exact value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selector {
    #[default]
    All,
    Only(String),
}

impl Selector {
    pub fn only(value: impl Into<String>) -> Self {
        Selector::Only(value.into())
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(expected) => expected == value,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Selector::All => None,
            Selector::Only(v) => Some(v),
        }
    }
}

impl From<String> for Selector {
    fn from(raw: String) -> Self {
        if raw == ALL { Selector::All } else { Selector::Only(raw) }
    }
}

impl From<Option<String>> for Selector {
    fn from(raw: Option<String>) -> Self {
        raw.map(Selector::from).unwrap_or_default()
    }
}

impl From<Selector> for String {
    fn from(sel: Selector) -> Self {
        match sel {
            Selector::All => ALL.to_string(),
            Selector::Only(v) => v,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value().unwrap_or(ALL))
    }
}

/// Question ordering policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Sequential,
    Random,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Sequential => f.write_str("sequential"),
            Mode::Random => f.write_str("random"),
        }
    }
}

/// The four quiz dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuizFilter {
    #[serde(default)]
    pub year: Selector,
    #[serde(default)]
    pub category: Selector,
    #[serde(default)]
    pub theme: Selector,
    #[serde(default)]
    pub mode: Mode,
}

impl QuizFilter {
    pub fn matches(&self, q: &Question) -> bool {
        self.year.matches(&q.year) && self.category.matches(&q.category) && self.theme.matches(&q.theme)
    }

    /// Bank indices of matching questions, in bank order.
    pub fn select(&self, bank: &QuestionBank) -> Vec<usize> {
        bank.questions()
            .iter()
            .enumerate()
            .filter(|(_, q)| self.matches(q))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Matching questions, shuffled when the mode is `random`.
    pub fn arrange<R: Rng>(&self, bank: &QuestionBank, rng: &mut R) -> Vec<usize> {
        let mut order = self.select(bank);
        if self.mode == Mode::Random {
            shuffle(&mut order, rng);
        }
        order
    }

    /// Storage key remembering the position for this exact combination.
    pub fn index_key(&self) -> String {
        format!("{}{}_{}_{}_{}", INDEX_PREFIX, self.year, self.category, self.theme, self.mode)
    }
}

/// Uniform Fisher–Yates shuffle.
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Distinct themes available for a year/category pair, first appearance first.
pub fn theme_options(bank: &QuestionBank, year: &Selector, category: &Selector) -> Vec<String> {
    let mut themes: Vec<String> = Vec::new();
    for q in bank.questions() {
        if year.matches(&q.year) && category.matches(&q.category) && !themes.contains(&q.theme) {
            themes.push(q.theme.clone());
        }
    }
    themes
}
