// src/models/topic.rs

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::Serialize;

/// One selectable theme inside a (year, category) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct TopicEntry {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTopics {
    pub category: String,
    pub themes: Vec<TopicEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearTopics {
    pub year: String,
    pub categories: Vec<CategoryTopics>,
}

/// `learningTopics.json`: year → category → themes, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LearningTopics {
    pub years: Vec<YearTopics>,
}

impl LearningTopics {
    pub fn find(&self, year: &str, category: &str, theme_id: &str) -> Option<&TopicEntry> {
        self.years
            .iter()
            .find(|y| y.year == year)?
            .categories
            .iter()
            .find(|c| c.category == category)?
            .themes
            .iter()
            .find(|t| t.id == theme_id)
    }
}

impl<'de> Deserialize<'de> for LearningTopics {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, IndexMap<String, Vec<TopicEntry>>>::deserialize(deserializer)?;

        let years = raw
            .into_iter()
            .map(|(year, categories)| YearTopics {
                categories: categories
                    .into_iter()
                    .map(|(category, themes)| CategoryTopics {
                        themes: dedup_themes(&year, &category, themes),
                        category,
                    })
                    .collect(),
                year,
            })
            .collect();

        Ok(LearningTopics { years })
    }
}

fn dedup_themes(year: &str, category: &str, themes: Vec<TopicEntry>) -> Vec<TopicEntry> {
    let mut seen = HashSet::new();
    themes
        .into_iter()
        .filter(|t| {
            let fresh = seen.insert(t.id.clone());
            if !fresh {
                tracing::warn!("Duplicate theme id {:?} in {}/{}, keeping the first", t.id, year, category);
            }
            fresh
        })
        .collect()
}
