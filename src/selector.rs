// src/selector.rs

//! Theme selection on the top page.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::topic::LearningTopics;

pub fn category_label(category: &str) -> &str {
    match category {
        "governance" => "ガバナンス",
        "business" => "ビジネススキル",
        "management" => "マネジメントスキル",
        other => other,
    }
}

/// A (year, category, theme id) triple from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub year: String,
    pub category: String,
    pub theme: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    UnknownTheme(Selection),
    NothingSelected,
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectError::UnknownTheme(s) => {
                write!(f, "theme {}/{}/{} is not in the catalog", s.year, s.category, s.theme)
            }
            SelectError::NothingSelected => f.write_str("テーマを選択してください"),
        }
    }
}

impl std::error::Error for SelectError {}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeCard {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySection {
    pub key: String,
    pub label: String,
    pub themes: Vec<ThemeCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearBlock {
    pub year: String,
    pub categories: Vec<CategorySection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
    pub years: Vec<YearBlock>,
    pub selection: Option<Selection>,
    pub start_enabled: bool,
}

/// Where starting the quiz leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartPlan {
    /// Name to remember as the current user, if one was entered.
    pub user_name: Option<String>,
    pub location: String,
}

/// Pending selection of the theme selector.
#[derive(Debug, Clone, Default)]
pub struct ThemeSelection {
    pending: Option<Selection>,
}

impl ThemeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&Selection> {
        self.pending.as_ref()
    }

    /// Replaces the pending selection; the triple must exist in `catalog`.
    pub fn select(&mut self, catalog: &LearningTopics, selection: Selection) -> Result<(), SelectError> {
        if catalog
            .find(&selection.year, &selection.category, &selection.theme)
            .is_none()
        {
            return Err(SelectError::UnknownTheme(selection));
        }
        self.pending = Some(selection);
        Ok(())
    }

    pub fn render(&self, catalog: &LearningTopics) -> CatalogView {
        let is_selected = |year: &str, category: &str, theme: &str| {
            self.pending
                .as_ref()
                .is_some_and(|s| s.year == year && s.category == category && s.theme == theme)
        };

        let years = catalog
            .years
            .iter()
            .map(|y| YearBlock {
                year: y.year.clone(),
                categories: y
                    .categories
                    .iter()
                    .map(|c| CategorySection {
                        key: c.category.clone(),
                        label: category_label(&c.category).to_string(),
                        themes: c
                            .themes
                            .iter()
                            .map(|t| ThemeCard {
                                id: t.id.clone(),
                                label: t.label.clone(),
                                selected: is_selected(&y.year, &c.category, &t.id),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        CatalogView {
            years,
            selection: self.pending.clone(),
            start_enabled: self.pending.is_some(),
        }
    }

    /// Plans navigation to the quiz page for the pending selection.
    pub fn start(&self, user_name: Option<&str>) -> Result<StartPlan, SelectError> {
        let selection = self.pending.as_ref().ok_or(SelectError::NothingSelected)?;

        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("year", &selection.year)
            .append_pair("track", &selection.category)
            .append_pair("theme", &selection.theme)
            .finish();

        Ok(StartPlan {
            user_name: user_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
            location: format!("/quiz?{}", query),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> LearningTopics {
        serde_json::from_str(
            r#"{
                "Year1": {
                    "governance": [{"id": "approval", "label": "承認フロー"}, {"id": "coi", "label": "利益相反"}],
                    "compliance": [{"id": "law", "label": "法令"}]
                },
                "Year2": {"management": [{"id": "approval", "label": "1on1 & 承認"}]}
            }"#,
        )
        .unwrap()
    }

    fn selection(year: &str, category: &str, theme: &str) -> Selection {
        Selection {
            year: year.into(),
            category: category.into(),
            theme: theme.into(),
        }
    }

    #[test]
    fn known_categories_get_display_labels() {
        assert_eq!(category_label("governance"), "ガバナンス");
        assert_eq!(category_label("business"), "ビジネススキル");
        assert_eq!(category_label("management"), "マネジメントスキル");
        assert_eq!(category_label("compliance"), "compliance");
    }

    #[test]
    fn exactly_one_card_is_selected() {
        let catalog = catalog();
        let mut sel = ThemeSelection::new();
        assert!(!sel.render(&catalog).start_enabled);

        sel.select(&catalog, selection("Year1", "governance", "coi")).unwrap();
        sel.select(&catalog, selection("Year2", "management", "approval")).unwrap();
        let view = sel.render(&catalog);

        let selected: Vec<(&str, &str, &str)> = view
            .years
            .iter()
            .flat_map(|y| {
                y.categories.iter().flat_map(move |c| {
                    c.themes
                        .iter()
                        .filter(|t| t.selected)
                        .map(move |t| (y.year.as_str(), c.key.as_str(), t.id.as_str()))
                })
            })
            .collect();
        assert_eq!(selected, vec![("Year2", "management", "approval")]);
        assert!(view.start_enabled);
        assert_eq!(view.years[0].categories[1].label, "compliance");
    }

    #[test]
    fn unknown_triple_is_rejected_and_keeps_previous_selection() {
        let catalog = catalog();
        let mut sel = ThemeSelection::new();
        sel.select(&catalog, selection("Year1", "governance", "coi")).unwrap();

        let err = sel.select(&catalog, selection("Year2", "governance", "coi")).unwrap_err();

        assert!(matches!(err, SelectError::UnknownTheme(_)));
        assert_eq!(sel.pending().unwrap().year, "Year1");
    }

    #[test]
    fn start_encodes_selection_as_query() {
        let catalog = catalog();
        let mut sel = ThemeSelection::new();
        assert_eq!(sel.start(None), Err(SelectError::NothingSelected));

        sel.select(&catalog, selection("Year2", "management", "approval")).unwrap();
        let plan = sel.start(Some("  hana ")).unwrap();

        assert_eq!(plan.location, "/quiz?year=Year2&track=management&theme=approval");
        assert_eq!(plan.user_name.as_deref(), Some("hana"));
        assert_eq!(sel.start(Some("   ")).unwrap().user_name, None);
    }
}
