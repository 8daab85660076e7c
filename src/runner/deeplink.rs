// src/runner/deeplink.rs

//! `/quiz?year=..&track=..&theme=..` links produced by the theme selector.
//!
//! The theme parameter is an opaque catalog id while the quiz filters work on
//! theme labels taken from the question bank, so the theme is matched
//! leniently: exact first, then substring containment in either direction.

use std::fmt;

use serde::Deserialize;

use crate::data::QuestionBank;
use crate::runner::filter::{ALL, Mode, QuizFilter, Selector, theme_options};

pub const VALID_YEARS: [&str; 2] = ["Year1", "Year2"];
pub const VALID_TRACKS: [&str; 3] = ["governance", "business", "management"];

/// Raw query parameters; any of them may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeepLinkParams {
    pub year: Option<String>,
    pub track: Option<String>,
    pub theme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub year: String,
    pub track: String,
    pub theme: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLinkError {
    InvalidParameters,
    ThemeNotFound(String),
    NoQuestions,
}

impl DeepLinkError {
    /// Message shown before redirecting home.
    pub fn user_message(&self) -> String {
        match self {
            DeepLinkError::InvalidParameters => "無効なパラメータです。トップページに戻ります。".to_string(),
            DeepLinkError::ThemeNotFound(theme) => {
                format!("テーマ「{}」が見つかりません。トップページに戻ります。", theme)
            }
            DeepLinkError::NoQuestions => {
                "該当する問題が見つかりませんでした。トップページに戻ります。".to_string()
            }
        }
    }
}

impl fmt::Display for DeepLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeepLinkError::InvalidParameters => f.write_str("invalid deep-link parameters"),
            DeepLinkError::ThemeNotFound(theme) => write!(f, "theme not found: {}", theme),
            DeepLinkError::NoQuestions => f.write_str("deep link matches no questions"),
        }
    }
}

impl std::error::Error for DeepLinkError {}

/// How the theme parameter was reconciled with the available options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeMatch {
    Exact(String),
    Partial(String),
    NotFound,
}

impl DeepLink {
    /// `None` unless all three parameters are present and non-empty.
    pub fn from_params(params: &DeepLinkParams) -> Option<Self> {
        let present = |p: &Option<String>| p.clone().filter(|v| !v.is_empty());
        Some(Self {
            year: present(&params.year)?,
            track: present(&params.track)?,
            theme: present(&params.theme)?,
        })
    }

    pub fn validate(&self) -> Result<(), DeepLinkError> {
        let valid = VALID_YEARS.contains(&self.year.as_str())
            && VALID_TRACKS.contains(&self.track.as_str())
            && !self.theme.is_empty();

        if valid {
            Ok(())
        } else {
            tracing::warn!("Invalid deep-link parameters: {:?}", self);
            Err(DeepLinkError::InvalidParameters)
        }
    }

    /// Validates the link and turns it into quiz filters over `bank`.
    pub fn resolve(&self, bank: &QuestionBank) -> Result<QuizFilter, DeepLinkError> {
        self.validate()?;

        let year = Selector::only(self.year.as_str());
        let category = Selector::only(self.track.as_str());
        let options = theme_options(bank, &year, &category);

        let theme = match match_theme(&options, &self.theme) {
            ThemeMatch::Exact(theme) => theme,
            ThemeMatch::Partial(theme) => {
                tracing::debug!("Deep-link theme {:?} matched {:?} partially", self.theme, theme);
                theme
            }
            ThemeMatch::NotFound => {
                tracing::warn!("Theme not found: {} (available: {:?})", self.theme, options);
                return Err(DeepLinkError::ThemeNotFound(self.theme.clone()));
            }
        };

        let filter = QuizFilter {
            year,
            category,
            theme: Selector::Only(theme),
            mode: Mode::Sequential,
        };

        if filter.select(bank).is_empty() {
            return Err(DeepLinkError::NoQuestions);
        }
        Ok(filter)
    }
}

/// Exact match first, then containment either way. Blank options and the
/// `all` wildcard never match.
pub fn match_theme(options: &[String], wanted: &str) -> ThemeMatch {
    let candidates = || {
        options
            .iter()
            .filter(|o| !o.is_empty() && o.as_str() != ALL)
    };

    if let Some(exact) = candidates().find(|o| o.as_str() == wanted) {
        return ThemeMatch::Exact(exact.clone());
    }
    if let Some(partial) = candidates().find(|o| o.contains(wanted) || wanted.contains(o.as_str())) {
        return ThemeMatch::Partial(partial.clone());
    }
    ThemeMatch::NotFound
}
