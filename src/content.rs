//! Content descriptor (`data.json`)
//!
//! Loaded once per page, read-only for the engines. Unknown fields are
//! ignored and optional fields default to empty so the admin panel can grow
//! the file without breaking older builds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tuning::Tuning;

/// Failure obtaining the content descriptor. Fatal to boot.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to fetch content: {0}")]
    Fetch(String),
    #[error("invalid content JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentDescriptor {
    pub site_name: String,
    pub level1: Level1Content,
    pub level2: Level2Content,
    pub level3: Level3Content,
    pub tuning: Tuning,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Level1Content {
    pub name: Option<String>,
    pub subtitle: String,
    pub cta_text: String,
    pub sparkles: Vec<Sparkle>,
}

/// A hidden object under the fog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sparkle {
    pub id: String,
    pub label: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Level2Content {
    pub name: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub cta_text: String,
    pub pairs: Vec<Pair>,
}

/// A date card and its matching memory card
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pair {
    pub id: String,
    pub date: String,
    pub photo: Option<String>,
    pub caption: String,
    pub emoji: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Level3Content {
    pub name: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Keyword {
    pub id: String,
    pub word: String,
}

/// Where a photo comes from. Missing photos render as a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoRef {
    Url(String),
    Placeholder,
}

impl PhotoRef {
    /// Static path of a level's photo (`photos/level<N>/<file>`)
    pub fn for_level(level: u32, photo: Option<&str>) -> Self {
        match photo.map(str::trim) {
            Some(file) if !file.is_empty() => Self::Url(format!("photos/level{level}/{file}")),
            _ => Self::Placeholder,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Placeholder => None,
        }
    }
}

impl ContentDescriptor {
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let content: Self = serde_json::from_str(json)?;
        log::info!(
            "Content loaded: {} sparkles, {} pairs, {} keywords",
            content.level1.sparkles.len(),
            content.level2.pairs.len(),
            content.level3.keywords.len()
        );
        Ok(content)
    }

    /// Display name of a level, if the content gives one
    pub fn level_name(&self, level: u32) -> Option<&str> {
        let name = match level {
            1 => self.level1.name.as_deref(),
            2 => self.level2.name.as_deref(),
            3 => self.level3.name.as_deref(),
            _ => None,
        };
        name.filter(|n| !n.is_empty())
    }

    /// Browser tab title: `"<site> | <level name>"`, or just the site name
    pub fn document_title(&self, level: u32) -> String {
        match self.level_name(level) {
            Some(name) => format!("{} | {}", self.site_name, name),
            None => self.site_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "siteName": "Our Story",
        "level1": {"name": "Find", "subtitle": "wipe", "ctaText": "Next",
                   "sparkles": [{"id": "s1", "label": "Beach", "photo": "beach.jpg"}]},
        "level2": {"title": "Match", "pairs": [{"id": "p1", "date": "2020", "caption": "c", "emoji": "x"}]},
        "level3": {"keywords": [{"id": "w1", "word": "love"}]},
        "extra": true
    }"#;

    #[test]
    fn test_parse_sample() {
        let content = ContentDescriptor::from_json(SAMPLE).unwrap();
        assert_eq!(content.level1.sparkles[0].label, "Beach");
        assert_eq!(content.level2.pairs[0].photo, None);
        assert_eq!(content.level3.keywords[0].word, "love");
        assert_eq!(content.tuning, Tuning::default());
    }

    #[test]
    fn test_document_title() {
        let content = ContentDescriptor::from_json(SAMPLE).unwrap();
        assert_eq!(content.document_title(1), "Our Story | Find");
        assert_eq!(content.document_title(2), "Our Story");
    }

    #[test]
    fn test_parse_failure_is_error() {
        assert!(matches!(
            ContentDescriptor::from_json("<html>"),
            Err(ContentError::Parse(_))
        ));
    }

    #[test]
    fn test_photo_ref() {
        assert_eq!(
            PhotoRef::for_level(2, Some("a.jpg")),
            PhotoRef::Url("photos/level2/a.jpg".into())
        );
        assert_eq!(PhotoRef::for_level(1, Some("  ")), PhotoRef::Placeholder);
        assert_eq!(PhotoRef::for_level(1, None).url(), None);
    }
}
