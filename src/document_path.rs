use chrono::{DateTime, NaiveDate};
use std::fmt;

use crate::error::ValidationError;

/// The two page fields a post's storage path is derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub date: Option<String>,
    pub title: Option<String>,
}

/// Where posts live in the repository and what they are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLayout {
    pub directory: String,
    pub extension: String,
}

impl Default for PostLayout {
    fn default() -> Self {
        Self {
            directory: "_posts".into(),
            extension: "md".into(),
        }
    }
}

/// Repository-relative path of a post, e.g. `_posts/2024-01-05-hello-world.md`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath(String);

impl DocumentPath {
    /// Derive the path from page metadata. Pure: the same metadata and layout
    /// always give the same path.
    pub fn derive(meta: &PageMetadata, layout: &PostLayout) -> Result<Self, ValidationError> {
        let date_text = meta
            .date
            .as_deref()
            .map(str::trim)
            .ok_or(ValidationError::MissingMetadata { field: "date" })?;
        let title = meta
            .title
            .as_deref()
            .ok_or(ValidationError::MissingMetadata { field: "title" })?;

        let date = parse_post_date(date_text)
            .ok_or_else(|| ValidationError::InvalidDate(date_text.to_string()))?;

        let dir = layout.directory.trim_matches('/');
        let name = format!("{}-{}.{}", date.format("%Y-%m-%d"), slugify(title), layout.extension);
        if dir.is_empty() {
            Ok(Self(name))
        } else {
            Ok(Self(format!("{dir}/{name}")))
        }
    }

    /// Wrap an already known repository path.
    #[cfg(test)]
    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase, drop everything outside ASCII word characters, whitespace and
/// `-`, then turn each whitespace run into a single `-`.
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
        } else {
            slug.push(c);
            in_space = false;
        }
    }
    slug
}

/// Formats a rendered post date commonly takes. Tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%m/%d/%Y",
    "%a, %b %d, %Y",
    "%A, %B %d, %Y",
];

/// Parse the date text shown on a post page. The calendar date is taken as
/// written; a time zone, if present, is never used to shift it.
pub fn parse_post_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }
    // "2024-01-05 10:30:00 +0000" as Jekyll prints `page.date`.
    if let Some(head) = text.get(..10) {
        if text.len() > 10 && text.as_bytes()[10] == b' ' {
            if let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
                return Some(d);
            }
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}
