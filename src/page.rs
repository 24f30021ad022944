//! Reading a rendered post page and pulling out the fields the editor needs.

use regex::Regex;
use std::{fmt, path::PathBuf, sync::LazyLock, time::Duration};
use url::Url;

use crate::{document_path::PageMetadata, error::PageError};

const POST_CLASS: &str = "post";
const DATE_CLASS: &str = "post-date";
const TITLE_CLASS: &str = "post-title";

/// Where a rendered page comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    Remote(Url),
    Local(PathBuf),
}

impl PageSource {
    /// `http(s)://…` is fetched, anything else is a file path.
    pub fn parse(arg: &str) -> Self {
        match Url::parse(arg) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => PageSource::Remote(url),
            _ => PageSource::Local(PathBuf::from(arg)),
        }
    }

    pub async fn fetch(&self) -> Result<String, PageError> {
        match self {
            PageSource::Remote(url) => {
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(10))
                    .build()?;
                let response = client.get(url.clone()).send().await?;
                if !response.status().is_success() {
                    return Err(PageError::Status(response.status().as_u16()));
                }
                Ok(response.text().await?)
            }
            PageSource::Local(path) => Ok(tokio::fs::read_to_string(path).await?),
        }
    }
}

impl fmt::Display for PageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSource::Remote(url) => write!(f, "{url}"),
            PageSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A loaded post page.
#[derive(Debug, Clone)]
pub struct Page {
    pub source: PageSource,
    pub metadata: PageMetadata,
}

impl Page {
    pub async fn load(source: PageSource) -> Result<Self, PageError> {
        let html = source.fetch().await?;
        let metadata = extract_metadata(&html)?;
        tracing::debug!(
            source = %source,
            date = metadata.date.as_deref().unwrap_or("-"),
            title = metadata.title.as_deref().unwrap_or("-"),
            "Loaded page"
        );
        Ok(Self { source, metadata })
    }
}

// ── Extraction ────────────────────────────────────────────────────────────────

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<([a-z][a-z0-9-]*)\b[^>]*?\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*>"#)
        .expect("static regex")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));

/// Pull the date and title out of a post page. Pages without a `post`
/// element are not editable.
pub fn extract_metadata(html: &str) -> Result<PageMetadata, PageError> {
    if find_by_class(html, POST_CLASS).is_none() {
        return Err(PageError::NotAPost);
    }
    Ok(PageMetadata {
        date: text_of_class(html, DATE_CLASS),
        title: text_of_class(html, TITLE_CLASS),
    })
}

/// Text content of the first element carrying `class`, or `None` if there is
/// no such element.
fn text_of_class(html: &str, class: &str) -> Option<String> {
    let (tag, inner_start) = find_by_class(html, class)?;
    let rest = &html[inner_start..];
    let close = format!("</{tag}");
    let inner = match find_ignore_case(rest, &close) {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(decode_entities(&ANY_TAG.replace_all(inner, "")).trim().to_string())
}

/// Tag name and byte offset just past the opening tag of the first element
/// whose class list contains `class`.
fn find_by_class(html: &str, class: &str) -> Option<(String, usize)> {
    OPEN_TAG.captures_iter(html).find_map(|caps| {
        let classes = caps.get(2).or_else(|| caps.get(3))?.as_str();
        if classes.split_whitespace().any(|c| c == class) {
            let whole = caps.get(0)?;
            Some((caps[1].to_ascii_lowercase(), whole.end()))
        } else {
            None
        }
    })
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let lower = haystack.to_ascii_lowercase();
    lower.find(&needle.to_ascii_lowercase())
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &tail[1..semi];
            decode_entity(entity).map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        "rsquo" => Some('’'),
        "lsquo" => Some('‘'),
        "rdquo" => Some('”'),
        "ldquo" => Some('“'),
        "hellip" => Some('…'),
        _ => None,
    }
}
