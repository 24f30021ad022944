use serde::Deserialize;

/// The subset of a post's YAML header shown in the editor.
#[derive(Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct PostHeader {
    pub title: Option<String>,
}

/// Parse the `---` delimited YAML header of a post, if it has one. A header
/// that fails to parse reads as empty: the editor must still open the file.
pub fn header(raw: &str) -> PostHeader {
    split(raw)
        .and_then(|(yaml, _)| serde_yml::from_str(yaml).ok())
        .unwrap_or_default()
}

/// Split a document into `(yaml, body)`. The opening `---` must be the first
/// line; the closing one must stand alone on its line.
fn split(raw: &str) -> Option<(&str, &str)> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_title() {
        let raw = "---\nlayout: post\ntitle: \"Hello, World\"\n---\nBody\n";
        let h = header(raw);
        assert_eq!(h.title.as_deref(), Some("Hello, World"));
    }

    #[test]
    fn crlf_and_bom() {
        let raw = "\u{feff}---\r\ntitle: T\r\n---\r\nBody";
        assert_eq!(split(raw), Some(("title: T\r\n", "Body")));
        assert_eq!(header(raw).title.as_deref(), Some("T"));
    }

    #[test]
    fn dashes_inside_text_do_not_close() {
        let raw = "---\ntitle: a\n---more\n---\n";
        assert_eq!(split(raw), Some(("title: a\n---more\n", "")));
    }

    #[test]
    fn no_header_or_bad_yaml_is_empty() {
        assert_eq!(header("# Just markdown\n"), PostHeader::default());
        assert_eq!(header("---\ntitle: [unclosed\n---\n"), PostHeader::default());
        assert_eq!(header("---\ntitle: never closed\n"), PostHeader::default());
    }
}
