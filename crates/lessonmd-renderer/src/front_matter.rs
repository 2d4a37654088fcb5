//! Leading YAML front matter.
//!
//! A document whose first line is `---` and which has a later `---` or `...`
//! line starts with front matter. The block is always removed from the body;
//! its entries are only parsed when they are going to be rendered.

use std::ops::Range;

use serde_yaml::{Mapping, Value};

/// Front matter located at the start of a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrontMatter<'a> {
    /// YAML between the delimiter lines.
    pub yaml: &'a str,
    /// Byte range of the document body after the closing delimiter.
    pub body: Range<usize>,
}

/// Error parsing front matter entries.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter must be a mapping")]
    NotMapping,
}

fn is_opening(line: &str) -> bool {
    line.trim_end() == "---"
}

fn is_closing(line: &str) -> bool {
    matches!(line.trim_end(), "---" | "...")
}

/// Locate front matter, if any.
///
/// ```
/// use lessonmd_renderer::front_matter;
///
/// let source = "---\ntitle: Intro\n---\nBody\n";
/// let found = front_matter::split(source).unwrap();
/// assert_eq!(found.yaml, "title: Intro\n");
/// assert_eq!(&source[found.body], "Body\n");
/// ```
#[must_use]
pub fn split(source: &str) -> Option<FrontMatter<'_>> {
    let first_end = source.find('\n')?;
    if !is_opening(&source[..first_end]) {
        return None;
    }

    let yaml_start = first_end + 1;
    let mut offset = yaml_start;
    while offset < source.len() {
        let (line, next) = match source[offset..].find('\n') {
            Some(pos) => (&source[offset..offset + pos], offset + pos + 1),
            None => (&source[offset..], source.len()),
        };
        if is_closing(line) {
            return Some(FrontMatter {
                yaml: &source[yaml_start..offset],
                body: next..source.len(),
            });
        }
        offset = next;
    }
    None
}

/// Parse front matter into display strings, keeping key order.
///
/// Sequences are joined with `", "`, null becomes an empty string.
pub fn entries(yaml: &str) -> Result<Vec<(String, String)>, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(mapping) => Ok(stringify_mapping(&mapping)),
        Value::Null => Ok(Vec::new()),
        _ => Err(FrontMatterError::NotMapping),
    }
}

fn stringify_mapping(mapping: &Mapping) -> Vec<(String, String)> {
    mapping
        .iter()
        .map(|(key, value)| (stringify(key), stringify(value)))
        .collect()
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => items.iter().map(stringify).collect::<Vec<_>>().join(", "),
        Value::Mapping(mapping) => stringify_mapping(mapping)
            .into_iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Tagged(tagged) => stringify(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_split() {
        let source = "---\ntitle: this is a title\nsummary: this is a summary\n---\n\nThis is a test.\n";
        let found = split(source).unwrap();
        assert_eq!(found.yaml, "title: this is a title\nsummary: this is a summary\n");
        assert_eq!(&source[found.body], "\nThis is a test.\n");
    }

    #[test]
    fn test_split_dots_closer_and_crlf() {
        let source = "---\r\na: 1\r\n...\r\nbody";
        let found = split(source).unwrap();
        assert_eq!(found.yaml, "a: 1\r\n");
        assert_eq!(&source[found.body], "body");
    }

    #[test]
    fn test_split_closer_at_end_without_newline() {
        let source = "---\na: 1\n---";
        let found = split(source).unwrap();
        assert_eq!(found.body, source.len()..source.len());
    }

    #[test]
    fn test_no_front_matter() {
        assert_eq!(split("# Title\n---\n"), None);
        assert_eq!(split("---\nnever closed\n"), None);
        assert_eq!(split("----\na: 1\n---\n"), None);
        assert_eq!(split(""), None);
    }

    #[test]
    fn test_entries_keep_order() {
        let parsed = entries("zeta: last\nalpha: first\n").unwrap();
        assert_eq!(
            parsed,
            vec![
                ("zeta".to_owned(), "last".to_owned()),
                ("alpha".to_owned(), "first".to_owned()),
            ]
        );
    }

    #[test]
    fn test_entries_stringify_values() {
        let parsed = entries("tags: [rust, yaml]\ndraft: false\nweight: 3\nempty:\n").unwrap();
        assert_eq!(
            parsed,
            vec![
                ("tags".to_owned(), "rust, yaml".to_owned()),
                ("draft".to_owned(), "false".to_owned()),
                ("weight".to_owned(), "3".to_owned()),
                ("empty".to_owned(), String::new()),
            ]
        );
    }

    #[test]
    fn test_entries_errors() {
        assert!(matches!(entries("- a\n- b\n"), Err(FrontMatterError::NotMapping)));
        assert!(matches!(entries("key: [unclosed\n"), Err(FrontMatterError::Yaml(_))));
        assert_eq!(entries("  \n").unwrap(), Vec::new());
    }
}
