//! Shared text helpers for rendering.

/// Escape HTML special characters.
///
/// Escapes `&`, `<`, `>` and `"`. Applying it to already generated markup
/// is a caller bug: renderers only pass literal text through here.
///
/// ```
/// use lessonmd_renderer::escape_html;
///
/// assert_eq!(escape_html(r#"<a href="x">"#), "&lt;a href=&quot;x&quot;&gt;");
/// ```
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    push_escaped(&mut result, s);
    result
}

/// Append `s` to `out` with HTML special characters escaped.
pub(crate) fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Convert heading text to a URL-safe slug.
///
/// Lowercases, joins words with single dashes and drops other punctuation.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Short name of a tab used in `data-tab-name` attributes.
///
/// Lowercases the title, turns spaces and underscores into hyphens and keeps
/// only `[a-z0-9-]`.
///
/// ```
/// use lessonmd_renderer::normalize_tab_name;
///
/// assert_eq!(normalize_tab_name("Node.js (LTS)"), "nodejs-lts");
/// ```
#[must_use]
pub fn normalize_tab_name(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' | '_' => Some('-'),
            'a'..='z' | '0'..='9' | '-' => Some(c),
            _ => None,
        })
        .collect()
}

/// Width of leading indentation, counting a tab as four columns.
pub(crate) fn indentation(line: &str) -> usize {
    line.chars()
        .map_while(|c| match c {
            ' ' => Some(1),
            '\t' => Some(4),
            _ => None,
        })
        .sum()
}

/// Whether a line has no visible content.
pub(crate) fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it's");
    }

    #[test]
    fn test_escape_html_does_not_touch_entities_twice() {
        let once = escape_html("a < b");
        assert_eq!(once, "a &lt; b");
        assert_eq!(escape_html("a < b"), once);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("  Spaces  "), "spaces");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("kebab-case"), "kebab-case");
        assert_eq!(slugify("snake_case"), "snake-case");
        assert_eq!(slugify("Lesson item title"), "lesson-item-title");
    }

    #[test]
    fn test_normalize_tab_name() {
        assert_eq!(normalize_tab_name("JavaScript Example"), "javascript-example");
        assert_eq!(normalize_tab_name("snake_case Tab"), "snake-case-tab");
        assert_eq!(normalize_tab_name("C++ / Rust"), "c--rust");
        assert_eq!(normalize_tab_name("Ünïcode"), "ncode");
    }

    #[test]
    fn test_indentation() {
        assert_eq!(indentation("  code"), 2);
        assert_eq!(indentation("\tcode"), 4);
        assert_eq!(indentation(" \t x"), 6);
        assert_eq!(indentation("none"), 0);
    }
}
