//! `=== "Title"` tab blocks.
//!
//! A tab's body is every following line indented by at least two columns.
//! Blank lines stay in the tab; the first non-blank line at a lower
//! indentation (including the next `=== "` opener) ends it without being
//! consumed. Grouping consecutive tabs happens later, in
//! [`TabGrouping`](crate::transform::TabGrouping).

use super::{BlockRecognizer, Continuation, LineContext};
use crate::ast::NodeKind;
use crate::util::{indentation, is_blank};

const TRIGGER: &str = "=== \"";
const BODY_INDENT: usize = 2;
const DEFAULT_TITLE: &str = "Tab";

/// Recognizes tab panels opened by `=== "<title>"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TabRecognizer;

impl BlockRecognizer for TabRecognizer {
    fn name(&self) -> &'static str {
        "tab"
    }

    fn trigger(&self) -> &'static str {
        TRIGGER
    }

    fn open(&self, line: &str) -> Option<NodeKind> {
        let rest = line.strip_prefix(TRIGGER)?;
        // An unclosed title still opens a tab under the default name.
        let title = rest.rfind('"').map_or("", |end| rest[..end].trim_end());
        let title = if title.is_empty() {
            DEFAULT_TITLE
        } else {
            title
        };
        Some(NodeKind::Tab {
            title: title.to_owned(),
        })
    }

    fn continue_line(&self, _node: &NodeKind, line: &str, _context: LineContext) -> Continuation {
        if is_blank(line) {
            return Continuation::Keep {
                strip: leading_spaces(line, BODY_INDENT),
            };
        }
        if indentation(line) < BODY_INDENT {
            return Continuation::Close { consume: false };
        }
        Continuation::Keep {
            strip: leading_spaces(line, BODY_INDENT),
        }
    }

    fn requires_close(&self) -> bool {
        false
    }
}

/// Number of leading space bytes to strip, at most `max`.
fn leading_spaces(line: &str, max: usize) -> usize {
    line.bytes().take(max).take_while(|&b| b == b' ').count()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn tab(title: &str) -> Option<NodeKind> {
        Some(NodeKind::Tab {
            title: title.to_owned(),
        })
    }

    #[test]
    fn test_open() {
        assert_eq!(TabRecognizer.open(r#"=== "JavaScript""#), tab("JavaScript"));
        assert_eq!(TabRecognizer.open(r#"=== "Two words"  "#), tab("Two words"));
        assert_eq!(TabRecognizer.open(r#"=== "Say "hi"""#), tab(r#"Say "hi""#));
    }

    #[test]
    fn test_open_empty_title_falls_back() {
        assert_eq!(TabRecognizer.open(r#"=== """#), tab("Tab"));
        assert_eq!(TabRecognizer.open(r#"=== "   ""#), tab("Tab"));
    }

    #[test]
    fn test_unclosed_title_uses_default() {
        assert_eq!(TabRecognizer.open(r#"=== "Open"#), tab("Tab"));
        assert_eq!(TabRecognizer.open(r#"=== ""#), tab("Tab"));
    }

    #[test]
    fn test_declines_without_opening_quote() {
        assert_eq!(TabRecognizer.open("=== Plain"), None);
        assert_eq!(TabRecognizer.open(r#"==="Tight""#), None);
    }

    #[test]
    fn test_continuation() {
        let node = NodeKind::Tab {
            title: "T".to_owned(),
        };
        let context = LineContext::default();
        let keep = |line| TabRecognizer.continue_line(&node, line, context);

        assert_eq!(keep("  body"), Continuation::Keep { strip: 2 });
        assert_eq!(keep("      code"), Continuation::Keep { strip: 2 });
        assert_eq!(keep(""), Continuation::Keep { strip: 0 });
        assert_eq!(keep(" "), Continuation::Keep { strip: 1 });
        assert_eq!(keep("\tbody"), Continuation::Keep { strip: 0 });
        assert_eq!(keep(" x"), Continuation::Close { consume: false });
        assert_eq!(keep("root"), Continuation::Close { consume: false });
        assert_eq!(keep(r#"=== "Next""#), Continuation::Close { consume: false });
    }

    #[test]
    fn test_tab_does_not_warn_at_end() {
        assert!(!TabRecognizer.requires_close());
    }
}
