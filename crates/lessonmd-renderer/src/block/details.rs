//! `[details Title` ... `]` collapsible sections.

use super::{BlockRecognizer, Continuation, LineContext};
use crate::ast::NodeKind;

const TRIGGER: &str = "[details ";
const CLOSER: &str = "]";

/// Recognizes `[details <title>` and `[details open <title>` blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetailsRecognizer;

impl BlockRecognizer for DetailsRecognizer {
    fn name(&self) -> &'static str {
        "details"
    }

    fn trigger(&self) -> &'static str {
        TRIGGER
    }

    fn open(&self, line: &str) -> Option<NodeKind> {
        let rest = line.strip_prefix(TRIGGER)?;
        let (open, title) = match rest.strip_prefix("open ") {
            Some(title) => (true, title),
            None => (false, rest),
        };
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        Some(NodeKind::Details {
            title: title.to_owned(),
            open,
        })
    }

    fn continue_line(&self, _node: &NodeKind, line: &str, context: LineContext) -> Continuation {
        if context.innermost && !context.in_fence && line.trim() == CLOSER {
            Continuation::Close { consume: true }
        } else {
            Continuation::Keep { strip: 0 }
        }
    }
}
