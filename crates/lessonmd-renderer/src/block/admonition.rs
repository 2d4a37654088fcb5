//! `:::type Title` callout blocks.

use super::{BlockRecognizer, Continuation, LineContext};
use crate::ast::{AdmonitionKind, NodeKind};

const FENCE: &str = ":::";

/// Recognizes admonitions opened by `:::<type> <title>` and closed by a lone `:::`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdmonitionRecognizer;

impl BlockRecognizer for AdmonitionRecognizer {
    fn name(&self) -> &'static str {
        "admonition"
    }

    fn trigger(&self) -> &'static str {
        FENCE
    }

    fn open(&self, line: &str) -> Option<NodeKind> {
        let rest = line.strip_prefix(FENCE)?.trim_start_matches(' ');
        let (keyword, title) = rest.split_once(char::is_whitespace)?;
        let kind = AdmonitionKind::from_keyword(keyword)?;
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        Some(NodeKind::Admonition {
            kind,
            title: title.to_owned(),
        })
    }

    fn continue_line(&self, _node: &NodeKind, line: &str, context: LineContext) -> Continuation {
        if context.innermost && !context.in_fence && line.trim() == FENCE {
            Continuation::Close { consume: true }
        } else {
            Continuation::Keep { strip: 0 }
        }
    }
}
