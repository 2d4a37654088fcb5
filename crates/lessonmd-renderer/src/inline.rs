//! Inline delimiter matching.
//!
//! pulldown-cmark has no notion of `==highlight==`, so the marker runs arrive
//! as plain text. This pass splits text nodes at marker runs, classifies each
//! run with the CommonMark flanking rules and pairs openers with closers using
//! a delimiter stack, the same way emphasis is resolved. Matched pairs move the
//! nodes between them under a new inline container; unmatched runs stay text.

use std::ops::Range;

use crate::ast::{Document, NodeId, NodeKind};

/// One marker run found in a text node, pending a partner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delimiter {
    pub marker: char,
    /// Length of the run as written.
    pub length: usize,
    /// Markers not yet consumed by a match.
    pub remaining: usize,
    pub can_open: bool,
    pub can_close: bool,
    node: NodeId,
}

/// Inline construct delimited by runs of a single marker character.
pub trait DelimiterProcessor: Send + Sync {
    /// Marker character, e.g. `=`.
    fn marker(&self) -> char;

    /// Shortest run that counts as a delimiter. Shorter runs are plain text.
    fn min_run(&self) -> usize;

    /// Whether `opener` may pair with `closer`.
    fn can_open_closer(&self, opener: &Delimiter, closer: &Delimiter) -> bool {
        opener.marker == closer.marker
    }

    /// Container created for a matched pair.
    fn node_kind(&self) -> NodeKind;
}

/// `==text==` highlight markers.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighlightDelimiter;

impl DelimiterProcessor for HighlightDelimiter {
    fn marker(&self) -> char {
        '='
    }

    fn min_run(&self) -> usize {
        2
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::InlineHighlight
    }
}

/// Run every processor over all inline content in `document`.
///
/// Returns the number of matched pairs.
pub fn process_document(document: &mut Document, processors: &[Box<dyn DelimiterProcessor>]) -> usize {
    let mut matched = 0;
    for processor in processors {
        let parents: Vec<NodeId> = document
            .descendants(document.root())
            .filter(|&id| has_text_children(document, id))
            .collect();
        for parent in parents {
            matched += process_parent(document, parent, processor.as_ref());
        }
    }
    if matched > 0 {
        tracing::debug!(matched, "resolved inline delimiters");
    }
    matched
}

fn has_text_children(document: &Document, id: NodeId) -> bool {
    !matches!(document.kind(id), NodeKind::Image { .. })
        && document
            .children(id)
            .any(|child| matches!(document.kind(child), NodeKind::Text(_)))
}

fn process_parent(document: &mut Document, parent: NodeId, processor: &dyn DelimiterProcessor) -> usize {
    let delimiters = split_runs(document, parent, processor);
    if delimiters.is_empty() {
        return 0;
    }
    resolve(document, delimiters, processor)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Boundary {
    Whitespace,
    Punctuation,
    Other,
}

fn classify(c: Option<char>) -> Boundary {
    match c {
        None => Boundary::Whitespace,
        Some(c) if c.is_whitespace() => Boundary::Whitespace,
        Some(c) if c.is_alphanumeric() => Boundary::Other,
        Some(_) => Boundary::Punctuation,
    }
}

/// Character class just outside a text node, looking at a sibling.
fn neighbor(document: &Document, sibling: Option<NodeId>, from_end: bool) -> Boundary {
    match sibling.map(|id| document.kind(id)) {
        None | Some(NodeKind::SoftBreak | NodeKind::HardBreak) => Boundary::Whitespace,
        Some(NodeKind::Text(text)) => classify(if from_end {
            text.chars().next_back()
        } else {
            text.chars().next()
        }),
        Some(_) => Boundary::Punctuation,
    }
}

/// Find marker runs of at least `min` characters, as byte ranges.
fn marker_runs(text: &str, marker: char, min: usize) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    let mut count = 0;

    for (offset, c) in text.char_indices() {
        if c == marker {
            if start.is_none() {
                start = Some(offset);
                count = 0;
            }
            count += 1;
        } else if let Some(run_start) = start.take()
            && count >= min
        {
            runs.push(run_start..offset);
        }
    }
    if let Some(run_start) = start
        && count >= min
    {
        runs.push(run_start..text.len());
    }
    runs
}

/// Replace text children containing marker runs with plain/run pieces and
/// return the runs as delimiters in document order.
fn split_runs(
    document: &mut Document,
    parent: NodeId,
    processor: &dyn DelimiterProcessor,
) -> Vec<Delimiter> {
    let marker = processor.marker();
    let marker_len = marker.len_utf8();
    let children: Vec<NodeId> = document.children(parent).collect();
    let mut delimiters = Vec::new();

    for child in children {
        let NodeKind::Text(text) = document.kind(child) else {
            continue;
        };
        let runs = marker_runs(text, marker, processor.min_run());
        if runs.is_empty() {
            continue;
        }
        let text = text.clone();
        let span = document.span(child);
        let before_node = neighbor(document, document.prev_sibling(child), true);
        let after_node = neighbor(document, document.next_sibling(child), false);

        let piece_span = |range: &Range<usize>| match &span {
            Some(span) if span.len() == text.len() => {
                Some(span.start + range.start..span.start + range.end)
            }
            other => other.clone(),
        };

        let mut cursor = 0;
        for run in runs {
            if run.start > cursor {
                let range = cursor..run.start;
                document.insert_before(
                    child,
                    NodeKind::Text(text[range.clone()].to_owned()),
                    piece_span(&range),
                );
            }

            let before = if run.start == 0 {
                before_node
            } else {
                classify(text[..run.start].chars().next_back())
            };
            let after = if run.end == text.len() {
                after_node
            } else {
                classify(text[run.end..].chars().next())
            };
            let left_flanking = after != Boundary::Whitespace
                && (after != Boundary::Punctuation || before != Boundary::Other);
            let right_flanking = before != Boundary::Whitespace
                && (before != Boundary::Punctuation || after != Boundary::Other);

            let node = document.insert_before(
                child,
                NodeKind::Text(text[run.clone()].to_owned()),
                piece_span(&run),
            );
            let length = run.len() / marker_len;
            delimiters.push(Delimiter {
                marker,
                length,
                remaining: length,
                can_open: left_flanking,
                can_close: right_flanking,
                node,
            });
            cursor = run.end;
        }
        if cursor < text.len() {
            let range = cursor..text.len();
            document.insert_before(
                child,
                NodeKind::Text(text[range.clone()].to_owned()),
                piece_span(&range),
            );
        }
        document.detach(child);
    }

    delimiters
}

/// Sum of lengths rule: when either side could both open and close, a pair
/// whose lengths add up to a multiple of three only matches if both are.
fn violates_rule_of_three(opener: &Delimiter, closer: &Delimiter) -> bool {
    (opener.can_close || closer.can_open)
        && (opener.length + closer.length) % 3 == 0
        && !(opener.length % 3 == 0 && closer.length % 3 == 0)
}

fn resolve(
    document: &mut Document,
    mut delimiters: Vec<Delimiter>,
    processor: &dyn DelimiterProcessor,
) -> usize {
    let mut matched = 0;
    let mut closer = 0;
    // Leftover markers shorter than a run never match.
    let min = processor.min_run().max(1);

    while closer < delimiters.len() {
        if !delimiters[closer].can_close || delimiters[closer].remaining < min {
            closer += 1;
            continue;
        }

        let found = (0..closer).rev().find(|&index| {
            let candidate = &delimiters[index];
            candidate.can_open
                && candidate.remaining >= min
                && processor.can_open_closer(candidate, &delimiters[closer])
                && !violates_rule_of_three(candidate, &delimiters[closer])
        });
        let Some(opener) = found else {
            closer += 1;
            continue;
        };

        let used = if delimiters[opener].remaining >= 2 && delimiters[closer].remaining >= 2 {
            2
        } else {
            1
        };
        delimiters[opener].remaining -= used;
        delimiters[closer].remaining -= used;

        let opener_node = delimiters[opener].node;
        let closer_node = delimiters[closer].node;
        match (document.next_sibling(opener_node), document.prev_sibling(closer_node)) {
            (Some(first), Some(last)) if first != closer_node => {
                document.wrap(first, last, processor.node_kind());
            }
            _ => {
                document.insert_after(opener_node, processor.node_kind(), None);
            }
        }

        for delimiter in &mut delimiters[opener + 1..closer] {
            delimiter.remaining = 0;
        }
        for index in [opener, closer] {
            let delimiter = &delimiters[index];
            set_markers(document, delimiter.node, delimiter.marker, delimiter.remaining);
        }
        matched += 1;
    }

    matched
}

/// Shrink a run's text node to its unconsumed markers, dropping it when none remain.
fn set_markers(document: &mut Document, node: NodeId, marker: char, remaining: usize) {
    if remaining == 0 {
        document.detach(node);
    } else if let NodeKind::Text(text) = document.kind_mut(node) {
        *text = std::iter::repeat_n(marker, remaining).collect();
    }
}
