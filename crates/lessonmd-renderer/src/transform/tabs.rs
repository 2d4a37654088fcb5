//! Grouping of consecutive tabs.

use super::Transformer;
use crate::ast::{Document, NodeId, NodeKind};

/// Wraps every maximal run of sibling [`NodeKind::Tab`] nodes in a
/// [`NodeKind::TabGroup`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TabGrouping;

impl Transformer for TabGrouping {
    fn name(&self) -> &'static str {
        "tab-grouping"
    }

    fn transform(&self, document: &mut Document) -> usize {
        let runs = tab_runs(document);
        let count = runs.len();
        for (first, last) in runs {
            document.wrap(first, last, NodeKind::TabGroup);
        }
        count
    }
}

fn is_tab(document: &Document, id: NodeId) -> bool {
    matches!(document.kind(id), NodeKind::Tab { .. })
}

/// First and last node of each run of consecutive tabs, in document order.
fn tab_runs(document: &Document) -> Vec<(NodeId, NodeId)> {
    let mut runs = Vec::new();
    for parent in document.descendants(document.root()) {
        if matches!(document.kind(parent), NodeKind::TabGroup) {
            continue;
        }
        let mut current: Option<(NodeId, NodeId)> = None;
        for child in document.children(parent) {
            if is_tab(document, child) {
                current = Some(match current {
                    Some((first, _)) => (first, child),
                    None => (child, child),
                });
            } else if let Some(run) = current.take() {
                runs.push(run);
            }
        }
        runs.extend(current);
    }
    runs
}
