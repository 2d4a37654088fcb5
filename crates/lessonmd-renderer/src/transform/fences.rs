//! Fenced code reclassification.

use super::Transformer;
use crate::ast::{Document, NodeId, NodeKind};

/// Language tag: the first whitespace-delimited token of an info string.
fn language(info: &str) -> &str {
    info.split_whitespace().next().unwrap_or_default()
}

/// Replace every fenced code block for which `select` returns a new kind.
///
/// Matches are collected before any replacement happens.
fn reclassify<F>(document: &mut Document, select: F) -> usize
where
    F: Fn(&str, &str) -> Option<NodeKind>,
{
    let matches: Vec<(NodeId, NodeKind)> = document
        .descendants(document.root())
        .filter_map(|id| match document.kind(id) {
            NodeKind::FencedCode { info, literal } => {
                select(info.as_str(), literal.as_str()).map(|kind| (id, kind))
            }
            _ => None,
        })
        .collect();

    let count = matches.len();
    for (id, kind) in matches {
        document.replace(id, kind);
    }
    count
}

/// Rewrites ```` ```command ```` fences into shell command blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandBlocks;

impl Transformer for CommandBlocks {
    fn name(&self) -> &'static str {
        "command-blocks"
    }

    fn transform(&self, document: &mut Document) -> usize {
        reclassify(document, |info, literal| {
            (language(info) == "command").then(|| NodeKind::CommandBlock {
                literal: literal.to_owned(),
            })
        })
    }
}

/// Rewrites ```` ```output ```` fences into captured output blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutputBlocks;

impl Transformer for OutputBlocks {
    fn name(&self) -> &'static str {
        "output-blocks"
    }

    fn transform(&self, document: &mut Document) -> usize {
        reclassify(document, |info, literal| {
            (language(info) == "output").then(|| NodeKind::OutputBlock {
                literal: literal.to_owned(),
            })
        })
    }
}

/// Rewrites ```` ```mermaid ```` fences into diagrams.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiagramBlocks;

impl Transformer for DiagramBlocks {
    fn name(&self) -> &'static str {
        "diagram-blocks"
    }

    fn transform(&self, document: &mut Document) -> usize {
        reclassify(document, |info, literal| {
            (language(info) == "mermaid").then(|| NodeKind::Diagram {
                literal: literal.to_owned(),
            })
        })
    }
}

/// Rewrites every remaining fence into a code block with an optional
/// filename caption.
///
/// The info string is split on its first whitespace: the first token is the
/// language, the trimmed rest (when non-empty) the filename.
#[derive(Debug, Default, Clone, Copy)]
pub struct LabeledCodeBlocks;

impl Transformer for LabeledCodeBlocks {
    fn name(&self) -> &'static str {
        "labeled-code-blocks"
    }

    fn transform(&self, document: &mut Document) -> usize {
        reclassify(document, |info, literal| {
            let (language, filename) = match info.split_once(char::is_whitespace) {
                Some((language, rest)) => (language, rest.trim()),
                None => (info, ""),
            };
            Some(NodeKind::LabeledCodeBlock {
                language: language.to_owned(),
                filename: (!filename.is_empty()).then(|| filename.to_owned()),
                literal: literal.to_owned(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn document(fences: &[&str]) -> Document {
        let mut document = Document::new(0..0);
        let root = document.root();
        for (index, info) in fences.iter().enumerate() {
            document.append_child(root, NodeKind::Paragraph, None);
            document.append_child(
                root,
                NodeKind::FencedCode {
                    info: (*info).to_owned(),
                    literal: format!("line {index}\n"),
                },
                Some(index * 10..index * 10 + 5),
            );
        }
        document
    }

    fn kinds(document: &Document) -> Vec<NodeKind> {
        document
            .children(document.root())
            .map(|id| document.kind(id).clone())
            .filter(|kind| kind != &NodeKind::Paragraph)
            .collect()
    }

    #[test]
    fn test_command_blocks() {
        let mut doc = document(&["command", "bash", "command extra"]);
        assert_eq!(CommandBlocks.transform(&mut doc), 2);
        assert_eq!(
            kinds(&doc),
            vec![
                NodeKind::CommandBlock {
                    literal: "line 0\n".to_owned()
                },
                NodeKind::FencedCode {
                    info: "bash".to_owned(),
                    literal: "line 1\n".to_owned()
                },
                NodeKind::CommandBlock {
                    literal: "line 2\n".to_owned()
                },
            ]
        );
    }

    #[test]
    fn test_output_and_diagram_blocks() {
        let mut doc = document(&["output", "mermaid"]);
        assert_eq!(OutputBlocks.transform(&mut doc), 1);
        assert_eq!(DiagramBlocks.transform(&mut doc), 1);
        assert_eq!(
            kinds(&doc),
            vec![
                NodeKind::OutputBlock {
                    literal: "line 0\n".to_owned()
                },
                NodeKind::Diagram {
                    literal: "line 1\n".to_owned()
                },
            ]
        );
    }

    #[test]
    fn test_labeled_code_blocks() {
        let mut doc = document(&["js   app.js ", "rust", ""]);
        assert_eq!(LabeledCodeBlocks.transform(&mut doc), 3);
        assert_eq!(
            kinds(&doc),
            vec![
                NodeKind::LabeledCodeBlock {
                    language: "js".to_owned(),
                    filename: Some("app.js".to_owned()),
                    literal: "line 0\n".to_owned(),
                },
                NodeKind::LabeledCodeBlock {
                    language: "rust".to_owned(),
                    filename: None,
                    literal: "line 1\n".to_owned(),
                },
                NodeKind::LabeledCodeBlock {
                    language: String::new(),
                    filename: None,
                    literal: "line 2\n".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_replacement_keeps_position_and_span() {
        let mut doc = document(&["python", "command"]);
        CommandBlocks.transform(&mut doc);
        let root = doc.root();
        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 4);
        assert_eq!(doc.kind(children[2]), &NodeKind::Paragraph);
        assert!(matches!(doc.kind(children[3]), NodeKind::CommandBlock { .. }));
        assert_eq!(doc.span(children[3]), Some(10..15));
    }

    #[test]
    fn test_no_match_allocates_nothing() {
        let mut doc = document(&["rust", "bash"]);
        let before = doc.arena_len();
        assert_eq!(CommandBlocks.transform(&mut doc), 0);
        assert_eq!(OutputBlocks.transform(&mut doc), 0);
        assert_eq!(doc.arena_len(), before);
    }

    #[test]
    fn test_nested_fences_are_found() {
        let mut doc = Document::new(0..0);
        let root = doc.root();
        let quote = doc.append_child(root, NodeKind::BlockQuote, None);
        let item = doc.append_child(quote, NodeKind::Item, None);
        let fence = doc.append_child(
            item,
            NodeKind::FencedCode {
                info: "output".to_owned(),
                literal: "ok\n".to_owned(),
            },
            None,
        );
        assert_eq!(OutputBlocks.transform(&mut doc), 1);
        let replaced = doc.first_child(item).unwrap();
        assert_ne!(replaced, fence);
        assert_eq!(doc.parent(fence), None);
        assert!(matches!(doc.kind(replaced), NodeKind::OutputBlock { .. }));
    }
}
