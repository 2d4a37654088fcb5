//! Line-oriented block scanning.
//!
//! The scanner keeps a stack of open containers: the document root plus one
//! frame per custom block opened by a [`BlockRecognizer`]. Each input line is
//! first offered to the open blocks (outermost first) so they can strip their
//! indentation or close; what remains is either a new custom block opener or
//! plain markdown for the innermost container.
//!
//! Plain markdown accumulates in a per-container run and is handed to
//! pulldown-cmark whenever the run is interrupted by a custom block or its
//! container closes. When custom blocks split the markdown into several
//! runs, a first scan collects the link reference definitions of all runs
//! so that references resolve across block boundaries.

mod admonition;
mod details;
mod fence;
mod markdown;
mod source;
mod tabs;

use std::ops::Range;

use pulldown_cmark::Options;

pub use admonition::AdmonitionRecognizer;
pub use details::DetailsRecognizer;
pub use tabs::TabRecognizer;

use crate::ast::{Document, NodeId, NodeKind};
use markdown::References;
use source::{Line, Run, lines};

/// What an open block reports for the line offered to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Continuation {
    /// The line belongs to the block. `strip` leading bytes are removed
    /// before nested content sees it.
    Keep { strip: usize },
    /// The block ends here. When `consume` is false the line is re-offered
    /// to the enclosing container.
    Close { consume: bool },
}

/// Where a continuation line sits relative to the open blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineContext {
    /// The block being asked is the innermost open block.
    pub innermost: bool,
    /// The innermost block's pending markdown has an unclosed code fence.
    pub in_fence: bool,
}

/// Parser for a custom block construct.
///
/// Recognizers are tried in registration order for lines that start with
/// their [`trigger`](Self::trigger); the first one whose
/// [`open`](Self::open) returns a node wins.
pub trait BlockRecognizer: Send + Sync {
    /// Name used in log messages and warnings.
    fn name(&self) -> &'static str;

    /// Prefix a line must start with before [`open`](Self::open) is tried.
    fn trigger(&self) -> &'static str;

    /// Inspect a single line and build the block node, or decline.
    ///
    /// If the returned kind does not accept children the node is emitted as
    /// a one-line leaf and no continuation follows.
    fn open(&self, line: &str) -> Option<NodeKind>;

    /// Decide whether `line` continues or closes the open block `node`.
    fn continue_line(&self, node: &NodeKind, line: &str, context: LineContext) -> Continuation;

    /// Whether reaching the end of input while open deserves a warning.
    fn requires_close(&self) -> bool {
        true
    }
}

/// Result of scanning a document.
#[derive(Debug)]
pub struct Parsed {
    pub document: Document,
    /// Recoverable problems such as unterminated blocks.
    pub warnings: Vec<String>,
}

struct Frame {
    node: NodeId,
    /// Index into the recognizer list; `None` for the document root.
    recognizer: Option<usize>,
    run: Run,
    opened_at: usize,
    end: usize,
}

impl Frame {
    fn new(node: NodeId, recognizer: Option<usize>, opened_at: usize, end: usize) -> Self {
        Self {
            node,
            recognizer,
            run: Run::default(),
            opened_at,
            end,
        }
    }
}

/// Builds a [`Document`] from source text with a set of block recognizers.
pub(crate) struct BlockScanner<'p> {
    recognizers: &'p [Box<dyn BlockRecognizer>],
    options: Options,
}

impl<'p> BlockScanner<'p> {
    pub(crate) fn new(recognizers: &'p [Box<dyn BlockRecognizer>], options: Options) -> Self {
        Self {
            recognizers,
            options,
        }
    }

    /// Scan `source[body]` into a document whose root spans all of `source`.
    pub(crate) fn scan(&self, source: &str, body: Range<usize>) -> Parsed {
        let split = !self.recognizers.is_empty() && source[body.clone()].contains("]:");
        let references = if split {
            let mut collect = Scan::new(self, source, References::new(), true);
            for line in lines(source, body.clone()) {
                collect.line(line);
            }
            collect.into_references()
        } else {
            References::new()
        };

        let mut scan = Scan::new(self, source, references, false);
        for line in lines(source, body) {
            scan.line(line);
        }
        scan.finish()
    }
}

struct Scan<'s, 'p> {
    scanner: &'s BlockScanner<'p>,
    document: Document,
    frames: Vec<Frame>,
    warnings: Vec<String>,
    references: References,
    /// Only gather reference definitions; the document is discarded.
    collecting: bool,
    limit: usize,
}

impl<'s, 'p> Scan<'s, 'p> {
    fn new(
        scanner: &'s BlockScanner<'p>,
        source: &str,
        references: References,
        collecting: bool,
    ) -> Self {
        let document = Document::new(0..source.len());
        let root = document.root();
        Self {
            scanner,
            document,
            frames: vec![Frame::new(root, None, 0, source.len())],
            warnings: Vec::new(),
            references,
            collecting,
            limit: source.len(),
        }
    }

    fn line(&mut self, original: Line<'_>) {
        let scanner = self.scanner;
        let mut line = original;
        // Line as seen by each open block that kept it.
        let mut views: Vec<Line<'_>> = Vec::new();
        let mut level = 1;

        while level < self.frames.len() {
            let innermost = level == self.frames.len() - 1;
            let frame = &self.frames[level];
            let Some(index) = frame.recognizer else {
                break;
            };
            let context = LineContext {
                innermost,
                in_fence: innermost && frame.run.in_fence(),
            };
            let recognizer = &scanner.recognizers[index];

            match recognizer.continue_line(self.document.kind(frame.node), line.text, context) {
                Continuation::Keep { strip } => {
                    views.push(line);
                    line = line.strip(strip);
                    level += 1;
                }
                Continuation::Close { consume: true } => {
                    self.extend_open(line.end);
                    self.close_from(level);
                    return;
                }
                Continuation::Close { consume: false } => {
                    self.close_from(level);
                    if let Some(previous) = views.pop() {
                        level -= 1;
                        line = previous;
                    }
                }
            }
        }

        self.extend_open(line.end);

        if !self.innermost().run.in_fence()
            && let Some((index, kind)) = self.open(line.text)
        {
            self.flush_innermost();
            let parent = self.innermost().node;
            if !self.collecting {
                tracing::debug!(
                    recognizer = scanner.recognizers[index].name(),
                    line = line.number,
                    "opened custom block"
                );
            }
            if kind.accepts_children() {
                let node = self
                    .document
                    .append_child(parent, kind, Some(line.start..line.end));
                self.frames
                    .push(Frame::new(node, Some(index), line.number, line.end));
            } else {
                self.document
                    .append_child(parent, kind, Some(line.start..line.end));
            }
            return;
        }

        let frame = self.innermost_mut();
        frame.run.push(line);
    }

    fn open(&self, text: &str) -> Option<(usize, NodeKind)> {
        self.scanner
            .recognizers
            .iter()
            .enumerate()
            .filter(|(_, recognizer)| text.starts_with(recognizer.trigger()))
            .find_map(|(index, recognizer)| recognizer.open(text).map(|kind| (index, kind)))
    }

    fn innermost(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    fn innermost_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn extend_open(&mut self, end: usize) {
        for frame in &mut self.frames {
            frame.end = end;
        }
    }

    fn flush_innermost(&mut self) {
        let last = self.frames.len() - 1;
        self.flush(last);
    }

    fn flush(&mut self, level: usize) {
        let frame = &mut self.frames[level];
        if frame.run.is_empty() {
            return;
        }
        if self.collecting {
            markdown::collect_references(&frame.run, self.scanner.options, &mut self.references);
        } else {
            markdown::build(
                &mut self.document,
                frame.node,
                &frame.run,
                self.scanner.options,
                &self.references,
                self.limit,
            );
        }
        frame.run.clear();
    }

    /// Close every frame at `level` and above, innermost first.
    fn close_from(&mut self, level: usize) {
        while self.frames.len() > level.max(1) {
            self.flush_innermost();
            if let Some(frame) = self.frames.pop() {
                let start = self
                    .document
                    .span(frame.node)
                    .map_or(frame.end, |span| span.start);
                self.document.set_span(frame.node, Some(start..frame.end));
            }
        }
    }

    fn into_references(mut self) -> References {
        self.close_from(1);
        self.flush(0);
        self.references
    }

    fn finish(mut self) -> Parsed {
        let scanner = self.scanner;
        for frame in self.frames.iter().skip(1) {
            let Some(index) = frame.recognizer else {
                continue;
            };
            let recognizer = &scanner.recognizers[index];
            if recognizer.requires_close() {
                let message = format!(
                    "unterminated {} block opened at line {} runs to end of document",
                    recognizer.name(),
                    frame.opened_at
                );
                tracing::warn!(line = frame.opened_at, "{message}");
                self.warnings.push(message);
            }
        }

        self.close_from(1);
        self.flush(0);

        Parsed {
            document: self.document,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::AdmonitionKind;

    fn recognizers() -> Vec<Box<dyn BlockRecognizer>> {
        vec![
            Box::new(AdmonitionRecognizer),
            Box::new(DetailsRecognizer),
            Box::new(TabRecognizer),
        ]
    }

    fn scan(source: &str) -> Parsed {
        let recognizers = recognizers();
        BlockScanner::new(&recognizers, Options::ENABLE_TABLES).scan(source, 0..source.len())
    }

    /// Compact outline of the tree: one entry per node, indented by depth.
    fn outline(document: &Document) -> Vec<String> {
        fn label(kind: &NodeKind) -> String {
            match kind {
                NodeKind::Text(text) => format!("Text {text:?}"),
                NodeKind::Admonition { kind, title } => {
                    format!("Admonition {} {title:?}", kind.as_str())
                }
                NodeKind::Details { title, open } => format!("Details {title:?} open={open}"),
                NodeKind::Tab { title } => format!("Tab {title:?}"),
                NodeKind::FencedCode { info, literal } => {
                    format!("FencedCode {info:?} {literal:?}")
                }
                other => {
                    let debug = format!("{other:?}");
                    debug
                        .split([' ', '(', '{'])
                        .next()
                        .unwrap_or_default()
                        .to_owned()
                }
            }
        }

        let mut lines = Vec::new();
        let root = document.root();
        for id in document.descendants(root).skip(1) {
            let mut depth = 0;
            let mut parent = document.parent(id);
            while let Some(p) = parent
                && p != root
            {
                depth += 1;
                parent = document.parent(p);
            }
            lines.push(format!("{}{}", "  ".repeat(depth), label(document.kind(id))));
        }
        lines
    }

    #[test]
    fn test_plain_markdown() {
        let parsed = scan("Hello\n\nWorld\n");
        assert_eq!(
            outline(&parsed.document),
            vec!["Paragraph", "  Text \"Hello\"", "Paragraph", "  Text \"World\""]
        );
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_admonition_with_body() {
        let parsed = scan(":::note Title\nBody\n:::\nAfter\n");
        assert_eq!(
            outline(&parsed.document),
            vec![
                "Admonition note \"Title\"",
                "  Paragraph",
                "    Text \"Body\"",
                "Paragraph",
                "  Text \"After\"",
            ]
        );
    }

    #[test]
    fn test_admonition_interrupts_paragraph() {
        let parsed = scan("Intro\n:::tip Hint\nInside\n:::\n");
        assert_eq!(
            outline(&parsed.document),
            vec![
                "Paragraph",
                "  Text \"Intro\"",
                "Admonition tip \"Hint\"",
                "  Paragraph",
                "    Text \"Inside\"",
            ]
        );
    }

    #[test]
    fn test_closer_inside_fence_is_code() {
        let parsed = scan(":::note Code\n```\n:::\n```\n:::\n");
        assert_eq!(
            outline(&parsed.document),
            vec![
                "Admonition note \"Code\"",
                "  FencedCode \"\" \":::\\n\"",
            ]
        );
    }

    #[test]
    fn test_trigger_inside_fence_is_code() {
        let parsed = scan("```\n:::note Not a block\n```\n");
        assert_eq!(
            outline(&parsed.document),
            vec!["FencedCode \"\" \":::note Not a block\\n\""]
        );
    }

    #[test]
    fn test_nested_admonitions_close_innermost_first() {
        let parsed = scan(":::note Outer\n:::warning Inner\ntext\n:::\nmore\n:::\n");
        assert_eq!(
            outline(&parsed.document),
            vec![
                "Admonition note \"Outer\"",
                "  Admonition warning \"Inner\"",
                "    Paragraph",
                "      Text \"text\"",
                "  Paragraph",
                "    Text \"more\"",
            ]
        );
    }

    #[test]
    fn test_unknown_admonition_type_is_text() {
        let parsed = scan(":::danger Nope\nbody\n:::\n");
        let outline = outline(&parsed.document);
        assert_eq!(outline[0], "Paragraph");
        assert!(
            parsed
                .document
                .descendants(parsed.document.root())
                .all(|id| !matches!(parsed.document.kind(id), NodeKind::Admonition { .. }))
        );
    }

    #[test]
    fn test_unterminated_admonition_runs_to_end() {
        let source = ":::caution Careful\nstill inside\n\nand here\n";
        let parsed = scan(source);
        assert_eq!(
            outline(&parsed.document),
            vec![
                "Admonition caution \"Careful\"",
                "  Paragraph",
                "    Text \"still inside\"",
                "  Paragraph",
                "    Text \"and here\"",
            ]
        );
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].contains("admonition"));
        assert!(parsed.warnings[0].contains("line 1"));

        let admonition = parsed.document.first_child(parsed.document.root()).unwrap();
        assert_eq!(parsed.document.span(admonition), Some(0..source.len()));
    }

    #[test]
    fn test_details_open_and_closed() {
        let parsed = scan("[details Closed\nA\n]\n[details open Opened\nB\n]\n");
        assert_eq!(
            outline(&parsed.document),
            vec![
                "Details \"Closed\" open=false",
                "  Paragraph",
                "    Text \"A\"",
                "Details \"Opened\" open=true",
                "  Paragraph",
                "    Text \"B\"",
            ]
        );
    }

    #[test]
    fn test_tabs_are_siblings_with_dedented_bodies() {
        let source = "=== \"One\"\n  first\n\n      indented code\n=== \"Two\"\n  second\nafter\n";
        let parsed = scan(source);
        assert_eq!(
            outline(&parsed.document),
            vec![
                "Tab \"One\"",
                "  Paragraph",
                "    Text \"first\"",
                "  IndentedCode",
                "Tab \"Two\"",
                "  Paragraph",
                "    Text \"second\"",
                "Paragraph",
                "  Text \"after\"",
            ]
        );
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_tab_keeps_blank_lines_before_more_content() {
        let parsed = scan("=== \"A\"\n  one\n\n\n  two\n");
        assert_eq!(
            outline(&parsed.document),
            vec![
                "Tab \"A\"",
                "  Paragraph",
                "    Text \"one\"",
                "  Paragraph",
                "    Text \"two\"",
            ]
        );
    }

    #[test]
    fn test_dedent_closes_tab_then_admonition_closer_applies() {
        let parsed = scan(":::note N\n=== \"T\"\n  in tab\n:::\nafter\n");
        assert_eq!(
            outline(&parsed.document),
            vec![
                "Admonition note \"N\"",
                "  Tab \"T\"",
                "    Paragraph",
                "      Text \"in tab\"",
                "Paragraph",
                "  Text \"after\"",
            ]
        );
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_nested_tabs_inside_tab() {
        let parsed = scan("=== \"Outer\"\n  === \"Inner\"\n    deep\n");
        assert_eq!(
            outline(&parsed.document),
            vec![
                "Tab \"Outer\"",
                "  Tab \"Inner\"",
                "    Paragraph",
                "      Text \"deep\"",
            ]
        );
    }

    #[test]
    fn test_indented_trigger_stays_markdown() {
        let parsed = scan("- item\n  :::note Not here\n");
        assert!(
            parsed
                .document
                .descendants(parsed.document.root())
                .all(|id| !matches!(parsed.document.kind(id), NodeKind::Admonition { .. }))
        );
    }

    #[test]
    fn test_child_spans_inside_parent_spans() {
        let source = "# Title\n\n:::info Box\n=== \"Tab\"\n  - a\n  - b\n:::\n[details D\n`x`\n]\n";
        let parsed = scan(source);
        let document = &parsed.document;
        for id in document.descendants(document.root()) {
            let (Some(span), Some(parent)) = (document.span(id), document.parent(id)) else {
                continue;
            };
            if let Some(parent_span) = document.span(parent) {
                assert!(
                    parent_span.start <= span.start && span.end <= parent_span.end,
                    "{:?} {span:?} escapes {:?} {parent_span:?}",
                    document.kind(id),
                    document.kind(parent)
                );
            }
        }
    }

    #[test]
    fn test_admonition_node_attributes() {
        let parsed = scan(":::warning   Mind the gap  \n:::\n");
        let node = parsed.document.first_child(parsed.document.root()).unwrap();
        assert_eq!(
            parsed.document.kind(node),
            &NodeKind::Admonition {
                kind: AdmonitionKind::Warning,
                title: "Mind the gap".to_owned(),
            }
        );
    }

    fn link_urls(document: &Document) -> Vec<String> {
        document
            .descendants(document.root())
            .filter_map(|id| match document.kind(id) {
                NodeKind::Link { url, .. } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_reference_defined_before_admonition() {
        let parsed = scan("[docs]: https://example.com/docs\n\n:::note Read\nSee [docs].\n:::\n");
        assert_eq!(link_urls(&parsed.document), vec!["https://example.com/docs"]);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_reference_defined_after_tab() {
        let parsed = scan("=== \"One\"\n  Open [the guide][Guide].\n\n[guide]: /guide\n");
        assert_eq!(link_urls(&parsed.document), vec!["/guide"]);
        assert_eq!(
            outline(&parsed.document),
            vec![
                "Tab \"One\"",
                "  Paragraph",
                "    Text \"Open \"",
                "    Link",
                "      Text \"the guide\"",
                "    Text \".\"",
            ]
        );
    }

    #[test]
    fn test_reference_between_sibling_blocks() {
        let parsed = scan("[details D\n[a] then [b]\n]\n:::info I\n[a]: /a\n:::\n[b]: /b\n");
        assert_eq!(link_urls(&parsed.document), vec!["/a", "/b"]);
    }
}

