//! Standard markdown blocks via pulldown-cmark.
//!
//! A pending [`Run`] is parsed with pulldown-cmark and its event stream is
//! turned into arena nodes under the container that owned the run.
//!
//! Runs are parsed one at a time, so a link reference definition is only
//! visible to pulldown-cmark inside its own run. [`collect_references`]
//! gathers the definitions of every run up front and [`build`] resolves
//! otherwise broken references against them.

use std::collections::HashMap;
use std::ops::Range;

use pulldown_cmark::{
    BrokenLink, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};

use super::source::Run;
use crate::ast::{Document, NodeId, NodeKind};

/// Link reference definitions keyed by normalized label: `(url, title)`.
pub(crate) type References = HashMap<String, (String, String)>;

/// Case-insensitive label match with internal whitespace collapsed.
fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Record the reference definitions of `run`. The first definition of a
/// label in document order wins.
pub(crate) fn collect_references(run: &Run, options: Options, references: &mut References) {
    let parser = Parser::new_ext(run.buffer(), options);
    for (label, definition) in parser.reference_definitions().iter() {
        references
            .entry(normalize_label(label))
            .or_insert_with(|| {
                (
                    definition.dest.to_string(),
                    definition
                        .title
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                )
            });
    }
}

/// Parse `run` and append the resulting nodes as children of `parent`.
///
/// References the run does not define itself are looked up in `references`.
pub(crate) fn build(
    document: &mut Document,
    parent: NodeId,
    run: &Run,
    options: Options,
    references: &References,
    limit: usize,
) {
    let mut builder = TreeBuilder {
        document,
        run,
        limit,
        stack: vec![parent],
        literal: None,
    };
    let parser = Parser::new_with_broken_link_callback(
        run.buffer(),
        options,
        Some(|link: BrokenLink<'_>| {
            references
                .get(&normalize_label(&link.reference))
                .map(|(url, title)| (CowStr::from(url.clone()), CowStr::from(title.clone())))
        }),
    );
    for (event, range) in parser.into_offset_iter() {
        builder.process_event(event, range);
    }
}

struct TreeBuilder<'a> {
    document: &'a mut Document,
    run: &'a Run,
    limit: usize,
    /// Open containers; the last entry receives new children.
    stack: Vec<NodeId>,
    /// Code or HTML block currently collecting its literal.
    literal: Option<NodeId>,
}

impl TreeBuilder<'_> {
    fn current(&self) -> NodeId {
        self.stack[self.stack.len() - 1]
    }

    fn span(&self, range: Range<usize>) -> Option<Range<usize>> {
        Some(self.run.source_range(range, self.limit))
    }

    fn leaf(&mut self, kind: NodeKind, range: Range<usize>) -> NodeId {
        let span = self.span(range);
        let parent = self.current();
        self.document.append_child(parent, kind, span)
    }

    fn open(&mut self, kind: NodeKind, range: Range<usize>) {
        let id = self.leaf(kind, range);
        self.stack.push(id);
    }

    fn process_event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start_tag(tag, range),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text, range),
            Event::Code(code) => {
                self.leaf(NodeKind::Code(code.into_string()), range);
            }
            Event::Html(html) => self.html(&html, range),
            Event::InlineHtml(html) => {
                self.leaf(NodeKind::InlineHtml(html.into_string()), range);
            }
            Event::SoftBreak => {
                self.leaf(NodeKind::SoftBreak, range);
            }
            Event::HardBreak => {
                self.leaf(NodeKind::HardBreak, range);
            }
            Event::Rule => {
                self.leaf(NodeKind::ThematicBreak, range);
            }
            Event::TaskListMarker(checked) => {
                self.leaf(NodeKind::TaskListMarker { checked }, range);
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not enabled in parser options
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>, range: Range<usize>) {
        let kind = match tag {
            Tag::Paragraph => NodeKind::Paragraph,
            Tag::Heading {
                level, id, classes, ..
            } => NodeKind::Heading {
                level: heading_level_to_num(level),
                id: id.map(pulldown_cmark::CowStr::into_string),
                classes: classes
                    .into_iter()
                    .map(pulldown_cmark::CowStr::into_string)
                    .collect(),
            },
            Tag::BlockQuote(_) => NodeKind::BlockQuote,
            Tag::CodeBlock(kind) => {
                let kind = match kind {
                    CodeBlockKind::Fenced(info) => NodeKind::FencedCode {
                        info: info.trim().to_owned(),
                        literal: String::new(),
                    },
                    CodeBlockKind::Indented => NodeKind::IndentedCode {
                        literal: String::new(),
                    },
                };
                self.literal = Some(self.leaf(kind, range));
                return;
            }
            Tag::HtmlBlock => {
                let kind = NodeKind::HtmlBlock {
                    literal: String::new(),
                };
                self.literal = Some(self.leaf(kind, range));
                return;
            }
            Tag::List(start) => NodeKind::List { start },
            Tag::Item => NodeKind::Item,
            Tag::Table(alignments) => NodeKind::Table { alignments },
            Tag::TableHead => NodeKind::TableHead,
            Tag::TableRow => NodeKind::TableRow,
            Tag::TableCell => NodeKind::TableCell,
            Tag::Emphasis => NodeKind::Emphasis,
            Tag::Strong => NodeKind::Strong,
            Tag::Strikethrough => NodeKind::Strikethrough,
            Tag::Link {
                dest_url, title, ..
            } => NodeKind::Link {
                url: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::Image {
                dest_url, title, ..
            } => NodeKind::Image {
                url: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::FootnoteDefinition(_)
            | Tag::MetadataBlock(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Superscript
            | Tag::Subscript => {
                // Not enabled; keep the stack balanced for the matching end tag.
                let parent = self.current();
                self.stack.push(parent);
                return;
            }
        };
        self.open(kind, range);
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::CodeBlock | TagEnd::HtmlBlock => self.literal = None,
            _ => {
                if self.stack.len() > 1 {
                    self.stack.pop();
                }
            }
        }
    }

    fn push_literal(&mut self, text: &str) -> bool {
        let Some(id) = self.literal else {
            return false;
        };
        match self.document.kind_mut(id) {
            NodeKind::FencedCode { literal, .. }
            | NodeKind::IndentedCode { literal }
            | NodeKind::HtmlBlock { literal } => literal.push_str(text),
            _ => return false,
        }
        true
    }

    fn text(&mut self, text: &str, range: Range<usize>) {
        if !self.push_literal(text) {
            self.leaf(NodeKind::Text(text.to_owned()), range);
        }
    }

    fn html(&mut self, html: &str, range: Range<usize>) {
        if !self.push_literal(html) {
            self.leaf(NodeKind::InlineHtml(html.to_owned()), range);
        }
    }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::block::source::lines;

    const OPTIONS: Options = Options::ENABLE_TABLES.union(Options::ENABLE_HEADING_ATTRIBUTES);

    fn run_of(source: &str) -> Run {
        let mut run = Run::default();
        for line in lines(source, 0..source.len()) {
            run.push(line);
        }
        run
    }

    fn parse_with(source: &str, references: &References) -> Document {
        let mut document = Document::new(0..source.len());
        let root = document.root();
        build(
            &mut document,
            root,
            &run_of(source),
            OPTIONS,
            references,
            source.len(),
        );
        document
    }

    fn parse(source: &str) -> Document {
        parse_with(source, &References::new())
    }

    fn kinds(document: &Document) -> Vec<String> {
        document
            .descendants(document.root())
            .skip(1)
            .map(|id| {
                let kind = format!("{:?}", document.kind(id));
                kind.split([' ', '(', '{']).next().unwrap_or_default().to_owned()
            })
            .collect()
    }

    #[test]
    fn test_paragraph_with_emphasis() {
        let document = parse("Hello *world*\n");
        assert_eq!(kinds(&document), vec!["Paragraph", "Text", "Emphasis", "Text"]);
    }

    #[test]
    fn test_fenced_code_collects_literal() {
        let document = parse("```js app.js\nlet x = 1;\n```\n");
        let code = document.first_child(document.root()).unwrap();
        assert_eq!(
            document.kind(code),
            &NodeKind::FencedCode {
                info: "js app.js".to_owned(),
                literal: "let x = 1;\n".to_owned(),
            }
        );
        assert_eq!(document.first_child(code), None);
    }

    #[test]
    fn test_html_block_literal() {
        let document = parse("<div>\nraw\n</div>\n");
        let html = document.first_child(document.root()).unwrap();
        assert_eq!(
            document.kind(html),
            &NodeKind::HtmlBlock {
                literal: "<div>\nraw\n</div>\n".to_owned(),
            }
        );
    }

    #[test]
    fn test_heading_attributes() {
        let document = parse("# Title {#custom .wide}\n");
        let heading = document.first_child(document.root()).unwrap();
        assert_eq!(
            document.kind(heading),
            &NodeKind::Heading {
                level: 1,
                id: Some("custom".to_owned()),
                classes: vec!["wide".to_owned()],
            }
        );
    }

    #[test]
    fn test_spans_point_into_source() {
        let source = "para one\n\npara two\n";
        let document = parse(source);
        let second = document.last_child(document.root()).unwrap();
        let span = document.span(second).unwrap();
        assert!(source[span].starts_with("para two"));
    }

    #[test]
    fn test_table_structure() {
        let document = parse("| a | b |\n|---|:-:|\n| 1 | 2 |\n");
        assert_eq!(
            kinds(&document),
            vec![
                "Table",
                "TableHead",
                "TableCell",
                "Text",
                "TableCell",
                "Text",
                "TableRow",
                "TableCell",
                "Text",
                "TableCell",
                "Text",
            ]
        );
    }

    #[test]
    fn test_collect_references_normalizes_labels() {
        let mut references = References::new();
        collect_references(
            &run_of("[Lesson  One]: /one \"First\"\n[lesson one]: /ignored\n[two]: /two\n"),
            OPTIONS,
            &mut references,
        );
        collect_references(&run_of("[TWO]: /later\n"), OPTIONS, &mut references);
        assert_eq!(
            references.get("lesson one"),
            Some(&("/one".to_owned(), "First".to_owned()))
        );
        assert_eq!(
            references.get("two"),
            Some(&("/two".to_owned(), String::new()))
        );
        assert_eq!(references.len(), 2);
    }

    #[test]
    fn test_build_resolves_outside_references() {
        let mut references = References::new();
        references.insert("guide".to_owned(), ("/guide".to_owned(), "Guide".to_owned()));
        let document = parse_with("See [the Guide][GUIDE] and [missing].\n", &references);
        let links: Vec<_> = document
            .descendants(document.root())
            .filter_map(|id| match document.kind(id) {
                NodeKind::Link { url, title } => Some((url.clone(), title.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(links, vec![("/guide".to_owned(), "Guide".to_owned())]);
    }
}
