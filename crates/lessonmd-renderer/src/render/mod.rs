//! HTML rendering.
//!
//! [`HtmlRenderer`] walks a [`Document`] once. Every node kind is handled by
//! one arm of [`HtmlRenderer::node`], called when the node is entered and,
//! for nodes with children, again when it is left.

mod context;

use std::fmt::Write;

use pulldown_cmark::Alignment;

use crate::ast::{Document, NodeId, NodeKind, WalkStatus};
use crate::diagram::{DiagramRenderer, MermaidMode};
use crate::util::{escape_html, normalize_tab_name, push_escaped, slugify};
use context::RenderContext;

/// Result of rendering a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    /// Problems that did not stop rendering, such as failed diagram renders.
    pub warnings: Vec<String>,
}

/// Document to HTML renderer.
///
/// The renderer itself holds only configuration; every call to
/// [`render`](Self::render) starts from fresh state.
#[derive(Clone, Copy)]
pub struct HtmlRenderer<'r> {
    heading_ids: bool,
    mermaid_mode: MermaidMode,
    diagram_renderer: Option<&'r dyn DiagramRenderer>,
}

impl Default for HtmlRenderer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HtmlRenderer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlRenderer")
            .field("heading_ids", &self.heading_ids)
            .field("mermaid_mode", &self.mermaid_mode)
            .field("diagram_renderer", &self.diagram_renderer.is_some())
            .finish()
    }
}

impl<'r> HtmlRenderer<'r> {
    /// Create a renderer with automatic heading ids and client-side diagrams.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heading_ids: true,
            mermaid_mode: MermaidMode::Client,
            diagram_renderer: None,
        }
    }

    /// Enable or disable generated heading ids.
    ///
    /// Explicit `{#id}` attributes are always rendered.
    #[must_use]
    pub fn with_heading_ids(mut self, enabled: bool) -> Self {
        self.heading_ids = enabled;
        self
    }

    #[must_use]
    pub fn with_mermaid_mode(mut self, mode: MermaidMode) -> Self {
        self.mermaid_mode = mode;
        self
    }

    /// Set the renderer used for diagrams in [`MermaidMode::Server`].
    #[must_use]
    pub fn with_diagram_renderer(mut self, renderer: &'r dyn DiagramRenderer) -> Self {
        self.diagram_renderer = Some(renderer);
        self
    }

    /// Render `document` to HTML.
    pub fn render(&self, document: &Document) -> Rendered {
        let capacity = document.span(document.root()).map_or(0, |span| span.len() * 2);
        let mut context = RenderContext::new(capacity);

        document.walk(document.root(), |id, entering| {
            self.node(document, id, entering, &mut context)
        });

        let (html, warnings) = context.finish();
        Rendered { html, warnings }
    }

    #[allow(clippy::too_many_lines)]
    fn node(
        &self,
        document: &Document,
        id: NodeId,
        entering: bool,
        context: &mut RenderContext,
    ) -> WalkStatus {
        let kind = document.kind(id);
        if entering && kind.is_block() && follows_inline(document, id) {
            context.ensure_newline();
        }
        let out = &mut context.output;

        match kind {
            NodeKind::Document => {}

            NodeKind::Paragraph => {
                out.push_str(if entering { "<p>" } else { "</p>\n" });
            }
            NodeKind::Heading { level, id: explicit, classes } => {
                if entering {
                    let heading_id = match explicit {
                        Some(explicit) => {
                            context.reserve_heading_id(explicit);
                            Some(explicit.clone())
                        }
                        None if self.heading_ids => {
                            Some(context.unique_heading_id(&slugify(&document.plain_text(id))))
                        }
                        None => None,
                    };
                    let out = &mut context.output;
                    write!(out, "<h{level}").unwrap();
                    if let Some(heading_id) = heading_id {
                        write!(out, r#" id="{}""#, escape_html(&heading_id)).unwrap();
                    }
                    if !classes.is_empty() {
                        write!(out, r#" class="{}""#, escape_html(&classes.join(" "))).unwrap();
                    }
                    out.push('>');
                } else {
                    writeln!(out, "</h{level}>").unwrap();
                }
            }
            NodeKind::BlockQuote => {
                out.push_str(if entering {
                    "<blockquote>\n"
                } else {
                    "</blockquote>\n"
                });
            }
            NodeKind::List { start } => match (entering, start) {
                (true, None) => out.push_str("<ul>\n"),
                (true, Some(1)) => out.push_str("<ol>\n"),
                (true, Some(n)) => writeln!(out, r#"<ol start="{n}">"#).unwrap(),
                (false, None) => out.push_str("</ul>\n"),
                (false, Some(_)) => out.push_str("</ol>\n"),
            },
            NodeKind::Item => {
                if entering {
                    out.push_str("<li>");
                    if document
                        .first_child(id)
                        .is_some_and(|child| document.kind(child).is_block())
                    {
                        out.push('\n');
                    }
                } else {
                    out.push_str("</li>\n");
                }
            }
            NodeKind::TaskListMarker { checked } => {
                out.push_str(if *checked {
                    r#"<input checked="" disabled="" type="checkbox"> "#
                } else {
                    r#"<input disabled="" type="checkbox"> "#
                });
            }
            NodeKind::FencedCode { info, literal } => {
                let language = info.split_whitespace().next().unwrap_or_default();
                code_block(out, language, literal);
            }
            NodeKind::IndentedCode { literal } => code_block(out, "", literal),
            NodeKind::HtmlBlock { literal } => out.push_str(literal),
            NodeKind::ThematicBreak => out.push_str("<hr>\n"),

            NodeKind::Table { .. } => {
                if entering {
                    out.push_str("<table>\n");
                } else {
                    if document
                        .last_child(id)
                        .is_some_and(|child| matches!(document.kind(child), NodeKind::TableRow))
                    {
                        out.push_str("</tbody>\n");
                    }
                    out.push_str("</table>\n");
                }
            }
            NodeKind::TableHead => {
                out.push_str(if entering {
                    "<thead>\n<tr>\n"
                } else {
                    "</tr>\n</thead>\n"
                });
            }
            NodeKind::TableRow => {
                if entering {
                    let first_row = document
                        .prev_sibling(id)
                        .is_none_or(|prev| matches!(document.kind(prev), NodeKind::TableHead));
                    if first_row {
                        out.push_str("<tbody>\n");
                    }
                    out.push_str("<tr>\n");
                } else {
                    out.push_str("</tr>\n");
                }
            }
            NodeKind::TableCell => {
                let in_head = document
                    .parent(id)
                    .is_some_and(|parent| matches!(document.kind(parent), NodeKind::TableHead));
                let tag = if in_head { "th" } else { "td" };
                if entering {
                    match cell_alignment(document, id) {
                        Some(align) => write!(out, r#"<{tag} style="text-align:{align}">"#),
                        None => write!(out, "<{tag}>"),
                    }
                    .unwrap();
                } else {
                    writeln!(out, "</{tag}>").unwrap();
                }
            }

            NodeKind::Text(text) => push_escaped(out, text),
            NodeKind::Code(code) => {
                out.push_str("<code>");
                push_escaped(out, code);
                out.push_str("</code>");
            }
            NodeKind::InlineHtml(html) => out.push_str(html),
            NodeKind::SoftBreak => out.push('\n'),
            NodeKind::HardBreak => out.push_str("<br>\n"),
            NodeKind::Emphasis => out.push_str(if entering { "<em>" } else { "</em>" }),
            NodeKind::Strong => out.push_str(if entering { "<strong>" } else { "</strong>" }),
            NodeKind::Strikethrough => out.push_str(if entering { "<del>" } else { "</del>" }),
            NodeKind::Link { url, title } => {
                if entering {
                    write!(out, r#"<a href="{}""#, escape_html(url)).unwrap();
                    if !title.is_empty() {
                        write!(out, r#" title="{}""#, escape_html(title)).unwrap();
                    }
                    out.push('>');
                } else {
                    out.push_str("</a>");
                }
            }
            NodeKind::Image { url, title } => {
                if entering {
                    write!(
                        out,
                        r#"<img src="{}" alt="{}""#,
                        escape_html(url),
                        escape_html(&document.plain_text(id))
                    )
                    .unwrap();
                    if !title.is_empty() {
                        write!(out, r#" title="{}""#, escape_html(title)).unwrap();
                    }
                    out.push('>');
                    return WalkStatus::SkipChildren;
                }
            }

            NodeKind::Admonition { kind, title } => {
                if entering {
                    write!(
                        out,
                        "<div class=\"notice {}\">\n  <div class=\"notice-heading\">{}</div>\n  <div class=\"notice-body\">\n",
                        kind.as_str(),
                        escape_html(title)
                    )
                    .unwrap();
                } else {
                    out.push_str("  </div>\n</div>\n");
                }
            }
            NodeKind::Details { title, open } => {
                if entering {
                    let open = if *open { " open" } else { "" };
                    write!(
                        out,
                        "<details{open}><summary>{}</summary>\n<div class=\"details-content\">\n",
                        escape_html(title)
                    )
                    .unwrap();
                } else {
                    out.push_str("</div>\n</details>\n");
                }
            }
            NodeKind::TabGroup => {
                if entering {
                    let group = context.open_tab_group();
                    tab_group_start(&mut context.output, document, id, group);
                } else {
                    tab_group_end(out);
                    context.close_tab_group();
                }
            }
            NodeKind::Tab { title } => self.tab(document, id, title, entering, context),
            NodeKind::CommandBlock { literal } => {
                out.push_str(r#"<pre><code class="language-bash command">"#);
                push_escaped(out, literal);
                out.push_str("</code></pre>\n");
            }
            NodeKind::OutputBlock { literal } => {
                out.push_str("<div class=\"output\">\n<p>Output</p>\n<pre><code>");
                push_escaped(out, literal);
                out.push_str("</code></pre>\n</div>");
            }
            NodeKind::LabeledCodeBlock {
                language,
                filename,
                literal,
            } => {
                if let Some(filename) = filename {
                    writeln!(out, "<p>{}</p>", escape_html(filename)).unwrap();
                }
                code_block(out, language, literal);
            }
            NodeKind::Diagram { literal } => self.diagram(literal, context),
            NodeKind::InlineHighlight => {
                out.push_str(if entering {
                    r#"<mark class="inline-highlight">"#
                } else {
                    "</mark>"
                });
            }
            NodeKind::MetadataTable { entries } => metadata_table(out, entries),
        }

        WalkStatus::Continue
    }

    /// Tabs outside a [`NodeKind::TabGroup`] open and close their group
    /// themselves, so documents that skipped grouping render identically.
    fn tab(
        &self,
        document: &Document,
        id: NodeId,
        title: &str,
        entering: bool,
        context: &mut RenderContext,
    ) {
        let grouped = document
            .parent(id)
            .is_some_and(|parent| matches!(document.kind(parent), NodeKind::TabGroup));

        if entering {
            if !grouped && !is_tab(document, document.prev_sibling(id)) {
                let group = context.open_tab_group();
                tab_group_start_run(&mut context.output, document, id, group);
            }
            let group = context.current_tab_group();
            let index = tab_index(document, id);
            let active = if index == 1 { " active" } else { "" };
            write!(
                context.output,
                "    <div class=\"tab-panel{active}\" role=\"tabpanel\" aria-labelledby=\"tab-{group}-{index}\" id=\"tab-panel-{group}-{index}\" data-tab-name=\"{}\">\n",
                normalize_tab_name(title)
            )
            .unwrap();
        } else {
            context.output.push_str("    </div>\n");
            if !grouped && !is_tab(document, document.next_sibling(id)) {
                tab_group_end(&mut context.output);
                context.close_tab_group();
            }
        }
    }

    fn diagram(&self, source: &str, context: &mut RenderContext) {
        if self.mermaid_mode == MermaidMode::Server {
            let result = match self.diagram_renderer {
                Some(renderer) => renderer.render(source).map_err(|e| e.to_string()),
                None => Err("no diagram renderer configured".to_owned()),
            };
            match result {
                Ok(svg) => {
                    write!(context.output, r#"<div class="mermaid">{svg}</div>"#).unwrap();
                    return;
                }
                Err(error) => {
                    tracing::warn!(%error, "diagram rendering failed, falling back to client-side markup");
                    context.warn(format!("diagram rendering failed: {error}"));
                }
            }
        }
        context.output.push_str(r#"<div class="mermaid">"#);
        push_escaped(&mut context.output, source);
        context.output.push_str("</div>");
    }
}

/// Whether the previous sibling is inline content, as in tight list items.
fn follows_inline(document: &Document, id: NodeId) -> bool {
    document
        .prev_sibling(id)
        .is_some_and(|prev| !document.kind(prev).is_block())
}

fn is_tab(document: &Document, id: Option<NodeId>) -> bool {
    id.is_some_and(|id| matches!(document.kind(id), NodeKind::Tab { .. }))
}

/// 1-based position of a tab among the consecutive tabs before it.
fn tab_index(document: &Document, id: NodeId) -> usize {
    let mut index = 1;
    let mut prev = document.prev_sibling(id);
    while is_tab(document, prev) {
        index += 1;
        prev = prev.and_then(|p| document.prev_sibling(p));
    }
    index
}

fn code_block(out: &mut String, language: &str, literal: &str) {
    if language.is_empty() {
        out.push_str("<pre><code>");
    } else {
        write!(out, r#"<pre><code class="language-{}">"#, escape_html(language)).unwrap();
    }
    push_escaped(out, literal);
    out.push_str("</code></pre>\n");
}

fn cell_alignment(document: &Document, cell: NodeId) -> Option<&'static str> {
    let row = document.parent(cell)?;
    let table = document.parent(row)?;
    let NodeKind::Table { alignments } = document.kind(table) else {
        return None;
    };
    let column = document.children(row).position(|child| child == cell)?;
    match alignments.get(column)? {
        Alignment::None => None,
        Alignment::Left => Some("left"),
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
    }
}

fn tab_group_start(out: &mut String, document: &Document, group_node: NodeId, group: usize) {
    tab_group_header(out, group, document.children(group_node), document);
}

/// Header for an ungrouped run of tabs starting at `first`.
fn tab_group_start_run(out: &mut String, document: &Document, first: NodeId, group: usize) {
    let run = std::iter::successors(Some(first), |&id| document.next_sibling(id))
        .take_while(|&id| is_tab(document, Some(id)));
    tab_group_header(out, group, run, document);
}

fn tab_group_header(
    out: &mut String,
    group: usize,
    tabs: impl Iterator<Item = NodeId>,
    document: &Document,
) {
    write!(
        out,
        "<div class=\"tabs\" id=\"tabs-{group}\">\n  <div class=\"tabs-nav\" role=\"tablist\">\n"
    )
    .unwrap();

    let titles = tabs.filter_map(|id| match document.kind(id) {
        NodeKind::Tab { title } => Some(title),
        _ => None,
    });
    for (position, title) in titles.enumerate() {
        let index = position + 1;
        let (active, selected) = if index == 1 {
            (" active", "true")
        } else {
            ("", "false")
        };
        writeln!(
            out,
            "    <button class=\"tab-button{active}\" role=\"tab\" aria-selected=\"{selected}\" aria-controls=\"tab-panel-{group}-{index}\" id=\"tab-{group}-{index}\" data-tab-name=\"{}\">{}</button>",
            normalize_tab_name(title),
            escape_html(title)
        )
        .unwrap();
    }

    out.push_str("  </div>\n  <div class=\"tab-panels\">\n");
}

fn tab_group_end(out: &mut String) {
    out.push_str("  </div>\n</div>\n");
}

fn metadata_table(out: &mut String, entries: &[(String, String)]) {
    out.push_str("<table>\n<thead>\n<tr>\n");
    for (key, _) in entries {
        writeln!(out, "<th>{}</th>", escape_html(key)).unwrap();
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n<tr>\n");
    for (_, value) in entries {
        writeln!(out, "<td>{}</td>", escape_html(value)).unwrap();
    }
    out.push_str("</tr>\n</tbody>\n</table>\n");
}
