//! Arena-backed document tree.
//!
//! Every node lives in a single `Vec` owned by [`Document`] and is addressed by
//! a [`NodeId`]. Structural edits (insert, detach, replace, wrap) only rewrite
//! sibling and parent links, so replacing a node keeps its position in O(1).
//! Detached nodes stay in the arena but are unreachable from the root.

use std::ops::Range;

use pulldown_cmark::Alignment;

/// Index of a node inside a [`Document`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Semantic type of an admonition callout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmonitionKind {
    Note,
    Tip,
    Info,
    Caution,
    Warning,
}

impl AdmonitionKind {
    /// Parse an admonition keyword (`note`, `tip`, `info`, `caution`, `warning`).
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "note" => Some(Self::Note),
            "tip" => Some(Self::Tip),
            "info" => Some(Self::Info),
            "caution" => Some(Self::Caution),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }

    /// CSS modifier class for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Info => "info",
            Self::Caution => "caution",
            Self::Warning => "warning",
        }
    }
}

/// Kind tag plus kind-specific attributes of a node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Document,

    // Standard blocks
    Paragraph,
    Heading {
        level: u8,
        /// Explicit `{#id}` attribute.
        id: Option<String>,
        classes: Vec<String>,
    },
    BlockQuote,
    List {
        start: Option<u64>,
    },
    Item,
    TaskListMarker {
        checked: bool,
    },
    FencedCode {
        info: String,
        literal: String,
    },
    IndentedCode {
        literal: String,
    },
    HtmlBlock {
        literal: String,
    },
    ThematicBreak,
    Table {
        alignments: Vec<Alignment>,
    },
    TableHead,
    TableRow,
    TableCell,

    // Standard inlines
    Text(String),
    Code(String),
    InlineHtml(String),
    SoftBreak,
    HardBreak,
    Emphasis,
    Strong,
    Strikethrough,
    Link {
        url: String,
        title: String,
    },
    Image {
        url: String,
        title: String,
    },

    // Lesson extensions
    Admonition {
        kind: AdmonitionKind,
        title: String,
    },
    Details {
        title: String,
        open: bool,
    },
    Tab {
        title: String,
    },
    TabGroup,
    CommandBlock {
        literal: String,
    },
    OutputBlock {
        literal: String,
    },
    LabeledCodeBlock {
        language: String,
        filename: Option<String>,
        literal: String,
    },
    Diagram {
        literal: String,
    },
    InlineHighlight,
    /// Leading front matter rendered as a two-row table.
    MetadataTable {
        entries: Vec<(String, String)>,
    },
}

impl NodeKind {
    /// Whether nodes of this kind own children.
    ///
    /// Leaf kinds carry their whole content as attributes and receive a
    /// single visit during [`Document::walk`].
    #[must_use]
    pub fn accepts_children(&self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::Paragraph
                | Self::Heading { .. }
                | Self::BlockQuote
                | Self::List { .. }
                | Self::Item
                | Self::Table { .. }
                | Self::TableHead
                | Self::TableRow
                | Self::TableCell
                | Self::Emphasis
                | Self::Strong
                | Self::Strikethrough
                | Self::Link { .. }
                | Self::Image { .. }
                | Self::Admonition { .. }
                | Self::Details { .. }
                | Self::Tab { .. }
                | Self::TabGroup
                | Self::InlineHighlight
        )
    }

    /// Whether this kind is rendered as a block (starts on its own line).
    #[must_use]
    pub fn is_block(&self) -> bool {
        !matches!(
            self,
            Self::Text(_)
                | Self::Code(_)
                | Self::InlineHtml(_)
                | Self::SoftBreak
                | Self::HardBreak
                | Self::Emphasis
                | Self::Strong
                | Self::Strikethrough
                | Self::Link { .. }
                | Self::Image { .. }
                | Self::InlineHighlight
                | Self::TaskListMarker { .. }
        )
    }
}

/// Visitor decision returned from [`Document::walk`] callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkStatus {
    Continue,
    /// Do not descend into the children of the node just entered.
    SkipChildren,
    Stop,
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    span: Option<Range<usize>>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/// A parsed document: the root node and everything reachable from it.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create a document whose root covers `span` of the source.
    #[must_use]
    pub fn new(span: Range<usize>) -> Self {
        let mut document = Self {
            nodes: Vec::with_capacity(64),
            root: NodeId(0),
        };
        document.root = document.alloc(NodeKind::Document, Some(span));
        document
    }

    fn alloc(&mut self, kind: NodeKind, span: Option<Range<usize>>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
            first_child: None,
            last_child: None,
            prev: None,
            next: None,
        });
        id
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes allocated in the arena, including detached ones.
    #[must_use]
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Mutable access to the attributes of a node.
    ///
    /// Callers update attributes in place; changing the variant is done
    /// with [`Document::replace`] instead.
    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    /// Source byte range of a node, if known.
    #[must_use]
    pub fn span(&self, id: NodeId) -> Option<Range<usize>> {
        self.nodes[id.0].span.clone()
    }

    pub(crate) fn set_span(&mut self, id: NodeId, span: Option<Range<usize>>) {
        self.nodes[id.0].span = span;
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].first_child
    }

    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].last_child
    }

    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next
    }

    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].prev
    }

    /// Iterate over the direct children of a node in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            document: self,
            next: self.first_child(id),
        }
    }

    /// Iterate over a node and all of its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            document: self,
            root: id,
            next: Some(id),
        }
    }

    /// Create a node and append it as the last child of `parent`.
    pub fn append_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        span: Option<Range<usize>>,
    ) -> NodeId {
        let id = self.alloc(kind, span);
        self.attach_last(parent, id);
        id
    }

    /// Create a node and insert it as the first child of `parent`.
    pub fn prepend_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        span: Option<Range<usize>>,
    ) -> NodeId {
        match self.first_child(parent) {
            Some(first) => self.insert_before(first, kind, span),
            None => self.append_child(parent, kind, span),
        }
    }

    /// Create a node and insert it directly before `sibling`.
    pub fn insert_before(
        &mut self,
        sibling: NodeId,
        kind: NodeKind,
        span: Option<Range<usize>>,
    ) -> NodeId {
        let id = self.alloc(kind, span);
        self.attach_before(sibling, id);
        id
    }

    /// Create a node and insert it directly after `sibling`.
    pub fn insert_after(
        &mut self,
        sibling: NodeId,
        kind: NodeKind,
        span: Option<Range<usize>>,
    ) -> NodeId {
        let id = self.alloc(kind, span);
        match self.next_sibling(sibling) {
            Some(next) => self.attach_before(next, id),
            None => {
                if let Some(parent) = self.parent(sibling) {
                    self.attach_last(parent, id);
                }
            }
        }
        id
    }

    /// Unlink a node (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        let node = &self.nodes[id.0];
        let (parent, prev, next) = (node.parent, node.prev, node.next);

        match prev {
            Some(prev) => self.nodes[prev.0].next = next,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.0].first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.nodes[next.0].prev = prev,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.0].last_child = prev;
                }
            }
        }

        let node = &mut self.nodes[id.0];
        node.parent = None;
        node.prev = None;
        node.next = None;
    }

    /// Move an existing node to the end of `parent`'s children.
    pub fn reparent(&mut self, id: NodeId, parent: NodeId) {
        self.detach(id);
        self.attach_last(parent, id);
    }

    /// Replace a node with a new node of `kind` at the same position.
    ///
    /// The replacement inherits the span and the children of the old node.
    /// The old node is left detached in the arena.
    pub fn replace(&mut self, id: NodeId, kind: NodeKind) -> NodeId {
        let span = self.span(id);
        let replacement = self.insert_before(id, kind, span);

        let mut child = self.first_child(id);
        while let Some(current) = child {
            child = self.next_sibling(current);
            self.reparent(current, replacement);
        }

        self.detach(id);
        replacement
    }

    /// Move the sibling run `first..=last` under a new container of `kind`
    /// placed where `first` was.
    ///
    /// The container's span covers the run when both ends have spans.
    pub fn wrap(&mut self, first: NodeId, last: NodeId, kind: NodeKind) -> NodeId {
        let span = match (self.span(first), self.span(last)) {
            (Some(start), Some(end)) => Some(start.start..end.end),
            _ => None,
        };
        let container = self.insert_before(first, kind, span);

        let mut current = Some(first);
        while let Some(id) = current {
            current = if id == last {
                None
            } else {
                self.next_sibling(id)
            };
            self.reparent(id, container);
        }
        container
    }

    fn attach_last(&mut self, parent: NodeId, id: NodeId) {
        let previous_last = self.nodes[parent.0].last_child;
        {
            let node = &mut self.nodes[id.0];
            node.parent = Some(parent);
            node.prev = previous_last;
            node.next = None;
        }
        match previous_last {
            Some(last) => self.nodes[last.0].next = Some(id),
            None => self.nodes[parent.0].first_child = Some(id),
        }
        self.nodes[parent.0].last_child = Some(id);
    }

    fn attach_before(&mut self, sibling: NodeId, id: NodeId) {
        let parent = self.nodes[sibling.0].parent;
        let prev = self.nodes[sibling.0].prev;
        {
            let node = &mut self.nodes[id.0];
            node.parent = parent;
            node.prev = prev;
            node.next = Some(sibling);
        }
        self.nodes[sibling.0].prev = Some(id);
        match prev {
            Some(prev) => self.nodes[prev.0].next = Some(id),
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.0].first_child = Some(id);
                }
            }
        }
    }

    /// Depth-first walk starting at `start`.
    ///
    /// Nodes that accept children are visited twice (`entering` true, then
    /// false after their children); leaf nodes are visited once on entry.
    /// The walk is iterative, so deeply nested documents cannot overflow the
    /// stack.
    pub fn walk<F>(&self, start: NodeId, mut visit: F)
    where
        F: FnMut(NodeId, bool) -> WalkStatus,
    {
        enum Step {
            Enter(NodeId),
            Leave(NodeId),
        }

        let mut stack = vec![Step::Enter(start)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(id) => {
                    let status = visit(id, true);
                    if status == WalkStatus::Stop {
                        return;
                    }
                    if !self.kind(id).accepts_children() {
                        continue;
                    }
                    stack.push(Step::Leave(id));
                    if status == WalkStatus::Continue {
                        let mut child = self.last_child(id);
                        while let Some(current) = child {
                            stack.push(Step::Enter(current));
                            child = self.prev_sibling(current);
                        }
                    }
                }
                Step::Leave(id) => {
                    if visit(id, false) == WalkStatus::Stop {
                        return;
                    }
                }
            }
        }
    }

    /// Concatenated text content of a subtree, without markup.
    #[must_use]
    pub fn plain_text(&self, id: NodeId) -> String {
        let mut text = String::new();
        for node in self.descendants(id) {
            match self.kind(node) {
                NodeKind::Text(value) | NodeKind::Code(value) => text.push_str(value),
                NodeKind::SoftBreak | NodeKind::HardBreak => text.push(' '),
                _ => {}
            }
        }
        text
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    document: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.document.next_sibling(current);
        Some(current)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    document: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        let document = self.document;

        self.next = document.first_child(current).or_else(|| {
            let mut node = current;
            loop {
                if node == self.root {
                    return None;
                }
                if let Some(next) = document.next_sibling(node) {
                    return Some(next);
                }
                node = document.parent(node)?;
            }
        });

        Some(current)
    }
}
