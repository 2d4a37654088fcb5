//! Extended markdown to HTML for technical lessons.
//!
//! Documents are CommonMark with GitHub extensions plus a handful of lesson
//! constructs:
//! - `:::note Title` ... `:::` admonitions
//! - `[details Title` ... `]` collapsible sections
//! - `=== "Title"` tabs, grouped when adjacent
//! - `==highlighted==` text
//! - `command`, `output` and `mermaid` fences, and fences labeled with a
//!   filename (`` ```js app.js ``)
//!
//! # Architecture
//!
//! Conversion runs in fixed stages over an owned [`Document`] tree:
//! 1. Front matter is split off the source.
//! 2. [`BlockRecognizer`]s carve out custom containers; everything between
//!    them is parsed by pulldown-cmark.
//! 3. [`DelimiterProcessor`]s turn inline delimiter runs into nodes.
//! 4. [`Transformer`]s rewrite the tree in priority order.
//! 5. [`HtmlRenderer`] writes HTML.
//!
//! [`Pipeline`] owns the extension registry; [`Converter`] drives the whole
//! process and adds the wrapper, stylesheet and scripts.
//!
//! # Example
//!
//! ```
//! use lessonmd_renderer::{ConvertOptions, Converter};
//!
//! let converter = Converter::new(ConvertOptions::default());
//! let html = converter.convert(b"Run ==this==:\n\n```command\nls\n```\n").unwrap();
//!
//! assert!(html.starts_with(r#"<div class="item">"#));
//! assert!(html.contains(r#"<mark class="inline-highlight">this</mark>"#));
//! assert!(html.contains(r#"<code class="language-bash command">ls"#));
//! ```

pub mod assets;
mod ast;
mod block;
mod converter;
mod diagram;
mod error;
pub mod front_matter;
mod inline;
mod pipeline;
mod render;
mod transform;
mod util;

pub use ast::{AdmonitionKind, Children, Descendants, Document, NodeId, NodeKind, WalkStatus};
pub use block::{
    AdmonitionRecognizer, BlockRecognizer, Continuation, DetailsRecognizer, LineContext, Parsed,
    TabRecognizer,
};
pub use converter::{Conversion, ConvertOptions, Converter};
pub use diagram::{DiagramError, DiagramRenderer, MermaidMode};
pub use error::ConvertError;
pub use inline::{Delimiter, DelimiterProcessor, HighlightDelimiter};
pub use pipeline::Pipeline;
pub use render::{HtmlRenderer, Rendered};
pub use transform::{
    CommandBlocks, DiagramBlocks, LabeledCodeBlocks, OutputBlocks, PRIORITY_LABELED_CODE,
    PRIORITY_RESERVED_FENCES, PRIORITY_TAB_GROUPING, TabGrouping, Transformer,
};
pub use util::{escape_html, normalize_tab_name, slugify};
