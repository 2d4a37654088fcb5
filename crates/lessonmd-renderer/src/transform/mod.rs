//! Whole-tree passes that run after parsing and before rendering.
//!
//! Each transformer walks the finished document, collects the nodes it wants
//! to rewrite and only then replaces them, so the tree is never mutated while
//! it is being traversed.

mod fences;
mod tabs;

pub use fences::{CommandBlocks, DiagramBlocks, LabeledCodeBlocks, OutputBlocks};
pub use tabs::TabGrouping;

use crate::ast::Document;

/// Priority of the reserved-language fence passes.
pub const PRIORITY_RESERVED_FENCES: u32 = 100;
/// Priority of the catch-all labeled code pass.
pub const PRIORITY_LABELED_CODE: u32 = 200;
/// Priority of tab grouping.
pub const PRIORITY_TAB_GROUPING: u32 = 300;

/// A tree rewrite applied once per conversion.
///
/// Transformers are registered on a [`Pipeline`](crate::Pipeline) with a
/// priority; lower priorities run first and ties keep registration order.
///
/// # Example
///
/// ```
/// use lessonmd_renderer::{Document, NodeKind, Pipeline, Transformer};
///
/// /// Drops every thematic break.
/// struct NoRules;
///
/// impl Transformer for NoRules {
///     fn name(&self) -> &'static str {
///         "no-rules"
///     }
///
///     fn transform(&self, document: &mut Document) -> usize {
///         let rules: Vec<_> = document
///             .descendants(document.root())
///             .filter(|&id| matches!(document.kind(id), NodeKind::ThematicBreak))
///             .collect();
///         for &id in &rules {
///             document.detach(id);
///         }
///         rules.len()
///     }
/// }
///
/// let pipeline = Pipeline::lesson().with_transformer(NoRules, 50);
/// let mut parsed = pipeline.parse("a\n\n---\n\nb\n");
/// pipeline.transform(&mut parsed.document);
/// ```
pub trait Transformer: Send + Sync {
    /// Name used in log messages.
    fn name(&self) -> &'static str;

    /// Rewrite `document` in place and return the number of nodes changed.
    ///
    /// A transformer that finds nothing to do must leave the tree untouched.
    fn transform(&self, document: &mut Document) -> usize;
}
