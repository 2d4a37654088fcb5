//! Parse and transform stages.

use std::ops::Range;

use pulldown_cmark::Options;

use crate::ast::Document;
use crate::block::{
    AdmonitionRecognizer, BlockRecognizer, BlockScanner, DetailsRecognizer, Parsed, TabRecognizer,
};
use crate::inline::{self, DelimiterProcessor, HighlightDelimiter};
use crate::transform::{
    CommandBlocks, DiagramBlocks, LabeledCodeBlocks, OutputBlocks, PRIORITY_LABELED_CODE,
    PRIORITY_RESERVED_FENCES, PRIORITY_TAB_GROUPING, TabGrouping, Transformer,
};

struct Registered {
    priority: u32,
    transformer: Box<dyn Transformer>,
}

/// The set of extensions applied to a document.
///
/// Block recognizers are tried in registration order. Transformers run in
/// ascending priority; equal priorities keep registration order.
///
/// ```
/// use lessonmd_renderer::{HtmlRenderer, Pipeline};
///
/// let pipeline = Pipeline::lesson();
/// let mut parsed = pipeline.parse(":::tip Try it\n```command\nls\n```\n:::\n");
/// pipeline.transform(&mut parsed.document);
///
/// let html = HtmlRenderer::new().render(&parsed.document).html;
/// assert!(html.contains(r#"<code class="language-bash command">ls"#));
/// ```
pub struct Pipeline {
    recognizers: Vec<Box<dyn BlockRecognizer>>,
    delimiters: Vec<Box<dyn DelimiterProcessor>>,
    transformers: Vec<Registered>,
    gfm: bool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::lesson()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "recognizers",
                &self.recognizers.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field("delimiters", &self.delimiters.len())
            .field(
                "transformers",
                &self
                    .transformers
                    .iter()
                    .map(|t| (t.priority, t.transformer.name()))
                    .collect::<Vec<_>>(),
            )
            .field("gfm", &self.gfm)
            .finish()
    }
}

impl Pipeline {
    /// Plain GitHub Flavored Markdown without lesson extensions.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            recognizers: Vec::new(),
            delimiters: Vec::new(),
            transformers: Vec::new(),
            gfm: true,
        }
    }

    /// Markdown with every lesson extension registered.
    #[must_use]
    pub fn lesson() -> Self {
        Self::standard()
            .with_recognizer(AdmonitionRecognizer)
            .with_recognizer(DetailsRecognizer)
            .with_recognizer(TabRecognizer)
            .with_delimiter(HighlightDelimiter)
            .with_transformer(CommandBlocks, PRIORITY_RESERVED_FENCES)
            .with_transformer(OutputBlocks, PRIORITY_RESERVED_FENCES)
            .with_transformer(DiagramBlocks, PRIORITY_RESERVED_FENCES)
            .with_transformer(LabeledCodeBlocks, PRIORITY_LABELED_CODE)
            .with_transformer(TabGrouping, PRIORITY_TAB_GROUPING)
    }

    /// Add a block recognizer after the existing ones.
    #[must_use]
    pub fn with_recognizer<R: BlockRecognizer + 'static>(mut self, recognizer: R) -> Self {
        self.recognizers.push(Box::new(recognizer));
        self
    }

    /// Add an inline delimiter processor.
    #[must_use]
    pub fn with_delimiter<D: DelimiterProcessor + 'static>(mut self, processor: D) -> Self {
        self.delimiters.push(Box::new(processor));
        self
    }

    /// Add a transformer at `priority` (lower runs first).
    #[must_use]
    pub fn with_transformer<T: Transformer + 'static>(mut self, transformer: T, priority: u32) -> Self {
        let position = self
            .transformers
            .partition_point(|registered| registered.priority <= priority);
        self.transformers.insert(
            position,
            Registered {
                priority,
                transformer: Box::new(transformer),
            },
        );
        self
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    ///
    /// GitHub blockquote alerts (`> [!NOTE]`) are not among them; the marker
    /// stays literal text inside an ordinary blockquote.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// pulldown-cmark options for standard markdown runs.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let options = Options::ENABLE_HEADING_ATTRIBUTES;
        if self.gfm {
            options
                | Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
        } else {
            options
        }
    }

    /// Parse a whole document: block structure, then inline delimiters.
    #[must_use]
    pub fn parse(&self, source: &str) -> Parsed {
        self.parse_range(source, 0..source.len())
    }

    /// Parse only `source[body]`, keeping spans relative to all of `source`.
    #[must_use]
    pub fn parse_range(&self, source: &str, body: Range<usize>) -> Parsed {
        let mut parsed = BlockScanner::new(&self.recognizers, self.parser_options()).scan(source, body);
        inline::process_document(&mut parsed.document, &self.delimiters);
        parsed
    }

    /// Run every registered transformer in priority order.
    ///
    /// Returns the total number of rewritten nodes.
    pub fn transform(&self, document: &mut Document) -> usize {
        let mut total = 0;
        for registered in &self.transformers {
            let changed = registered.transformer.transform(document);
            if changed > 0 {
                tracing::debug!(
                    transformer = registered.transformer.name(),
                    changed,
                    "applied transformer"
                );
            }
            total += changed;
        }
        total
    }
}
