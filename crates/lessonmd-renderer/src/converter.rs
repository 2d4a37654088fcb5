//! End-to-end conversion: bytes in, HTML fragment out.

use crate::assets;
use crate::ast::NodeKind;
use crate::diagram::{DiagramRenderer, MermaidMode};
use crate::error::ConvertError;
use crate::front_matter;
use crate::pipeline::Pipeline;
use crate::render::HtmlRenderer;
use crate::util::escape_html;

/// Options controlling the final HTML fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Wrap the output in `<div class="{wrapper_class}">`.
    pub wrap: bool,
    /// Class of the wrapper element, also used to scope the stylesheet and
    /// the highlight script.
    pub wrapper_class: String,
    /// Prepend the stylesheet in a `<style>` element.
    pub include_stylesheet: bool,
    pub include_highlight_js: bool,
    pub include_mermaid_js: bool,
    pub include_tabs_js: bool,
    pub mermaid_mode: MermaidMode,
    /// Render front matter as a table instead of dropping it.
    pub include_front_matter: bool,
    /// Generate ids for headings without an explicit `{#id}`.
    pub heading_ids: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            wrap: true,
            wrapper_class: "item".to_owned(),
            include_stylesheet: false,
            include_highlight_js: false,
            include_mermaid_js: false,
            include_tabs_js: false,
            mermaid_mode: MermaidMode::Client,
            include_front_matter: false,
            heading_ids: true,
        }
    }
}

/// Output of a conversion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversion {
    pub html: String,
    /// Non-fatal problems: unterminated blocks, bad front matter, diagram
    /// rendering failures.
    pub warnings: Vec<String>,
}

/// Converts lesson markdown to HTML.
///
/// A converter is immutable once built and can be shared between threads;
/// every call works on its own document and render state.
///
/// ```
/// use lessonmd_renderer::{ConvertOptions, Converter};
///
/// let converter = Converter::new(ConvertOptions {
///     wrap: false,
///     ..ConvertOptions::default()
/// });
/// let html = converter.convert(b":::note Title\nBody\n:::\n").unwrap();
/// assert!(html.starts_with(r#"<div class="notice note">"#));
/// assert!(html.contains("<p>Body</p>"));
/// ```
pub struct Converter {
    pipeline: Pipeline,
    options: ConvertOptions,
    diagram_renderer: Option<Box<dyn DiagramRenderer>>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("pipeline", &self.pipeline)
            .field("options", &self.options)
            .field("diagram_renderer", &self.diagram_renderer.is_some())
            .finish()
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl Converter {
    /// Create a converter with every lesson extension enabled.
    #[must_use]
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            pipeline: Pipeline::lesson(),
            options,
            diagram_renderer: None,
        }
    }

    /// Replace the extension pipeline.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Set the renderer used when `mermaid_mode` is [`MermaidMode::Server`].
    #[must_use]
    pub fn with_diagram_renderer<R: DiagramRenderer + 'static>(mut self, renderer: R) -> Self {
        self.diagram_renderer = Some(Box::new(renderer));
        self
    }

    #[must_use]
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert `input` and return the HTML fragment.
    pub fn convert(&self, input: &[u8]) -> Result<String, ConvertError> {
        self.run(input).map(|conversion| conversion.html)
    }

    /// Convert `input`, returning the HTML together with any warnings.
    pub fn run(&self, input: &[u8]) -> Result<Conversion, ConvertError> {
        let source = std::str::from_utf8(input)?;
        let mut warnings = Vec::new();

        let front_matter = front_matter::split(source);
        let body = front_matter
            .as_ref()
            .map_or(0..source.len(), |found| found.body.clone());

        let mut parsed = self.pipeline.parse_range(source, body.clone());
        warnings.append(&mut parsed.warnings);
        let document = &mut parsed.document;

        if self.options.include_front_matter
            && let Some(found) = &front_matter
        {
            match front_matter::entries(found.yaml) {
                Ok(entries) if !entries.is_empty() => {
                    let root = document.root();
                    document.prepend_child(root, NodeKind::MetadataTable { entries }, Some(0..body.start));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring front matter");
                    warnings.push(format!("ignoring front matter: {e}"));
                }
            }
        }

        self.pipeline.transform(document);

        let mut renderer = HtmlRenderer::new()
            .with_heading_ids(self.options.heading_ids)
            .with_mermaid_mode(self.options.mermaid_mode);
        if let Some(diagram_renderer) = &self.diagram_renderer {
            renderer = renderer.with_diagram_renderer(diagram_renderer.as_ref());
        }
        let mut rendered = renderer.render(document);
        warnings.append(&mut rendered.warnings);

        Ok(Conversion {
            html: self.assemble(rendered.html),
            warnings,
        })
    }

    /// Add stylesheet, wrapper and scripts around the rendered body.
    fn assemble(&self, body: String) -> String {
        let options = &self.options;
        let class = options.wrapper_class.as_str();
        let mut html = body;

        if options.include_stylesheet {
            html = format!("{}{html}\n", assets::style_tag(&assets::stylesheet(class)));
        }
        if options.wrap {
            html = format!("<div class=\"{}\">\n{html}\n</div>", escape_html(class));
        }
        if options.include_highlight_js {
            html.push_str(&assets::script_tag(&assets::highlight_js(class)));
        }
        if options.include_mermaid_js {
            html.push_str(&assets::script_tag(assets::mermaid_js()));
        }
        if options.include_tabs_js {
            html.push_str(&assets::script_tag(assets::tabs_js()));
        }
        html
    }
}
