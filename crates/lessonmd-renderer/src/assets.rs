//! Static stylesheet and client scripts shipped with the converter.
//!
//! The files live in the crate's `assets/` directory and are compiled in.
//! The stylesheet and the highlight script are scoped to the wrapper class;
//! they are written against `.item` and rescoped on request.

const STYLESHEET: &str = include_str!("../assets/lessonmd.css");
const HIGHLIGHT_JS: &str = include_str!("../assets/highlight.js");
const MERMAID_JS: &str = include_str!("../assets/mermaid.js");
const TABS_JS: &str = include_str!("../assets/tabs.js");

const DEFAULT_SCOPE: &str = ".item";

fn rescope(source: &str, class: &str) -> String {
    if class == &DEFAULT_SCOPE[1..] {
        return source.to_owned();
    }
    source.replace(DEFAULT_SCOPE, &format!(".{class}"))
}

/// Stylesheet with every rule scoped to `.{class}`.
///
/// ```
/// let css = lessonmd_renderer::assets::stylesheet("lesson");
/// assert!(css.contains(".lesson .notice"));
/// assert!(!css.contains(".item"));
/// ```
#[must_use]
pub fn stylesheet(class: &str) -> String {
    rescope(STYLESHEET, class)
}

/// Syntax highlighting and copy-to-clipboard loader for code under `.{class}`.
#[must_use]
pub fn highlight_js(class: &str) -> String {
    rescope(HIGHLIGHT_JS, class)
}

/// Client-side Mermaid loader.
#[must_use]
pub fn mermaid_js() -> &'static str {
    MERMAID_JS
}

/// Tab switching script. Defines `initializeTabs` and keeps tabs with the
/// same `data-tab-name` in sync across groups.
#[must_use]
pub fn tabs_js() -> &'static str {
    TABS_JS
}

/// Wrap CSS in a `<style>` element followed by a newline.
#[must_use]
pub fn style_tag(css: &str) -> String {
    format!("<style>{css}</style>\n")
}

/// Wrap JavaScript in a `<script>` element followed by a newline.
#[must_use]
pub fn script_tag(js: &str) -> String {
    format!("<script>{js}</script>\n")
}
