//! Per-conversion render state.

use std::collections::HashMap;

/// Mutable state for one render call.
///
/// A fresh context is created for every document, so tab group numbering
/// and heading ids never leak between conversions.
#[derive(Debug)]
pub(crate) struct RenderContext {
    pub(crate) output: String,
    tab_groups: usize,
    open_groups: Vec<usize>,
    heading_ids: HashMap<String, usize>,
    warnings: Vec<String>,
}

impl RenderContext {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            output: String::with_capacity(capacity),
            tab_groups: 0,
            open_groups: Vec::new(),
            heading_ids: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Start a tab group and return its 1-based number.
    pub(crate) fn open_tab_group(&mut self) -> usize {
        self.tab_groups += 1;
        self.open_groups.push(self.tab_groups);
        self.tab_groups
    }

    pub(crate) fn close_tab_group(&mut self) {
        self.open_groups.pop();
    }

    /// Number of the innermost open tab group.
    pub(crate) fn current_tab_group(&self) -> usize {
        self.open_groups.last().copied().unwrap_or(self.tab_groups)
    }

    /// Reserve `base` as a heading id, suffixing `-1`, `-2`, ... on collision.
    pub(crate) fn unique_heading_id(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "heading" } else { base };
        if !self.heading_ids.contains_key(base) {
            self.heading_ids.insert(base.to_owned(), 0);
            return base.to_owned();
        }

        loop {
            let count = self.heading_ids.entry(base.to_owned()).or_insert(0);
            *count += 1;
            let candidate = format!("{base}-{count}");
            if !self.heading_ids.contains_key(&candidate) {
                self.heading_ids.insert(candidate.clone(), 0);
                return candidate;
            }
        }
    }

    /// Record an explicit id so generated ids avoid it.
    pub(crate) fn reserve_heading_id(&mut self, id: &str) {
        self.heading_ids.entry(id.to_owned()).or_insert(0);
    }

    pub(crate) fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Start a new line unless the output already ends with one.
    pub(crate) fn ensure_newline(&mut self) {
        if !self.output.is_empty() && !self.output.ends_with('\n') {
            self.output.push('\n');
        }
    }

    pub(crate) fn finish(self) -> (String, Vec<String>) {
        (self.output, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_tab_groups_are_numbered_from_one() {
        let mut context = RenderContext::new(0);
        assert_eq!(context.open_tab_group(), 1);
        assert_eq!(context.open_tab_group(), 2);
        assert_eq!(context.current_tab_group(), 2);
        context.close_tab_group();
        assert_eq!(context.current_tab_group(), 1);
        context.close_tab_group();
        assert_eq!(context.open_tab_group(), 3);
    }

    #[test]
    fn test_unique_heading_ids() {
        let mut context = RenderContext::new(0);
        assert_eq!(context.unique_heading_id("intro"), "intro");
        assert_eq!(context.unique_heading_id("intro"), "intro-1");
        assert_eq!(context.unique_heading_id("intro"), "intro-2");
        assert_eq!(context.unique_heading_id(""), "heading");
    }

    #[test]
    fn test_generated_ids_skip_reserved() {
        let mut context = RenderContext::new(0);
        context.reserve_heading_id("setup-1");
        assert_eq!(context.unique_heading_id("setup"), "setup");
        assert_eq!(context.unique_heading_id("setup"), "setup-2");
    }

    #[test]
    fn test_ensure_newline() {
        let mut context = RenderContext::new(0);
        context.ensure_newline();
        assert_eq!(context.output, "");
        context.output.push_str("<li>a");
        context.ensure_newline();
        context.ensure_newline();
        assert_eq!(context.output, "<li>a\n");
    }
}
