//! Diagnostics on stderr. Stdout carries only the converted HTML.

use std::fmt::Display;

use console::{Style, Term};

/// Reports config fallbacks and failed conversions to stderr.
pub(crate) struct Output {
    term: Term,
    notice: Style,
    failure: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            notice: Style::new().for_stderr().yellow(),
            failure: Style::new().for_stderr().red().bold(),
        }
    }

    /// A discovered config file could not be used; conversion continues
    /// with built-in defaults.
    pub(crate) fn config_fallback(&self, err: &impl Display) {
        let line = fallback_message(err);
        let _ = self.term.write_line(&self.notice.apply_to(line).to_string());
    }

    /// Nothing was written to stdout.
    pub(crate) fn conversion_failed(&self, err: &impl Display) {
        let line = failure_message(err);
        let _ = self.term.write_line(&self.failure.apply_to(line).to_string());
    }
}

fn fallback_message(err: &impl Display) -> String {
    format!("lessonmd: ignoring config file, using defaults ({err})")
}

fn failure_message(err: &impl Display) -> String {
    format!("lessonmd: no HTML written: {err}")
}
