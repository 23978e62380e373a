//! Colored status lines on stderr.
//!
//! Stdout is reserved for command results (`classgraph markup`), so every
//! status message goes through [`Output`].

use console::{Style, Term};

pub(crate) struct Output {
    term: Term,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn line(&self, style: Option<Style>, msg: &str) {
        let text = match style {
            Some(style) => style.apply_to(msg).to_string(),
            None => msg.to_owned(),
        };
        // Status output is best effort; a closed stderr must not fail the run.
        let _ = self.term.write_line(&text);
    }

    pub(crate) fn info(&self, msg: &str) {
        self.line(None, msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(Some(Style::new().green()), msg);
    }

    /// Per-diagram failures and other non-fatal problems.
    pub(crate) fn warning(&self, msg: &str) {
        self.line(Some(Style::new().yellow()), msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(Some(Style::new().red().bold()), msg);
    }
}
