//! Non-interactive UI for CI/headless environments.

use crate::error::Result;

use super::{OutputMode, UserInterface};

/// UI implementation for non-interactive mode.
///
/// Status lines go to stdout and warnings/errors to stderr, without
/// styling. Confirmations cannot be asked, so they resolve to their default.
pub struct NonInteractiveUI {
    mode: OutputMode,
}

impl NonInteractiveUI {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        tracing::warn!(
            "Cannot ask '{}' in non-interactive mode; answering {} (pass --yes to proceed)",
            question,
            if default { "yes" } else { "no" }
        );
        Ok(default)
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n{}\n", title);
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_is_not_interactive() {
        let ui = NonInteractiveUI::new(OutputMode::Normal);
        assert!(!ui.is_interactive());
    }

    #[test]
    fn confirm_uses_default() {
        let mut ui = NonInteractiveUI::new(OutputMode::Normal);
        assert!(!ui.confirm("Push?", false).unwrap());
        assert!(ui.confirm("Push?", true).unwrap());
    }

    #[test]
    fn output_mode_preserved() {
        let ui = NonInteractiveUI::new(OutputMode::Silent);
        assert_eq!(ui.output_mode(), OutputMode::Silent);
    }
}
