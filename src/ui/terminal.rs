//! Interactive terminal UI.

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use std::io::Write;

use crate::error::{FleetError, Result};

use super::{FleetTheme, NonInteractiveUI, OutputMode, UserInterface};

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    theme: FleetTheme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode, colors: bool) -> Self {
        let theme = if colors {
            FleetTheme::new()
        } else {
            FleetTheme::plain()
        };

        Self {
            term: Term::stdout(),
            theme,
            mode,
        }
    }
}

/// Dialoguer theme without the default yellow `?` prefix.
fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("".to_string()),
        ..ColorfulTheme::default()
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_error(msg)).ok();
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&prompt_theme())
            .with_prompt(question)
            .default(default)
            .interact_on(&self.term)
            .map_err(|e| FleetError::Io(e.into()))
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Create the appropriate UI based on context.
pub fn create_ui(interactive: bool, mode: OutputMode, colors: bool) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new(mode, colors))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_ui_output_mode() {
        let ui = TerminalUI::new(OutputMode::Verbose, false);
        assert_eq!(ui.output_mode(), OutputMode::Verbose);
    }

    #[test]
    fn create_ui_non_interactive() {
        let ui = create_ui(false, OutputMode::Normal, false);
        assert!(!ui.is_interactive());
    }

    #[test]
    fn create_ui_respects_mode() {
        let ui = create_ui(false, OutputMode::Quiet, false);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }
}
