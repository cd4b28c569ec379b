//! User interface abstraction.
//!
//! This module provides:
//! - [`UserInterface`] trait so commands and the orchestrator never write
//!   to the terminal directly
//! - [`TerminalUI`] for interactive terminal usage
//! - [`NonInteractiveUI`] for CI/headless environments
//! - [`MockUI`] for tests
//!
//! # Example
//!
//! ```
//! use fleetenv::ui::{create_ui, OutputMode};
//!
//! let mut ui = create_ui(false, OutputMode::Quiet, false);
//! ui.show_header("fleetenv");
//! ui.success("Workspace in sync");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, FleetTheme};

use crate::error::Result;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Ask a yes/no question.
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;
}
