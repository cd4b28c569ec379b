//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion. Confirmation answers can be
//! configured up front.
//!
//! # Example
//!
//! ```
//! use fleetenv::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_confirm_response(true);
//!
//! ui.message("Planning 3 projects");
//! assert!(ui.confirm("Push 2 key(s) to web (preview)?", false).unwrap());
//!
//! assert!(ui.has_message("Planning"));
//! assert_eq!(ui.confirmations().len(), 1);
//! ```

use std::collections::VecDeque;

use crate::error::Result;

use super::{OutputMode, UserInterface};

/// Mock UI implementation for testing.
///
/// Queued answers (via `queue_confirm_responses`) are used first, then the
/// fixed answer from `set_confirm_response`, then the question's default.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    confirmations: Vec<String>,
    confirm_queue: VecDeque<bool>,
    confirm_response: Option<bool>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Answer every confirmation with `response`.
    pub fn set_confirm_response(&mut self, response: bool) {
        self.confirm_response = Some(response);
    }

    /// Answer the next confirmations in order.
    pub fn queue_confirm_responses(&mut self, responses: impl IntoIterator<Item = bool>) {
        self.confirm_queue.extend(responses);
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Questions asked through `confirm`.
    pub fn confirmations(&self) -> &[String] {
        &self.confirmations
    }

    /// Check if a message containing `msg` was shown.
    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    /// Clear all captured interactions.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.successes.clear();
        self.warnings.clear();
        self.errors.clear();
        self.headers.clear();
        self.confirmations.clear();
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        self.confirmations.push(question.to_string());
        Ok(self
            .confirm_queue
            .pop_front()
            .or(self.confirm_response)
            .unwrap_or(default))
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}
