//! Visual theme and styling.

use console::Style;

use crate::env::EnvContext;

/// Terminal styles.
#[derive(Debug, Clone)]
pub struct FleetTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (orange).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for highlighted text (bold).
    pub highlight: Style,
    /// Style for headers (cyan bold).
    pub header: Style,
}

impl Default for FleetTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl FleetTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    pub fn format_header(&self, title: &str) -> String {
        format!(
            "{} {}",
            self.header.apply_to("▲"),
            self.highlight.apply_to(title)
        )
    }
}

/// Check if colors should be enabled.
///
/// `--no-color` and `NO_COLOR` (https://no-color.org/) both disable colors,
/// as does a stdout that is not a TTY.
pub fn should_use_colors(no_color_flag: bool, env: &EnvContext) -> bool {
    if no_color_flag || env.get("NO_COLOR").is_some() {
        return false;
    }
    console::Term::stdout().is_term()
}
