//! Console styling
//!
//! Output goes through `anstream`, which strips the escapes when stdout is
//! not a terminal.

use owo_colors::OwoColorize;
use std::fmt::Display;

/// Check mark
pub const CHECK: &str = "✓";
/// Cross mark
pub const CROSS: &str = "✗";
/// Arrow prefix for progress lines
pub const ARROW: &str = "→";

/// Semantic styles for CLI output
pub trait Stylize {
    /// De-emphasized text
    fn muted(&self) -> String;
    /// Headings
    fn emphasis(&self) -> String;
    /// Names and numbers
    fn accent(&self) -> String;
    /// Good news
    fn success(&self) -> String;
    /// Something went wrong, but not fatally
    fn warn(&self) -> String;
    /// Fatal
    fn error(&self) -> String;
}

impl<T: Display> Stylize for T {
    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    fn emphasis(&self) -> String {
        self.bold().to_string()
    }

    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    fn success(&self) -> String {
        self.green().to_string()
    }

    fn warn(&self) -> String {
        self.yellow().to_string()
    }

    fn error(&self) -> String {
        self.red().to_string()
    }
}
