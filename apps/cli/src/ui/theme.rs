use console::style;
use std::fmt;

/// Colors used across kiln's output.
pub struct Theme;

impl Theme {
    /// Commands and paths the user can act on (cyan).
    pub fn primary(text: impl fmt::Display) -> String {
        style(text).cyan().bold().to_string()
    }

    pub fn success(text: impl fmt::Display) -> String {
        style(text).green().bold().to_string()
    }

    pub fn error(text: impl fmt::Display) -> String {
        style(text).red().bold().to_string()
    }

    /// Secondary detail such as hints and causes.
    pub fn muted(text: impl fmt::Display) -> String {
        style(text).dim().to_string()
    }
}
