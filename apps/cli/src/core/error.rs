use kiln::application::DispatchError;
use kiln::domain::{CacheError, VersionError};
use thiserror::Error;

use crate::ui::Theme;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not find the home directory")]
    HomeNotFound,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Returns a themed, actionable suggestion for the error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            CliError::Config(_) => {
                Some("Check ~/.kiln/config.toml for syntax errors or unknown values.".to_string())
            }
            CliError::HomeNotFound => Some("Set the HOME environment variable.".to_string()),
            CliError::Dispatch(err) => dispatch_suggestion(err),
            CliError::Io(_) => None,
        }
    }

    pub fn render(&self) {
        eprintln!("\n{} {}", Theme::error("Error:"), self);
        if let Some(s) = self.suggestion() {
            eprintln!("{} {}", Theme::muted("  help:"), s);
        }
    }
}

fn dispatch_suggestion(err: &DispatchError) -> Option<String> {
    let hint = match err {
        DispatchError::UnknownCommand(_) => {
            "Register the command under [commands] in ~/.kiln/config.toml."
        }
        DispatchError::CommandTable(_) => "Fix the [commands] table in ~/.kiln/config.toml.",
        DispatchError::Registry(_) => "Use `npm`, `npmmirror` or a full URL for `registry`.",
        DispatchError::Cache(CacheError::Version(VersionError::Registry(_))) => {
            "Check your network connection or switch `registry` to a mirror."
        }
        DispatchError::Cache(CacheError::Install(_)) => {
            "Make sure the installer from [installer] is on your PATH."
        }
        DispatchError::SpawnFailed { .. } => {
            "Map the entry file's extension to a program under [interpreters]."
        }
        DispatchError::InProcessUnavailable(_) => "Run the command with --isolated.",
        _ => return None,
    };
    Some(hint.to_string())
}

/// Print `err` once. The cause chain is only shown with `--debug`.
pub fn report(err: &anyhow::Error, debug: bool) {
    match err.downcast_ref::<CliError>() {
        Some(cli_err) => cli_err.render(),
        None => eprintln!("\n{} {}", Theme::error("Error:"), err),
    }

    if debug {
        for cause in err.chain().skip(1) {
            eprintln!("{} {}", Theme::muted("  caused by:"), cause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions() {
        let unknown = CliError::from(DispatchError::UnknownCommand("deploy".to_string()));
        assert!(unknown.suggestion().unwrap().contains("[commands]"));

        let in_process = CliError::from(DispatchError::InProcessUnavailable("x".to_string()));
        assert!(in_process.suggestion().unwrap().contains("--isolated"));

        assert!(CliError::Io(std::io::Error::other("x")).suggestion().is_none());
    }
}
