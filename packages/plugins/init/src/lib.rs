use anyhow::{bail, Context, Result};
use kiln_sdk::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// `kiln init <project-name> [--force]`
///
/// Prepares the project directory below `base_dir`. Scaffolding the
/// template into it is left to the template package.
#[derive(Debug, Clone)]
pub struct InitCommand {
    base_dir: PathBuf,
    project_name: String,
    force: bool,
    created: Option<PathBuf>,
}

impl InitCommand {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            project_name: String::new(),
            force: false,
            created: None,
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn force(&self) -> bool {
        self.force
    }

    /// Directory prepared by `exec`.
    pub fn project_dir(&self) -> Option<&Path> {
        self.created.as_deref()
    }
}

impl Command for InitCommand {
    fn init(&mut self, ctx: &CommandContext) -> Result<()> {
        self.project_name = ctx.arg_str(0).unwrap_or_default().trim().to_string();
        self.force = ctx.flag("force");
        tracing::debug!("projectName: {}", self.project_name);
        tracing::debug!("force: {}", self.force);

        if self.project_name.is_empty() {
            bail!("A project name is required");
        }
        if !is_valid_project_name(&self.project_name) {
            bail!(
                "Invalid project name '{}': use letters and digits, separated by single '-' or '_', starting with a letter",
                self.project_name
            );
        }
        Ok(())
    }

    fn exec(&mut self) -> Result<()> {
        let dir = self.base_dir.join(&self.project_name);

        if dir.exists() {
            let occupied = fs::read_dir(&dir)
                .with_context(|| format!("Failed to read {}", dir.display()))?
                .next()
                .is_some();
            if occupied && !self.force {
                bail!(
                    "{} is not empty; pass --force to initialize it anyway",
                    dir.display()
                );
            }
        } else {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        tracing::info!("project directory ready at {}", dir.display());
        self.created = Some(dir);
        Ok(())
    }
}

/// Letters first, then letters or digits; `-` and `_` only between
/// segments and each followed by a letter.
pub fn is_valid_project_name(name: &str) -> bool {
    let mut chars = name.chars().peekable();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }

    while let Some(c) = chars.next() {
        match c {
            '-' | '_' => match chars.peek() {
                Some(next) if next.is_ascii_alphabetic() => {}
                _ => return false,
            },
            c if c.is_ascii_alphanumeric() => {}
            _ => return false,
        }
    }
    true
}

/// Entry function kiln calls, in-process or through the plugin binary.
pub fn entry(argv: Vec<Value>) -> i32 {
    match std::env::current_dir() {
        Ok(cwd) => kiln_sdk::run(InitCommand::new(cwd), argv),
        Err(err) => {
            tracing::error!("Cannot determine the working directory: {}", err);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn run_in(base: &Path, argv: Vec<Value>) -> std::result::Result<InitCommand, LifecycleError> {
        CommandLifecycle::from_args(InitCommand::new(base), argv)?.run()
    }

    #[test]
    fn test_project_names() {
        for ok in ["app", "my-project", "my_project", "a1", "web-app2", "a-b-c"] {
            assert!(is_valid_project_name(ok), "{ok}");
        }
        for bad in ["", "1app", "-app", "app-", "my--app", "my-1app", "my app", "app/x", "ünï"] {
            assert!(!is_valid_project_name(bad), "{bad}");
        }
    }

    #[test]
    fn test_reads_name_and_force() {
        let dir = tempdir().unwrap();
        let cmd = run_in(
            dir.path(),
            vec![json!("my-project"), json!({ "force": true })],
        )
        .unwrap();

        assert_eq!(cmd.project_name(), "my-project");
        assert!(cmd.force());
        assert!(dir.path().join("my-project").is_dir());
        assert_eq!(cmd.project_dir(), Some(dir.path().join("my-project").as_path()));
    }

    #[test]
    fn test_missing_or_invalid_name_fails_init() {
        let dir = tempdir().unwrap();

        let err = run_in(dir.path(), vec![json!({})]).unwrap_err();
        assert!(matches!(err, LifecycleError::Init(_)));

        let err = run_in(dir.path(), vec![json!("9lives"), json!({})]).unwrap_err();
        assert!(err.to_string().contains("Invalid project name"));
        assert!(!dir.path().join("9lives").exists());
    }

    #[test]
    fn test_non_empty_directory_needs_force() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("app");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("README.md"), "hi").unwrap();

        let err = run_in(dir.path(), vec![json!("app"), json!({})]).unwrap_err();
        assert!(matches!(err, LifecycleError::Exec(_)));

        run_in(dir.path(), vec![json!("app"), json!({ "force": true })]).unwrap();
        assert!(project.join("README.md").exists());
    }

    #[test]
    fn test_empty_existing_directory_is_fine() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("app")).unwrap();

        assert!(run_in(dir.path(), vec![json!("app")]).is_ok());
    }
}
