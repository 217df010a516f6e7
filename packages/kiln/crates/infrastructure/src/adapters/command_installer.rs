use async_trait::async_trait;
use domain::entities::cache_entry_path;
use domain::ports::installer::{InstallError, InstallRequest, Installer};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;

/// Lines of installer stderr carried into an error.
const STDERR_TAIL: usize = 20;

/// Program and argument template used to materialize a package.
///
/// Arguments may contain placeholders that are filled from the request:
/// `{name}`, `{version}`, `{spec}` (`name@version`), `{root}`, `{store}`,
/// `{entry}` (the expected cache entry) and `{registry}`. Arguments that
/// mention `{store}` or `{entry}` are dropped when the request has no store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallerTemplate {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for InstallerTemplate {
    fn default() -> Self {
        Self {
            program: "npminstall".to_string(),
            args: vec![
                "--root={root}".to_string(),
                "--storeDir={store}".to_string(),
                "--registry={registry}".to_string(),
                "{spec}".to_string(),
            ],
        }
    }
}

impl InstallerTemplate {
    fn render(&self, request: &InstallRequest, registry: &str) -> Vec<String> {
        let store = request.store_dir.as_deref();
        let entry = store.map(|dir| cache_entry_path(dir, &request.name, &request.version));
        let spec = format!("{}@{}", request.name, request.version);

        self.args
            .iter()
            .filter(|arg| store.is_some() || !(arg.contains("{store}") || arg.contains("{entry}")))
            .map(|arg| {
                let mut out = arg
                    .replace("{name}", &request.name)
                    .replace("{version}", &request.version)
                    .replace("{spec}", &spec)
                    .replace("{root}", &display(&request.root))
                    .replace("{registry}", registry);
                if let Some(dir) = store {
                    out = out.replace("{store}", &display(dir));
                }
                if let Some(path) = entry.as_deref() {
                    out = out.replace("{entry}", &display(path));
                }
                out
            })
            .collect()
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Installs packages by running an external package manager.
///
/// Output is captured: stdout goes to the debug log, the tail of stderr ends
/// up in the error when the program fails. No timeout is applied.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    template: InstallerTemplate,
    registry: String,
}

impl CommandInstaller {
    pub fn new(template: InstallerTemplate, registry: impl Into<String>) -> Self {
        Self {
            template,
            registry: registry.into(),
        }
    }

    pub fn template(&self) -> &InstallerTemplate {
        &self.template
    }
}

#[async_trait]
impl Installer for CommandInstaller {
    async fn install(&self, request: &InstallRequest) -> Result<(), InstallError> {
        let args = self.template.render(request, &self.registry);
        tracing::debug!("running {} {}", self.template.program, args.join(" "));

        let failed = |reason: String| InstallError::InstallFailed {
            name: request.name.clone(),
            version: request.version.clone(),
            reason,
        };

        let output = Command::new(&self.template.program)
            .args(&args)
            .current_dir(&request.root)
            .output()
            .await
            .map_err(|err| failed(format!("failed to launch {}: {err}", self.template.program)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!("{}", stdout.trim_end());
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL)..].join("\n");
            let reason = if tail.trim().is_empty() {
                format!("{} exited with {}", self.template.program, output.status)
            } else {
                format!("{} exited with {}:\n{}", self.template.program, output.status, tail)
            };
            return Err(failed(reason));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn request(store: Option<&str>) -> InstallRequest {
        InstallRequest {
            name: "@kiln-cli/init".to_string(),
            version: "1.2.0".to_string(),
            root: PathBuf::from("/home/u/.kiln/dependencies"),
            store_dir: store.map(PathBuf::from),
        }
    }

    #[test]
    fn test_default_template_renders_npminstall_args() {
        let args = InstallerTemplate::default().render(
            &request(Some("/home/u/.kiln/dependencies/node_modules")),
            "https://registry.npmjs.org/",
        );

        assert_eq!(
            args,
            vec![
                "--root=/home/u/.kiln/dependencies",
                "--storeDir=/home/u/.kiln/dependencies/node_modules",
                "--registry=https://registry.npmjs.org/",
                "@kiln-cli/init@1.2.0",
            ]
        );
    }

    #[test]
    fn test_store_arguments_dropped_without_store() {
        let template = InstallerTemplate {
            program: "x".to_string(),
            args: vec!["{entry}".to_string(), "--storeDir={store}".to_string(), "{name}".to_string()],
        };

        assert_eq!(template.render(&request(None), "r"), vec!["@kiln-cli/init"]);
    }

    #[test]
    fn test_entry_placeholder_matches_cache_layout() {
        let template = InstallerTemplate {
            program: "x".to_string(),
            args: vec!["{entry}".to_string()],
        };

        assert_eq!(
            template.render(&request(Some("/s")), "r"),
            vec!["/s/_@kiln-cli_init@1.2.0@@kiln-cli/init"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_program_in_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("node_modules");
        let installer = CommandInstaller::new(
            InstallerTemplate {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), "mkdir -p '{entry}'".to_string()],
            },
            "npm",
        );
        let req = InstallRequest {
            name: "@kiln-cli/init".to_string(),
            version: "1.0.0".to_string(),
            root: dir.path().to_path_buf(),
            store_dir: Some(store.clone()),
        };

        installer.install(&req).await.unwrap();
        assert!(cache_entry_path(&store, "@kiln-cli/init", "1.0.0").is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let installer = CommandInstaller::new(
            InstallerTemplate {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), "echo 'E404 not found' >&2; exit 3".to_string()],
            },
            "npm",
        );
        let req = InstallRequest {
            name: "missing".to_string(),
            version: "1.0.0".to_string(),
            root: dir.path().to_path_buf(),
            store_dir: None,
        };

        let err = installer.install(&req).await.unwrap_err();
        let InstallError::InstallFailed { name, reason, .. } = err;
        assert_eq!(name, "missing");
        assert!(reason.contains("E404 not found"), "{reason}");
    }

    #[tokio::test]
    async fn test_missing_program_is_install_failure() {
        let dir = tempfile::tempdir().unwrap();
        let installer = CommandInstaller::new(
            InstallerTemplate {
                program: "kiln-no-such-installer".to_string(),
                args: vec![],
            },
            "npm",
        );
        let req = InstallRequest {
            name: "x".to_string(),
            version: "1.0.0".to_string(),
            root: dir.path().to_path_buf(),
            store_dir: None,
        };

        let err = installer.install(&req).await.unwrap_err();
        assert!(err.to_string().contains("failed to launch"));
    }
}
