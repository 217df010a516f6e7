use domain::system::format_path;
use domain::wire::{self, ENVELOPE_ENV};
use domain::InvocationEnvelope;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

use crate::error::DispatchError;

/// Environment variable naming the entry file for the node bootstrap.
pub const ENTRY_ENV: &str = "KILN_ENTRY";

/// Script run with `node -e`: decodes the envelope and calls the entry's
/// exported function with `[...args, options]`.
pub const NODE_BOOTSTRAP: &str = include_str!("node_bootstrap.js");

/// Runs an entry file in a child process.
///
/// The invocation travels as a framed envelope in a transient file named by
/// `KILN_ENVELOPE`; stdio is inherited so the child talks to the user
/// directly. The child is awaited without a timeout.
///
/// Entries mapped to `node` are not run as scripts: node evaluates
/// [`NODE_BOOTSTRAP`], which loads the entry and calls its export. Any other
/// interpreter gets the entry path as its argument, and entries without an
/// interpreter are executed directly.
#[derive(Debug, Clone, Default)]
pub struct IsolatedLauncher {
    interpreters: BTreeMap<String, String>,
    env: Vec<(String, String)>,
}

impl IsolatedLauncher {
    pub fn new(interpreters: BTreeMap<String, String>) -> Self {
        Self {
            interpreters,
            env: Vec::new(),
        }
    }

    /// Extra environment for every child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub async fn launch(
        &self,
        entry: &Path,
        envelope: &InvocationEnvelope,
    ) -> Result<i32, DispatchError> {
        let transient = tempfile::Builder::new()
            .prefix("kiln-")
            .suffix(".kinv")
            .tempfile()
            .map_err(|source| domain::EnvelopeError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        wire::write_file(transient.path(), envelope)?;

        let mut cmd = match self.interpreter_for(entry) {
            Some(program) if is_node(program) => {
                let mut cmd = Command::new(program);
                cmd.arg("-e")
                    .arg(NODE_BOOTSTRAP)
                    .env(ENTRY_ENV, format_path(entry));
                cmd
            }
            Some(program) => {
                let mut cmd = Command::new(program);
                cmd.arg(entry);
                cmd
            }
            None => Command::new(entry),
        };
        cmd.env(ENVELOPE_ENV, transient.path())
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        tracing::debug!(
            "spawning {} for '{}' ({} args)",
            entry.display(),
            envelope.command,
            envelope.args.len()
        );

        let mut child = cmd.spawn().map_err(|source| DispatchError::SpawnFailed {
            entry: entry.to_path_buf(),
            source,
        })?;
        let status = child
            .wait()
            .await
            .map_err(|source| DispatchError::SpawnFailed {
                entry: entry.to_path_buf(),
                source,
            })?;

        let code = exit_code(status);
        tracing::debug!("{} exited with {}", entry.display(), code);
        Ok(code)
    }

    fn interpreter_for(&self, entry: &Path) -> Option<&str> {
        let ext = entry.extension()?.to_str()?;
        self.interpreters.get(ext).map(String::as_str)
    }
}

fn is_node(program: &str) -> bool {
    Path::new(program)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem == "node" || stem == "nodejs")
}

/// Exit code of a finished child; death by signal maps to `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn sh_launcher() -> IsolatedLauncher {
        let mut interpreters = BTreeMap::new();
        interpreters.insert("sh".to_string(), "sh".to_string());
        IsolatedLauncher::new(interpreters)
    }

    fn envelope() -> InvocationEnvelope {
        InvocationEnvelope::from_argv("init", vec![json!("demo"), json!({ "force": true })])
    }

    #[tokio::test]
    async fn test_propagates_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("main.sh");
        fs::write(&entry, "exit 7\n").unwrap();

        assert_eq!(sh_launcher().launch(&entry, &envelope()).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_child_sees_envelope_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("main.sh");
        fs::write(
            &entry,
            "[ \"$(head -c 4 \"$KILN_ENVELOPE\")\" = KINV ] || exit 3\n\
             [ \"$KILN_LOG_LEVEL\" = debug ] || exit 4\n",
        )
        .unwrap();

        let launcher = sh_launcher().env("KILN_LOG_LEVEL", "debug");
        assert_eq!(launcher.launch(&entry, &envelope()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_signal_maps_to_128_plus() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("main.sh");
        fs::write(&entry, "kill -9 $$\n").unwrap();

        assert_eq!(sh_launcher().launch(&entry, &envelope()).await.unwrap(), 137);
    }

    #[test]
    fn test_node_programs_use_bootstrap() {
        assert!(is_node("node"));
        assert!(is_node("/usr/local/bin/node"));
        assert!(is_node("nodejs"));
        assert!(!is_node("sh"));
        assert!(!is_node("deno"));
    }

    #[test]
    fn test_bootstrap_matches_wire_format() {
        assert!(NODE_BOOTSTRAP.contains("'KINV'"));
        assert!(NODE_BOOTSTRAP.contains(&format!("WIRE_VERSION = {}", wire::WIRE_VERSION)));
        assert!(NODE_BOOTSTRAP.contains(ENVELOPE_ENV));
        assert!(NODE_BOOTSTRAP.contains(ENTRY_ENV));
    }

    #[tokio::test]
    async fn test_unspawnable_entry() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("missing-binary");

        let err = sh_launcher().launch(&entry, &envelope()).await.unwrap_err();
        assert!(matches!(err, DispatchError::SpawnFailed { .. }));
    }
}
