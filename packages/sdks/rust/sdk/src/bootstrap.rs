//! Fixed `main` for plugin binaries started by kiln.
//!
//! kiln writes the invocation to a framed envelope file and passes its path
//! in `KILN_ENVELOPE`. The bootstrap reads it back, rebuilds the argument
//! list and exits with whatever the entry function returns.

use domain::wire::{self, EnvelopeError};
use domain::Entrypoint;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Log level kiln forwards to its children.
pub const LOG_LEVEL_ENV: &str = "KILN_LOG_LEVEL";

pub fn main(entry: Entrypoint) -> ! {
    init_logging();

    let code = match wire::read_from_env() {
        Ok(envelope) => {
            tracing::debug!("running '{}'", envelope.command);
            entry(envelope.into_argv())
        }
        Err(err) => {
            tracing::error!("{}", err);
            1
        }
    };

    std::process::exit(code)
}

/// Run `entry` with the envelope stored at `path`.
pub fn run_from_path(entry: Entrypoint, path: &Path) -> Result<i32, EnvelopeError> {
    let envelope = wire::read_file(path)?;
    Ok(entry(envelope.into_argv()))
}

fn init_logging() {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout belongs to the command
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::InvocationEnvelope;
    use serde_json::{json, Value};

    fn shape(argv: Vec<Value>) -> i32 {
        match argv.as_slice() {
            [Value::String(name), Value::Object(options)]
                if name == "demo" && options.len() == 1 && options["force"] == json!(true) =>
            {
                0
            }
            _ => 9,
        }
    }

    #[test]
    fn test_argv_is_rebuilt_from_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("call.kinv");
        let envelope = InvocationEnvelope::from_argv(
            "init",
            vec![json!("demo"), json!({ "force": true, "_cwd": "/tmp" })],
        );
        wire::write_file(&path, &envelope).unwrap();

        assert_eq!(run_from_path(shape, &path).unwrap(), 0);
    }

    #[test]
    fn test_missing_envelope_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_from_path(shape, &dir.path().join("gone.kinv")).unwrap_err();

        assert!(matches!(err, EnvelopeError::Io { .. }));
    }
}
