use domain::Entrypoint;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

/// Exit code reported when an entry function panics.
pub const PANIC_EXIT_CODE: i32 = 101;

/// Entry functions linked into the running binary, keyed by artifact name.
#[derive(Debug, Clone, Default)]
pub struct InProcessEntries {
    entries: HashMap<String, Entrypoint>,
}

impl InProcessEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, artifact: impl Into<String>, entry: Entrypoint) {
        self.entries.insert(artifact.into(), entry);
    }

    pub fn contains(&self, artifact: &str) -> bool {
        self.entries.contains_key(artifact)
    }

    /// Run the entry for `artifact`. `None` when nothing is linked for it.
    ///
    /// A panic in the entry is logged and turned into [`PANIC_EXIT_CODE`].
    pub fn call(&self, artifact: &str, argv: Vec<Value>) -> Option<i32> {
        let entry = *self.entries.get(artifact)?;

        let code = match panic::catch_unwind(AssertUnwindSafe(|| entry(argv))) {
            Ok(code) => code,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("{} panicked: {}", artifact, message);
                PANIC_EXIT_CODE
            }
        };

        if code != 0 {
            tracing::error!("{} exited with code {}", artifact, code);
        }
        Some(code)
    }
}
