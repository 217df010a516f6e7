pub mod artifact;
pub mod invocation;

pub use artifact::{cache_entry_path, sanitize_name, ArtifactError, ArtifactRef, LATEST};
pub use invocation::{Entrypoint, InvocationEnvelope};
