use domain::entities::ArtifactError;
use domain::{CacheError, EnvelopeError};
use infrastructure::RegistryUrlError;
use std::path::PathBuf;
use thiserror::Error;

use crate::command_table::CommandTableError;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
    #[error(transparent)]
    CommandTable(#[from] CommandTableError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Registry(#[from] RegistryUrlError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("{artifact} was installed but declares no entry file under {root}")]
    EntryNotFound { artifact: String, root: PathBuf },
    #[error("Failed to start {entry}: {source}")]
    SpawnFailed {
        entry: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error("{0} is not linked into this binary; run it isolated instead")]
    InProcessUnavailable(String),
}
