use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Installation of {name}@{version} failed: {reason}")]
    InstallFailed {
        name: String,
        version: String,
        reason: String,
    },
}

/// One `name@version` to materialize below `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub name: String,
    pub version: String,
    pub root: PathBuf,
    /// Module cache the installer stores versioned copies in.
    pub store_dir: Option<PathBuf>,
}

/// External package installer.
///
/// Implementations are trusted to either fully materialize the requested
/// version or fail; callers add no rollback.
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, request: &InstallRequest) -> Result<(), InstallError>;
}

#[async_trait]
impl<T: Installer + ?Sized> Installer for Arc<T> {
    async fn install(&self, request: &InstallRequest) -> Result<(), InstallError> {
        (**self).install(request).await
    }
}

#[async_trait]
impl<T: Installer + ?Sized> Installer for &T {
    async fn install(&self, request: &InstallRequest) -> Result<(), InstallError> {
        (**self).install(request).await
    }
}
