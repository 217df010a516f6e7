use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::entities::artifact::ArtifactRef;
use crate::ports::installer::{InstallError, InstallRequest, Installer};
use crate::ports::registry::RegistryClient;
use crate::system::entry::{EntryError, EntryResolver};
use crate::system::lock::CacheLock;
use crate::system::version::{VersionError, VersionResolver};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Install(#[from] InstallError),
    #[error(transparent)]
    Entry(#[from] EntryError),
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Installer reported success but {name}@{version} is missing at {path}")]
    NotMaterialized {
        name: String,
        version: String,
        path: PathBuf,
    },
}

/// Versioned on-disk copies of one artifact.
///
/// With a store directory every version gets its own cache entry (see
/// [`crate::entities::cache_entry_path`]); old entries are never removed.
/// Without one the artifact lives in `target_root` and is managed by whoever
/// put it there.
pub struct ArtifactCache<R, I> {
    artifact: ArtifactRef,
    resolver: VersionResolver<R>,
    installer: I,
}

impl<R: RegistryClient, I: Installer> ArtifactCache<R, I> {
    pub fn new(artifact: ArtifactRef, resolver: VersionResolver<R>, installer: I) -> Self {
        Self {
            artifact,
            resolver,
            installer,
        }
    }

    pub fn artifact(&self) -> &ArtifactRef {
        &self.artifact
    }

    /// Create the store directory and pin `latest` to a concrete version.
    pub async fn prepare(&mut self) -> Result<(), CacheError> {
        if let Some(store) = self.artifact.store_dir() {
            if !store.exists() {
                fs::create_dir_all(store).map_err(|source| CacheError::Io {
                    path: store.to_path_buf(),
                    source,
                })?;
            }
        }

        if self.artifact.is_latest() {
            let version = self.resolver.resolve_latest(self.artifact.name()).await?;
            tracing::debug!(artifact = self.artifact.name(), %version, "pinned latest");
            self.artifact.pin_version(version);
        }

        Ok(())
    }

    /// Cache entry of the pinned version, if caching is enabled.
    pub fn cache_file_path(&self) -> Option<PathBuf> {
        self.artifact.cache_entry()
    }

    /// Whether the pinned version is on disk.
    ///
    /// With caching this pins `latest` first, so call it (or [`Self::prepare`])
    /// before reading the artifact's version.
    pub async fn exists(&mut self) -> Result<bool, CacheError> {
        match self.artifact.store_dir() {
            Some(_) => {
                self.prepare().await?;
                Ok(self
                    .cache_file_path()
                    .map(|path| path.exists())
                    .unwrap_or(false))
            }
            None => Ok(self.artifact.target_root().exists()),
        }
    }

    /// Materialize the pinned version. A version already in the cache is not
    /// installed again.
    pub async fn install(&mut self) -> Result<(), CacheError> {
        self.prepare().await?;
        let version = self.artifact.version().to_string();
        self.install_version(&version).await
    }

    /// Move to the newest published version, installing it when its cache
    /// entry is missing. Older entries are left in place.
    pub async fn update(&mut self) -> Result<(), CacheError> {
        if !self.artifact.is_cached() {
            tracing::debug!(
                artifact = self.artifact.name(),
                "no store directory, leaving {} untouched",
                self.artifact.target_root().display()
            );
            return Ok(());
        }

        self.prepare().await?;
        let latest = self.resolver.resolve_latest(self.artifact.name()).await?;
        let present = self
            .artifact
            .cache_entry_for(&latest)
            .map(|path| path.exists())
            .unwrap_or(false);

        if present {
            tracing::debug!(artifact = self.artifact.name(), %latest, "already up to date");
            return Ok(());
        }

        tracing::info!(
            "updating {} from {} to {}",
            self.artifact.name(),
            self.artifact.version(),
            latest
        );
        self.install_version(&latest).await?;
        self.artifact.pin_version(latest);
        Ok(())
    }

    /// Entry file of the materialized artifact, if it declares one.
    ///
    /// Cached artifacts only look for a descriptor inside the store.
    pub fn entry_file_path(&self) -> Result<Option<PathBuf>, CacheError> {
        Ok(EntryResolver::resolve_within(
            &self.artifact.package_root(),
            self.artifact.store_dir(),
        )?)
    }

    async fn install_version(&self, version: &str) -> Result<(), CacheError> {
        let lock_dir = self
            .artifact
            .store_dir()
            .unwrap_or_else(|| self.artifact.target_root());
        ensure_dir(self.artifact.target_root())?;
        let _lock = CacheLock::acquire_async(lock_dir.to_path_buf())
            .await
            .map_err(|source| CacheError::Io {
                path: lock_dir.to_path_buf(),
                source,
            })?;

        let entry = self.artifact.cache_entry_for(version);
        if let Some(path) = entry.as_deref() {
            if path.exists() {
                tracing::debug!("{}@{} already cached", self.artifact.name(), version);
                return Ok(());
            }
        }

        tracing::info!("installing {}@{}", self.artifact.name(), version);
        let request = InstallRequest {
            name: self.artifact.name().to_string(),
            version: version.to_string(),
            root: self.artifact.target_root().to_path_buf(),
            store_dir: self.artifact.store_dir().map(Path::to_path_buf),
        };
        self.installer.install(&request).await?;

        if let Some(path) = entry {
            if !path.exists() {
                return Err(CacheError::NotMaterialized {
                    name: request.name,
                    version: request.version,
                    path,
                });
            }
        }

        Ok(())
    }
}

fn ensure_dir(path: &Path) -> Result<(), CacheError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}
