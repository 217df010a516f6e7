use semver::Version;
use thiserror::Error;

use crate::ports::registry::{RegistryClient, RegistryError};

#[derive(Error, Debug)]
pub enum VersionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("No published versions found for '{0}'")]
    NoVersionsFound(String),
    #[error("Invalid version '{version}': {source}")]
    InvalidVersion {
        version: String,
        source: semver::Error,
    },
}

/// Selects versions of an artifact from what the registry publishes.
///
/// Nothing is cached between calls: every resolution fetches a fresh list.
pub struct VersionResolver<R> {
    registry: R,
}

impl<R: RegistryClient> VersionResolver<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// All published version strings for `name`, possibly empty.
    pub async fn list_versions(&self, name: &str) -> Result<Vec<String>, VersionError> {
        let versions = self.registry.fetch_versions(name).await?;
        tracing::debug!(artifact = name, count = versions.len(), "fetched versions");
        Ok(versions)
    }

    /// Highest published version of `name`.
    pub async fn resolve_latest(&self, name: &str) -> Result<String, VersionError> {
        let versions = self.list_versions(name).await?;
        sort_descending(&versions)
            .into_iter()
            .next()
            .map(|v| v.to_string())
            .ok_or_else(|| VersionError::NoVersionsFound(name.to_string()))
    }

    /// Highest published version that is at least `base_version`, if any.
    pub async fn resolve_satisfying(
        &self,
        name: &str,
        base_version: &str,
    ) -> Result<Option<String>, VersionError> {
        let base = parse_version(base_version)?;
        let versions = self.list_versions(name).await?;

        Ok(satisfying(&versions, &base)
            .into_iter()
            .next()
            .map(|v| v.to_string()))
    }
}

/// Parse a version, tolerating a leading `v`.
pub fn parse_version(raw: &str) -> Result<Version, VersionError> {
    let clean = raw.trim().trim_start_matches('v');
    Version::parse(clean).map_err(|source| VersionError::InvalidVersion {
        version: raw.to_string(),
        source,
    })
}

/// Parse, de-duplicate and order versions from highest to lowest.
///
/// Entries that are not valid semver are skipped.
pub fn sort_descending(versions: &[String]) -> Vec<Version> {
    let mut parsed: Vec<Version> = versions
        .iter()
        .filter_map(|raw| match parse_version(raw) {
            Ok(version) => Some(version),
            Err(err) => {
                tracing::warn!("skipping registry version: {err}");
                None
            }
        })
        .collect();

    parsed.sort_by(|a, b| b.cmp(a));
    parsed.dedup();
    parsed
}

/// Versions `>= base`, highest first.
pub fn satisfying(versions: &[String], base: &Version) -> Vec<Version> {
    sort_descending(versions)
        .into_iter()
        .filter(|v| v >= base)
        .collect()
}
