use std::path::{Path, PathBuf};
use thiserror::Error;

/// Version sentinel meaning "whatever the registry publishes as newest".
pub const LATEST: &str = "latest";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("Artifact name must not be empty")]
    EmptyName,
}

/// Identity of an installable artifact.
///
/// `store_dir` switches caching on: with a store directory every version lives
/// in its own cache entry below it, without one `target_root` is used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    name: String,
    version: String,
    target_root: PathBuf,
    store_dir: Option<PathBuf>,
}

impl ArtifactRef {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        target_root: impl Into<PathBuf>,
        store_dir: Option<PathBuf>,
    ) -> Result<Self, ArtifactError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ArtifactError::EmptyName);
        }

        Ok(Self {
            name,
            version: version.into(),
            target_root: target_root.into(),
            store_dir,
        })
    }

    /// Reference to the newest published version of `name`.
    pub fn latest(
        name: impl Into<String>,
        target_root: impl Into<PathBuf>,
        store_dir: Option<PathBuf>,
    ) -> Result<Self, ArtifactError> {
        Self::new(name, LATEST, target_root, store_dir)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_latest(&self) -> bool {
        self.version == LATEST
    }

    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    pub fn store_dir(&self) -> Option<&Path> {
        self.store_dir.as_deref()
    }

    pub fn is_cached(&self) -> bool {
        self.store_dir.is_some()
    }

    /// Cache entry of the currently pinned version, if caching is enabled.
    pub fn cache_entry(&self) -> Option<PathBuf> {
        self.cache_entry_for(&self.version)
    }

    /// Cache entry of an arbitrary version of this artifact.
    pub fn cache_entry_for(&self, version: &str) -> Option<PathBuf> {
        self.store_dir
            .as_deref()
            .map(|store| cache_entry_path(store, &self.name, version))
    }

    /// Directory the artifact is materialized in for its pinned version.
    pub fn package_root(&self) -> PathBuf {
        self.cache_entry()
            .unwrap_or_else(|| self.target_root.clone())
    }

    pub(crate) fn pin_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }
}

/// Replace path separators so a scoped name fits in a single path segment.
pub fn sanitize_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Path format: `<store>/_<sanitized-name>@<version>@<name>`
///
/// This is the layout the installer produces, so it has to be recomputed the
/// same way on every lookup.
pub fn cache_entry_path(store_dir: &Path, name: &str, version: &str) -> PathBuf {
    store_dir.join(format!("_{}@{}@{}", sanitize_name(name), version, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_entry_path_is_deterministic() {
        let store = PathBuf::from("/tmp/kiln/dependencies/node_modules");
        let first = cache_entry_path(&store, "@kiln-cli/init", "1.0.4");
        let second = cache_entry_path(&store, "@kiln-cli/init", "1.0.4");

        assert_eq!(first, second);
        assert_eq!(
            first,
            store.join("_@kiln-cli_init@1.0.4@@kiln-cli/init")
        );
    }

    #[test]
    fn test_unscoped_name() {
        let store = PathBuf::from("/store");
        assert_eq!(
            cache_entry_path(&store, "axios", "1.7.2"),
            store.join("_axios@1.7.2@axios")
        );
    }

    #[test]
    fn test_sanitize_handles_both_separators() {
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = ArtifactRef::latest("  ", "/tmp", None).unwrap_err();
        assert_eq!(err, ArtifactError::EmptyName);
    }

    #[test]
    fn test_package_root_without_store() {
        let artifact = ArtifactRef::latest("init", "/work/local-init", None).unwrap();
        assert!(!artifact.is_cached());
        assert!(artifact.cache_entry().is_none());
        assert_eq!(artifact.package_root(), PathBuf::from("/work/local-init"));
    }

    #[test]
    fn test_package_root_follows_pinned_version() {
        let mut artifact =
            ArtifactRef::latest("init", "/home/u/.kiln/dependencies", Some("/s".into())).unwrap();
        artifact.pin_version("2.1.0");

        assert!(!artifact.is_latest());
        assert_eq!(artifact.package_root(), PathBuf::from("/s/_init@2.1.0@init"));
    }
}
