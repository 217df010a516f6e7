use infrastructure::InstallerTemplate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Cache target below the kiln home directory.
pub const CACHE_DIR: &str = "dependencies";
/// Module store below the cache target.
pub const STORE_DIR: &str = "node_modules";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecMode {
    /// Spawn the entry file as a child process.
    #[default]
    Isolated,
    /// Call the entry function linked into this binary.
    InProcess,
}

/// Everything the dispatcher needs to know about the environment.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// `<home>/.kiln`
    pub kiln_home: PathBuf,
    /// Local artifact directory; disables caching when set.
    pub target_path: Option<PathBuf>,
    pub mode: ExecMode,
    pub registry: String,
    pub registry_timeout: Duration,
    pub installer: InstallerTemplate,
    /// Entry file extension to interpreter program, e.g. `js -> node`.
    pub interpreters: BTreeMap<String, String>,
    /// Forwarded to isolated children as `KILN_LOG_LEVEL`.
    pub log_level: Option<String>,
}

impl DispatchSettings {
    pub fn new(kiln_home: impl Into<PathBuf>) -> Self {
        Self {
            kiln_home: kiln_home.into(),
            target_path: None,
            mode: ExecMode::default(),
            registry: "npm".to_string(),
            registry_timeout: Duration::from_secs(30),
            installer: InstallerTemplate::default(),
            interpreters: default_interpreters(),
            log_level: None,
        }
    }

    pub fn cache_target(&self) -> PathBuf {
        self.kiln_home.join(CACHE_DIR)
    }

    pub fn store_dir(&self) -> PathBuf {
        self.cache_target().join(STORE_DIR)
    }

    /// `(target_root, store_dir)` for a dispatch.
    pub fn artifact_location(&self) -> (PathBuf, Option<PathBuf>) {
        match self.target_path.as_deref() {
            Some(path) => (path.to_path_buf(), None),
            None => (self.cache_target(), Some(self.store_dir())),
        }
    }
}

pub fn default_interpreters() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for ext in ["js", "cjs", "mjs"] {
        map.insert(ext.to_string(), "node".to_string());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_location_is_cached() {
        let settings = DispatchSettings::new("/home/u/.kiln");
        let (target, store) = settings.artifact_location();

        assert_eq!(target, PathBuf::from("/home/u/.kiln/dependencies"));
        assert_eq!(
            store,
            Some(PathBuf::from("/home/u/.kiln/dependencies/node_modules"))
        );
    }

    #[test]
    fn test_override_disables_cache() {
        let mut settings = DispatchSettings::new("/home/u/.kiln");
        settings.target_path = Some(PathBuf::from("/work/init"));

        assert_eq!(
            settings.artifact_location(),
            (PathBuf::from("/work/init"), None)
        );
    }

    #[test]
    fn test_script_entries_run_under_node() {
        let settings = DispatchSettings::new("/k");

        assert_eq!(settings.interpreters.get("js").map(String::as_str), Some("node"));
        assert!(!settings.interpreters.contains_key("rs"));
    }
}
