use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Package descriptor every artifact ships at its root.
pub const DESCRIPTOR_FILE: &str = "package.json";

#[derive(Error, Debug)]
pub enum EntryError {
    #[error("Failed to read package descriptor {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse package descriptor {path}: {source}")]
    Descriptor {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The parts of a package descriptor kiln reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Entry file, relative to the descriptor's directory.
    #[serde(default)]
    pub main: Option<String>,
}

/// Locates the entry file of a materialized artifact.
pub struct EntryResolver;

impl EntryResolver {
    /// Absolute, forward-slash path of the entry file declared by the nearest
    /// descriptor at or above `root`.
    ///
    /// `Ok(None)` means there is nothing to execute: no descriptor, or one
    /// without a `main` field.
    pub fn resolve(root: &Path) -> Result<Option<PathBuf>, EntryError> {
        Self::resolve_within(root, None)
    }

    /// Like [`resolve`](Self::resolve), but the search never climbs above
    /// `ceiling`.
    pub fn resolve_within(
        root: &Path,
        ceiling: Option<&Path>,
    ) -> Result<Option<PathBuf>, EntryError> {
        let Some(dir) = Self::find_package_dir_within(root, ceiling) else {
            tracing::debug!("no {} at or above {}", DESCRIPTOR_FILE, root.display());
            return Ok(None);
        };

        let descriptor = Self::read_descriptor(&dir)?;
        let Some(main) = descriptor.main.filter(|m| !m.trim().is_empty()) else {
            tracing::debug!("descriptor in {} declares no entry", dir.display());
            return Ok(None);
        };

        let entry = normalize(&absolute(&dir).join(main));
        Ok(Some(PathBuf::from(format_path(&entry))))
    }

    /// Nearest directory at or above `start` holding a descriptor.
    pub fn find_package_dir(start: &Path) -> Option<PathBuf> {
        Self::find_package_dir_within(start, None)
    }

    pub fn find_package_dir_within(start: &Path, ceiling: Option<&Path>) -> Option<PathBuf> {
        if !start.exists() {
            return None;
        }

        let ceiling = ceiling.map(|c| normalize(&absolute(c)));
        let mut current = normalize(&absolute(start));
        loop {
            if current.join(DESCRIPTOR_FILE).is_file() {
                return Some(current);
            }
            if ceiling.as_deref() == Some(current.as_path()) || !current.pop() {
                break;
            }
        }
        None
    }

    pub fn read_descriptor(dir: &Path) -> Result<PackageDescriptor, EntryError> {
        let path = dir.join(DESCRIPTOR_FILE);
        let content = fs::read_to_string(&path).map_err(|source| EntryError::Io {
            path: path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| EntryError::Descriptor { path, source })
    }
}

/// Render a path with `/` separators regardless of host platform.
pub fn format_path(path: &Path) -> String {
    let rendered = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        rendered.into_owned()
    } else {
        rendered.replace('\\', "/")
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Lexically resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
