use std::collections::BTreeMap;
use thiserror::Error;

/// Artifact implementing `kiln init`.
pub const INIT_ARTIFACT: &str = "@kiln-cli/init";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandTableError {
    #[error("Command name must not be empty")]
    EmptyCommand,
    #[error("Command '{0}' is mapped to an empty artifact name")]
    EmptyArtifact(String),
    #[error("Command '{0}' is registered twice")]
    Duplicate(String),
}

/// Which artifact implements which command.
///
/// Entries are validated when registered, so a bad table fails at startup
/// rather than on first dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTable {
    entries: BTreeMap<String, String>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the commands kiln ships.
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("init".to_string(), INIT_ARTIFACT.to_string());
        Self { entries }
    }

    /// Built-in commands with `overrides` applied on top.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self, CommandTableError> {
        let mut table = Self::new();
        let mut merged = Self::builtin().entries;
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

        for (command, artifact) in merged {
            table.register(command, artifact)?;
        }
        Ok(table)
    }

    pub fn register(
        &mut self,
        command: impl Into<String>,
        artifact: impl Into<String>,
    ) -> Result<(), CommandTableError> {
        let command = command.into();
        let artifact = artifact.into();

        if command.trim().is_empty() {
            return Err(CommandTableError::EmptyCommand);
        }
        if artifact.trim().is_empty() {
            return Err(CommandTableError::EmptyArtifact(command));
        }
        if self.entries.contains_key(&command) {
            return Err(CommandTableError::Duplicate(command));
        }

        self.entries.insert(command, artifact);
        Ok(())
    }

    pub fn artifact_for(&self, command: &str) -> Option<&str> {
        self.entries.get(command).map(String::as_str)
    }

    pub fn commands(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, a)| (c.as_str(), a.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_maps_init() {
        let table = CommandTable::builtin();
        assert_eq!(table.artifact_for("init"), Some(INIT_ARTIFACT));
        assert_eq!(table.artifact_for("deploy"), None);
    }

    #[test]
    fn test_registration_is_validated() {
        let mut table = CommandTable::new();

        assert_eq!(table.register(" ", "x"), Err(CommandTableError::EmptyCommand));
        assert_eq!(
            table.register("add", ""),
            Err(CommandTableError::EmptyArtifact("add".to_string()))
        );
        table.register("add", "@kiln-cli/add").unwrap();
        assert_eq!(
            table.register("add", "@other/add"),
            Err(CommandTableError::Duplicate("add".to_string()))
        );
    }

    #[test]
    fn test_overrides_replace_builtin() {
        let mut overrides = BTreeMap::new();
        overrides.insert("init".to_string(), "@acme/init".to_string());
        overrides.insert("lint".to_string(), "@acme/lint".to_string());

        let table = CommandTable::with_overrides(&overrides).unwrap();
        assert_eq!(table.artifact_for("init"), Some("@acme/init"));
        assert_eq!(table.commands().count(), 2);

        overrides.insert("broken".to_string(), String::new());
        assert!(CommandTable::with_overrides(&overrides).is_err());
    }
}
