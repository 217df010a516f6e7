pub mod adapters;

pub use adapters::command_installer::{CommandInstaller, InstallerTemplate};
pub use adapters::npm_registry::{NpmRegistry, RegistryUrlError};
