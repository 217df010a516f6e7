pub mod entities;
pub mod ports;
pub mod system;
pub mod wire;

pub use entities::{ArtifactRef, Entrypoint, InvocationEnvelope};
pub use ports::installer::{InstallError, InstallRequest, Installer};
pub use ports::registry::{RegistryClient, RegistryError};
pub use system::{ArtifactCache, CacheError, EntryResolver, VersionError, VersionResolver};
pub use wire::EnvelopeError;
