pub mod entry;
pub mod lock;
pub mod store;
pub mod version;

pub use entry::{format_path, EntryError, EntryResolver, PackageDescriptor};
pub use lock::CacheLock;
pub use store::{ArtifactCache, CacheError};
pub use version::{VersionError, VersionResolver};
