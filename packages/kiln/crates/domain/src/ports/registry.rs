use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry unavailable for '{name}': {reason}")]
    Unavailable { name: String, reason: String },
    #[error("Invalid registry response for '{name}': {reason}")]
    InvalidResponse { name: String, reason: String },
}

/// Source of published version metadata for artifacts.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Every version string published for `name`, in registry order.
    ///
    /// An artifact with no published versions yields an empty list.
    async fn fetch_versions(&self, name: &str) -> Result<Vec<String>, RegistryError>;
}

#[async_trait]
impl<T: RegistryClient + ?Sized> RegistryClient for Arc<T> {
    async fn fetch_versions(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        (**self).fetch_versions(name).await
    }
}

#[async_trait]
impl<T: RegistryClient + ?Sized> RegistryClient for &T {
    async fn fetch_versions(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        (**self).fetch_versions(name).await
    }
}
