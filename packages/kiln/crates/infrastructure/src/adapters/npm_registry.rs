use async_trait::async_trait;
use domain::ports::registry::{RegistryClient, RegistryError};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const NPM_REGISTRY: &str = "https://registry.npmjs.org/";
pub const NPM_MIRROR_REGISTRY: &str = "https://registry.npmmirror.com/";

/// Abbreviated metadata is enough to list versions and much smaller.
const ACCEPT_METADATA: &str = "application/vnd.npm.install-v1+json; q=1.0, application/json; q=0.8";

#[derive(Error, Debug)]
pub enum RegistryUrlError {
    #[error("Invalid registry URL '{url}': {source}")]
    Invalid {
        url: String,
        source: url::ParseError,
    },
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct PackageDocument {
    #[serde(default)]
    versions: serde_json::Map<String, serde_json::Value>,
}

/// Version metadata from an npm-compatible registry.
///
/// `GET <base>/<name>` must answer 200 with a `versions` object keyed by
/// version string.
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    client: Client,
    base: Url,
}

impl NpmRegistry {
    /// `registry` is `npm`, `npmmirror` or a base URL.
    pub fn new(registry: &str, timeout: Duration) -> Result<Self, RegistryUrlError> {
        let base = resolve_registry(registry)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kiln/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: Client, base: Url) -> Self {
        Self {
            client,
            base: with_trailing_slash(base),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Metadata URL for `name`; the scope separator is percent-encoded.
    pub fn package_url(&self, name: &str) -> Result<Url, RegistryError> {
        let encoded = name.trim_start_matches('/').replace('/', "%2F");
        self.base
            .join(&encoded)
            .map_err(|err| RegistryError::InvalidResponse {
                name: name.to_string(),
                reason: format!("cannot build metadata URL: {err}"),
            })
    }
}

#[async_trait]
impl RegistryClient for NpmRegistry {
    async fn fetch_versions(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        let url = self.package_url(name)?;
        tracing::debug!("GET {}", url);

        let unavailable = |reason: String| RegistryError::Unavailable {
            name: name.to_string(),
            reason,
        };

        let res = self
            .client
            .get(url.clone())
            .header(ACCEPT, ACCEPT_METADATA)
            .send()
            .await
            .map_err(|err| unavailable(format!("request to {url} failed: {err}")))?;

        if res.status() != StatusCode::OK {
            return Err(unavailable(format!("{url} answered {}", res.status())));
        }

        let document: PackageDocument =
            res.json()
                .await
                .map_err(|err| RegistryError::InvalidResponse {
                    name: name.to_string(),
                    reason: err.to_string(),
                })?;

        Ok(document.versions.keys().cloned().collect())
    }
}

/// Map a registry alias or URL to a base URL ending in `/`.
pub fn resolve_registry(registry: &str) -> Result<Url, RegistryUrlError> {
    let raw = match registry.trim() {
        "" | "npm" => NPM_REGISTRY,
        "npmmirror" | "taobao" => NPM_MIRROR_REGISTRY,
        other => other,
    };

    Url::parse(raw)
        .map(with_trailing_slash)
        .map_err(|source| RegistryUrlError::Invalid {
            url: raw.to_string(),
            source,
        })
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_aliases() {
        assert_eq!(resolve_registry("npm").unwrap().as_str(), NPM_REGISTRY);
        assert_eq!(
            resolve_registry("npmmirror").unwrap().as_str(),
            NPM_MIRROR_REGISTRY
        );
        assert_eq!(
            resolve_registry("https://npm.example.com/registry")
                .unwrap()
                .as_str(),
            "https://npm.example.com/registry/"
        );
        assert!(resolve_registry("not a url").is_err());
    }

    #[test]
    fn test_package_url_encodes_scope() {
        let registry =
            NpmRegistry::with_client(Client::new(), Url::parse("https://r.example/npm").unwrap());

        assert_eq!(
            registry.package_url("@kiln-cli/init").unwrap().as_str(),
            "https://r.example/npm/@kiln-cli%2Finit"
        );
        assert_eq!(
            registry.package_url("axios").unwrap().as_str(),
            "https://r.example/npm/axios"
        );
    }
}
