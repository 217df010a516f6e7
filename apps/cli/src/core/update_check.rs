use kiln::domain::VersionResolver;
use kiln::infrastructure::NpmRegistry;
use semver::Version;
use std::time::Duration;

use crate::core::config::Config;
use crate::ui::Theme;

/// Name kiln itself is published under.
pub const SELF_PACKAGE: &str = "@kiln-cli/core";
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Keep the check from holding up the actual command.
const CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// Warn when a newer kiln is published. Never fails the command.
pub async fn notify(config: &Config) {
    let registry = match NpmRegistry::new(&config.registry, config.registry_timeout.min(CHECK_TIMEOUT)) {
        Ok(registry) => registry,
        Err(err) => {
            tracing::debug!("skipping update check: {}", err);
            return;
        }
    };

    let resolver = VersionResolver::new(registry);
    match resolver.resolve_satisfying(SELF_PACKAGE, CURRENT_VERSION).await {
        Ok(Some(latest)) if is_newer(&latest, CURRENT_VERSION) => {
            let _ = cliclack::log::warning(format!(
                "kiln {} is available (current {}). Upgrade with: {}",
                Theme::success(&latest),
                CURRENT_VERSION,
                Theme::primary("cargo install kiln-cli")
            ));
        }
        Ok(_) => tracing::debug!("kiln {} is up to date", CURRENT_VERSION),
        Err(err) => tracing::debug!("update check failed: {}", err),
    }
}

fn is_newer(candidate: &str, current: &str) -> bool {
    match (Version::parse(candidate), Version::parse(current)) {
        (Ok(candidate), Ok(current)) => candidate > current,
        _ => false,
    }
}
