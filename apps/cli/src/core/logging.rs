use tracing_subscriber::EnvFilter;

/// Crates whose logs follow the configured level; everything else is `warn`.
const KILN_CRATES: &[&str] = &[
    "kiln_cli",
    "application",
    "domain",
    "infrastructure",
    "kiln_sdk",
    "kiln_plugin_init",
];

/// Install the global subscriber. `RUST_LOG`, when set, replaces `level`.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives(level)))
        .unwrap_or_else(|_| EnvFilter::new(directives("info")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}

fn directives(level: &str) -> String {
    let mut out = String::from("warn");
    for krate in KILN_CRATES {
        out.push_str(&format!(",{krate}={level}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives() {
        let d = directives("debug");
        assert!(d.starts_with("warn,"));
        assert!(d.contains("domain=debug"));
        assert!(d.contains("kiln_cli=debug"));
    }
}
