use kiln::application::settings::default_interpreters;
use kiln::application::{CommandTable, CommandTableError, DispatchSettings, ExecMode};
use kiln::infrastructure::InstallerTemplate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::error::CliError;

/// Name of the kiln directory below the user's home.
pub const DEFAULT_HOME_DIR: &str = ".kiln";
pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_REGISTRY: &str = "npm";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// `<kiln-home>/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub registry: Option<String>,
    pub registry_timeout_secs: Option<u64>,
    pub exec_mode: Option<ExecMode>,
    pub update_check: Option<bool>,
    pub log_level: Option<String>,
    pub commands: BTreeMap<String, String>,
    pub installer: Option<InstallerTemplate>,
    pub interpreters: BTreeMap<String, String>,
}

/// `KILN_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    pub kiln_home: Option<String>,
    pub target_path: Option<String>,
    pub registry: Option<String>,
    pub log_level: Option<String>,
}

impl EnvVars {
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            kiln_home: var("KILN_HOME"),
            target_path: var("KILN_TARGET_PATH"),
            registry: var("KILN_REGISTRY"),
            log_level: var("KILN_LOG_LEVEL"),
        }
    }
}

/// Command-line flags that win over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub debug: bool,
    pub target_path: Option<PathBuf>,
    pub exec_mode: Option<ExecMode>,
}

/// Resolved configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub home: PathBuf,
    pub kiln_home: PathBuf,
    pub target_path: Option<PathBuf>,
    pub registry: String,
    pub registry_timeout: Duration,
    pub exec_mode: ExecMode,
    pub update_check: bool,
    pub log_level: String,
    pub commands: BTreeMap<String, String>,
    pub installer: InstallerTemplate,
    pub interpreters: BTreeMap<String, String>,
}

impl Config {
    /// Defaults, then `~/.env`, then `config.toml`, then the environment,
    /// then `overrides`.
    pub fn load(overrides: Overrides) -> Result<Self, CliError> {
        let home = dirs::home_dir().ok_or(CliError::HomeNotFound)?;

        let dotenv_path = home.join(".env");
        if dotenv_path.exists() {
            // existing variables are not overwritten
            if let Err(err) = dotenv::from_path(&dotenv_path) {
                return Err(CliError::Config(format!(
                    "{}: {}",
                    dotenv_path.display(),
                    err
                )));
            }
        }

        Self::resolve(home, EnvVars::from_env(), overrides)
    }

    pub fn resolve(home: PathBuf, env: EnvVars, overrides: Overrides) -> Result<Self, CliError> {
        let home_dir = env.kiln_home.as_deref().unwrap_or(DEFAULT_HOME_DIR);
        let kiln_home = home.join(home_dir);
        let file = read_config_file(&kiln_home.join(CONFIG_FILE))?;

        let target_path = overrides
            .target_path
            .or_else(|| env.target_path.map(PathBuf::from))
            .map(|path| absolutize(&path));

        let log_level = if overrides.debug {
            "debug".to_string()
        } else {
            normalize_level(
                env.log_level
                    .as_deref()
                    .or(file.log_level.as_deref())
                    .unwrap_or("info"),
            )
        };

        let mut interpreters = default_interpreters();
        interpreters.extend(file.interpreters);

        Ok(Self {
            home,
            kiln_home,
            target_path,
            registry: env
                .registry
                .or(file.registry)
                .unwrap_or_else(|| DEFAULT_REGISTRY.to_string()),
            registry_timeout: Duration::from_secs(
                file.registry_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            exec_mode: overrides
                .exec_mode
                .or(file.exec_mode)
                .unwrap_or_default(),
            update_check: file.update_check.unwrap_or(true),
            log_level,
            commands: file.commands,
            installer: file.installer.unwrap_or_default(),
            interpreters,
        })
    }

    pub fn debug(&self) -> bool {
        self.log_level == "debug" || self.log_level == "trace"
    }

    pub fn command_table(&self) -> Result<CommandTable, CommandTableError> {
        CommandTable::with_overrides(&self.commands)
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        let mut settings = DispatchSettings::new(&self.kiln_home);
        settings.target_path = self.target_path.clone();
        settings.mode = self.exec_mode;
        settings.registry = self.registry.clone();
        settings.registry_timeout = self.registry_timeout;
        settings.installer = self.installer.clone();
        settings.interpreters = self.interpreters.clone();
        settings.log_level = Some(self.log_level.clone());
        settings
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, CliError> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|err| CliError::Config(format!("{}: {}", path.display(), err)))
}

/// `verbose` is accepted as an alias of `debug`.
fn normalize_level(level: &str) -> String {
    match level.trim().to_ascii_lowercase().as_str() {
        "verbose" => "debug".to_string(),
        other => other.to_string(),
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
