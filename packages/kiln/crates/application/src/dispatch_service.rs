use domain::{ArtifactCache, ArtifactRef, InvocationEnvelope, Installer, RegistryClient, VersionResolver};
use infrastructure::{CommandInstaller, NpmRegistry};
use serde_json::Value;

use crate::command_table::CommandTable;
use crate::error::DispatchError;
use crate::in_process::InProcessEntries;
use crate::launcher::IsolatedLauncher;
use crate::settings::{DispatchSettings, ExecMode};

/// Dispatcher wired to an npm-compatible registry and a command installer.
pub type DefaultDispatcher = CommandDispatcher<NpmRegistry, CommandInstaller>;

/// Turns a command name into a running artifact.
///
/// In isolated mode the artifact registered for the command is brought up to
/// date in the cache (unless a local target path overrides it), its entry
/// file is resolved and run in a child process. In-process mode calls the
/// entry function linked into this binary instead; the cache is not touched,
/// since the linked code is what runs whatever version is published.
pub struct CommandDispatcher<R, I> {
    table: CommandTable,
    settings: DispatchSettings,
    registry: R,
    installer: I,
    in_process: InProcessEntries,
    launcher: IsolatedLauncher,
}

impl DefaultDispatcher {
    pub fn from_settings(
        table: CommandTable,
        settings: DispatchSettings,
    ) -> Result<Self, DispatchError> {
        let registry = NpmRegistry::new(&settings.registry, settings.registry_timeout)?;
        let installer =
            CommandInstaller::new(settings.installer.clone(), registry.base_url().as_str());
        Ok(Self::new(table, settings, registry, installer))
    }
}

impl<R: RegistryClient, I: Installer> CommandDispatcher<R, I> {
    pub fn new(table: CommandTable, settings: DispatchSettings, registry: R, installer: I) -> Self {
        let mut launcher = IsolatedLauncher::new(settings.interpreters.clone());
        if let Some(level) = settings.log_level.as_deref() {
            launcher = launcher.env("KILN_LOG_LEVEL", level);
        }

        Self {
            table,
            settings,
            registry,
            installer,
            in_process: InProcessEntries::new(),
            launcher,
        }
    }

    /// Link an entry function so the artifact can run in-process.
    pub fn link(&mut self, artifact: impl Into<String>, entry: domain::Entrypoint) {
        self.in_process.register(artifact, entry);
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Run `command` with `argv` (positional arguments, then the options
    /// object) and return its exit code.
    pub async fn dispatch(&self, command: &str, argv: Vec<Value>) -> Result<i32, DispatchError> {
        let artifact_name = self
            .table
            .artifact_for(command)
            .ok_or_else(|| DispatchError::UnknownCommand(command.to_string()))?;

        if self.settings.mode == ExecMode::InProcess {
            tracing::debug!("running linked entry of {} in-process", artifact_name);
            return self
                .in_process
                .call(artifact_name, argv)
                .ok_or_else(|| DispatchError::InProcessUnavailable(artifact_name.to_string()));
        }

        let (target_root, store_dir) = self.settings.artifact_location();
        let local = store_dir.is_none();
        let artifact = ArtifactRef::latest(artifact_name, target_root, store_dir)?;

        let mut cache = ArtifactCache::new(
            artifact,
            VersionResolver::new(&self.registry),
            &self.installer,
        );

        if local {
            tracing::debug!(
                "using local {} at {}",
                artifact_name,
                cache.artifact().target_root().display()
            );
        } else if cache.exists().await? {
            cache.update().await?;
        } else {
            cache.install().await?;
        }

        let entry = match cache.entry_file_path()? {
            Some(entry) => entry,
            None if local => {
                tracing::debug!("{} has no entry file, nothing to run", artifact_name);
                return Ok(0);
            }
            None => {
                return Err(DispatchError::EntryNotFound {
                    artifact: artifact_name.to_string(),
                    root: cache.artifact().package_root(),
                })
            }
        };
        tracing::debug!(
            "{} {} -> {}",
            artifact_name,
            cache.artifact().version(),
            entry.display()
        );

        let envelope = InvocationEnvelope::from_argv(command, argv);
        self.launcher.launch(&entry, &envelope).await
    }
}
