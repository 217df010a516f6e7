use semver::Version;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::api::context::CommandContext;
use crate::api::traits::Command;

/// Version of the kiln runtime commands are checked against.
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Created,
    VersionChecked,
    Initialized,
    Executed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Created => "created",
            Stage::VersionChecked => "version-checked",
            Stage::Initialized => "initialized",
            Stage::Executed => "executed",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("kiln {found} is too old for this command (requires >= {required})")]
    UnsupportedRuntime { required: String, found: String },
    #[error("Cannot move from {from} to {to}")]
    OutOfOrder { from: Stage, to: Stage },
    #[error("{0}")]
    Init(anyhow::Error),
    #[error("{0}")]
    Exec(anyhow::Error),
}

impl LifecycleError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            LifecycleError::InvalidArguments(_) => 2,
            _ => 1,
        }
    }
}

/// Drives a [`Command`] through `Created -> VersionChecked -> Initialized ->
/// Executed`. Stages only move forward, one step at a time.
pub struct CommandLifecycle<C> {
    command: C,
    argv: Vec<Value>,
    stage: Stage,
    runtime: String,
}

impl<C: Command> CommandLifecycle<C> {
    /// Takes the argument list as received; it must be a non-empty array.
    pub fn new(command: C, argv: Value) -> Result<Self, LifecycleError> {
        match argv {
            Value::Array(items) => Self::from_args(command, items),
            Value::Null => Err(LifecycleError::InvalidArguments(
                "argument list is missing".to_string(),
            )),
            other => Err(LifecycleError::InvalidArguments(format!(
                "argument list must be an array, got {other}"
            ))),
        }
    }

    pub fn from_args(command: C, argv: Vec<Value>) -> Result<Self, LifecycleError> {
        if argv.is_empty() {
            return Err(LifecycleError::InvalidArguments(
                "argument list is empty".to_string(),
            ));
        }

        Ok(Self {
            command,
            argv,
            stage: Stage::Created,
            runtime: RUNTIME_VERSION.to_string(),
        })
    }

    /// Check against another runtime version than the one compiled in.
    pub fn with_runtime(mut self, version: impl Into<String>) -> Self {
        self.runtime = version.into();
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn command(&self) -> &C {
        &self.command
    }

    pub fn check_version(&mut self) -> Result<(), LifecycleError> {
        self.advance(Stage::Created, Stage::VersionChecked)?;

        let required = self.command.min_runtime_version().to_string();
        let unsupported = || LifecycleError::UnsupportedRuntime {
            required: required.clone(),
            found: self.runtime.clone(),
        };
        let min = Version::parse(&required).map_err(|_| unsupported())?;
        let found = Version::parse(&self.runtime).map_err(|_| unsupported())?;
        if found < min {
            return Err(unsupported());
        }

        self.stage = Stage::VersionChecked;
        Ok(())
    }

    pub fn init(&mut self) -> Result<(), LifecycleError> {
        self.advance(Stage::VersionChecked, Stage::Initialized)?;

        let ctx = CommandContext::from_argv(std::mem::take(&mut self.argv));
        self.command.init(&ctx).map_err(LifecycleError::Init)?;

        self.stage = Stage::Initialized;
        Ok(())
    }

    pub fn exec(&mut self) -> Result<(), LifecycleError> {
        self.advance(Stage::Initialized, Stage::Executed)?;
        self.command.exec().map_err(LifecycleError::Exec)?;

        self.stage = Stage::Executed;
        Ok(())
    }

    /// Run every remaining stage.
    pub fn run(mut self) -> Result<C, LifecycleError> {
        self.check_version()?;
        self.init()?;
        self.exec()?;
        Ok(self.command)
    }

    /// Run every stage and turn a failure into one logged message and an
    /// exit code.
    pub fn run_reported(self) -> i32 {
        match self.run() {
            Ok(_) => 0,
            Err(err) => report(&err),
        }
    }

    fn advance(&self, expected: Stage, to: Stage) -> Result<(), LifecycleError> {
        if self.stage != expected {
            return Err(LifecycleError::OutOfOrder {
                from: self.stage,
                to,
            });
        }
        Ok(())
    }
}

/// Log `err` once and return its exit code. The cause chain is only shown
/// at debug level.
pub fn report(err: &LifecycleError) -> i32 {
    tracing::error!("{}", err);
    match err {
        LifecycleError::Init(source) | LifecycleError::Exec(source) => {
            tracing::debug!("{:?}", source)
        }
        _ => tracing::debug!("{:?}", err),
    }
    err.exit_code()
}

/// Run `command` with `argv`; the usual body of a plugin entry function.
pub fn run<C: Command>(command: C, argv: Vec<Value>) -> i32 {
    match CommandLifecycle::from_args(command, argv) {
        Ok(lifecycle) => lifecycle.run_reported(),
        Err(err) => report(&err),
    }
}
