use crate::api::context::CommandContext;
use anyhow::Result;

/// The logic of one kiln command.
///
/// Driven by [`crate::CommandLifecycle`]: the runtime version is checked,
/// then `init` runs once, then `exec` runs once.
pub trait Command {
    /// Lowest kiln runtime this command supports.
    fn min_runtime_version(&self) -> &str {
        "0.1.0"
    }

    /// 1. Initialization
    /// Read and validate inputs. Nothing should be written here.
    fn init(&mut self, ctx: &CommandContext) -> Result<()>;

    /// 2. Execution
    /// Perform the command's work.
    fn exec(&mut self) -> Result<()>;
}
