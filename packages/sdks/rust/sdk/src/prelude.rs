pub use crate::api::context::CommandContext;
pub use crate::api::lifecycle::{CommandLifecycle, LifecycleError};
pub use crate::api::traits::Command;
pub use crate::Entrypoint;
pub use serde_json::{json, Value};
