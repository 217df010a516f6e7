//! # kiln SDK
//!
//! Types for writing commands that kiln resolves and runs.
//!
//! A command implements [`Command`] and exposes an entry function with the
//! [`Entrypoint`] signature. kiln either calls that function directly (when
//! the plugin is linked into the CLI) or starts the plugin binary, whose
//! `main` hands the same function to [`bootstrap::main`].
//!
//! ```rust,ignore
//! use kiln_sdk::prelude::*;
//!
//! pub fn entry(argv: Vec<Value>) -> i32 {
//!     kiln_sdk::run(MyCommand::default(), argv)
//! }
//!
//! fn main() {
//!     kiln_sdk::bootstrap::main(entry)
//! }
//! ```

pub mod api;
pub mod bootstrap;
pub mod prelude;

pub use api::context::CommandContext;
pub use api::lifecycle::{run, CommandLifecycle, LifecycleError, Stage, RUNTIME_VERSION};
pub use api::traits::Command;
pub use domain::{Entrypoint, InvocationEnvelope};
pub use serde_json;
