pub mod command_table;
pub mod dispatch_service;
pub mod error;
pub mod in_process;
pub mod launcher;
pub mod settings;

pub use command_table::{CommandTable, CommandTableError};
pub use dispatch_service::{CommandDispatcher, DefaultDispatcher};
pub use error::DispatchError;
pub use settings::{DispatchSettings, ExecMode};
