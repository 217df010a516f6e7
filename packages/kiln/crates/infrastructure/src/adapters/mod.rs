pub mod command_installer;
pub mod npm_registry;
