pub mod installer;
pub mod registry;
