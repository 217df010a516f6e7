//! Facade over the kiln layers so the CLI can depend on a single crate.

pub use application;
pub use domain;
pub use infrastructure;
