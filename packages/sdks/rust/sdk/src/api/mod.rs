pub mod context;
pub mod lifecycle;
pub mod traits;
