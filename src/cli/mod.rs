//! CLI command handling

pub mod check;
pub mod dispatch;
pub mod output;

pub use check::*;
pub use dispatch::*;
pub use output::*;
