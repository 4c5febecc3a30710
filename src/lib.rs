/// command-use library
///
/// Command history records that keep a reference to the terminal mark of
/// their output, persist without it, and find it again after a restart.

pub mod config;
pub mod core;
pub mod db;
pub mod error;

// Re-exports for convenience
pub use config::Config;
pub use crate::core::{CommandHistory, CommandUse, MarkLookup, MarkRegistry, MarkState, ScreenMark};
pub use db::Database;
pub use error::{CommandUseError, Result};
