/// Database module for command-use
///
/// Stores serialized command uses in SQLite via sqlx.

pub mod connection;
pub mod models;
pub mod queries;

pub use connection::{Database, DatabaseStats};
pub use models::*;
