/// Data models for database rows

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted command use
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredCommandUse {
    pub id: i64,
    pub command: String,
    pub use_value: String, // JSON array text
    pub recorded_at: String, // ISO 8601 format from SQLite
}

/// Input for storing a new command use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandUseInput {
    pub command: String,
    pub use_value: String,
}

/// Per-command rollup for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommandSummary {
    pub command: String,
    pub use_count: i64,
    pub last_recorded: String,
}
