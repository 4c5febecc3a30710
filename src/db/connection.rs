/// Database connection management with connection pooling

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Maximum number of database connections in the pool
const MAX_CONNECTIONS: u32 = 5;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl Database {
    /// Open (or create) the database at `db_path`
    ///
    /// # Examples
    /// ```no_run
    /// use command_use_lib::db::Database;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Database::new("/tmp/command-use/history.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let db = Self {
            pool: Arc::new(pool),
            db_path,
        };

        db.initialize_schema().await?;
        tracing::debug!(path = %db.db_path.display(), "opened command use database");

        Ok(db)
    }

    /// Fresh in-memory database for tests
    #[cfg(test)]
    pub async fn new_test() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.create_if_missing(true);

        // One connection: every in-memory connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self {
            pool: Arc::new(pool),
            db_path: PathBuf::from(":memory:"),
        };

        db.initialize_schema().await?;

        Ok(db)
    }

    async fn initialize_schema(&self) -> Result<()> {
        let schema = include_str!("../../database/schema.sql");

        // SQLite executes one statement per query
        for statement in schema.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed).execute(self.pool.as_ref()).await?;
            }
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Close all connections in the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn stats(&self) -> Result<DatabaseStats> {
        let total_uses: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM command_uses")
            .fetch_one(self.pool.as_ref())
            .await?;

        let distinct_commands: (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT command) FROM command_uses")
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(DatabaseStats {
            total_uses: total_uses.0,
            distinct_commands: distinct_commands.0,
            pool_size: self.pool.size(),
            idle_connections: self.pool.num_idle(),
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub total_uses: i64,
    pub distinct_commands: i64,
    pub pool_size: u32,
    pub idle_connections: usize,
}
