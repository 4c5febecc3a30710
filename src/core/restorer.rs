/// Restore path
///
/// Rebuilds a `CommandHistory` from stored rows and re-binds marks once the
/// caller has reconstructed them. Corrupt rows are skipped, never fatal.

use crate::core::command_use::CommandUse;
use crate::core::history::{CommandHistory, ResolveSummary};
use crate::core::mark::MarkLookup;
use crate::db::Database;
use crate::error::Result;
use std::sync::Arc;

/// What came back from storage
#[derive(Debug)]
pub struct RestoreReport {
    pub history: CommandHistory,
    /// Rows that could not be decoded
    pub skipped: usize,
}

pub struct Restorer {
    db: Arc<Database>,
}

impl Restorer {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Load stored uses (all, or just one command) into an unresolved history
    pub async fn restore(&self, command: Option<&str>) -> Result<RestoreReport> {
        let rows = self.db.get_command_uses(command).await?;
        let mut history = CommandHistory::new();
        let mut skipped = 0;

        for row in rows {
            let decoded = if row.command.trim().is_empty() {
                None
            } else {
                CommandUse::from_serialized_str(&row.use_value)
            };
            match decoded {
                Some(use_) => history.add_use(&row.command, use_),
                None => {
                    skipped += 1;
                    tracing::warn!(id = row.id, command = %row.command, "skipping malformed command use");
                }
            }
        }

        tracing::debug!(commands = history.len(), skipped, "restored command history");
        Ok(RestoreReport { history, skipped })
    }

    /// Restore, then bind marks found through `lookup`
    pub async fn restore_and_resolve<L: MarkLookup + ?Sized>(
        &self,
        command: Option<&str>,
        lookup: &L,
    ) -> Result<(RestoreReport, ResolveSummary)> {
        let mut report = self.restore(command).await?;
        let summary = report.history.resolve_marks(lookup);
        Ok((report, summary))
    }
}
