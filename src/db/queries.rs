/// SQL query functions for command use storage

use crate::db::models::*;
use crate::db::Database;
use crate::error::Result;
use sqlx::Row;

impl Database {
    /// Store one serialized command use
    ///
    /// # Returns
    /// * `Ok(i64)` - The row ID
    pub async fn insert_command_use(&self, input: CommandUseInput) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO command_uses (command, use_value)
            VALUES (?, ?)
            RETURNING id
            "#,
        )
        .bind(&input.command)
        .bind(&input.use_value)
        .fetch_one(self.pool())
        .await?;

        Ok(result.get(0))
    }

    /// Stored uses in insertion order, optionally for a single command
    pub async fn get_command_uses(&self, command: Option<&str>) -> Result<Vec<StoredCommandUse>> {
        let uses = if let Some(command) = command {
            sqlx::query_as::<_, StoredCommandUse>(
                "SELECT * FROM command_uses WHERE command = ? ORDER BY id ASC",
            )
            .bind(command)
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query_as::<_, StoredCommandUse>("SELECT * FROM command_uses ORDER BY id ASC")
                .fetch_all(self.pool())
                .await?
        };

        Ok(uses)
    }

    /// Commands ordered by their latest use
    pub async fn get_recent_commands(&self, limit: i64) -> Result<Vec<CommandSummary>> {
        let commands = sqlx::query_as::<_, CommandSummary>(
            r#"
            SELECT command, COUNT(*) AS use_count, MAX(recorded_at) AS last_recorded
            FROM command_uses
            GROUP BY command
            ORDER BY MAX(id) DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(commands)
    }

    /// Delete every use of a command
    pub async fn delete_command_uses(&self, command: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM command_uses WHERE command = ?")
            .bind(command)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Keep only the newest `keep` uses of a command
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of rows removed
    pub async fn trim_command_uses(&self, command: &str, keep: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM command_uses
            WHERE command = ?
              AND id NOT IN (
                SELECT id FROM command_uses WHERE command = ? ORDER BY id DESC LIMIT ?
              )
            "#,
        )
        .bind(command)
        .bind(command)
        .bind(keep)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(command: &str, value: &str) -> CommandUseInput {
        CommandUseInput {
            command: command.to_string(),
            use_value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = Database::new_test().await.unwrap();

        let id = db
            .insert_command_use(input("make", "[1.0,\"/src\",\"g1\"]"))
            .await
            .unwrap();
        assert!(id > 0);

        let uses = db.get_command_uses(Some("make")).await.unwrap();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].use_value, "[1.0,\"/src\",\"g1\"]");
        assert!(db.get_command_uses(Some("other")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_in_insertion_order() {
        let db = Database::new_test().await.unwrap();
        db.insert_command_use(input("a", "[1]")).await.unwrap();
        db.insert_command_use(input("b", "[2]")).await.unwrap();
        db.insert_command_use(input("a", "[3]")).await.unwrap();

        let values: Vec<_> = db
            .get_command_uses(None)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.use_value)
            .collect();
        assert_eq!(values, vec!["[1]", "[2]", "[3]"]);
    }

    #[tokio::test]
    async fn test_recent_commands() {
        let db = Database::new_test().await.unwrap();
        db.insert_command_use(input("a", "[1]")).await.unwrap();
        db.insert_command_use(input("b", "[2]")).await.unwrap();
        db.insert_command_use(input("a", "[3]")).await.unwrap();

        let recent = db.get_recent_commands(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].command, "a");
        assert_eq!(recent[0].use_count, 2);
        assert_eq!(recent[1].command, "b");
    }

    #[tokio::test]
    async fn test_trim_and_delete() {
        let db = Database::new_test().await.unwrap();
        for i in 0..5 {
            db.insert_command_use(input("ls", &format!("[{}]", i))).await.unwrap();
        }
        db.insert_command_use(input("pwd", "[9]")).await.unwrap();

        let removed = db.trim_command_uses("ls", 2).await.unwrap();
        assert_eq!(removed, 3);

        let kept: Vec<_> = db
            .get_command_uses(Some("ls"))
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.use_value)
            .collect();
        assert_eq!(kept, vec!["[3]", "[4]"]);

        assert_eq!(db.delete_command_uses("ls").await.unwrap(), 2);
        let stats = db.stats().await.unwrap();
        assert_eq!(stats.total_uses, 1);
        assert_eq!(stats.distinct_commands, 1);
    }
}
