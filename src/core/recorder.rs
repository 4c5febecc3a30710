// Records command uses: checks the command text, builds the record from the
// live mark, persists its serialized form and adds it to the history.

use crate::config::Config;
use crate::core::command_use::CommandUse;
use crate::core::history::CommandHistory;
use crate::core::mark::ScreenMark;
use crate::db::{CommandUseInput, Database};
use crate::error::{CommandUseError, Result};
use regex::Regex;
use std::sync::Arc;

// Stuff we definitely shouldn't keep in history
const SENSITIVE_PATTERNS: &[&str] = &[
    r"password\s*=",
    r"passwd\s*=",
    r"token\s*=",
    r"api[_-]?key\s*=",
    r"secret\s*=",
    r"bearer\s+",
    r"--password",
    r"--token",
];

/// Strip NUL bytes and collapse runs of whitespace.
///
/// This is the key uses are stored under, so lookups should go through it too.
pub fn normalize_command(command: &str) -> String {
    command
        .replace('\0', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct Recorder {
    db: Arc<Database>,
    sensitive_regex: Vec<Regex>,
    max_command_length: usize,
    max_uses_per_command: usize,
}

impl Recorder {
    pub fn new(db: Arc<Database>, config: &Config) -> Self {
        let sensitive_regex = SENSITIVE_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self {
            db,
            sensitive_regex,
            max_command_length: config.max_command_length,
            max_uses_per_command: config.max_uses_per_command,
        }
    }

    /// Record that `command` just ran in `directory`, with output at `mark`.
    ///
    /// The record goes to the database first; the history only sees it once
    /// it is stored. Both keep the most recently added uses when trimming.
    pub async fn record(
        &self,
        history: &mut CommandHistory,
        command: &str,
        directory: Option<String>,
        mark: Option<&Arc<ScreenMark>>,
    ) -> Result<CommandUse> {
        let sanitized = self.sanitize_command(command);
        self.validate_command(&sanitized)?;

        let command_use = CommandUse::now(directory.filter(|d| !d.is_empty()), mark);
        let input = CommandUseInput {
            command: sanitized.clone(),
            use_value: serde_json::to_string(&command_use.serialized_value())?,
        };

        let id = self.db.insert_command_use(input).await?;
        history.add_use(&sanitized, command_use.clone());
        history.truncate_uses(self.max_uses_per_command);

        // The use is stored either way; a failed trim only leaves extra rows
        // behind for the next record to remove.
        match self
            .db
            .trim_command_uses(&sanitized, self.max_uses_per_command as i64)
            .await
        {
            Ok(trimmed) => tracing::debug!(id, command = %sanitized, trimmed, "recorded command use"),
            Err(e) => tracing::warn!(id, command = %sanitized, error = %e, "failed to trim old command uses"),
        }

        Ok(command_use)
    }

    fn validate_command(&self, command: &str) -> Result<()> {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return Err(CommandUseError::InvalidCommand("empty command".to_string()));
        }

        if trimmed.len() > self.max_command_length {
            return Err(CommandUseError::CommandTooLong(self.max_command_length));
        }

        if self.contains_sensitive_data(trimmed) {
            return Err(CommandUseError::SensitiveData);
        }

        Ok(())
    }

    fn sanitize_command(&self, command: &str) -> String {
        normalize_command(command)
    }

    fn contains_sensitive_data(&self, command: &str) -> bool {
        let lowercase = command.to_lowercase();

        self.sensitive_regex
            .iter()
            .any(|regex| regex.is_match(&lowercase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_config(max_uses: usize) -> Config {
        Config {
            db_path: PathBuf::from(":memory:"),
            max_command_length: 100,
            max_uses_per_command: max_uses,
        }
    }

    async fn create_test_recorder(max_uses: usize) -> (Recorder, Arc<Database>) {
        let db = Arc::new(Database::new_test().await.unwrap());
        (Recorder::new(Arc::clone(&db), &test_config(max_uses)), db)
    }

    #[tokio::test]
    async fn test_record_persists_serialized_value() {
        let (recorder, db) = create_test_recorder(10).await;
        let mut history = CommandHistory::new();
        let mark = Arc::new(ScreenMark::with_guid("g-live", 12));

        let use_ = recorder
            .record(&mut history, "cargo   test", Some("/src".to_string()), Some(&mark))
            .await
            .unwrap();

        assert!(use_.is_resolved());
        assert_eq!(use_.mark_guid(), Some("g-live"));

        let stored = db.get_command_uses(Some("cargo test")).await.unwrap();
        assert_eq!(stored.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&stored[0].use_value).unwrap();
        assert_eq!(value, use_.serialized_value());

        assert_eq!(history.entry("cargo test").unwrap().use_count(), 1);
    }

    #[tokio::test]
    async fn test_record_without_mark_or_directory() {
        let (recorder, _db) = create_test_recorder(10).await;
        let mut history = CommandHistory::new();

        let use_ = recorder
            .record(&mut history, "make", Some(String::new()), None)
            .await
            .unwrap();

        assert!(use_.directory().is_none());
        assert!(use_.mark_guid().is_none());
        assert!(!use_.is_resolved());
    }

    #[tokio::test]
    async fn test_record_empty_command() {
        let (recorder, _db) = create_test_recorder(10).await;
        let mut history = CommandHistory::new();

        let result = recorder.record(&mut history, "   ", None, None).await;

        assert!(matches!(result, Err(CommandUseError::InvalidCommand(_))));
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_record_nul_only_command() {
        let (recorder, db) = create_test_recorder(10).await;
        let mut history = CommandHistory::new();

        let result = recorder.record(&mut history, "\0\0", None, None).await;

        assert!(matches!(result, Err(CommandUseError::InvalidCommand(_))));
        assert!(history.is_empty());
        assert_eq!(db.stats().await.unwrap().total_uses, 0);

        let result = recorder.record(&mut history, " \0 \t\0", None, None).await;
        assert!(matches!(result, Err(CommandUseError::InvalidCommand(_))));
    }

    #[test]
    fn test_normalize_command() {
        assert_eq!(normalize_command("cargo  test"), "cargo test");
        assert_eq!(normalize_command("\tgit\0  status \n"), "git status");
        assert_eq!(normalize_command("\0\0"), "");
    }

    #[tokio::test]
    async fn test_trim_agrees_with_database_order() {
        let (recorder, db) = create_test_recorder(2).await;
        let mut history = CommandHistory::new();

        // Pre-existing rows carry times later than anything recorded now,
        // as if the clock had gone backwards since.
        for t in [4_000_000_000.0, 4_000_000_001.0] {
            let use_ = CommandUse::new(t, None, None);
            db.insert_command_use(CommandUseInput {
                command: "make".to_string(),
                use_value: serde_json::to_string(&use_.serialized_value()).unwrap(),
            })
            .await
            .unwrap();
            history.add_use("make", use_);
        }

        let recorded = recorder.record(&mut history, "make", None, None).await.unwrap();

        let stored: Vec<CommandUse> = db
            .get_command_uses(Some("make"))
            .await
            .unwrap()
            .iter()
            .map(|row| CommandUse::from_serialized_str(&row.use_value).unwrap())
            .collect();
        let in_memory = history.entry("make").unwrap().uses();

        assert_eq!(stored.len(), 2);
        assert_eq!(in_memory.len(), 2);
        for (a, b) in stored.iter().zip(in_memory) {
            assert_eq!(a.time(), b.time());
        }
        assert_eq!(in_memory[1].time(), recorded.time());
    }

    #[tokio::test]
    async fn test_lookup_key_matches_stored_key() {
        let (recorder, db) = create_test_recorder(10).await;
        let mut history = CommandHistory::new();

        recorder.record(&mut history, "cargo   test", None, None).await.unwrap();

        let key = normalize_command("cargo  test");
        assert_eq!(db.get_command_uses(Some(&key)).await.unwrap().len(), 1);
        assert!(history.entry(&key).is_some());
    }

    #[tokio::test]
    async fn test_record_sensitive_command() {
        let (recorder, db) = create_test_recorder(10).await;
        let mut history = CommandHistory::new();

        let result = recorder
            .record(&mut history, "mysql -u root --password=secret123", None, None)
            .await;

        assert!(matches!(result, Err(CommandUseError::SensitiveData)));
        assert_eq!(db.stats().await.unwrap().total_uses, 0);
    }

    #[tokio::test]
    async fn test_command_too_long() {
        let (recorder, _db) = create_test_recorder(10).await;
        let mut history = CommandHistory::new();

        let long_cmd = "a".repeat(101);
        let result = recorder.record(&mut history, &long_cmd, None, None).await;

        assert!(matches!(result, Err(CommandUseError::CommandTooLong(100))));
    }

    #[tokio::test]
    async fn test_record_trims_old_uses() {
        let (recorder, db) = create_test_recorder(2).await;
        let mut history = CommandHistory::new();

        for _ in 0..4 {
            recorder.record(&mut history, "git pull", None, None).await.unwrap();
        }

        assert_eq!(db.get_command_uses(Some("git pull")).await.unwrap().len(), 2);
        assert_eq!(history.entry("git pull").unwrap().use_count(), 2);
    }

    #[tokio::test]
    async fn test_sanitize_and_sensitive_checks() {
        let (recorder, _db) = create_test_recorder(10).await;

        assert_eq!(recorder.sanitize_command("  npm    test   "), "npm test");
        assert!(!recorder.sanitize_command("cmd\0with\0nulls").contains('\0'));

        assert!(recorder.contains_sensitive_data("export API_KEY=abc123"));
        assert!(recorder.contains_sensitive_data("curl -H 'Authorization: Bearer abc'"));
        assert!(!recorder.contains_sensitive_data("npm install"));
    }
}
