/// Runtime configuration
///
/// Defaults live here; a couple of environment variables can override them.

use crate::error::{CommandUseError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Overrides the database location
pub const DB_PATH_ENV: &str = "COMMAND_USE_DB";

/// Overrides how many uses are kept per command
pub const MAX_USES_ENV: &str = "COMMAND_USE_MAX_USES";

const DEFAULT_MAX_COMMAND_LENGTH: usize = 10_000;
const DEFAULT_MAX_USES_PER_COMMAND: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite file holding serialized command uses
    pub db_path: PathBuf,

    /// Longest command text the recorder accepts
    pub max_command_length: usize,

    /// Older uses beyond this count are trimmed after recording
    pub max_uses_per_command: usize,
}

impl Config {
    /// Build the config from defaults plus environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self {
            db_path: Self::default_db_path()?,
            max_command_length: DEFAULT_MAX_COMMAND_LENGTH,
            max_uses_per_command: DEFAULT_MAX_USES_PER_COMMAND,
        };
        config.apply_overrides(env::var(DB_PATH_ENV).ok(), env::var(MAX_USES_ENV).ok())?;
        Ok(config)
    }

    /// Default database location: `~/.command-use/history.db`
    pub fn default_db_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            CommandUseError::Config("Could not determine home directory".to_string())
        })?;

        Ok(home.join(".command-use").join("history.db"))
    }

    fn apply_overrides(&mut self, db_path: Option<String>, max_uses: Option<String>) -> Result<()> {
        if let Some(path) = db_path.filter(|p| !p.trim().is_empty()) {
            self.db_path = PathBuf::from(path);
        }

        if let Some(raw) = max_uses {
            let parsed = raw.trim().parse::<usize>().map_err(|_| {
                CommandUseError::Config(format!("{} must be a positive integer, got '{}'", MAX_USES_ENV, raw))
            })?;
            if parsed == 0 {
                return Err(CommandUseError::Config(format!("{} must be at least 1", MAX_USES_ENV)));
            }
            self.max_uses_per_command = parsed;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            db_path: PathBuf::from("/tmp/history.db"),
            max_command_length: DEFAULT_MAX_COMMAND_LENGTH,
            max_uses_per_command: DEFAULT_MAX_USES_PER_COMMAND,
        }
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = base();
        config
            .apply_overrides(Some("/var/lib/uses.db".to_string()), Some("5".to_string()))
            .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/uses.db"));
        assert_eq!(config.max_uses_per_command, 5);
    }

    #[test]
    fn test_blank_db_override_ignored() {
        let mut config = base();
        config.apply_overrides(Some("  ".to_string()), None).unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/history.db"));
    }

    #[test]
    fn test_bad_max_uses_rejected() {
        let mut config = base();
        let result = config.apply_overrides(None, Some("lots".to_string()));
        assert!(matches!(result, Err(CommandUseError::Config(_))));

        let result = config.apply_overrides(None, Some("0".to_string()));
        assert!(matches!(result, Err(CommandUseError::Config(_))));
    }

    #[test]
    fn test_default_path_under_home() {
        if let Ok(path) = Config::default_db_path() {
            assert!(path.ends_with(".command-use/history.db"));
        }
    }
}
