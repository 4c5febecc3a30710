/// In-memory command history
///
/// Groups command uses by command text. The history is the single writer
/// for its records: resolving marks needs `&mut self`.

use crate::core::command_use::CommandUse;
use crate::core::mark::MarkLookup;
use std::collections::HashMap;

/// All recorded uses of one command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandHistoryEntry {
    command: String,
    uses: Vec<CommandUse>,
}

impl CommandHistoryEntry {
    fn new(command: String) -> Self {
        Self {
            command,
            uses: Vec::new(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Uses in the order they were added
    pub fn uses(&self) -> &[CommandUse] {
        &self.uses
    }

    pub fn use_count(&self) -> usize {
        self.uses.len()
    }

    /// Time of the most recent use
    pub fn last_used(&self) -> Option<f64> {
        self.uses.iter().map(CommandUse::time).reduce(f64::max)
    }
}

/// Outcome of resolving marks across a history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    pub resolved: usize,
    pub unresolved: usize,
}

#[derive(Debug, Default, Clone)]
pub struct CommandHistory {
    entries: HashMap<String, CommandHistoryEntry>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a use under `command`. Blank commands are ignored.
    pub fn add_use(&mut self, command: &str, command_use: CommandUse) {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return;
        }

        self.entries
            .entry(trimmed.to_string())
            .or_insert_with(|| CommandHistoryEntry::new(trimmed.to_string()))
            .uses
            .push(command_use);
    }

    pub fn entry(&self, command: &str) -> Option<&CommandHistoryEntry> {
        self.entries.get(command.trim())
    }

    /// Entries, most recently used first
    pub fn entries(&self) -> Vec<&CommandHistoryEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            b.last_used()
                .partial_cmp(&a.last_used())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.command.cmp(&b.command))
        });
        entries
    }

    /// Number of distinct commands
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind every unresolved use whose mark can be found
    pub fn resolve_marks<L: MarkLookup + ?Sized>(&mut self, lookup: &L) -> ResolveSummary {
        let mut summary = ResolveSummary::default();

        for use_ in self.entries.values_mut().flat_map(|e| e.uses.iter_mut()) {
            if use_.resolve(lookup) {
                summary.resolved += 1;
            } else {
                summary.unresolved += 1;
            }
        }

        tracing::debug!(
            resolved = summary.resolved,
            unresolved = summary.unresolved,
            "resolved command use marks"
        );
        summary
    }

    pub fn unresolved_count(&self) -> usize {
        self.entries
            .values()
            .flat_map(|e| e.uses.iter())
            .filter(|u| !u.is_resolved())
            .count()
    }

    /// Keep only the `max_per_command` most recently added uses of each
    /// command. Storage trims by insertion order too, so the two agree even
    /// when recorded times go backwards.
    pub fn truncate_uses(&mut self, max_per_command: usize) {
        for entry in self.entries.values_mut() {
            if entry.uses.len() > max_per_command {
                let excess = entry.uses.len() - max_per_command;
                entry.uses.drain(..excess);
            }
        }
        self.entries.retain(|_, e| !e.uses.is_empty());
    }
}
