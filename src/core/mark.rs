// Terminal buffer marks, as far as command history needs to know them.
//
// The buffer owns marks through `Arc`; history only ever holds `Weak`
// handles or the mark's guid.

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A position in the terminal output buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenMark {
    guid: String,
    /// Absolute line (scrollback length + cursor row) where the mark sits
    absolute_line: usize,
}

impl ScreenMark {
    /// Create a mark with a fresh guid
    pub fn new(absolute_line: usize) -> Self {
        Self::with_guid(Uuid::new_v4().to_string(), absolute_line)
    }

    /// Rebuild a mark whose guid was persisted elsewhere
    pub fn with_guid(guid: impl Into<String>, absolute_line: usize) -> Self {
        Self {
            guid: guid.into(),
            absolute_line,
        }
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn absolute_line(&self) -> usize {
        self.absolute_line
    }
}

/// Finds a live mark by guid. Supplied by whoever rebuilt the marks.
pub trait MarkLookup {
    fn mark_with_guid(&self, guid: &str) -> Option<Arc<ScreenMark>>;
}

impl MarkLookup for HashMap<String, Arc<ScreenMark>> {
    fn mark_with_guid(&self, guid: &str) -> Option<Arc<ScreenMark>> {
        self.get(guid).cloned()
    }
}

/// Marks reconstructed for one session, keyed by guid
#[derive(Debug, Default, Clone)]
pub struct MarkRegistry {
    marks: HashMap<String, Arc<ScreenMark>>,
}

impl MarkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_marks<I>(marks: I) -> Self
    where
        I: IntoIterator<Item = Arc<ScreenMark>>,
    {
        let mut registry = Self::new();
        for mark in marks {
            registry.insert(mark);
        }
        registry
    }

    /// Register a mark.
    ///
    /// Guids must be unique within a session. A duplicate replaces the
    /// earlier mark and the displaced one is handed back so the caller can
    /// deal with it.
    pub fn insert(&mut self, mark: Arc<ScreenMark>) -> Option<Arc<ScreenMark>> {
        let previous = self.marks.insert(mark.guid().to_string(), mark);
        if let Some(prev) = &previous {
            tracing::warn!(guid = prev.guid(), "duplicate mark guid registered; earlier mark displaced");
        }
        previous
    }

    /// Forget a mark, e.g. after scrollback trimming dropped it
    pub fn remove(&mut self, guid: &str) -> Option<Arc<ScreenMark>> {
        self.marks.remove(guid)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

impl MarkLookup for MarkRegistry {
    fn mark_with_guid(&self, guid: &str) -> Option<Arc<ScreenMark>> {
        self.marks.get(guid).cloned()
    }
}
