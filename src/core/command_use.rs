/// One use of a command: when it ran, where, and which buffer mark
/// delimits its output.
///
/// Persisted as a positional array `[time, directory, mark_guid]`. The mark
/// handle never goes to disk; after a restart the record only knows the
/// guid until [`CommandUse::resolve`] binds it to a rebuilt mark.

use crate::core::mark::{MarkLookup, ScreenMark};
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeTuple, Serializer};
use serde_json::Value;
use std::sync::{Arc, Weak};

/// Whether a record's mark handle has been bound yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkState {
    /// Only `mark_guid` is known
    Unresolved,
    /// A mark handle has been assigned (it may since have been dropped by its owner)
    Resolved,
}

#[derive(Debug, Clone)]
pub struct CommandUse {
    /// Seconds since the Unix epoch
    time: f64,
    directory: Option<String>,
    mark: Option<Weak<ScreenMark>>,
    mark_guid: Option<String>,
}

impl CommandUse {
    /// Build a record for a command that just ran.
    ///
    /// The guid is taken from `mark` now, so the record can be persisted
    /// without touching the mark again.
    pub fn new(time: f64, directory: Option<String>, mark: Option<&Arc<ScreenMark>>) -> Self {
        debug_assert!(
            time.is_finite() && time >= 0.0,
            "command use time must be finite and non-negative, got {}",
            time
        );
        Self {
            time,
            directory,
            mark: mark.map(Arc::downgrade),
            mark_guid: mark.map(|m| m.guid().to_string()),
        }
    }

    /// Same as [`CommandUse::new`], stamped with the current time
    pub fn now(directory: Option<String>, mark: Option<&Arc<ScreenMark>>) -> Self {
        let time = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        Self::new(time, directory, mark)
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// `time` as a UTC datetime, if it is representable
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        if !self.time.is_finite() || self.time < 0.0 {
            return None;
        }
        let secs = self.time.trunc() as i64;
        let nanos = ((self.time.fract() * 1e9).round() as u32).min(999_999_999);
        DateTime::from_timestamp(secs, nanos)
    }

    pub fn directory(&self) -> Option<&str> {
        self.directory.as_deref()
    }

    /// The live mark, if bound and still alive
    pub fn mark(&self) -> Option<Arc<ScreenMark>> {
        self.mark.as_ref().and_then(Weak::upgrade)
    }

    pub fn mark_guid(&self) -> Option<&str> {
        self.mark_guid.as_deref()
    }

    pub fn state(&self) -> MarkState {
        if self.mark.is_some() {
            MarkState::Resolved
        } else {
            MarkState::Unresolved
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.state() == MarkState::Resolved
    }

    /// Bind the mark handle. The guid follows the mark.
    pub fn set_mark(&mut self, mark: &Arc<ScreenMark>) {
        self.mark = Some(Arc::downgrade(mark));
        self.mark_guid = Some(mark.guid().to_string());
    }

    /// Look the guid up and bind the mark if found.
    ///
    /// Returns whether the record is resolved afterwards. Not finding the
    /// mark is normal: its output may have been trimmed from scrollback.
    pub fn resolve<L: MarkLookup + ?Sized>(&mut self, lookup: &L) -> bool {
        if self.is_resolved() {
            return true;
        }

        let Some(mark) = self.mark_guid.as_deref().and_then(|guid| lookup.mark_with_guid(guid)) else {
            return false;
        };
        self.set_mark(&mark);
        true
    }

    /// Positional form: `[time, directory-or-null, mark_guid-or-null]`
    pub fn serialized_value(&self) -> Value {
        serde_json::json!([self.time, self.directory, self.mark_guid])
    }

    /// Rebuild an unresolved record from [`CommandUse::serialized_value`] output.
    ///
    /// Returns `None` for anything malformed so that one bad entry can be
    /// skipped without failing the whole history. Trailing elements may be
    /// missing (older data) or extra (newer data).
    pub fn from_serialized_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;

        let time = items
            .first()?
            .as_f64()
            .filter(|t| t.is_finite() && *t >= 0.0)?;
        let directory = optional_string(items.get(1))?;
        let mark_guid = optional_string(items.get(2))?;

        Some(Self {
            time,
            directory,
            mark: None,
            mark_guid,
        })
    }

    /// Parse JSON text, then [`CommandUse::from_serialized_value`]
    pub fn from_serialized_str(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        Self::from_serialized_value(&value)
    }
}

// Outer None: wrong kind. Inner None: absent or null.
fn optional_string(value: Option<&Value>) -> Option<Option<String>> {
    match value {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(_) => None,
    }
}

impl Serialize for CommandUse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.time)?;
        tuple.serialize_element(&self.directory)?;
        tuple.serialize_element(&self.mark_guid)?;
        tuple.end()
    }
}

impl PartialEq for CommandUse {
    fn eq(&self, other: &Self) -> bool {
        if self.time != other.time || self.directory != other.directory {
            return false;
        }

        match (&self.mark, &other.mark) {
            (Some(a), Some(b)) => Weak::ptr_eq(a, b),
            (None, None) => self.mark_guid == other.mark_guid,
            _ => false,
        }
    }
}
