//! Key/value views of interpreter state for inspection panels

use crate::state::StateStore;
use crate::value::{stringify, Value};

use super::DispatchLog;

/// A single key/value row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEntry {
    pub key: String,
    pub value: String,
}

impl DebugEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A titled group of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSection {
    pub title: String,
    pub entries: Vec<DebugEntry>,
}

impl DebugSection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_entry(key, value);
        self
    }

    pub fn push_entry(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(DebugEntry::new(key, value));
    }
}

/// Types that can describe themselves as debug sections.
pub trait DebugState {
    fn debug_sections(&self) -> Vec<DebugSection>;
}

/// Longest rendered value before truncation.
const MAX_VALUE_WIDTH: usize = 60;

fn preview(value: &Value) -> String {
    let text = match value {
        Value::String(s) => format!("{s:?}"),
        other => stringify(other),
    };
    if text.chars().count() <= MAX_VALUE_WIDTH {
        return text;
    }
    let mut cut: String = text.chars().take(MAX_VALUE_WIDTH - 1).collect();
    cut.push('…');
    cut
}

impl DebugState for StateStore {
    fn debug_sections(&self) -> Vec<DebugSection> {
        let snapshot = self.snapshot();
        let mut section = DebugSection::new(format!("State (v{})", self.version()));
        for (key, value) in snapshot.iter() {
            section.push_entry(key.as_str(), preview(value));
        }
        vec![section]
    }
}

impl DebugState for DispatchLog {
    fn debug_sections(&self) -> Vec<DebugSection> {
        let mut section = DebugSection::new("Dispatches");
        for entry in self.recent(self.len()) {
            section.push_entry(
                entry.name(),
                format!("{:?} ({} ago)", entry.status, entry.elapsed_display()),
            );
        }
        vec![section]
    }
}

impl<A: DebugState, B: DebugState> DebugState for (A, B) {
    fn debug_sections(&self) -> Vec<DebugSection> {
        let mut sections = self.0.debug_sections();
        sections.extend(self.1.debug_sections());
        sections
    }
}

impl<T: DebugState> DebugState for &T {
    fn debug_sections(&self) -> Vec<DebugSection> {
        (*self).debug_sections()
    }
}
