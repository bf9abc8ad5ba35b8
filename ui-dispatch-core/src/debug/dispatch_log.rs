//! In-memory record of dispatched actions
//!
//! Every action link the dispatcher runs (and every mount-time fetch) is
//! recorded under a name of the form `"<kind>:<target>"`, e.g. `api:users`
//! or `setState:form.email`. Glob filters decide which names are kept.
//!
//! ```
//! use ui_dispatch_core::debug::DispatchFilter;
//!
//! let filter = DispatchFilter::new(Some("api:*"), Some("api:health*"));
//! assert!(filter.allows("api:users"));
//! assert!(!filter.allows("api:healthcheck"));
//! assert!(!filter.allows("setState:form"));
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::dispatcher::{ActionStatus, LinkReport};
use crate::node::ActionKind;

/// Include/exclude glob patterns over dispatch names.
///
/// `*` matches any run of characters, `?` exactly one.
#[derive(Debug, Clone, Default)]
pub struct DispatchFilter {
    /// When non-empty, a name must match one of these.
    pub include: Vec<String>,
    /// Names matching any of these are dropped (checked after `include`).
    pub exclude: Vec<String>,
}

impl DispatchFilter {
    /// Build from comma-separated pattern lists.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include: include.map(split_patterns).unwrap_or_default(),
            exclude: exclude.map(split_patterns).unwrap_or_default(),
        }
    }

    pub fn allows(&self, name: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| glob_match(p, name)) {
            return false;
        }
        !self.exclude.iter().any(|p| glob_match(p, name))
    }
}

fn split_patterns(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Ring-buffer sizing and filtering.
#[derive(Debug, Clone)]
pub struct DispatchLogConfig {
    pub capacity: usize,
    pub filter: DispatchFilter,
}

impl Default for DispatchLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: DispatchFilter::default(),
        }
    }
}

impl DispatchLogConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn filter(mut self, filter: DispatchFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// One recorded action link.
#[derive(Debug, Clone)]
pub struct DispatchLogEntry {
    pub kind: ActionKind,
    pub target: Option<String>,
    pub status: ActionStatus,
    pub sequence: u64,
    pub timestamp: Instant,
}

impl DispatchLogEntry {
    /// Filter name, `"<kind>:<target>"` (or just the kind without a target).
    pub fn name(&self) -> String {
        dispatch_name(&self.kind, self.target.as_deref())
    }

    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }

    /// Short age for display, e.g. `"150ms"` or `"2.3s"`.
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.elapsed();
        if elapsed.as_secs() >= 1 {
            format!("{:.1}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        }
    }
}

fn dispatch_name(kind: &ActionKind, target: Option<&str>) -> String {
    match target {
        Some(target) => format!("{kind}:{target}"),
        None => kind.to_string(),
    }
}

/// Bounded log of recent dispatches, oldest dropped first.
#[derive(Debug, Clone)]
pub struct DispatchLog {
    entries: VecDeque<DispatchLogEntry>,
    config: DispatchLogConfig,
    next_sequence: u64,
}

impl Default for DispatchLog {
    fn default() -> Self {
        Self::new(DispatchLogConfig::default())
    }
}

impl DispatchLog {
    pub fn new(config: DispatchLogConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            config,
            next_sequence: 0,
        }
    }

    /// Record a link. Returns `None` when the filter drops it.
    pub fn record(&mut self, link: &LinkReport) -> Option<&DispatchLogEntry> {
        let name = dispatch_name(&link.kind, link.target.as_deref());
        if self.config.capacity == 0 || !self.config.filter.allows(&name) {
            return None;
        }

        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(DispatchLogEntry {
            kind: link.kind.clone(),
            target: link.target.clone(),
            status: link.status,
            sequence: self.next_sequence,
            timestamp: Instant::now(),
        });
        self.next_sequence += 1;
        self.entries.back()
    }

    /// Oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &DispatchLogEntry> {
        self.entries.iter()
    }

    /// The most recent `count` entries, newest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &DispatchLogEntry> {
        self.entries.iter().rev().take(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn config(&self) -> &DispatchLogConfig {
        &self.config
    }
}

/// Glob match supporting `*` and `?`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Last `*` seen, and the text position it is currently absorbing up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, absorbed)) => {
                    p = star + 1;
                    t = absorbed + 1;
                    backtrack = Some((star, t));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
