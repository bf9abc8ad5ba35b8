//! Mount-time data loading
//!
//! A root node's `dataFetch` list runs through a [`FetchQueue`]: one fetch at
//! a time, in declaration order, so a later fetch can template its URL from
//! state an earlier one wrote.

use std::collections::VecDeque;

use crate::dispatcher::{ActionDispatcher, ActionStatus, DispatchReport};
use crate::node::DataFetchSpec;

/// Outcome of one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
    pub key: String,
    pub status: ActionStatus,
    /// Report of the `onSuccess`/`onError` action, when one ran.
    pub continuation: Option<DispatchReport>,
}

/// Per-key outcomes in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub records: Vec<FetchRecord>,
}

impl FetchReport {
    pub fn keys(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.key.as_str()).collect()
    }

    pub fn status_of(&self, key: &str) -> Option<ActionStatus> {
        self.records.iter().find(|r| r.key == key).map(|r| r.status)
    }

    pub fn all_succeeded(&self) -> bool {
        self.records.iter().all(|r| r.status == ActionStatus::Succeeded)
    }
}

/// Ordered queue of pending fetches.
#[derive(Debug, Clone, Default)]
pub struct FetchQueue {
    pending: VecDeque<DataFetchSpec>,
    abort_on_error: bool,
}

impl FetchQueue {
    pub fn new(specs: impl IntoIterator<Item = DataFetchSpec>) -> Self {
        Self {
            pending: specs.into_iter().collect(),
            abort_on_error: false,
        }
    }

    /// Stop at the first failure; remaining fetches are reported as skipped.
    pub fn abort_on_error(mut self, abort: bool) -> Self {
        self.abort_on_error = abort;
        self
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain the queue. Each fetch, including its continuation, settles
    /// before the next one starts.
    pub async fn run(mut self, dispatcher: &ActionDispatcher) -> FetchReport {
        let mut report = FetchReport::default();
        tracing::debug!(count = self.pending.len(), "running data fetches");

        while let Some(spec) = self.pending.pop_front() {
            let (status, continuation) = dispatcher.fetch(&spec).await;
            report.records.push(FetchRecord {
                key: spec.key,
                status,
                continuation,
            });

            let stop = match status {
                ActionStatus::Failed => self.abort_on_error,
                ActionStatus::Skipped => dispatcher.is_ended(),
                _ => false,
            };
            if stop {
                tracing::debug!(remaining = self.pending.len(), "fetch queue stopped early");
                report
                    .records
                    .extend(self.pending.drain(..).map(|spec| FetchRecord {
                        key: spec.key,
                        status: ActionStatus::Skipped,
                        continuation: None,
                    }));
            }
        }

        report
    }
}
