//! Keyed background tasks
//!
//! Interpreters run their mount-time fetches and host-fired event handlers
//! off the render path. Each task is registered under a [`TaskKey`]; spawning
//! under a key that is still running aborts the older task, and dropping the
//! manager aborts everything. Finished tasks send their output on the
//! manager's channel.
//!
//! ```
//! use ui_dispatch_core::tasks::TaskManager;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let mut tasks = TaskManager::new(tx);
//! tasks.spawn("mount", async { "mounted" });
//! assert_eq!(rx.recv().await, Some("mounted"));
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Identifies a task for cancellation and replacement.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskKey(String);

impl TaskKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TaskKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Registry of running tasks producing `T`.
pub struct TaskManager<T> {
    tasks: HashMap<TaskKey, AbortHandle>,
    output: mpsc::UnboundedSender<T>,
}

impl<T> std::fmt::Debug for TaskManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManager")
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> TaskManager<T>
where
    T: Send + 'static,
{
    pub fn new(output: mpsc::UnboundedSender<T>) -> Self {
        Self {
            tasks: HashMap::new(),
            output,
        }
    }

    /// Spawn `future`, aborting any running task with the same key.
    ///
    /// The output is sent on the channel when the future completes; an
    /// aborted task sends nothing.
    pub fn spawn<F>(&mut self, key: impl Into<TaskKey>, future: F) -> &mut Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let key = key.into();
        self.cancel(&key);
        self.prune();

        let tx = self.output.clone();
        let handle = tokio::spawn(async move {
            let output = future.await;
            let _ = tx.send(output);
        });
        tracing::trace!(task = key.name(), "task spawned");

        self.tasks.insert(key, handle.abort_handle());
        self
    }

    /// Abort the task registered under `key`, if any.
    pub fn cancel(&mut self, key: &TaskKey) {
        if let Some(handle) = self.tasks.remove(key) {
            handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }

    /// Whether a task under `key` is registered and not yet finished.
    pub fn is_running(&self, key: &TaskKey) -> bool {
        self.tasks.get(key).is_some_and(|handle| !handle.is_finished())
    }

    /// Forget tasks that have already finished.
    pub fn prune(&mut self) {
        self.tasks.retain(|_, handle| !handle.is_finished());
    }

    /// Number of registered tasks (finished ones included until pruned).
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn running_keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.tasks
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(key, _)| key)
    }
}

impl<T> Drop for TaskManager<T> {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_task_key() {
        let k1 = TaskKey::new("mount");
        let k2: TaskKey = "mount".into();
        assert_eq!(k1, k2);
        assert_eq!(k1.name(), "mount");
    }

    #[tokio::test]
    async fn test_spawn_sends_output() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);

        tasks.spawn("answer", async { 42 });

        let output = tokio::time::timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("timeout")
            .expect("channel closed");
        assert_eq!(output, 42);
    }

    #[tokio::test]
    async fn test_spawn_replaces_running_task() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);
        let counter = Arc::new(AtomicUsize::new(0));

        let c1 = counter.clone();
        tasks.spawn("mount", async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            c1.fetch_add(1, Ordering::SeqCst);
            1
        });
        let c2 = counter.clone();
        tasks.spawn("mount", async move {
            c2.fetch_add(10, Ordering::SeqCst);
            2
        });

        let output = tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .expect("timeout")
            .expect("channel closed");
        assert_eq!(output, 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_cancel_and_prune() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u8>();
        let mut tasks = TaskManager::new(tx);

        tasks.spawn("slow", async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            1
        });
        tasks.spawn("fast", async { 2 });
        assert_eq!(rx.recv().await, Some(2));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(tasks.is_running(&TaskKey::new("slow")));
        tasks.cancel(&TaskKey::new("slow"));
        assert!(!tasks.is_running(&TaskKey::new("slow")));

        tasks.prune();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let (tx, _rx) = mpsc::unbounded_channel::<u8>();
        let mut tasks = TaskManager::new(tx);
        tasks.spawn("a", async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            1
        });
        tasks.spawn("b", async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            2
        });
        assert_eq!(tasks.len(), 2);

        tasks.cancel_all();
        assert!(tasks.is_empty());
    }
}
