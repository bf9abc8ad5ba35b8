//! Navigation seam
//!
//! A `navigate` action leaves the current interpreter instance. What that
//! means (opening a URL, swapping the configuration, quitting) belongs to the
//! host, which supplies a [`Navigator`].

/// Performs a full navigation away from the current tree.
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}

/// Navigator that only records the request in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, location: &str) {
        tracing::info!(location, "navigation requested");
    }
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, location: &str) {
        self(location)
    }
}
