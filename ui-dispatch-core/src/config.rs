//! Interpreter configuration

use std::collections::BTreeMap;

use crate::debug::DispatchLogConfig;

/// Default limit on node nesting before rendering gives up on a branch.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options shared by the renderer, dispatcher and fetch queue.
///
/// # Example
///
/// ```
/// use ui_dispatch_core::RendererOptions;
///
/// let options = RendererOptions::default()
///     .with_max_depth(16)
///     .with_header("Authorization", "Bearer token")
///     .abort_fetches_on_error(true);
/// assert_eq!(options.max_depth, 16);
/// assert_eq!(options.default_headers["authorization"], "Bearer token");
/// ```
#[derive(Debug, Clone)]
pub struct RendererOptions {
    /// Maximum node nesting depth; deeper branches render nothing.
    pub max_depth: usize,
    /// Headers sent with every remote call (names are lower-cased).
    /// Per-call headers override these.
    pub default_headers: BTreeMap<String, String>,
    /// Stop the mount-time fetch queue at the first failed fetch.
    pub abort_fetches_on_error: bool,
    /// Capacity and filtering of the in-memory dispatch log.
    pub dispatch_log: DispatchLogConfig,
}

impl Default for RendererOptions {
    fn default() -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            default_headers,
            abort_fetches_on_error: false,
            dispatch_log: DispatchLogConfig::default(),
        }
    }
}

impl RendererOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn abort_fetches_on_error(mut self, abort: bool) -> Self {
        self.abort_fetches_on_error = abort;
        self
    }

    pub fn with_dispatch_log(mut self, config: DispatchLogConfig) -> Self {
        self.dispatch_log = config;
        self
    }
}
