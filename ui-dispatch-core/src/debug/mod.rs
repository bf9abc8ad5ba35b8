//! Inspection utilities
//!
//! - [`DispatchLog`]: bounded in-memory record of executed action links,
//!   filtered by glob patterns over `"<kind>:<target>"` names
//! - [`DebugState`]: key/value sections describing the store or the log, for
//!   display in a host's inspection panel

mod dispatch_log;
mod state;

pub use dispatch_log::{
    glob_match, DispatchFilter, DispatchLog, DispatchLogConfig, DispatchLogEntry,
};
pub use state::{DebugEntry, DebugSection, DebugState};
