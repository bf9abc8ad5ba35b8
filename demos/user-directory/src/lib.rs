//! Terminal host for ui-dispatch component trees
//!
//! The binary mounts a configuration tree, polls the terminal for input and
//! redraws whenever the tree's state changes. This library half holds the
//! pieces that do not need a real terminal.

pub mod poller;
pub mod view;

/// The configuration run when no `--config` is given.
pub const BUNDLED_CONFIG: &str = include_str!("../config/user_directory.json");
