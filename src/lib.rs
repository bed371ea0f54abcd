//! Live, in-memory mirror of a watched directory subtree.
//!
//! This crate normalizes raw OS filesystem change notifications into a
//! typed `FileEvent` stream (synthesizing `Moved` out of a bare
//! `Removed`/`Added` pair when the backend can't correlate them itself)
//! and applies that stream to an ordered, path-indexed `DirectoryTree`
//! that multicasts per-entry change notifications to listeners.
//!
//! - [`timer`] — single-shot countdown driving the MOVED-synthesis window.
//! - [`queue`] — the FIFO hand-off between the watcher thread and the
//!   application main loop.
//! - [`watch`] — the `notify`-backed adapter and the facade consumers use
//!   to start/stop a watch session and drain events.
//! - [`tree`] — the directory tree model itself.
//! - [`config`] — injectable configuration (extension table, MOVED window).
//! - [`event`] — the normalized `FileEvent` type.
//! - [`error`] — the crate-wide error type and `Result` alias.

pub mod config;
pub mod error;
pub mod event;
pub mod namepool;
pub mod queue;
pub mod timer;
pub mod tree;
pub mod types;
pub mod watch;

pub use config::WatchConfig;
pub use error::{Result, WatchError};
pub use event::FileEvent;
pub use tree::DirectoryTree;
pub use types::AssetType;
pub use watch::FileSystemWatcherFacade;
