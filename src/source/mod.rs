//! Data source abstraction for receiving log-history snapshots.
//!
//! This module provides a trait-based abstraction for receiving the
//! master's log history from various backends - HTTP polling, local files,
//! or in-memory channels.

mod channel;
mod file;
mod http;
mod snapshot;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use http::{fetch_once, HttpSource};
pub use snapshot::{HistoryEnvelope, LogEntry, LogHistory, RawLog};

use std::fmt::Debug;

/// Trait for receiving log-history snapshots from various sources.
///
/// Implementations provide snapshots from different backends - an HTTP
/// endpoint, file polling, or in-memory channels.
///
/// # Example
///
/// ```
/// use attackwatch::{DataSource, FileSource};
///
/// let mut source = FileSource::new("history.json");
/// if let Some(snapshot) = source.poll() {
///     println!("Got {} entries", snapshot.len());
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Poll for the latest snapshot.
    ///
    /// Returns `Some(history)` if new data is available, `None` otherwise.
    /// This method must be non-blocking; the TUI loop calls it between
    /// frames.
    fn poll(&mut self) -> Option<LogHistory>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// Check if the source has encountered an error.
    ///
    /// Returns the error message from the most recent failed poll cycle.
    /// A successful cycle clears it.
    fn error(&self) -> Option<String>;
}
