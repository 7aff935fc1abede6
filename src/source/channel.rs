//! Channel-based data source.
//!
//! Receives log-history snapshots via a tokio watch channel. Useful for
//! embedding the dashboard behind another transport, and for tests that
//! push histories directly.

use tokio::sync::watch;

use super::{DataSource, LogHistory};

/// A data source that receives log-history snapshots via a channel.
///
/// The producer sends complete histories through the channel and this
/// source provides them to the TUI.
///
/// # Example
///
/// ```
/// use attackwatch::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("replay");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<LogHistory>,
    description: String,
    /// Track if we've returned the initial value yet
    initial_returned: bool,
}

impl ChannelSource {
    /// Create a new channel source from the receiving end of a watch
    /// channel.
    pub fn new(receiver: watch::Receiver<LogHistory>, source_description: &str) -> Self {
        let description = format!("channel: {}", source_description);
        Self {
            receiver,
            description,
            initial_returned: false,
        }
    }

    /// Create a channel pair for pushing snapshots to a ChannelSource.
    ///
    /// Returns (sender, source) where the sender pushes histories and the
    /// source plugs into the dashboard.
    pub fn create(source_description: &str) -> (watch::Sender<LogHistory>, Self) {
        let (tx, rx) = watch::channel(LogHistory::default());
        let source = Self::new(rx, source_description);
        (tx, source)
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<LogHistory> {
        // Return the initial value on first poll
        if !self.initial_returned {
            self.initial_returned = true;
            self.receiver.mark_changed();
        }

        // Check if there's a new value without blocking
        if self.receiver.has_changed().unwrap_or(false) {
            let history = self.receiver.borrow_and_update().clone();
            Some(history)
        } else {
            None
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        // Connection errors belong to the producing side of the channel
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LogEntry;

    #[test]
    fn test_channel_source_poll() {
        let (tx, mut source) = ChannelSource::create("test");

        // Initially returns the default (empty) history
        let history = source.poll();
        assert!(history.is_some());
        assert!(history.unwrap().is_empty());

        // No change, so poll returns None
        assert!(source.poll().is_none());

        // Send a new history
        tx.send(vec![LogEntry {
            prediction: Some("Normal".to_string()),
            ..Default::default()
        }])
        .unwrap();

        // Now poll returns the new history
        let history = source.poll().unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_channel_source_description() {
        let (_tx, source) = ChannelSource::create("replay");
        assert_eq!(source.description(), "channel: replay");
    }
}
