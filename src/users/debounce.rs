//! Debounced search commands.
//!
//! Query edits are pushed into a channel as they happen; the debouncer yields
//! a query only once no newer edit has arrived for the quiet period. Callers
//! decide when to run the search, so request timing stays explicit.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

/// Sending side handed to whatever produces query edits.
pub type QuerySender = mpsc::Sender<String>;

#[derive(Debug)]
pub struct SearchDebouncer {
    rx: mpsc::Receiver<String>,
    quiet: Duration,
}

impl SearchDebouncer {
    /// Create a debouncer and the sender that feeds it.
    #[must_use]
    pub fn channel(quiet: Duration) -> (QuerySender, Self) {
        let (tx, rx) = mpsc::channel(64);
        (tx, Self { rx, quiet })
    }

    /// Wait for the next settled query.
    ///
    /// Returns `None` once every sender is gone and nothing is pending. A
    /// query still pending when the senders close is returned immediately.
    pub async fn next(&mut self) -> Option<String> {
        let mut latest = self.rx.recv().await?;

        loop {
            tokio::select! {
                () = tokio::time::sleep(self.quiet) => {
                    trace!(query = %latest, "Search query settled");
                    return Some(latest);
                }
                edit = self.rx.recv() => match edit {
                    Some(query) => latest = query,
                    None => return Some(latest),
                },
            }
        }
    }
}
