//! Progress notifications
//!
//! The engine reports human-facing progress ("Found 12 links on ...") through
//! a [`ProgressSink`]. Sinks are fire-and-forget: they never fail the crawl
//! and never buffer without bound.

use tokio::sync::mpsc;

/// Append-only notification channel for crawl progress
pub trait ProgressSink: Send + Sync {
    fn emit(&self, message: &str);
}

/// Forwards progress messages to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, message: &str) {
        tracing::info!(target: "sumi_trawl::progress", "{}", message);
    }
}

/// Sends progress messages over a bounded channel
///
/// When the receiver falls behind and the channel is full, new messages are
/// dropped rather than queued.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: mpsc::Sender<String>,
}

impl ChannelProgress {
    /// Creates a sink and the receiver that drains it
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl ProgressSink for ChannelProgress {
    fn emit(&self, message: &str) {
        if let Err(e) = self.sender.try_send(message.to_string()) {
            tracing::trace!("Dropping progress message: {}", e);
        }
    }
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn emit(&self, message: &str) {
        self(message)
    }
}
