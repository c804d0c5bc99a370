//! Shutdown coordination for the listeners.

use std::time::Duration;

use tokio::sync::broadcast;

/// Time granted to open connections once shutdown starts.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(10);

/// Stop signal shared by every listener, plus how long they may drain.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    grace: Duration,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::with_grace(DEFAULT_GRACE)
    }

    pub fn with_grace(grace: Duration) -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx, grace }
    }

    /// Drain budget for in-flight connections after [`Shutdown::trigger`].
    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Tell every listener to stop accepting.
    pub fn trigger(&self) {
        let receivers = self.tx.send(()).unwrap_or(0);
        tracing::debug!(listeners = receivers, grace_ms = self.grace.as_millis() as u64, "Shutdown triggered");
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
