//! Single-slot reload notification.
//!
//! A signal means "the active configuration changed at least once since you
//! last looked". It carries no payload; a woken consumer re-reads the store.

use std::sync::Mutex;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::observability::metrics;

/// Sending half, owned by the store.
#[derive(Debug)]
pub struct ReloadNotifier {
    tx: mpsc::Sender<()>,
    rx: Mutex<Option<mpsc::Receiver<()>>>,
}

impl ReloadNotifier {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Post a signal without blocking. Returns false if one was already pending.
    pub fn notify(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => {
                metrics::record_reload_signal("sent");
                true
            }
            Err(TrySendError::Full(())) => {
                metrics::record_reload_signal("dropped");
                tracing::debug!("Reload signal already pending, dropping");
                false
            }
            // Subscriber dropped its receiver.
            Err(TrySendError::Closed(())) => false,
        }
    }

    /// Take the receiving half. Only the first caller gets it.
    pub fn subscribe(&self) -> Option<ReloadReceiver> {
        self.rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .map(|rx| ReloadReceiver { rx })
    }
}

impl Default for ReloadNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half handed to the one reload consumer.
#[derive(Debug)]
pub struct ReloadReceiver {
    rx: mpsc::Receiver<()>,
}

impl ReloadReceiver {
    /// Wait for the next signal. Returns false once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }

    /// Consume a pending signal, if any, without waiting.
    pub fn try_pending(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signals_coalesce() {
        let notifier = ReloadNotifier::new();
        let mut receiver = notifier.subscribe().unwrap();

        assert!(notifier.notify());
        assert!(!notifier.notify());
        assert!(!notifier.notify());

        assert!(receiver.try_pending());
        assert!(!receiver.try_pending());
    }

    #[test]
    fn test_subscribe_once() {
        let notifier = ReloadNotifier::new();
        assert!(notifier.subscribe().is_some());
        assert!(notifier.subscribe().is_none());
    }

    #[test]
    fn test_signal_pending_before_subscribe() {
        let notifier = ReloadNotifier::new();
        notifier.notify();

        let mut receiver = notifier.subscribe().unwrap();
        assert!(receiver.try_pending());
    }

    #[tokio::test]
    async fn test_changed_wakes_and_ends_with_sender() {
        let notifier = ReloadNotifier::new();
        let mut receiver = notifier.subscribe().unwrap();

        notifier.notify();
        assert!(receiver.changed().await);

        drop(notifier);
        assert!(!receiver.changed().await);
    }
}
