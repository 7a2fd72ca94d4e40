//! Cooperative shutdown signal.
//!
//! A [`ShutdownTx`] is held by whoever decides when to stop (the binary's
//! Ctrl-C handler, a test). Long-running tasks receive a [`ShutdownRx`] and
//! check it at every loop iteration or tick. Nothing is aborted from the
//! outside: tasks exit on their own and the lifecycle coordinator waits for
//! them.

use tokio::sync::watch;

/// Sending side of the shutdown signal.
#[derive(Debug)]
pub struct ShutdownTx {
    tx: watch::Sender<bool>,
}

/// Receiving side of the shutdown signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownRx {
    rx: watch::Receiver<bool>,
}

/// Create a new, not yet cancelled, shutdown signal.
pub fn channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTx { tx }, ShutdownRx { rx })
}

impl ShutdownTx {
    /// Signal every receiver to stop. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Create an additional receiver.
    pub fn subscribe(&self) -> ShutdownRx {
        ShutdownRx {
            rx: self.tx.subscribe(),
        }
    }
}

impl ShutdownRx {
    /// A receiver whose sender is gone; it never fires.
    pub fn never() -> Self {
        let (_tx, rx) = channel();
        rx
    }

    /// Non-blocking check.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been signalled.
    ///
    /// If the sender is dropped without cancelling, this never resolves.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Sender dropped without cancelling
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_starts_not_cancelled() {
        let (_tx, rx) = channel();
        assert!(!rx.is_cancelled());
    }

    #[test]
    fn test_cancel_is_visible_to_all_receivers() {
        let (tx, rx) = channel();
        let rx2 = rx.clone();
        let rx3 = tx.subscribe();

        tx.cancel();
        tx.cancel();

        assert!(rx.is_cancelled());
        assert!(rx2.is_cancelled());
        assert!(rx3.is_cancelled());
    }

    #[test]
    fn test_cancelled_future_resolves_after_cancel() {
        let (tx, mut rx) = channel();
        let mut fut = task::spawn(rx.cancelled());

        assert_pending!(fut.poll());
        tx.cancel();
        assert!(fut.is_woken());
        assert_ready!(fut.poll());
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_when_already_cancelled() {
        let (tx, mut rx) = channel();
        tx.cancel();
        tokio::time::timeout(Duration::from_millis(100), rx.cancelled())
            .await
            .expect("should resolve immediately");
    }

    #[tokio::test]
    async fn test_dropped_sender_never_fires() {
        let mut rx = ShutdownRx::never();
        let result = tokio::time::timeout(Duration::from_millis(50), rx.cancelled()).await;
        assert!(result.is_err());
        assert!(!rx.is_cancelled());
    }
}
