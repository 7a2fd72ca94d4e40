//! Sink: drain the terminal conduits with a multiplexed wait.
//!
//! Draining one conduit to exhaustion before touching the other deadlocks as
//! soon as a producer blocks on the conduit nobody is reading. The sink waits
//! on both at once; whichever has a value (or has closed) first is serviced.
//! `tokio::select!` picks among ready branches at random, so neither conduit
//! can starve the other. A closed conduit's branch is disabled for good and
//! the sink returns once every branch is disabled.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::order::{InvalidOrder, Order};

use super::context::StageContext;
use super::error::PipelineError;
use super::types::Disposition;

/// Launch the sink. The returned receiver yields every terminal disposition,
/// in observation order, once both conduits have closed.
pub fn spawn(
    ctx: &StageContext,
    filled: mpsc::Receiver<Order>,
    invalid: mpsc::Receiver<InvalidOrder>,
) -> oneshot::Receiver<Vec<Disposition>> {
    let (report_tx, report_rx) = oneshot::channel();
    ctx.lifecycle.spawn("sink", async move {
        let observed = drain(filled, invalid).await;
        if report_tx.send(observed).is_err() {
            debug!("Sink report receiver dropped");
        }
        Ok::<(), PipelineError>(())
    });
    report_rx
}

/// Drain `filled` and `invalid` until both are closed.
pub async fn drain(
    mut filled: mpsc::Receiver<Order>,
    mut invalid: mpsc::Receiver<InvalidOrder>,
) -> Vec<Disposition> {
    let mut observed = Vec::new();
    let mut filled_open = true;
    let mut invalid_open = true;

    loop {
        tokio::select! {
            next = filled.recv(), if filled_open => match next {
                Some(order) => {
                    info!(
                        "Order filled: product {} quantity {}",
                        order.product_code, order.quantity
                    );
                    observed.push(Disposition::Filled { order });
                }
                None => {
                    debug!("Filled conduit closed");
                    filled_open = false;
                }
            },
            next = invalid.recv(), if invalid_open => match next {
                Some(rejected) => {
                    warn!(
                        "Invalid order: product {}: {}",
                        rejected.order.product_code, rejected.reason
                    );
                    observed.push(Disposition::Invalid { rejected });
                }
                None => {
                    debug!("Invalid conduit closed");
                    invalid_open = false;
                }
            },
            else => break,
        }
    }

    debug!("Sink drained {} terminal events", observed.len());
    observed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;
    use std::time::Duration;

    fn filled_order(code: i64) -> Order {
        let mut order = Order::received(code, 1.0);
        order.reserve();
        order.fill();
        order
    }

    fn rejected(code: i64) -> InvalidOrder {
        InvalidOrder::new(Order::received(code, -1.0), "quantity must be greater than zero")
    }

    fn split(observed: &[Disposition]) -> (usize, usize) {
        let filled = observed
            .iter()
            .filter(|d| matches!(d, Disposition::Filled { .. }))
            .count();
        (filled, observed.len() - filled)
    }

    #[tokio::test]
    async fn test_invalid_first_does_not_deadlock() {
        // Unbuffered-ish conduits: the invalid producer blocks until read
        // while the filled conduit stays open and silent.
        let (filled_tx, filled_rx) = mpsc::channel(1);
        let (invalid_tx, invalid_rx) = mpsc::channel(1);

        let producer = tokio::spawn(async move {
            for code in 0..5 {
                invalid_tx.send(rejected(code)).await.unwrap();
            }
            drop(invalid_tx);
            tokio::time::sleep(Duration::from_millis(20)).await;
            filled_tx.send(filled_order(100)).await.unwrap();
        });

        let observed = tokio::time::timeout(Duration::from_secs(2), drain(filled_rx, invalid_rx))
            .await
            .expect("sink deadlocked");
        producer.await.unwrap();

        assert_eq!(split(&observed), (1, 5));
    }

    #[tokio::test]
    async fn test_terminates_regardless_of_close_order() {
        for filled_closes_first in [true, false] {
            let (filled_tx, filled_rx) = mpsc::channel(1);
            let (invalid_tx, invalid_rx) = mpsc::channel(1);

            let producer_filled = tokio::spawn(async move {
                for code in 0..10 {
                    filled_tx.send(filled_order(code)).await.unwrap();
                }
                if !filled_closes_first {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                }
            });
            let producer_invalid = tokio::spawn(async move {
                for code in 10..13 {
                    invalid_tx.send(rejected(code)).await.unwrap();
                }
                if filled_closes_first {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                }
            });

            let observed =
                tokio::time::timeout(Duration::from_secs(2), drain(filled_rx, invalid_rx))
                    .await
                    .expect("sink did not terminate");
            producer_filled.await.unwrap();
            producer_invalid.await.unwrap();

            assert_eq!(split(&observed), (10, 3));
            for disposition in &observed {
                if let Disposition::Filled { order } = disposition {
                    assert_eq!(order.status, OrderStatus::Filled);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_both_closed_immediately() {
        let (filled_tx, filled_rx) = mpsc::channel::<Order>(1);
        let (invalid_tx, invalid_rx) = mpsc::channel::<InvalidOrder>(1);
        drop(filled_tx);
        drop(invalid_tx);

        assert!(drain(filled_rx, invalid_rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_spawned_sink_hands_back_report() {
        let ctx = StageContext::new(
            crate::lifecycle::Lifecycle::new(),
            crate::shutdown::ShutdownRx::never(),
            1,
        );
        let (filled_tx, filled_rx) = mpsc::channel(1);
        let (invalid_tx, invalid_rx) = mpsc::channel(1);
        let report = spawn(&ctx, filled_rx, invalid_rx);

        filled_tx.send(filled_order(1)).await.unwrap();
        invalid_tx.send(rejected(2)).await.unwrap();
        drop(filled_tx);
        drop(invalid_tx);

        ctx.lifecycle.wait().await.unwrap();
        let observed = report.await.unwrap();
        let codes: Vec<i64> = observed.iter().map(Disposition::product_code).collect();
        assert_eq!(codes.len(), 2);
        assert!(codes.contains(&1) && codes.contains(&2));
    }
}
