//! Validation stage: split orders into valid and invalid conduits.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::order::{InvalidOrder, Order, INVALID_QUANTITY_REASON};

use super::context::StageContext;
use super::error::PipelineError;
use super::types::PipelineStats;

/// Launch the validation stage.
///
/// Returns `(valid, invalid)` conduits. Both close together once `input` is
/// drained, so a consumer can observe each completion independently.
pub fn spawn(
    ctx: &StageContext,
    input: mpsc::Receiver<Order>,
) -> (mpsc::Receiver<Order>, mpsc::Receiver<InvalidOrder>) {
    let (valid_tx, valid_rx) = mpsc::channel(ctx.capacity);
    let (invalid_tx, invalid_rx) = mpsc::channel(ctx.capacity);
    ctx.lifecycle.spawn(
        "validate",
        run(input, valid_tx, invalid_tx, Arc::clone(&ctx.stats)),
    );
    (valid_rx, invalid_rx)
}

/// Route every order from `input` by quantity.
///
/// Orders are forwarded unchanged and in arrival order.
pub async fn run(
    mut input: mpsc::Receiver<Order>,
    valid: mpsc::Sender<Order>,
    invalid: mpsc::Sender<InvalidOrder>,
    stats: Arc<PipelineStats>,
) -> Result<(), PipelineError> {
    while let Some(order) = input.recv().await {
        if order.has_positive_quantity() {
            valid
                .send(order)
                .await
                .map_err(|_| PipelineError::closed("validate"))?;
            stats.record_valid();
        } else {
            debug!(
                "Rejecting order for product {} (quantity {})",
                order.product_code, order.quantity
            );
            invalid
                .send(InvalidOrder::new(order, INVALID_QUANTITY_REASON))
                .await
                .map_err(|_| PipelineError::closed("validate"))?;
            stats.record_invalid();
        }
    }

    // `valid` and `invalid` are dropped here together.
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;

    #[tokio::test]
    async fn test_partitions_by_quantity() {
        let (in_tx, in_rx) = mpsc::channel(1);
        let (valid_tx, mut valid_rx) = mpsc::channel(1);
        let (invalid_tx, mut invalid_rx) = mpsc::channel(1);
        let stats = Arc::new(PipelineStats::default());

        let stage = tokio::spawn(run(in_rx, valid_tx, invalid_tx, Arc::clone(&stats)));

        tokio::spawn(async move {
            for quantity in [1.0, 0.0, -1.0] {
                in_tx.send(Order::received(7, quantity)).await.unwrap();
            }
        });

        // Drain both conduits concurrently; a sequential drain could block.
        let valid_reader = tokio::spawn(async move {
            let mut out = Vec::new();
            while let Some(order) = valid_rx.recv().await {
                out.push(order);
            }
            out
        });

        let mut invalid = Vec::new();
        while let Some(rejected) = invalid_rx.recv().await {
            invalid.push(rejected);
        }
        let valid = valid_reader.await.unwrap();
        stage.await.unwrap().unwrap();

        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0], Order::received(7, 1.0));

        assert_eq!(invalid.len(), 2);
        assert!(invalid.iter().all(|r| r.reason == INVALID_QUANTITY_REASON));
        assert_eq!(invalid[0].order.quantity, 0.0);
        assert_eq!(invalid[1].order.quantity, -1.0);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.valid, 1);
        assert_eq!(snapshot.invalid, 2);
    }

    #[tokio::test]
    async fn test_fractional_quantity_is_valid() {
        let (in_tx, in_rx) = mpsc::channel(4);
        let (valid_tx, mut valid_rx) = mpsc::channel(4);
        let (invalid_tx, mut invalid_rx) = mpsc::channel(4);

        in_tx.send(Order::received(2222, 42.3)).await.unwrap();
        in_tx.send(Order::received(5, 0.25)).await.unwrap();
        drop(in_tx);

        run(in_rx, valid_tx, invalid_tx, Arc::new(PipelineStats::default()))
            .await
            .unwrap();

        let first = valid_rx.recv().await.unwrap();
        assert_eq!(first.quantity, 42.3);
        assert_eq!(first.status, OrderStatus::Received);
        assert_eq!(valid_rx.recv().await.unwrap().quantity, 0.25);
        assert!(valid_rx.recv().await.is_none());
        assert!(invalid_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_both_outputs_close_on_empty_input() {
        let (in_tx, in_rx) = mpsc::channel::<Order>(1);
        drop(in_tx);

        let ctx = StageContext::new(
            crate::lifecycle::Lifecycle::new(),
            crate::shutdown::ShutdownRx::never(),
            1,
        );
        let (mut valid_rx, mut invalid_rx) = spawn(&ctx, in_rx);

        assert!(valid_rx.recv().await.is_none());
        assert!(invalid_rx.recv().await.is_none());
        ctx.lifecycle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_invalid_conduit_is_reported() {
        let (in_tx, in_rx) = mpsc::channel(1);
        let (valid_tx, _valid_rx) = mpsc::channel(1);
        let (invalid_tx, invalid_rx) = mpsc::channel(1);
        drop(invalid_rx);

        in_tx.send(Order::received(1, -1.0)).await.unwrap();
        drop(in_tx);

        let result = run(in_rx, valid_tx, invalid_tx, Arc::new(PipelineStats::default())).await;
        assert!(matches!(
            result,
            Err(PipelineError::ConduitClosed { stage: "validate" })
        ));
    }
}
