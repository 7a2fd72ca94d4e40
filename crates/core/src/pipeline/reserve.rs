//! Reservation stage: mark valid orders reserved with a pool of workers.

use tokio::sync::mpsc;

use crate::order::Order;

use super::context::StageContext;
use super::pool::{self, StatusTransition};
use super::types::PipelineStats;

/// Received -> Reserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reserve;

impl StatusTransition for Reserve {
    const STAGE: &'static str = "reserve";

    fn apply(&self, order: &mut Order) -> bool {
        order.reserve()
    }

    fn record(&self, stats: &PipelineStats) {
        stats.record_reserved();
    }
}

/// Launch `workers` reservation workers over `input`.
pub fn spawn(
    ctx: &StageContext,
    workers: usize,
    input: mpsc::Receiver<Order>,
) -> mpsc::Receiver<Order> {
    pool::spawn(ctx, Reserve, workers, input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Lifecycle;
    use crate::order::OrderStatus;
    use crate::shutdown::ShutdownRx;

    fn context() -> StageContext {
        StageContext::new(Lifecycle::new(), ShutdownRx::never(), 1)
    }

    #[tokio::test]
    async fn test_reserves_received_orders() {
        let ctx = context();
        let (in_tx, in_rx) = mpsc::channel(2);
        let mut out = spawn(&ctx, 3, in_rx);

        in_tx.send(Order::received(1, 1.0)).await.unwrap();
        in_tx.send(Order::received(2, 1.0)).await.unwrap();
        drop(in_tx);

        let mut count = 0;
        while let Some(order) = out.recv().await {
            assert_eq!(order.status, OrderStatus::Reserved);
            count += 1;
        }
        assert_eq!(count, 2);
        ctx.lifecycle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_already_reserved_order_is_unchanged() {
        let ctx = context();
        let (in_tx, in_rx) = mpsc::channel(2);
        let mut out = spawn(&ctx, 1, in_rx);

        let mut reserved = Order::received(3, 2.0);
        reserved.reserve();
        let mut filled = reserved.clone();
        filled.fill();

        in_tx.send(reserved.clone()).await.unwrap();
        in_tx.send(filled.clone()).await.unwrap();
        drop(in_tx);

        assert_eq!(out.recv().await.unwrap(), reserved);
        assert_eq!(out.recv().await.unwrap(), filled);
        assert!(out.recv().await.is_none());

        ctx.lifecycle.wait().await.unwrap();
        assert_eq!(ctx.stats.snapshot().reserved, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_three_workers_emit_every_order_once() {
        let ctx = context();
        let (in_tx, in_rx) = mpsc::channel(1);
        let mut out = spawn(&ctx, 3, in_rx);

        const K: i64 = 200;
        tokio::spawn(async move {
            for code in 0..K {
                in_tx.send(Order::received(code, 1.0)).await.unwrap();
            }
        });

        let mut codes = Vec::new();
        while let Some(order) = out.recv().await {
            codes.push(order.product_code);
        }
        codes.sort_unstable();

        assert_eq!(codes, (0..K).collect::<Vec<_>>());
        ctx.lifecycle.wait().await.unwrap();
    }
}
