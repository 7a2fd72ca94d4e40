//! Fill stage: mark reserved orders filled.

use tokio::sync::mpsc;

use crate::order::Order;

use super::context::StageContext;
use super::pool::{self, StatusTransition};
use super::types::PipelineStats;

/// Reserved -> Filled.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fill;

impl StatusTransition for Fill {
    const STAGE: &'static str = "fill";

    fn apply(&self, order: &mut Order) -> bool {
        order.fill()
    }

    fn record(&self, stats: &PipelineStats) {
        stats.record_filled();
    }
}

/// Launch `workers` fill workers over `input`.
pub fn spawn(
    ctx: &StageContext,
    workers: usize,
    input: mpsc::Receiver<Order>,
) -> mpsc::Receiver<Order> {
    pool::spawn(ctx, Fill, workers, input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Lifecycle;
    use crate::order::OrderStatus;
    use crate::shutdown::ShutdownRx;

    #[tokio::test]
    async fn test_fills_only_reserved_orders() {
        let ctx = StageContext::new(Lifecycle::new(), ShutdownRx::never(), 1);
        let (in_tx, in_rx) = mpsc::channel(2);
        let mut out = spawn(&ctx, 1, in_rx);

        let mut reserved = Order::received(10, 1.0);
        reserved.reserve();

        in_tx.send(reserved).await.unwrap();
        in_tx.send(Order::received(11, 1.0)).await.unwrap();
        drop(in_tx);

        let first = out.recv().await.unwrap();
        assert_eq!(first.product_code, 10);
        assert_eq!(first.status, OrderStatus::Filled);

        // Never reserved, so the guard leaves it alone.
        let second = out.recv().await.unwrap();
        assert_eq!(second.product_code, 11);
        assert_eq!(second.status, OrderStatus::Received);

        assert!(out.recv().await.is_none());
        ctx.lifecycle.wait().await.unwrap();
        assert_eq!(ctx.stats.snapshot().filled, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_fanned_out_fill_keeps_every_order() {
        let ctx = StageContext::new(Lifecycle::new(), ShutdownRx::never(), 1);
        let (in_tx, in_rx) = mpsc::channel(1);
        let mut out = spawn(&ctx, 4, in_rx);

        tokio::spawn(async move {
            for code in 0..40 {
                let mut order = Order::received(code, 1.0);
                order.reserve();
                in_tx.send(order).await.unwrap();
            }
        });

        let mut count = 0;
        while let Some(order) = out.recv().await {
            assert_eq!(order.status, OrderStatus::Filled);
            count += 1;
        }
        assert_eq!(count, 40);
        ctx.lifecycle.wait().await.unwrap();
    }
}
