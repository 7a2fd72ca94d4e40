//! Fan-out / fan-in worker pool shared by the status-transition stages.
//!
//! `workers` tasks share one input conduit and one output conduit. Every
//! worker holds its own clone of the output sender and the pool drops the
//! original after launching them, so the output conduit closes exactly when
//! the last worker has drained the input and exited. A worker finishing early
//! never closes the conduit under the others.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::order::Order;

use super::context::StageContext;
use super::error::PipelineError;
use super::types::PipelineStats;

/// A status change applied by a worker pool stage.
pub trait StatusTransition: Send + Sync + 'static {
    /// Stage name used for task names and errors.
    const STAGE: &'static str;

    /// Apply the transition. Returns `true` if the order changed.
    fn apply(&self, order: &mut Order) -> bool;

    /// Count an applied transition.
    fn record(&self, stats: &PipelineStats);
}

type SharedInput = Arc<Mutex<mpsc::Receiver<Order>>>;

/// Launch a pool of `workers` tasks applying `transition` to every order.
///
/// Returns the merged output conduit. Output order across workers is not
/// defined.
pub fn spawn<T: StatusTransition>(
    ctx: &StageContext,
    transition: T,
    workers: usize,
    input: mpsc::Receiver<Order>,
) -> mpsc::Receiver<Order> {
    let (tx, rx) = mpsc::channel(ctx.capacity);
    let input: SharedInput = Arc::new(Mutex::new(input));
    let transition = Arc::new(transition);

    for id in 0..workers {
        ctx.lifecycle.spawn(
            format!("{}-{}", T::STAGE, id),
            run_worker(
                id,
                Arc::clone(&transition),
                Arc::clone(&input),
                tx.clone(),
                Arc::clone(&ctx.stats),
            ),
        );
    }

    debug!("Started {} {} workers", workers, T::STAGE);
    rx
}

async fn run_worker<T: StatusTransition>(
    id: usize,
    transition: Arc<T>,
    input: SharedInput,
    output: mpsc::Sender<Order>,
    stats: Arc<PipelineStats>,
) -> Result<(), PipelineError> {
    let mut handled = 0usize;

    loop {
        // Only one worker waits on the conduit at a time; the rest queue on the lock.
        let next = input.lock().await.recv().await;
        let Some(mut order) = next else {
            break;
        };

        if transition.apply(&mut order) {
            transition.record(&stats);
        } else {
            debug!(
                "{} worker {} left product {} unchanged (status {})",
                T::STAGE,
                id,
                order.product_code,
                order.status
            );
        }

        output
            .send(order)
            .await
            .map_err(|_| PipelineError::closed(T::STAGE))?;
        handled += 1;
    }

    debug!("{} worker {} done after {} orders", T::STAGE, id, handled);
    Ok(())
}
