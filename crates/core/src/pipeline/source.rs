//! Source stage: decode raw records into orders.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::order::{Order, RawOrder};
use crate::shutdown::ShutdownRx;

use super::context::StageContext;
use super::error::PipelineError;
use super::types::PipelineStats;

/// Launch the source stage and return its output conduit.
///
/// The conduit closes after the last record has been handled, or earlier if
/// shutdown is signalled.
pub fn spawn(ctx: &StageContext, records: Vec<String>) -> mpsc::Receiver<Order> {
    let (tx, rx) = mpsc::channel(ctx.capacity);
    ctx.lifecycle.spawn(
        "source",
        run(records, tx, Arc::clone(&ctx.stats), ctx.shutdown.clone()),
    );
    rx
}

/// Decode `records` in order and send each valid one on `out`.
///
/// Malformed records are logged, counted and skipped.
pub async fn run(
    records: Vec<String>,
    out: mpsc::Sender<Order>,
    stats: Arc<PipelineStats>,
    mut shutdown: ShutdownRx,
) -> Result<(), PipelineError> {
    let total = records.len();

    for (idx, record) in records.into_iter().enumerate() {
        if shutdown.is_cancelled() {
            info!("Source stage cancelled after {} of {} records", idx, total);
            return Ok(());
        }

        let order = match RawOrder::parse(&record) {
            Ok(raw) => raw.into_order(),
            Err(e) => {
                warn!("Skipping record {}: {}", idx, e);
                stats.record_parse_failure();
                continue;
            }
        };

        debug!("Received order for product {}", order.product_code);

        tokio::select! {
            sent = out.send(order) => {
                sent.map_err(|_| PipelineError::closed("source"))?;
                stats.record_received();
            }
            _ = shutdown.cancelled() => {
                info!("Source stage cancelled after {} of {} records", idx, total);
                return Ok(());
            }
        }
    }

    debug!("Source stage finished ({} records)", total);
    Ok(())
}
