//! Periodic task with cooperative cancellation.
//!
//! The ticker fires every `interval` until its shutdown signal is cancelled.
//! It checks the signal at every tick and while waiting for the next one, so
//! it stops within one interval of the signal. Launch it through a
//! [`Lifecycle`] and wait on that to confirm it actually exited.

mod config;

pub use config::TickerConfig;

use std::convert::Infallible;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::lifecycle::Lifecycle;
use crate::metrics;
use crate::shutdown::ShutdownRx;

/// One tick of the periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 1-based sequence number.
    pub seq: u64,
    pub at: DateTime<Utc>,
}

/// Launch a ticker registered with `lifecycle`.
///
/// Ticks are delivered on the returned conduit, which closes when the ticker
/// exits.
pub fn spawn(lifecycle: &Lifecycle, interval: Duration, shutdown: ShutdownRx) -> mpsc::Receiver<Tick> {
    let (tx, rx) = mpsc::channel(1);
    lifecycle.spawn("ticker", async move {
        run(interval, tx, shutdown).await;
        Ok::<(), Infallible>(())
    });
    rx
}

/// Tick every `interval` until cancelled or until nobody listens.
///
/// The first tick fires one interval after start. Returns the number of
/// ticks delivered.
pub async fn run(interval: Duration, out: mpsc::Sender<Tick>, mut shutdown: ShutdownRx) -> u64 {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seq = 0u64;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Ticker cancelled after {} ticks", seq);
                break;
            }
            _ = ticker.tick() => {
                if shutdown.is_cancelled() {
                    info!("Ticker cancelled after {} ticks", seq);
                    break;
                }

                let tick = Tick { seq: seq + 1, at: Utc::now() };
                tokio::select! {
                    sent = out.send(tick) => {
                        if sent.is_err() {
                            debug!("Tick receiver dropped, stopping ticker");
                            break;
                        }
                        seq = tick.seq;
                        metrics::TICKS.inc();
                        info!("tick! ({})", seq);
                    }
                    _ = shutdown.cancelled() => {
                        info!("Ticker cancelled after {} ticks", seq);
                        break;
                    }
                }
            }
        }
    }

    seq
}
