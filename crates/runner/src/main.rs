use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orderflow_core::{
    load_config, register_metrics, shutdown, ticker, validate_config, Config, ConfigError,
    Database, InitGuard, Lifecycle, OrderPipeline, ShutdownTx,
};

/// Environment variable naming the config file.
const CONFIG_PATH_ENV: &str = "ORDERFLOW_CONFIG";

/// Config file used when the environment does not name one.
const DEFAULT_CONFIG_PATH: &str = "orderflow.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    // Load configuration; a missing file means defaults
    let (config, missing_file) = match load_config(&config_path) {
        Ok(config) => (config, false),
        Err(ConfigError::FileNotFound(_)) => (Config::default(), true),
        Err(e) => {
            init_logging(false);
            return Err(e)
                .with_context(|| format!("Failed to load config from {:?}", config_path));
        }
    };

    init_logging(config.logging.json);

    if missing_file {
        info!("No config at {:?}, using defaults", config_path);
    } else {
        info!("Loaded configuration from {:?}", config_path);
    }

    validate_config(&config).context("Configuration validation failed")?;
    debug!(
        "Effective configuration: {}",
        serde_json::to_string(&config).unwrap_or_default()
    );

    // Open the database exactly once
    let mut database: InitGuard<Database> = InitGuard::new();
    for attempt in 1..=2 {
        let db = database
            .get_or_try_init(|| Database::open(&config.database))
            .context("Failed to open database")?;
        debug!("Database init attempt {} -> {}", attempt, db.location());
    }
    if let Some(db) = database.get() {
        db.ping().context("Database ping failed")?;
        info!("Database ready ({})", db.location());
    }

    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    let shutdown_tx = Arc::new(shutdown_tx);
    let signal_listener = tokio::spawn(cancel_on_signal(Arc::clone(&shutdown_tx)));

    // Run the order pipeline
    let pipeline = OrderPipeline::new(config.pipeline.clone());
    let report = pipeline
        .run(config.input.records.clone(), shutdown_rx.clone())
        .await
        .context("Order pipeline failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to encode report")?
    );

    if config.ticker.enabled && !shutdown_rx.is_cancelled() {
        run_ticker(&config, &shutdown_tx).await?;
    }

    signal_listener.abort();

    if config.metrics.dump {
        dump_metrics()?;
    }

    if let Some(db) = database.teardown() {
        db.close().context("Failed to close database")?;
        info!("Database closed");
    }

    Ok(())
}

/// Initialize the tracing subscriber.
fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Let the ticker run for the configured time, then cancel it and wait.
async fn run_ticker(config: &Config, shutdown_tx: &ShutdownTx) -> Result<()> {
    let lifecycle = Lifecycle::new();
    let interval = Duration::from_millis(config.ticker.interval_ms);
    let mut shutdown_rx = shutdown_tx.subscribe();

    let mut ticks = ticker::spawn(&lifecycle, interval, shutdown_tx.subscribe());
    let consumer = tokio::spawn(async move {
        let mut received = 0u64;
        while let Some(tick) = ticks.recv().await {
            debug!("Tick {} at {}", tick.seq, tick.at);
            received += 1;
        }
        received
    });

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_millis(config.ticker.run_for_ms)) => {
            info!("Ticker ran for {} ms, cancelling", config.ticker.run_for_ms);
        }
        _ = shutdown_rx.cancelled() => {
            info!("Ticker cancelled by signal");
        }
    }
    shutdown_tx.cancel();

    lifecycle.wait().await.context("Ticker failed")?;
    let received = consumer.await.context("Tick consumer panicked")?;
    info!("Ticker stopped after {} ticks", received);
    Ok(())
}

/// Print every registered metric in the Prometheus text format.
fn dump_metrics() -> Result<()> {
    let registry = Registry::new();
    register_metrics(&registry).context("Failed to register metrics")?;

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .context("Failed to encode metrics")?;
    print!("{}", String::from_utf8_lossy(&buffer));
    Ok(())
}

/// Cancel the shutdown signal on Ctrl+C or SIGTERM.
async fn cancel_on_signal(shutdown_tx: Arc<ShutdownTx>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
    shutdown_tx.cancel();
}
