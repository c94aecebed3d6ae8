//! tipwarden - keyword rules and self-expiring tips for chat groups.
//!
//! Reads newline-delimited JSON events on stdin, writes one outcome per event
//! on stdout, and emits platform actions through the console platform.

use std::sync::Arc;
use std::time::Duration;
use tipwarden::config::{self, Config};
use tipwarden::events::Event;
use tipwarden::platform::ConsolePlatform;
use tipwarden::store::{MemoryStore, RedbStore, Store};
use tipwarden::{Warden, http, metrics};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Run `job` every `secs` seconds, starting one period from now.
fn spawn_periodic<F, Fut>(warden: Arc<Warden>, secs: u64, job: F)
where
    F: Fn(Arc<Warden>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let period = Duration::from_secs(secs);
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            job(Arc::clone(&warden)).await;
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries event outcomes and platform calls.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if std::env::var("TIPWARDEN_LOG_FORMAT").is_ok_and(|f| f == "json") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tipwarden.toml".to_string());

    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).map_err(|e| {
            error!(path = %config_path, error = %e, "Failed to load config");
            e
        })?
    } else {
        warn!(path = %config_path, "Config file not found, using defaults");
        Config::default()
    };

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "Refusing to start with {} configuration error(s)",
            errors.len()
        ));
    }

    metrics::init();
    let metrics_port = config.metrics.port;
    if metrics_port != 0 {
        tokio::spawn(async move {
            http::run_http_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let store: Arc<dyn Store> = if config.store.is_memory() {
        info!("Using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(RedbStore::open(&config.store.path)?)
    };

    let timers = config.timers.clone();
    let max_in_flight = config.workers.max_in_flight;
    let warden = Arc::new(Warden::new(
        config,
        Arc::new(ConsolePlatform::new()),
        store,
    )?);
    warden.restore()?;

    spawn_periodic(Arc::clone(&warden), timers.sweep_interval, |warden| async move {
        let at = now();
        warden.sweep(at).await;
        let rotated = warden.rotate_due(at).await;
        if rotated > 0 {
            info!(rotated, "Invite links rotated");
        }
    });
    spawn_periodic(Arc::clone(&warden), timers.notify_reset_interval, |warden| async move {
        warden.reset_notifications();
    });
    spawn_periodic(Arc::clone(&warden), timers.counter_reset_interval, |warden| async move {
        warden.reset_counters();
    });
    info!(
        sweep = timers.sweep_interval,
        notify_reset = timers.notify_reset_interval,
        counter_reset = timers.counter_reset_interval,
        "Background tasks started"
    );

    let workers = Arc::new(Semaphore::new(max_in_flight));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!(max_in_flight, "tipwarden ready, reading events from stdin");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let event: Event = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Skipping malformed event");
                continue;
            }
        };

        let permit = Arc::clone(&workers).acquire_owned().await?;
        let warden = Arc::clone(&warden);
        tokio::spawn(async move {
            let outcome = warden.handle_event(event, now()).await;
            match serde_json::to_string(&outcome) {
                Ok(json) => println!("{json}"),
                Err(e) => error!(error = %e, "Failed to encode outcome"),
            }
            drop(permit);
        });
    }

    info!("stdin closed, shutting down");
    Ok(())
}
