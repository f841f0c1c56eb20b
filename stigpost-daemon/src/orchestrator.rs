//! Daemon assembly, channel wiring, and lifecycle management.
//!
//! The [`Orchestrator`] loads configuration, picks the store backend,
//! builds the ingestor, serves the HTTP router, and drains published
//! events until a shutdown signal arrives.
//!
//! # Startup Order
//!
//! 1. Metrics recorder (when enabled)
//! 2. Store backend (`memory` or `file`)
//! 3. Event channel and its drain task
//! 4. Ingestor and HTTP router
//!
//! # Shutdown Order
//!
//! 1. HTTP server stops accepting and finishes in-flight requests
//! 2. Shutdown broadcast to background tasks
//! 3. Event drain task logs whatever is still queued

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};

use stigpost_checklist_ingest::{
    ChannelPublisher, ChecklistIngestorBuilder, FileStore, IngestorConfig, MemoryStore,
};
use stigpost_core::config::StigpostConfig;
use stigpost_core::event::PublishedEvent;
use stigpost_core::store::{ArtifactStore, SystemGroupStore};

use crate::http::{self, AppState};
use crate::metrics_server;

/// Uptime gauge refresh period.
const UPTIME_INTERVAL_SECS: u64 = 10;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: StigpostConfig,
    /// Shutdown broadcast sender (signals all background tasks).
    shutdown_tx: broadcast::Sender<()>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read, parsed,
    /// or validated, or if the metrics recorder cannot be installed.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = StigpostConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    pub fn build_from_config(config: StigpostConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
        IngestorConfig::from_core(&config.ingest)
            .validate()
            .map_err(|e| anyhow::anyhow!("ingest config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            tracing::info!(port = config.metrics.port, "metrics endpoint enabled");
        }

        let (shutdown_tx, _) = broadcast::channel(16);

        tracing::info!(
            store_backend = %config.store.backend,
            bind = %config.server.bind,
            "orchestrator initialized"
        );

        Ok(Self {
            config,
            shutdown_tx,
            start_time: Instant::now(),
        })
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &StigpostConfig {
        &self.config
    }

    /// Open the configured store and serve until a shutdown signal.
    ///
    /// # Shutdown Triggers
    ///
    /// - `SIGTERM` (from systemd, Docker, or `kill`)
    /// - `SIGINT` (Ctrl+C)
    pub async fn run(&mut self) -> Result<()> {
        match self.config.store.backend.as_str() {
            "memory" => {
                tracing::warn!("memory store selected; documents are lost on restart");
                self.serve(Arc::new(MemoryStore::new())).await
            }
            "file" => {
                let store = FileStore::open(&self.config.store.path)
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to open file store: {}", e))?;
                tracing::info!(path = %store.root().display(), "file store opened");
                self.serve(Arc::new(store)).await
            }
            other => Err(anyhow::anyhow!("unknown store backend '{}'", other)),
        }
    }

    async fn serve<S>(&mut self, store: Arc<S>) -> Result<()>
    where
        S: ArtifactStore + SystemGroupStore,
    {
        let shutdown = shutdown_signal()?;

        let (publisher, event_rx) = ChannelPublisher::new(
            self.config.publisher.channel_capacity,
            self.config.publisher.topic_prefix.clone(),
        );
        let event_task = spawn_event_logger(event_rx, self.shutdown_tx.subscribe());

        let uptime_task = self
            .config
            .metrics
            .enabled
            .then(|| spawn_uptime_updater(self.start_time, self.shutdown_tx.subscribe()));

        let ingestor = ChecklistIngestorBuilder::new(store, Arc::new(publisher))
            .config(IngestorConfig::from_core(&self.config.ingest))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build checklist ingestor: {}", e))?;

        let state = AppState::new(Arc::new(ingestor), &self.config.server.actor_header)
            .map_err(|e| anyhow::anyhow!("failed to build router state: {}", e))?;
        let app = http::router(state, self.config.server.max_upload_bytes);

        let listener = tokio::net::TcpListener::bind(&self.config.server.bind)
            .await
            .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", self.config.server.bind, e))?;
        tracing::info!(bind = %self.config.server.bind, "HTTP ingress listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let signal = shutdown.await;
                tracing::info!(signal = signal, "shutdown signal received");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        tracing::info!("broadcasting shutdown signal to all tasks");
        let _ = self.shutdown_tx.send(());

        let _ = event_task.await;
        if let Some(task) = uptime_task {
            let _ = task.await;
        }

        tracing::info!("stigpost-daemon shut down");
        Ok(())
    }
}

/// Install SIGTERM and SIGINT handlers.
///
/// The returned future resolves with the name of the first signal
/// received.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
fn shutdown_signal() -> Result<impl Future<Output = &'static str> + Send> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Spawn a task that logs published events.
///
/// Stands in for the broker transport. On shutdown the remaining queued
/// events are logged before the task exits.
pub fn spawn_event_logger(
    mut event_rx: mpsc::Receiver<PublishedEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<usize> {
    tokio::spawn(async move {
        let mut count = 0usize;
        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Some(event) => {
                            log_event(&event);
                            count += 1;
                        }
                        None => {
                            tracing::debug!("event channel closed");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    while let Ok(event) = event_rx.try_recv() {
                        log_event(&event);
                        count += 1;
                    }
                    tracing::debug!(drained = count, "event logger shutting down");
                    break;
                }
            }
        }
        count
    })
}

fn log_event(event: &PublishedEvent) {
    tracing::info!(
        event_id = %event.id,
        topic = %event.topic,
        payload = %event.payload_text(),
        "event published"
    );
}

/// Spawn a task that refreshes the uptime gauge.
pub fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(UPTIME_INTERVAL_SECS));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let uptime_secs = start_time.elapsed().as_secs();
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(stigpost_core::metrics::DAEMON_UPTIME_SECONDS)
                        .set(uptime_secs as f64);
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
            }
        }
    })
}
