use crate::app_config::{AppConfig, StorageKind};
use crate::bridge::CommandHandler;
use crate::monitor::SimulatedMonitor;
use crate::persistence::{FileStore, MemoryStore, PersistenceStore};
use crate::reconciler::reconciler;
use crate::registry::GeofenceRegistry;
use crate::registry_listener::registry_listener;
use std::sync::Arc;
use tokio::io::{BufReader, stdin, stdout};
use tokio::task;
use tracing::{info, warn};

mod app_config;
mod bridge;
mod domain;
mod monitor;
mod persistence;
mod reconciler;
mod registry;
mod registry_listener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Responses go to stdout, so logs go to stderr
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).with_writer(std::io::stderr).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!("✅  Loaded configuration");

    let store: Arc<dyn PersistenceStore> = match config.storage().kind() {
        StorageKind::File => Arc::new(FileStore::new(config.storage().directory(), config.storage().slot())),
        StorageKind::Memory => {
            warn!("⚠️ Using in-memory storage, regions will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    let monitor = Arc::new(SimulatedMonitor::from_config(config.monitor()));
    let registry = Arc::new(GeofenceRegistry::new(store, monitor.clone()));

    let notifier_rx = registry.subscribe();
    let capacity = registry.capacity();
    task::spawn(async move {
        registry_listener(notifier_rx, capacity).await;
    });

    registry.initialize().await?;
    info!("✅  Initialized registry");

    let report = registry.synchronize_all().await;
    info!(
        "✅  Synchronized monitoring, {} started, {} stopped, {} warning(s)",
        report.started.len(),
        report.stopped.len(),
        report.warnings.len()
    );

    if let Some(period) = config.core().reconcile_interval() {
        let registry = registry.clone();
        task::spawn(async move {
            reconciler(registry, period).await;
        });
        info!("✅  Scheduled reconciliation every {:?}", period);
    }

    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));

    let handler = CommandHandler::new(registry, monitor);
    bridge::listen(BufReader::new(stdin()), stdout(), &handler).await?;

    Ok(())
}
