use crate::registry::RegionSnapshot;
use tokio::sync::watch::Receiver;
use tracing::{info, instrument};

#[instrument(skip_all)]
pub async fn registry_listener(mut rx: Receiver<RegionSnapshot>, capacity: usize) {
    while rx.changed().await.is_ok() {
        let count = rx.borrow_and_update().len();
        log_count(count, capacity);
    }
}

fn log_count(count: usize, capacity: usize) {
    if count >= capacity {
        info!(count, capacity, "📍 Geotifications ({}), capacity reached, adding is disabled", count);
    } else {
        info!(count, capacity, "📍 Geotifications ({})", count);
    }
}
