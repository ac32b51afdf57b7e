use std::sync::Arc;

use crate::configs::{SchemaManager, Settings, Storage};
use crate::repositories::DeviceRepository;
use crate::services::ingest::IngestService;
use crate::services::telemetry_sink::TelemetrySink;

pub mod configs;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod services;

pub async fn run(settings: &Arc<Settings>) -> anyhow::Result<()> {
    let storage = Arc::new(Storage::new(settings.database.clone(), SchemaManager::default()).await?);

    let registry = Arc::new(DeviceRepository::new(storage.clone()));

    let sink = Arc::new(TelemetrySink::new(settings.influx.clone()));
    sink.ensure_bucket().await?;

    let service = IngestService::new(&settings.broker, registry, sink);

    tracing::info!(
        "connecting to broker {}:{}",
        settings.broker.host,
        settings.broker.port
    );

    service.run().await;

    Ok(())
}
