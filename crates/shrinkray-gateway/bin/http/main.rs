mod cli;

use crate::cli::{StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use shrinkray_gateway::{App, AppState};
use shrinkray_generator::RandomGenerator;
use shrinkray_shortener::{shutdown_signal, ShortenerService};
use shrinkray_storage::{InMemoryStorage, PostgresSettings, PostgresStorage, Storage};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CLI::parse();
    let _telemetry = shrinkray_telemetry::init("shrinkray-gateway", &cli.telemetry)?;

    info!(
        listen_addr = %cli.listen_addr,
        storage_backend = %cli.storage,
        request_timeout_ms = cli.request_timeout_ms,
        max_attempts = cli.max_attempts,
        "starting gateway server"
    );

    match cli.storage {
        StorageBackendArg::InMemory => {
            run_server(&cli, Arc::new(InMemoryStorage::new())).await?;
        }
        StorageBackendArg::Postgres => {
            let url = cli
                .postgres_url
                .clone()
                .context("postgres url is required when storage backend is postgres")?;
            let settings = PostgresSettings::builder()
                .url(url)
                .max_connections(cli.postgres_max_connections)
                .build();
            let storage = PostgresStorage::connect(&settings)
                .await
                .context("failed to connect to postgres")?;
            run_server(&cli, Arc::new(storage)).await?;
        }
    }

    info!("gateway server stopped");
    Ok(())
}

async fn run_server<S: Storage>(cli: &CLI, storage: Arc<S>) -> anyhow::Result<()> {
    let service = ShortenerService::from_shared(
        Arc::clone(&storage),
        Arc::new(RandomGenerator::new()),
        cli.shortener_config(),
    );
    let router = App::router(AppState::new(Arc::new(service)));

    let listener = tokio::net::TcpListener::bind(cli.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed");

    if let Err(err) = storage.close().await {
        error!(error = %err, "failed to close storage");
    }

    result
}
