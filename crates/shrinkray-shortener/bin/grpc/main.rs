mod cli;
mod error;
mod server;

use crate::cli::{StorageBackendArg, CLI};
use crate::server::ShortenerGrpcServer;
use anyhow::Context;
use clap::Parser;
use shrinkray_generator::RandomGenerator;
use shrinkray_proto_schema::v1::shortener_service_server::ShortenerServiceServer;
use shrinkray_shortener::{shutdown_signal, ShortenerService};
use shrinkray_storage::{InMemoryStorage, PostgresSettings, PostgresStorage, Storage};
use std::sync::Arc;
use tonic::transport::Server;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CLI::parse();
    let _telemetry = shrinkray_telemetry::init("shrinkray-shortener", &cli.telemetry)?;

    info!(
        listen_addr = %cli.listen_addr,
        storage_backend = %cli.storage,
        request_timeout_ms = cli.request_timeout_ms,
        max_attempts = cli.max_attempts,
        "starting shortener gRPC server"
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

    info!("shortener gRPC server stopped");
    Ok(())
}

async fn run_server<S: Storage>(cli: &CLI, storage: Arc<S>) -> anyhow::Result<()> {
    let service = ShortenerService::from_shared(
        Arc::clone(&storage),
        Arc::new(RandomGenerator::new()),
        cli.shortener_config(),
    );

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<ShortenerServiceServer<ShortenerGrpcServer>>()
        .await;

    let result = Server::builder()
        .add_service(health_service)
        .add_service(ShortenerServiceServer::new(ShortenerGrpcServer::new(service)))
        .serve_with_shutdown(cli.listen_addr, shutdown_signal())
        .await
        .context("gRPC server failed");

    if let Err(err) = storage.close().await {
        error!(error = %err, "failed to close storage");
    }

    result
}
