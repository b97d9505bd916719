mod errors;
mod params;
mod services;

use actix_web::{web, App, HttpServer};
use blob_store::ChunkedBlobStore;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use crate::params::Args;
use crate::services::blob_service::{self, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = args.store_config().validate().map_err(std::io::Error::other)?;
    let chunk_stores = args.chunk_stores().map_err(std::io::Error::other)?;
    tracing::info!("using {:?} backend with {:?}", args.backend, config);

    let shared_state = web::Data::new(AppState {
        store: ChunkedBlobStore::new(chunk_stores, config),
    });
    let max_body_bytes = args.max_body_bytes;

    tracing::info!("Blob store listening on: {}", args.http_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(shared_state.clone())
            .app_data(web::PayloadConfig::new(max_body_bytes))
            .configure(blob_service::configure)
    })
        .bind(args.http_addr.clone())?
        .run()
        .await
}
