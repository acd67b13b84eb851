// portal-server/src/main.rs
use std::sync::Arc;

use actix_web::middleware::{Compress, Condition};
use actix_web::{web, App, HttpServer};
use common::{setup_tracing, Config};
use portal_server::backend::BackendClient;
use portal_server::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // The subscriber needs the configured level; report the config origin after
    let (config, origin) = Config::from_env();
    setup_tracing(&config.log_level);
    origin.log();

    let server_addr = config.server_addr.clone();
    tracing::info!("Starting console gateway on {}", server_addr);
    tracing::info!("Registry backend at {}", config.backend.base_url);
    if config.read_only {
        tracing::warn!("Registry is in read-only mode");
    }

    let backend = BackendClient::new(&config.backend)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let state = web::Data::new(AppState::new(&config, Arc::new(backend)));
    let _cleanup = state.registry.spawn_cleanup();

    let static_files = config.static_files.clone();
    let enable_compression = static_files.enable_compression;

    HttpServer::new(move || {
        App::new()
            .wrap(Condition::new(enable_compression, Compress::default()))
            .app_data(state.clone())
            .configure(|cfg| portal_server::configure(cfg, &static_files))
    })
    .bind(&server_addr)?
    .run()
    .await
}
