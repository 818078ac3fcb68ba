use std::fs;
use std::sync::Arc;

use axum::Router;
use common::config::Config;
use common::DATA_FILE_ORGANIZATIONS;
use metadata::MetadataProvider;
use tokio::select;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tracing::debug;
use tracing::info;

use crate::error::Result;
use crate::init_platform;

pub async fn start(cfg: Config) -> Result<()> {
    debug!("db path: {:?}", cfg.data.path);

    fs::create_dir_all(&cfg.data.path)?;
    let pool = metadata::sqlite::new(
        cfg.data.path.join(DATA_FILE_ORGANIZATIONS),
        cfg.data.max_connections,
    )
    .await?;
    let md = Arc::new(MetadataProvider::new(pool));

    info!("initializing platform...");
    let router = init_platform(md.clone(), Router::new());

    let mut sig_int = signal(SignalKind::interrupt())?;
    let mut sig_term = signal(SignalKind::terminate())?;
    let shutdown = async move {
        select! {
            _ = sig_int.recv() => info!("SIGINT received"),
            _ = sig_term.recv() => info!("SIGTERM received"),
        }
    };

    let listener = tokio::net::TcpListener::bind(cfg.server.host).await?;
    info!("listening on {}", cfg.server.host);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("closing metadata store...");
    md.close().await;

    Ok(())
}
