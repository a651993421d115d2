use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tracing::info;

use precast_catalog::config::{AppConfig, StoreConfig, UploadMode};
use precast_catalog::db::{get_db_pool, PgStore, RecordStore};
use precast_catalog::memory::MemoryStore;
use precast_catalog::upload::Uploader;
use precast_catalog::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar .env
    let _ = dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn RecordStore> = match &config.store {
        StoreConfig::Postgres {
            url,
            max_connections,
        } => {
            let pool = get_db_pool(url, *max_connections).await?;
            info!("conectado a Postgres");
            Arc::new(PgStore::new(pool).await?)
        }
        StoreConfig::Memory => {
            info!("usando el store en memoria");
            Arc::new(MemoryStore::new())
        }
    };

    let uploader = Uploader::new(config.upload.clone());
    uploader.ensure_dir().await?;
    match &config.upload.mode {
        UploadMode::Local => {
            info!(dir = %uploader.dir().display(), "imágenes servidas en local")
        }
        UploadMode::Remote { endpoint } => {
            info!(%endpoint, "imágenes reenviadas al servidor remoto")
        }
    }

    let app = router(AppState {
        store,
        uploader: Arc::new(uploader),
    });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "servidor escuchando");
    axum::serve(listener, app).await?;

    Ok(())
}
