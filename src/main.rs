use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vidshare_api::auth::TokenService;
use vidshare_api::config::{AppConfig, MediaBackend, StorageBackend};
use vidshare_api::database::{MemoryStore, PgStore, Store};
use vidshare_api::media::{CloudinaryHost, MediaHost, MemoryMediaHost};
use vidshare_api::routes::app;
use vidshare_api::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "vidshare-api")]
#[command(about = "Video-sharing platform REST API")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides VIDSHARE_PORT)")]
    port: Option<u16>,

    #[arg(long, value_enum, help = "Storage backend (overrides STORAGE_BACKEND)")]
    storage: Option<StorageBackend>,

    #[arg(long, value_enum, help = "Media backend (overrides MEDIA_BACKEND)")]
    media: Option<MediaBackend>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, secrets, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vidshare_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env().context("failed to read configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(storage) = args.storage {
        config.database.backend = storage;
    }
    if let Some(media) = args.media {
        config.media.backend = media;
    }
    config.validate().context("invalid configuration")?;

    tracing::info!(
        "Starting VidShare API in {:?} mode (storage: {:?}, media: {:?})",
        config.environment,
        config.database.backend,
        config.media.backend
    );

    let store: Arc<dyn Store> = match config.database.backend {
        StorageBackend::Postgres => Arc::new(
            PgStore::connect(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?,
        ),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let media: Arc<dyn MediaHost> = match config.media.backend {
        MediaBackend::Cloudinary => Arc::new(CloudinaryHost::new(&config.media).context("failed to configure Cloudinary")?),
        MediaBackend::Memory => Arc::new(MemoryMediaHost::new(config.media.folder.clone())),
    };

    let tokens = TokenService::new(&config.auth).context("failed to configure token signing")?;
    let bind_addr = config.bind_addr();
    let state = AppState::new(config, store, media, tokens);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("VidShare API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
