mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use agora_api::attachments::{AttachmentResolver, UploadStore};
use agora_api::content::ContentService;
use agora_api::identity::IdentityService;
use agora_api::tokens::TokenSigner;
use agora_api::{AppState, AppStateInner};
use agora_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora=debug,agora_api=debug,agora_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and upload storage
    let db = Arc::new(Database::open(&config.db_path)?);
    let uploads = UploadStore::new(config.uploads_dir.clone(), config.max_upload_bytes).await?;

    let state: AppState = Arc::new(AppStateInner {
        identity: IdentityService::new(db.clone(), TokenSigner::new(&config.jwt_secret)),
        content: ContentService::new(db, AttachmentResolver::new(&config.public_url), config.policy),
        uploads,
    });

    let app = agora_api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Agora listening on {}", addr);
    info!("Attachments served from {}/uploads", config.public_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
