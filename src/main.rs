//! Folio - portfolio site backend
//! Users, blog posts, projects and card payments over a document store,
//! with bearer-token authentication and per-request role checks.

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use folio_backend::{
    auth::{JwtHandler, UserStore},
    config::IN_MEMORY_DB,
    create_router,
    payments::{PaymentGateway, StripeGateway},
    store::{DocumentStore, MemoryDocumentStore, SqliteDocumentStore},
    AppState, Config,
};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let config = Config::parse();
    config.validate()?;

    info!("🚀 Folio backend starting");

    // Signing secret problems stop startup here, never per request.
    let jwt_handler = Arc::new(JwtHandler::new(&config.token_secret)?);

    let db_path = config.resolved_db_path();
    let store: Arc<dyn DocumentStore> = if db_path == IN_MEMORY_DB {
        warn!("Using in-memory document store; data is lost on exit");
        Arc::new(MemoryDocumentStore::new())
    } else {
        Arc::new(SqliteDocumentStore::new(&db_path)?)
    };
    info!("📊 Database initialized at: {}", db_path);

    if let Some(email) = config.admin_email() {
        UserStore::new(store.clone())
            .ensure_admin(email)
            .await
            .context("Failed to seed admin user")?;
    }

    let payments: Option<Arc<dyn PaymentGateway>> = match config.payment_key() {
        Some(key) => {
            let http_client = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .context("Failed to build HTTP client")?;
            Some(Arc::new(StripeGateway::new(
                http_client,
                &config.stripe_api_base,
                key.to_string(),
            )))
        }
        None => {
            warn!("PAYMENT_KEY not set; payment intents are disabled");
            None
        }
    };

    let app = create_router(AppState::new(store, jwt_handler, payments));

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🎯 Server is running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_backend=debug,folio=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate directory when started from elsewhere
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
