use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use school_api::app::{build_router, cors_layer, AppState};
use school_api::database::{MemoryStore, PgStore, SchoolStore};

#[derive(Parser)]
#[command(name = "school-api")]
#[command(about = "School management REST API")]
#[command(version)]
struct Args {
    #[arg(long, env = "API_PORT", help = "Port to listen on")]
    port: Option<u16>,

    #[arg(long, env = "DATABASE_URL", help = "PostgreSQL connection URL (in-memory store when omitted)")]
    database_url: Option<String>,

    #[arg(long, help = "Apply pending migrations before serving")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT secrets, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = school_api::config::config().clone();
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(url) = args.database_url.filter(|url| !url.trim().is_empty()) {
        config.database.url = Some(url);
    }
    if args.migrate {
        config.database.run_migrations = true;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    tracing::info!("Starting School API in {:?} mode", config.environment);

    let store: Arc<dyn SchoolStore> = match config.database.url.as_deref() {
        Some(url) => {
            let store = PgStore::connect(url, &config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            if config.database.run_migrations {
                store.migrate().await.context("failed to apply migrations")?;
            }
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::from_config(store, &config);
    let mut app = build_router(state);
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security));
    }

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], config.api.port));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("School API listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;

    Ok(())
}
