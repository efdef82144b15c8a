//! Solve server - HTTP endpoint turning math problem photos into rendered steps.

mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use clap::Parser;
use snapsolve::io::config::{load_config, read_api_key, resolve_config_path};
use snapsolve::io::model::OpenAiClient;
use snapsolve::solve::{SolveService, SolveSettings};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::state::{AppState, SharedModel};

/// Room for the JSON envelope around the image payload.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Parser)]
#[command(name = "snapsolve-server")]
#[command(about = "HTTP endpoint that solves photographed math problems")]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value = "3000")]
    port: u16,

    /// Config file (defaults to $SNAPSOLVE_CONFIG, then ./snapsolve.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of static capture UI files to serve at `/`
    #[arg(long)]
    ui_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("snapsolve_server=info".parse()?)
                .add_directive("snapsolve=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let config = load_config(&config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;
    let api_key = read_api_key(&config.model)?;
    let client: SharedModel = Arc::new(OpenAiClient::from_config(&config.model, api_key)?);
    info!(
        config = %config_path.display(),
        model = %config.model.name,
        strict_output = config.solve.strict_output,
        "starting snapsolve-server"
    );

    let service = SolveService::new(client, SolveSettings::from_config(&config))?;
    let state = AppState::new(service);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .nest("/api", routes::api_router())
        .layer(DefaultBodyLimit::max(
            config.solve.max_image_bytes + BODY_OVERHEAD_BYTES,
        ))
        .layer(cors)
        .with_state(state);

    if let Some(ui_dir) = args.ui_dir {
        if ui_dir.exists() {
            info!(ui_dir = %ui_dir.display(), "serving static UI files");
            app =
                app.fallback_service(ServeDir::new(ui_dir).append_index_html_on_directories(true));
        } else {
            info!(ui_dir = %ui_dir.display(), "UI directory not found, API-only mode");
        }
    }

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
