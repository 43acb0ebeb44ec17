mod dto;
mod error;
mod handlers;
mod services;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::body::Body;
use axum::http::{HeaderValue, Request, Response};
use axum::routing::{get, post};
use axum::Router;
use scout_config::{ServerSettings, Settings};
use scout_engine::{build_internal_agent, Agent};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub struct ServerState {
    pub agent: Arc<dyn Agent>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    init_tracing(&settings.log_level);
    info!(
        model = %settings.model.model,
        collection = %settings.vector_store.collection,
        "Loaded settings"
    );

    let agent = build_internal_agent(&settings).await;
    let state = Arc::new(ServerState { agent: Arc::new(agent) });
    let app = build_router(state, &settings.server);

    let addr = settings.server.bind_addr();
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` wins; otherwise `level` with noisy HTTP internals held at warn.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},hyper=warn,reqwest=warn,h2=warn")));

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .compact()
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

fn cors_layer(server: &ServerSettings) -> CorsLayer {
    let origin = match server.allows_any_origin() {
        true => AllowOrigin::any(),
        false => {
            let origins: Vec<HeaderValue> = server
                .allowed_origins
                .iter()
                .filter_map(|o| match o.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin: {}", o);
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        }
    };

    CorsLayer::new().allow_origin(origin).allow_methods(Any).allow_headers(Any)
}

fn build_router(state: Arc<ServerState>, server: &ServerSettings) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %req.method(),
                uri = %req.uri(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let v1 = Router::new()
        .route("/health", get(handlers::health))
        .route("/internal_agent/query", post(handlers::agent::query))
        .route("/internal_agent/internal_agent", get(handlers::agent::legacy));

    Router::new()
        .nest(&format!("{}/v1", server.api_prefix), v1)
        .route("/", get(handlers::root))
        .layer(trace_layer)
        .layer(cors_layer(server))
        .with_state(state)
}
