use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderName, Method, Response};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use prize_wheel::Campaign;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::games::backend_wheel_game::create_router as create_wheel_game_router;
use crate::services::contact_service::submit_contact;
use crate::services::session_store::{SessionStore, TokioRevealScheduler};

mod config;
mod error;
mod games;
mod logging;
mod services;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    campaign: Arc<Campaign>,
    sessions: SessionStore,
    scheduler: TokioRevealScheduler,
    http: reqwest::Client,
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Must be called inside the tokio runtime that will run reveal timers.
    pub fn new(campaign: Campaign, config: ServerConfig) -> Self {
        Self {
            campaign: Arc::new(campaign),
            sessions: SessionStore::new(),
            scheduler: TokioRevealScheduler::current(),
            http: reqwest::Client::new(),
            config: Arc::new(config),
        }
    }
}

pub async fn health_check() -> impl IntoResponse {
    Response::builder()
        .status(200)
        .body(Body::from("OK"))
        .unwrap_or_default()
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.allowed_origins.clone())
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(vec![
            header::CONTENT_TYPE,
            HeaderName::from_static("x-requested-with"),
        ]);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/contact", post(submit_contact))
        .nest("/api/wheel", create_wheel_game_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn load_campaign(config: &ServerConfig) -> Result<Campaign, Box<dyn std::error::Error>> {
    let campaign = match &config.campaign_file {
        Some(path) => {
            info!("Loading campaign from {}", path.display());
            Campaign::from_json(&std::fs::read_to_string(path)?)?
        }
        None => Campaign::builtin()?,
    };
    Ok(campaign)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::from_path(".env").ok();
    logging::setup();

    let config = ServerConfig::from_env()?;
    let campaign = load_campaign(&config).map_err(|e| {
        error!("Campaign configuration rejected: {}", e);
        e
    })?;

    let state = AppState::new(campaign, config.clone());

    // Idle sessions are swept; nothing about them is kept.
    let sessions = state.sessions.clone();
    let ttl = config.session_ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.sweep(ttl);
            if removed > 0 {
                info!("Swept {} idle wheel sessions ({} live)", removed, sessions.len());
            }
        }
    });

    let app = build_router(state);
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Prize wheel listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
