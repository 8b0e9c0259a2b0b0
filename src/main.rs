use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod rate_limit;
mod services;
#[cfg(test)]
mod test_support;

use config::Config;
use rate_limit::RateLimitState;
use services::analysis::StagedSimulator;
use services::analysis_registry::AnalysisRegistry;
use services::mood_store::MoodStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub ws_tx: Option<broadcast::Sender<String>>,
    pub rate_limiter: RateLimitState,
    pub moods: MoodStore,
    pub analyses: AnalysisRegistry,
    pub simulator: Arc<StagedSimulator>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Arc<Config>, ws_tx: Option<broadcast::Sender<String>>) -> Self {
        Self {
            moods: MoodStore::new(db.clone()),
            analyses: AnalysisRegistry::new(ws_tx.clone()),
            simulator: Arc::new(StagedSimulator::new(config.analysis_step_interval())),
            rate_limiter: RateLimitState::new(),
            db,
            config,
            ws_tx,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let analysis_start = Router::new()
        .route("/api/analyses", post(handlers::analyses::start_analysis))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_analysis,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler))
        // Mood journal
        .route(
            "/api/moods",
            get(handlers::moods::list_moods).post(handlers::moods::upsert_mood),
        )
        .route("/api/moods/today", get(handlers::moods::todays_mood))
        .route("/api/moods/insights", get(handlers::moods::mood_insights))
        .route("/api/moods/tags", get(handlers::moods::mood_vocabulary))
        // Uploads & simulated analysis
        .route("/api/uploads", post(handlers::uploads::screen))
        .route(
            "/api/analyses/:id",
            get(handlers::analyses::get_analysis).delete(handlers::analyses::cancel_analysis),
        )
        .merge(analysis_start)
        .layer(DefaultBodyLimit::max(state.config.request_body_limit))
        .with_state(state)
}

/// Purges finished analyses and stale rate-limit windows once a minute.
fn spawn_maintenance_worker(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            let purged = state
                .analyses
                .purge_finished(state.config.analysis_retention())
                .await;
            let windows = state
                .rate_limiter
                .cleanup(state.config.analysis_rate_window_secs)
                .await;
            if purged > 0 || windows > 0 {
                tracing::info!(
                    purged_analyses = purged,
                    expired_rate_windows = windows,
                    "Maintenance sweep"
                );
            }
        }
    });
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindful_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env().expect("Invalid configuration"));

    // Database
    let db = db::create_pool(&config.database_url).await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    // WebSocket broadcast channel
    let (ws_tx, _) = broadcast::channel::<String>(256);

    let state = AppState::new(db, config.clone(), Some(ws_tx));

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .expect("FRONTEND_URL must be a valid header value")];
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    spawn_maintenance_worker(state.clone());

    let app = build_router(state)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");
    // Client IPs feed the analysis rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .expect("Server error");
}
