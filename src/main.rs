use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use config::Config;
use db::progress::ProgressStore;
use services::files::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub store: ProgressStore,
    pub files: FileStore,
    pub config: Arc<Config>,
}

/// Router factory, separated from `main` so tests can drive the full
/// middleware stack without binding a socket.
fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        // Progress
        .route("/api/progress", get(handlers::progress::list_progress))
        .route(
            "/api/progress/history",
            get(handlers::progress::get_history),
        )
        .route("/api/progress/stats", get(handlers::progress::get_stats))
        .route(
            "/api/progress/:date",
            get(handlers::progress::get_by_date).put(handlers::progress::update_progress),
        )
        .route(
            "/api/progress/:date/water",
            post(handlers::progress::increment_water),
        )
        // Photos
        .route(
            "/api/progress/:date/photo",
            post(handlers::photos::upload_photo),
        )
        .route("/api/photos/:file_name", get(handlers::photos::get_photo))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .unwrap()];
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

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seventyfive_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Database
    let pool = db::create_pool(&config.database_url).await;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let state = AppState {
        store: ProgressStore::new(pool, config.water_goal_ml),
        files: FileStore::new(&config.upload_dir),
        config: config.clone(),
    };

    let app = app(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// State over a lazily-connected pool: routes that never touch the
    /// database can be exercised without Postgres running.
    fn test_state() -> AppState {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/seventyfive_test")
            .expect("lazy pool");
        let config = Arc::new(Config {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:6896".into(),
            water_goal_ml: config::DEFAULT_WATER_GOAL_ML,
            history_days: 30,
            upload_dir: "uploads".into(),
        });
        AppState {
            store: ProgressStore::new(pool, config.water_goal_ml),
            files: FileStore::new(&config.upload_dir),
            config,
        }
    }

    #[tokio::test]
    async fn test_health_endpoint_responds_ok() {
        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "seventyfive-api");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .uri("/api/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_date_is_rejected_before_storage() {
        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .uri("/api/progress/not-a-date")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
