use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use grupos_api::config;
use grupos_api::database;
use grupos_api::handlers::{auth, groups, investigators, memberships};
use grupos_api::middleware::auth::jwt_auth_middleware;
use grupos_api::state::AppState;
use grupos_api::storage::LocalStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();

    let pool = database::connect_pool().await?;
    database::run_migrations(&pool).await?;

    let attachments = Arc::new(LocalStore::from_config());
    let state = AppState::new(pool, attachments);

    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    let config = config::config();

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(investigator_routes())
        .merge(group_routes())
        .merge(membership_routes())
        // Stored attachments are served statically from the uploads directory.
        .nest_service("/uploads", ServeDir::new(&config.storage.root))
        .layer(DefaultBodyLimit::max(config.storage.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Reads are public; mutations require a valid Bearer token.
fn investigator_routes() -> Router<AppState> {
    Router::new()
        .route("/investigadores", get(investigators::list))
        .route("/investigadores/all", get(investigators::list_all))
        .route("/investigadores/:id", get(investigators::get_one))
        .route("/investigadores/:id/grupos", get(groups::by_investigator))
        .route(
            "/investigadores",
            post(investigators::create).route_layer(middleware::from_fn(jwt_auth_middleware)),
        )
        .route(
            "/investigadores/:id",
            put(investigators::update)
                .delete(investigators::delete)
                .route_layer(middleware::from_fn(jwt_auth_middleware)),
        )
}

fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/grupos", get(groups::list))
        .route("/grupos/with-details", get(groups::list_with_details))
        .route("/grupos/:id", get(groups::get_one))
        .route("/grupos/:id/details", get(groups::details))
        .route("/grupos/:id/detalles", get(memberships::list_by_group))
        .route(
            "/grupos",
            post(groups::create).route_layer(middleware::from_fn(jwt_auth_middleware)),
        )
        .route(
            "/grupos/with-details",
            post(groups::create_with_details).route_layer(middleware::from_fn(jwt_auth_middleware)),
        )
        .route(
            "/grupos/:id",
            put(groups::update)
                .delete(groups::delete)
                .route_layer(middleware::from_fn(jwt_auth_middleware)),
        )
}

fn membership_routes() -> Router<AppState> {
    Router::new()
        .route("/detalles", get(memberships::list))
        .route("/detalles/:id", get(memberships::get_one))
        .route(
            "/detalles",
            post(memberships::create).route_layer(middleware::from_fn(jwt_auth_middleware)),
        )
        .route(
            "/detalles/:id",
            put(memberships::update)
                .delete(memberships::delete)
                .route_layer(middleware::from_fn(jwt_auth_middleware)),
        )
}

async fn root() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "name": "API de Grupos de Investigación",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/register, /login (public)",
            "investigadores": "/investigadores[/:id] (GET public, writes protected)",
            "grupos": "/grupos[/:id] (GET public, writes protected)",
            "detalles": "/detalles[/:id] (GET public, writes protected)",
            "uploads": "/uploads/:id (public, static)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(&state.pool).await {
        Ok(()) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
