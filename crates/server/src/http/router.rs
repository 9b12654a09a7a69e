use super::handlers::{account, health, mods};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if allowed_origins == "*" {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
        base.allow_origin(Any)
    } else {
        tracing::info!("CORS enabled for origins: {:?}", origins);
        base.allow_origin(origins)
    }
}

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    let mods_routes = Router::new()
        .route("/", get(mods::list_mods))
        .route("/search", post(mods::search_mods))
        .route("/latest", get(mods::latest_mods))
        .route("/latest/comments", get(mods::latest_comments))
        .route("/tags", get(mods::list_tags))
        .route("/by-author/:author", get(mods::mods_by_author))
        .route("/:alias", get(mods::get_mod))
        .route("/:alias/comments", get(mods::get_mod_comments))
        .route("/:alias/banner", get(mods::get_banner).post(mods::set_banner))
        .route("/:alias/releases/:version", get(mods::get_mod_file));

    let account_routes = Router::new()
        .route("/link/start", post(account::start_link))
        .route("/link/verify", post(account::verify_link))
        .route("/link/set-password", post(account::set_password))
        .route("/login", post(account::login))
        .route("/logout", post(account::logout))
        .route("/profile", get(account::profile));

    Router::new()
        .nest("/api/v1/mods", mods_routes)
        .nest("/api/v1/account", account_routes)
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}
