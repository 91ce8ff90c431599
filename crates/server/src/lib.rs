//! mediarank server: a small social voting site for media works.
//!
//! Users authenticate through a third-party OAuth provider, own the works
//! they create, and cast at most one up-vote on works they do not own.
//! Handlers are stateless per request: session lookup, entity load,
//! authorization check, mutation, then a redirect carrying a flash message.

pub mod error;
pub mod flash;
pub mod routes;
pub mod storage;

use axum::{
    extract::FromRef,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mediarank_api::oauth::OAuthProviderConfig;
use storage::Db;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
}

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub oauth_providers: Vec<OAuthProviderConfig>,
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Landing page: public
        .route("/", get(routes::home::root))
        // Session / auth
        .route("/login", get(routes::session::login_form))
        .route("/logout", delete(routes::session::logout))
        .route("/auth/{provider}", get(routes::oauth::begin))
        .route(
            "/auth/callback/{provider}",
            get(routes::oauth::callback).post(routes::oauth::callback),
        )
        // Work catalog
        .route(
            "/works",
            get(routes::works::index).post(routes::works::create),
        )
        .route("/works/new", get(routes::works::new_form))
        .route(
            "/works/{id}",
            get(routes::works::show)
                .put(routes::works::update)
                .delete(routes::works::destroy),
        )
        .route("/works/{id}/edit", get(routes::works::edit_form))
        // Vote ledger
        .route("/works/{id}/upvote", post(routes::votes::upvote))
        // User directory
        .route("/users", get(routes::users::index))
        .route("/users/{id}", get(routes::users::show))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
