use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Routes that require no token. `POST /posts` lives here on purpose: the owner
/// of a new post is whatever username the body declares.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Landing page; JSON metadata when the client asks for application/json.
        .route("/", get(handlers::root))
        // GET /api
        .route("/api", get(handlers::api_info))
        // GET /health
        .route("/health", get(handlers::health))
        // POST /sign
        // Exchanges a username for a signed access token.
        .route("/sign", post(handlers::sign_in))
        // POST /posts
        .route("/posts", post(handlers::create_post))
}
