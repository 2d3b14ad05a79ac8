use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes that only run after the auth gate has verified a bearer token.
/// `create_router` wraps this whole router in `auth::auth_gate`, and the
/// handlers read the caller's identity through the `RequestIdentity` extractor.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /posts
        // Posts owned by the token's subject only.
        .route("/posts", get(handlers::list_own_posts))
        // GET /posts/all
        .route("/posts/all", get(handlers::list_all_posts))
}
