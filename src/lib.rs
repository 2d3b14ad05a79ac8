use std::{sync::Arc, time::Instant};

use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod token;

// Routing segregation (Public, Authenticated).
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use auth::{RequestIdentity, TokenCodecState};
pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{InMemoryPostStore, PostStore, PostStoreState};
pub use token::{Claims, TokenCodec, TokenError};

/// ApiDoc
///
/// Aggregates the annotated handlers and schemas into the OpenAPI document
/// served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::sign_in, handlers::create_post, handlers::list_own_posts,
        handlers::list_all_posts, handlers::health, handlers::api_info,
    ),
    components(
        schemas(
            models::Post, models::SignInRequest, models::SignInResponse, models::SignedInUser,
            models::CreatePostRequest, models::PostCreatedResponse, models::AllPostsResponse,
            models::HealthResponse, models::ApiInfo, models::ErrorBody,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "bearer-posts", description = "Bearer-token protected posts API")
    )
)]
struct ApiDoc;

/// Registers the `bearer` security scheme referenced by the protected paths.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// Implements the **Unified State Pattern**: the single, cheaply clonable container
/// holding every service a request may need. Handlers never reach for globals;
/// they pull exactly the piece they need through `State<AppState>` or one of the
/// `FromRef` projections below.
///
/// Because the post store is injected here rather than living at module level,
/// each test builds its own isolated state, and a persistent backend can replace
/// the in-memory store without touching a single handler.
#[derive(Clone)]
pub struct AppState {
    /// Post storage, injected so tests and future backends can swap it.
    pub store: PostStoreState,
    /// Token issuing/verification, keyed by the configured secret.
    pub tokens: TokenCodecState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
    /// Process start, for the uptime reported by /health.
    pub started_at: Instant,
}

impl AppState {
    /// new
    ///
    /// Builds the state around `store`, deriving the token codec from the
    /// configured secret.
    pub fn new(config: AppConfig, store: PostStoreState) -> Self {
        let tokens = Arc::new(TokenCodec::new(config.token_secret.expose()));
        Self {
            store,
            tokens,
            config,
            started_at: Instant::now(),
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// These let extractors and middleware pull a single component out of AppState.
// The auth gate, for example, only ever sees the token codec.

impl FromRef<AppState> for PostStoreState {
    fn from_ref(app_state: &AppState) -> PostStoreState {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for TokenCodecState {
    fn from_ref(app_state: &AppState) -> TokenCodecState {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies the auth gate to
/// the protected routes, wraps everything in the observability layers and
/// registers the application state.
///
/// *Ordering*: the observability layers are applied outermost, so even requests
/// rejected by the auth gate get a request id and a trace span. The gate itself
/// is a `route_layer`, so it only runs for requests that matched a protected
/// route; unknown paths still fall through to a plain 404.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: sign-in, post creation, health and metadata.
        .merge(public::public_routes())
        // Authenticated Routes: one gate instance shared by every protected route.
        // `GET /posts` merges with the public `POST /posts` into a single path,
        // and only the GET side carries the gate.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::auth_gate,
            )),
        )
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged with the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (Applied last)
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span so every log line of a request carries its
/// method, URI and `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
