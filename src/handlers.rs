use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;

use crate::{
    AppState,
    auth::{BEARER_SCHEME, RequestIdentity},
    error::{ApiError, Result},
    models::{
        AllPostsResponse, ApiInfo, CreatePostRequest, ErrorBody, HealthResponse, Post,
        PostCreatedResponse, SignInRequest, SignInResponse, SignedInUser,
    },
    token::Claims,
};

const API_NAME: &str = "JWT Authentication API";

/// An unreadable or missing JSON body is treated as an empty one, so the caller
/// gets the endpoint's missing-field error instead of a bare rejection.
fn body_or_default<T: Default>(payload: std::result::Result<Json<T>, JsonRejection>) -> T {
    match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(%rejection, "request body ignored");
            T::default()
        }
    }
}

// --- Handlers ---

/// sign_in
///
/// [Public Route] Issues an access token for `username`.
/// The token carries `sub = username`, `iat`, and `exp` when a lifetime is configured.
#[utoipa::path(
    post,
    path = "/sign",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Token issued", body = SignInResponse),
        (status = 400, description = "Username missing", body = ErrorBody)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<SignInResponse>> {
    let request = body_or_default(payload);
    let username = request.username()?;

    let claims = Claims::for_subject(username, state.config.token_ttl);
    let access_token = state
        .tokens
        .issue(&claims)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!(user = %username, "access token issued");

    Ok(Json(SignInResponse {
        access_token,
        token_type: BEARER_SCHEME.to_string(),
        message: format!("Successfully signed in as {username}"),
        user: SignedInUser {
            name: username.to_string(),
        },
    }))
}

/// create_post
///
/// [Public Route] Appends a new post owned by the declared `username`.
///
/// *Note*: The owner is taken from the request body, not from a token. This
/// route is deliberately unauthenticated.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = PostCreatedResponse),
        (status = 400, description = "Missing required fields", body = ErrorBody)
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PostCreatedResponse>)> {
    let post = body_or_default(payload).into_post()?;
    let post = state.store.append(post).await;

    Ok((
        StatusCode::CREATED,
        Json(PostCreatedResponse {
            message: "Post created successfully".to_string(),
            post,
        }),
    ))
}

/// list_own_posts
///
/// [Authenticated Route] Lists the posts owned by the token's subject.
/// The filter comes from the verified identity, never from the request.
#[utoipa::path(
    get,
    path = "/posts",
    responses(
        (status = 200, description = "Posts owned by the caller", body = [Post]),
        (status = 401, description = "No token", body = ErrorBody),
        (status = 403, description = "Invalid or expired token", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn list_own_posts(
    identity: RequestIdentity,
    State(state): State<AppState>,
) -> Json<Vec<Post>> {
    Json(state.store.list_by_owner(identity.subject()).await)
}

/// list_all_posts
///
/// [Authenticated Route] Lists every post regardless of owner.
#[utoipa::path(
    get,
    path = "/posts/all",
    responses(
        (status = 200, description = "All posts", body = AllPostsResponse),
        (status = 401, description = "No token", body = ErrorBody),
        (status = 403, description = "Invalid or expired token", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn list_all_posts(
    _identity: RequestIdentity,
    State(state): State<AppState>,
) -> Json<AllPostsResponse> {
    Json(AllPostsResponse {
        message: "All posts (requires authentication)".to_string(),
        posts: state.store.list_all().await,
    })
}

/// health
///
/// [Public Route] Liveness check with process uptime in seconds.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Healthy", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

/// api_info
///
/// [Public Route] Static description of the API surface.
#[utoipa::path(
    get,
    path = "/api",
    responses((status = 200, description = "API information", body = ApiInfo))
)]
pub async fn api_info() -> Json<ApiInfo> {
    Json(build_api_info(None))
}

/// root
///
/// [Public Route] Content-negotiated landing page: JSON metadata when the
/// client accepts `application/json`, a small HTML page otherwise.
pub async fn root(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let accepts_json = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"));

    if accepts_json {
        let hint = format!(
            "Visit http://localhost:{} in your browser for interactive testing",
            state.config.port
        );
        Json(build_api_info(Some(hint))).into_response()
    } else {
        Html(LANDING_PAGE).into_response()
    }
}

fn build_api_info(web_interface: Option<String>) -> ApiInfo {
    let endpoints = [
        ("POST /sign", "Sign in to get JWT token"),
        ("GET /posts", "Get user posts (requires authentication)"),
        ("GET /posts/all", "Get all posts (requires authentication)"),
        ("POST /posts", "Create new post (public - no auth required)"),
        ("GET /health", "Health check"),
        ("GET /api", "API information"),
    ]
    .into_iter()
    .map(|(route, description)| (route.to_string(), description.to_string()))
    .collect::<BTreeMap<_, _>>();

    ApiInfo {
        message: API_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
        authentication: "Bearer Token in Authorization header".to_string(),
        documentation: "See /swagger-ui for the interactive OpenAPI documentation".to_string(),
        web_interface,
    }
}

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>JWT Authentication API</title>
</head>
<body>
  <h1>JWT Authentication API</h1>
  <p>Sign in with <code>POST /sign</code>, then send <code>Authorization: Bearer &lt;token&gt;</code>.</p>
  <ul>
    <li><code>POST /sign</code> - get a token</li>
    <li><code>POST /posts</code> - create a post (public)</li>
    <li><code>GET /posts</code> - your posts (authenticated)</li>
    <li><code>GET /posts/all</code> - all posts (authenticated)</li>
    <li><code>GET /health</code> - health check</li>
    <li><code>GET /api</code> - API information</li>
  </ul>
  <p>Interactive documentation: <a href="/swagger-ui">/swagger-ui</a></p>
</body>
</html>
"#;
