use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ApiError;

// --- Core Records ---

/// Post
///
/// A single post held by the post store. `owner` is fixed at creation from the
/// creating request's declared username and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Post {
    pub owner: String,
    pub title: String,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        owner: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            title: title.into(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// The two posts the demo store starts with.
pub fn demo_posts() -> Vec<Post> {
    vec![
        Post::new("Rodrigo", "Post 1", "This is the first post by Rodrigo"),
        Post::new("Audrey", "Post 2", "This is the second post by Audrey"),
    ]
}

// --- Request Payloads (Input Schemas) ---

/// SignInRequest
///
/// Input payload for POST /sign. The field is optional at the type level so an
/// absent username surfaces as a 400 rather than a deserialization rejection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignInRequest {
    #[schema(example = "Audrey")]
    pub username: Option<String>,
}

impl SignInRequest {
    pub fn username(&self) -> Result<&str, ApiError> {
        required(&self.username).ok_or(ApiError::MissingField {
            error: "Username is required",
            message: "Please provide a username in the request body",
        })
    }
}

/// CreatePostRequest
///
/// Input payload for POST /posts. All three fields must be present and non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub username: Option<String>,
}

impl CreatePostRequest {
    /// into_post
    ///
    /// Validates the payload and stamps the creation time.
    pub fn into_post(self) -> Result<Post, ApiError> {
        match (
            required(&self.title),
            required(&self.content),
            required(&self.username),
        ) {
            (Some(title), Some(content), Some(username)) => {
                Ok(Post::new(username, title, content))
            }
            _ => Err(ApiError::MissingField {
                error: "Missing required fields",
                message: "Title, content, and username are required",
            }),
        }
    }
}

// An empty string is treated the same as an absent field.
fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

// --- Response Schemas (Output) ---

/// SignedInUser
///
/// The public view of the identity a token was issued for.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignedInUser {
    pub name: String,
}

/// SignInResponse
///
/// Output of POST /sign. `accessToken` goes into `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignInResponse {
    pub access_token: String,
    pub token_type: String,
    pub message: String,
    pub user: SignedInUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PostCreatedResponse {
    pub message: String,
    pub post: Post,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AllPostsResponse {
    pub message: String,
    pub posts: Vec<Post>,
}

/// HealthResponse
///
/// Output of GET /health. `uptime` is the process uptime in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HealthResponse {
    pub status: String,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
    pub uptime: f64,
}

/// ApiInfo
///
/// Output of GET /api and the JSON variant of GET /.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ApiInfo {
    pub message: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
    pub authentication: String,
    pub documentation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub web_interface: Option<String>,
}

/// ErrorBody
///
/// The structured body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
