use crate::models::Post;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// PostStore Trait
///
/// Defines the abstract contract for post persistence. Handlers only ever see
/// `Arc<dyn PostStore>`, so the in-memory implementation can be replaced by a
/// persistent one (or a mock in tests) without touching the routing layer.
///
/// **Send + Sync + async_trait** are required to make the trait object shareable
/// across Axum's asynchronous task boundaries.
#[async_trait]
pub trait PostStore: Send + Sync {
    // Appends at the end and returns the stored record. Never fails.
    async fn append(&self, post: Post) -> Post;
    // Snapshot of every post, in insertion order.
    async fn list_all(&self) -> Vec<Post>;
    // Snapshot of the posts whose owner equals `owner` exactly, in insertion order.
    async fn list_by_owner(&self, owner: &str) -> Vec<Post>;
}

/// PostStoreState
///
/// The concrete type used to share the post store across the application state.
pub type PostStoreState = Arc<dyn PostStore>;

/// InMemoryPostStore
///
/// Append-only, process-local store. A single `RwLock` serializes writers;
/// readers clone a consistent snapshot under the read lock.
#[derive(Default)]
pub struct InMemoryPostStore {
    posts: RwLock<Vec<Post>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store that already holds `posts`, in the given order.
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: RwLock::new(posts),
        }
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn append(&self, post: Post) -> Post {
        let mut posts = self.posts.write().await;
        posts.push(post.clone());
        tracing::debug!(owner = %post.owner, total = posts.len(), "post appended");
        post
    }

    async fn list_all(&self) -> Vec<Post> {
        self.posts.read().await.clone()
    }

    async fn list_by_owner(&self, owner: &str) -> Vec<Post> {
        self.posts
            .read()
            .await
            .iter()
            .filter(|post| post.owner == owner)
            .cloned()
            .collect()
    }
}
