use bearer_posts::{
    AppConfig, AppState, InMemoryPostStore, create_router, models::demo_posts,
    repository::PostStoreState,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

async fn spawn_app() -> TestApp {
    let store = Arc::new(InMemoryPostStore::with_posts(demo_posts())) as PostStoreState;
    let state = AppState::new(AppConfig::default(), store);
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_sign_in_and_read_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Sign in
    let response = client
        .post(format!("{}/sign", app.address))
        .json(&json!({ "username": "Audrey" }))
        .send()
        .await
        .expect("sign fail");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let token = body["accessToken"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["name"], "Audrey");

    // Create (public)
    let response = client
        .post(format!("{}/posts", app.address))
        .json(&json!({ "title": "Hello", "content": "World", "username": "Audrey" }))
        .send()
        .await
        .expect("post fail");
    assert_eq!(response.status(), 201);

    // Own posts
    let response = client
        .get(format!("{}/posts", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let posts: Vec<Value> = response.json().await.unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p["owner"] == "Audrey"));

    // All posts
    let response = client
        .get(format!("{}/posts/all", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["posts"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_protected_routes_reject_anonymous_clients() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for path in ["/posts", "/posts/all"] {
        let response = client
            .get(format!("{}{}", app.address, path))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401, "{path}");

        let response = client
            .get(format!("{}{}", app.address, path))
            .bearer_auth("not.a.token")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 403, "{path}");
    }
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;
    let response = reqwest::get(format!("{}/api-docs/openapi.json", app.address))
        .await
        .unwrap();
    assert!(response.status().is_success());
    let doc: Value = response.json().await.unwrap();
    assert!(doc["paths"]["/sign"].is_object());
    assert!(doc["paths"]["/posts/all"].is_object());
}
