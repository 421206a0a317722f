//! Smoke tests against a running site server.
//!
//! These tests require the site running with its default configuration:
//!
//! ```bash
//! HEARTGATE_BACKEND=memory cargo run -p heartgate-site
//! HEARTGATE_TEST_URL=http://localhost:3000 cargo test -p heartgate-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode, redirect};
use serde_json::Value;

/// Base URL of the running site (configurable via environment).
fn base_url() -> String {
    std::env::var("HEARTGATE_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps the session cookie and does not follow redirects.
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

#[tokio::test]
#[ignore = "requires a running site server"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach the site");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running site server"]
async fn test_intro_then_gate() {
    let client = client();
    let base = base_url();

    let intro = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(intro.status(), StatusCode::OK);
    assert!(intro.text().await.unwrap().contains("/intro"));

    let resp = client.post(format!("{base}/intro")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let status: Value = client
        .get(format!("{base}/api/gate"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["introSeen"], true);
    assert_eq!(status["unlocked"], false);
}

#[tokio::test]
#[ignore = "requires a running site server"]
async fn test_locked_api_is_unauthorized() {
    let resp = client()
        .get(format!("{}/api/site", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
