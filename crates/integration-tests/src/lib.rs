//! Integration tests for Heartgate.
//!
//! # Running Tests
//!
//! ```bash
//! # Router-level tests against the in-memory backend
//! cargo test -p heartgate-integration-tests
//!
//! # Smoke test against a running server
//! HEARTGATE_TEST_URL=http://localhost:3000 cargo test -p heartgate-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `gate_flow` - Intro, gate attempts, lockout, unlock and scenes
//! - `content_store` - Edit panel API: text, reasons, photos, reset
//! - `smoke` - Live server checks (ignored by default)
//!
//! [`TestApp`] builds the full router on the in-memory backend and drives it
//! with `tower::ServiceExt::oneshot`, carrying the session cookie between
//! requests the way a browser would.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use heartgate_core::LocalVerifier;
use heartgate_site::config::SiteConfig;
use heartgate_site::middleware::SESSION_COOKIE_NAME;
use heartgate_site::state::{AppState, GateVerifier};
use heartgate_site::store::{Backend, ContentStore, MemoryBackend};
use heartgate_site::supabase::SupabaseClient;
use heartgate_site::supabase::functions::RemoteVerifier;
use serde::de::DeserializeOwned;
use serde_json::json;
use tower::ServiceExt;

/// Gate date configured for every test app.
pub const REFERENCE_DATE: &str = "2024-03-21";

/// The reference date as the visitor types it.
pub const CORRECT_INPUT: &str = "21/03/2024";

/// Edit token configured for every test app.
pub const EDIT_TOKEN: &str = "k7Qp2xV9mR4tL8wZ";

/// Site id the stub `unlock` function is configured with.
pub const STUB_SITE_ID: &str = "site-under-test";

const BOUNDARY: &str = "heartgate-test-boundary";

/// A response with its body read into memory.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Decode the body as JSON.
    #[must_use]
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("body is not the expected JSON ({e}): {}", self.body))
    }
}

/// One part of a multipart upload.
pub enum Part<'a> {
    Text { name: &'a str, value: &'a str },
    File { name: &'a str, file_name: &'a str, bytes: Vec<u8> },
}

/// The site router on an in-memory backend, plus one visitor's cookie jar.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
    client_ip: String,
    pub state: AppState,
    pub memory: MemoryBackend,
}

impl TestApp {
    /// App with the default test configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// App with extra configuration variables layered over the defaults.
    ///
    /// Must be called inside a Tokio runtime; the content store spawns its
    /// save task on construction.
    #[must_use]
    pub fn with_env(extra: &[(&str, &str)]) -> Self {
        Self::build(extra, |config| {
            GateVerifier::Local(LocalVerifier::new(config.gate.reference_date))
        })
    }

    /// App whose gate asks a stub `unlock` function instead of comparing
    /// dates locally. The stub answers with `replies` in order and repeats
    /// the last one.
    pub async fn with_unlock_function(replies: Vec<UnlockReply>) -> Self {
        let base = spawn_unlock_function(replies).await;
        Self::build(
            &[
                ("SUPABASE_URL", base.as_str()),
                ("SUPABASE_ANON_KEY", "test-anon-key"),
                ("HEARTGATE_SITE_ID", STUB_SITE_ID),
            ],
            |config| {
                let supabase = config.supabase.as_ref().expect("stub backend configured");
                let client = SupabaseClient::new(supabase).expect("client builds");
                GateVerifier::Remote(RemoteVerifier::new(client, supabase.site_id.clone()))
            },
        )
    }

    fn build(extra: &[(&str, &str)], verifier: impl FnOnce(&SiteConfig) -> GateVerifier) -> Self {
        let mut vars: HashMap<String, String> = [
            ("HEARTGATE_BACKEND", "memory"),
            ("HEARTGATE_REFERENCE_DATE", REFERENCE_DATE),
            ("HEARTGATE_EDIT_TOKEN", EDIT_TOKEN),
            ("HEARTGATE_SAVE_DEBOUNCE_MS", "20"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (key, value) in extra {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = SiteConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("test configuration is valid");
        let memory = MemoryBackend::new();
        let store = ContentStore::new(
            Backend::Memory(memory.clone()),
            config.photos,
            config.save_debounce,
        );
        let verifier = verifier(&config);
        let state = AppState::from_parts(config, store, verifier);

        Self {
            router: heartgate_site::app(state.clone()),
            cookie: None,
            client_ip: "203.0.113.7".to_string(),
            state,
            memory,
        }
    }

    /// A second visitor on the same app, with an empty cookie jar.
    #[must_use]
    pub fn new_visitor(&self, client_ip: &str) -> Self {
        Self {
            router: self.router.clone(),
            cookie: None,
            client_ip: client_ip.to_string(),
            state: self.state.clone(),
            memory: self.memory.clone(),
        }
    }

    /// Send a request with the visitor's cookie and client address.
    pub async fn send(
        &mut self,
        builder: axum::http::request::Builder,
        body: Body,
    ) -> TestResponse {
        let mut builder = builder.header("x-forwarded-for", self.client_ip.as_str());
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie.as_str());
        }
        let request = builder.body(body).expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            let pair = value.split(';').next().unwrap_or_default().trim();
            if pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")) {
                self.cookie = Some(pair.to_string());
            }
        }

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Request::builder().method(Method::GET).uri(path), Body::empty())
            .await
    }

    pub async fn delete(&mut self, path: &str) -> TestResponse {
        self.send(Request::builder().method(Method::DELETE).uri(path), Body::empty())
            .await
    }

    /// POST an `application/x-www-form-urlencoded` body.
    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(path)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
            Body::from(body),
        )
        .await
    }

    /// Send a JSON body with `method`.
    pub async fn json(
        &mut self,
        method: Method,
        path: &str,
        value: &serde_json::Value,
    ) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json"),
            Body::from(value.to_string()),
        )
        .await
    }

    /// POST a `multipart/form-data` body.
    pub async fn post_multipart(&mut self, path: &str, parts: Vec<Part<'_>>) -> TestResponse {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text { name, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    name,
                    file_name,
                    bytes,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(&bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(path)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                ),
            Body::from(body),
        )
        .await
    }

    /// Dismiss the intro screen.
    pub async fn pass_intro(&mut self) {
        let response = self.post_form("/intro", &[]).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
    }

    /// Submit one date on the gate.
    pub async fn submit_date(&mut self, date: &str) -> TestResponse {
        self.post_form("/unlock", &[("date", date)]).await
    }

    /// Pass the intro and unlock with the correct date.
    pub async fn unlock(&mut self) {
        self.pass_intro().await;
        let response = self.submit_date(CORRECT_INPUT).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location(), Some("/"));
    }

    /// Sign in to the edit panel.
    pub async fn login_editor(&mut self) {
        let response = self.post_form("/edit/login", &[("token", EDIT_TOKEN)]).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location(), Some("/edit"));
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// One answer from the stub `unlock` function.
#[derive(Debug, Clone)]
pub enum UnlockReply {
    /// `200 {"success": true}` with these photos, if any.
    Accept(Option<serde_json::Value>),
    /// `401 {"success": false}` with this message.
    Deny(&'static str),
    /// `500` with no verdict.
    Fail,
}

impl IntoResponse for UnlockReply {
    fn into_response(self) -> Response {
        match self {
            Self::Accept(None) => Json(json!({ "success": true })).into_response(),
            Self::Accept(Some(photos)) => {
                Json(json!({ "success": true, "photos": photos })).into_response()
            }
            Self::Deny(message) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "message": message })),
            )
                .into_response(),
            Self::Fail => (StatusCode::INTERNAL_SERVER_ERROR, "function crashed").into_response(),
        }
    }
}

/// Serve `POST /functions/v1/unlock` on a local port and return its base URL.
async fn spawn_unlock_function(replies: Vec<UnlockReply>) -> String {
    let replies = Arc::new(Mutex::new(VecDeque::from(replies)));
    let handler = move || {
        let replies = Arc::clone(&replies);
        async move {
            let mut queue = replies.lock().expect("reply queue lock");
            let reply = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            reply.unwrap_or(UnlockReply::Fail)
        }
    };
    let router = Router::new().route("/functions/v1/unlock", post(handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("stub binds");
    let addr = listener.local_addr().expect("stub has an address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

/// PNG bytes of a solid `width` x `height` image.
#[must_use]
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([220, 60, 110]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("PNG encodes");
    bytes
}

fn form_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                char::from(b).to_string()
            }
            b' ' => "+".to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}
