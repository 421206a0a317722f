//! Supabase REST client.
//!
//! Talks to three Supabase surfaces with the project's anon key:
//!
//! - `rest/v1` - `PostgREST` row access (`love_sites`, `love_reasons`,
//!   `love_photos`)
//! - `storage/v1` - blob storage for photo binaries
//! - `functions/v1` - the `unlock` edge function
//!
//! Every call is a single HTTP round trip. There are no retries.

pub mod functions;
pub mod rows;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use thiserror::Error;
use url::Url;

use crate::config::SupabaseConfig;

/// Request timeout for every Supabase call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when talking to Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration cannot be turned into a client.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Client for one Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base: Url,
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let key = config.anon_key.expose_secret();
        let mut headers = HeaderMap::new();

        let mut apikey = HeaderValue::from_str(key)
            .map_err(|e| SupabaseError::Config(format!("Invalid anon key format: {e}")))?;
        apikey.set_sensitive(true);
        headers.insert("apikey", apikey);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| SupabaseError::Config(format!("Invalid anon key format: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert("Authorization", bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        // Joining relative paths needs a trailing slash on the base.
        let mut base = config.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(SupabaseClientInner { client, base }),
        })
    }

    /// Absolute URL for a path below the project root, e.g. `rest/v1/love_sites`.
    pub(crate) fn url(&self, path: &str) -> Result<Url, SupabaseError> {
        self.inner
            .base
            .join(path)
            .map_err(|e| SupabaseError::Config(format!("Invalid path {path}: {e}")))
    }

    /// Project base URL as configured, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.inner.base.as_str().trim_end_matches('/')
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner.client.request(method, url)
    }
}

/// Turn a non-success response into [`SupabaseError::Api`].
pub(crate) async fn check(response: Response) -> Result<Response, SupabaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        "Supabase returned non-success status"
    );
    Err(SupabaseError::Api {
        status: status.as_u16(),
        message: body.chars().take(200).collect(),
    })
}

/// Decode a JSON body, keeping a prefix of the raw text for diagnostics.
pub(crate) async fn decode<T: serde::de::DeserializeOwned>(
    response: Response,
) -> Result<T, SupabaseError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse Supabase response"
        );
        SupabaseError::Parse(e.to_string())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use heartgate_core::SiteId;
    use secrecy::SecretString;

    fn config(url: &str) -> SupabaseConfig {
        SupabaseConfig {
            url: Url::parse(url).unwrap(),
            anon_key: SecretString::from("anon-key"),
            site_id: SiteId::new("site-1"),
            bucket: "love-memories".to_string(),
            signed_url_ttl: None,
        }
    }

    #[test]
    fn test_url_joins_below_project_root() {
        let client = SupabaseClient::new(&config("https://abc.supabase.co")).unwrap();
        assert_eq!(
            client.url("rest/v1/love_sites").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/love_sites"
        );
        assert_eq!(client.base_url(), "https://abc.supabase.co");
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = SupabaseClient::new(&config("http://localhost:54321/proxy")).unwrap();
        assert_eq!(
            client.url("functions/v1/unlock").unwrap().as_str(),
            "http://localhost:54321/proxy/functions/v1/unlock"
        );
    }

    #[test]
    fn test_error_display() {
        let err = SupabaseError::Api {
            status: 404,
            message: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 404 - missing");
    }
}
