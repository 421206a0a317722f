//! Blob storage for photo binaries.

use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{SupabaseClient, SupabaseError, check, decode};

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [&'a str],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl SupabaseClient {
    /// Upload `bytes` to `bucket/path`. Fails if the object already exists.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), SupabaseError> {
        let url = self.url(&format!("storage/v1/object/{bucket}/{}", encode_path(path)))?;
        let response = self
            .request(Method::POST, url)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Remove objects from `bucket`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(count = paths.len()))]
    pub async fn remove_objects(&self, bucket: &str, paths: &[&str]) -> Result<(), SupabaseError> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = self.url(&format!("storage/v1/object/{bucket}"))?;
        let response = self
            .request(Method::DELETE, url)
            .json(&RemoveRequest { prefixes: paths })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Public URL of an object in a public bucket.
    #[must_use]
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{}",
            self.base_url(),
            encode_path(path)
        )
    }

    /// Create a signed URL for an object, valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<String, SupabaseError> {
        let url = self.url(&format!(
            "storage/v1/object/sign/{bucket}/{}",
            encode_path(path)
        ))?;
        let response = self
            .request(Method::POST, url)
            .json(&SignRequest {
                expires_in: ttl.as_secs().max(1),
            })
            .send()
            .await?;
        let signed: SignResponse = decode(check(response).await?).await?;
        Ok(absolute_signed_url(self.base_url(), &signed.signed_url))
    }
}

/// Percent-encode each segment of an object path, keeping the slashes.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// The sign endpoint answers with a path relative to `storage/v1`.
fn absolute_signed_url(base: &str, signed: &str) -> String {
    if signed.starts_with("http://") || signed.starts_with("https://") {
        return signed.to_string();
    }
    let signed = signed.trim_start_matches('/');
    format!("{base}/storage/v1/{signed}")
}
