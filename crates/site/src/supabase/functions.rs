//! The `unlock` edge function.
//!
//! ```text
//! POST {base}/functions/v1/unlock
//! { "siteId": "...", "code": "21/03/2024" }
//!
//! { "success": true, "photos": [{ "id", "url", "caption", "story", "storagePath" }] }
//! { "success": false, "message": "..." }
//! ```

use heartgate_core::gate::{Verdict, Verifier, VerifyError};
use heartgate_core::{GateDate, PhotoId, PhotoRecord, SiteId};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{SupabaseClient, SupabaseError, check, decode};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnlockRequest<'a> {
    site_id: &'a str,
    code: String,
}

/// Reply from the unlock function.
#[derive(Debug, Clone, Deserialize)]
pub struct UnlockReply {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub photos: Option<Vec<DisclosedPhoto>>,
}

/// A photo disclosed by a successful unlock.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosedPhoto {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub story: Option<String>,
    #[serde(default)]
    pub storage_path: Option<String>,
}

impl UnlockReply {
    /// Interpret the reply as a gate verdict.
    #[must_use]
    pub fn into_verdict(self) -> Verdict {
        if !self.success {
            return Verdict::Denied {
                message: self.message,
            };
        }

        let disclosed = self.photos.map(|photos| {
            photos
                .into_iter()
                .zip(0_u32..)
                .map(|(photo, position)| PhotoRecord {
                    id: PhotoId::new(photo.id),
                    remote_url: photo.url,
                    caption: photo.caption.unwrap_or_default(),
                    story: photo.story,
                    storage_path: photo.storage_path.unwrap_or_default(),
                    position,
                })
                .collect()
        });
        Verdict::Accepted { disclosed }
    }
}

impl SupabaseClient {
    /// Call the unlock function with a date code.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the reply cannot be parsed.
    #[instrument(skip(self, code), fields(site_id = %site_id))]
    pub async fn call_unlock(
        &self,
        site_id: &SiteId,
        code: String,
    ) -> Result<UnlockReply, SupabaseError> {
        let url = self.url("functions/v1/unlock")?;
        let response = self
            .request(Method::POST, url)
            .json(&UnlockRequest {
                site_id: site_id.as_str(),
                code,
            })
            .send()
            .await?;

        // The function answers wrong codes with 401 and a JSON body.
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return decode(response).await;
        }
        decode(check(response).await?).await
    }
}

/// Verifier backed by the unlock function.
#[derive(Clone)]
pub struct RemoteVerifier {
    client: SupabaseClient,
    site_id: SiteId,
}

impl RemoteVerifier {
    #[must_use]
    pub const fn new(client: SupabaseClient, site_id: SiteId) -> Self {
        Self { client, site_id }
    }
}

impl Verifier for RemoteVerifier {
    async fn verify(&self, date: GateDate) -> Result<Verdict, VerifyError> {
        match self.client.call_unlock(&self.site_id, date.to_slashed()).await {
            Ok(reply) => Ok(reply.into_verdict()),
            Err(e) => {
                tracing::error!(error = %e, "Unlock verification failed");
                sentry::capture_error(&e);
                Err(VerifyError::Unavailable(e.to_string()))
            }
        }
    }
}
