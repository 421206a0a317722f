//! Supabase-backed content.

use std::time::Duration;

use heartgate_core::{PhotoId, PhotoRecord, SiteContent, SiteId, TextFields};
use moka::future::Cache;
use tracing::instrument;

use super::{PhotoUpdate, StoreError};
use crate::config::SupabaseConfig;
use crate::supabase::SupabaseClient;
use crate::supabase::rows::{NewPhotoRow, PhotoPatch, PhotoRow, SiteRow};

/// Upper bound on cached signed URLs.
const URL_CACHE_CAPACITY: u64 = 2_000;

/// Content stored in Supabase rows and blob storage.
#[derive(Clone)]
pub struct SupabaseBackend {
    client: SupabaseClient,
    site_id: SiteId,
    bucket: String,
    signed_ttl: Option<Duration>,
    urls: Cache<String, String>,
}

impl SupabaseBackend {
    /// Create a backend for the configured site.
    #[must_use]
    pub fn new(client: SupabaseClient, config: &SupabaseConfig) -> Self {
        // Signed URLs are cached for 80% of their validity so a cached URL
        // never outlives its signature.
        let cache_ttl = config
            .signed_url_ttl
            .map_or(Duration::from_secs(60), |ttl| ttl.mul_f64(0.8));
        let urls = Cache::builder()
            .max_capacity(URL_CACHE_CAPACITY)
            .time_to_live(cache_ttl.max(Duration::from_secs(1)))
            .build();

        Self {
            client,
            site_id: config.site_id.clone(),
            bucket: config.bucket.clone(),
            signed_ttl: config.signed_url_ttl,
            urls,
        }
    }

    /// Site id of this backend.
    #[must_use]
    pub const fn site_id(&self) -> &SiteId {
        &self.site_id
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &SupabaseClient {
        &self.client
    }

    /// Display URL for a stored object: signed when a TTL is configured,
    /// public otherwise. A failed signing falls back to the public URL.
    pub async fn display_url(&self, path: &str) -> String {
        let Some(ttl) = self.signed_ttl else {
            return self.client.public_url(&self.bucket, path);
        };

        if let Some(url) = self.urls.get(path).await {
            return url;
        }

        match self.client.signed_url(&self.bucket, path, ttl).await {
            Ok(url) => {
                self.urls.insert(path.to_string(), url.clone()).await;
                url
            }
            Err(e) => {
                tracing::warn!(error = %e, path, "Failed to sign photo URL, using public URL");
                self.client.public_url(&self.bucket, path)
            }
        }
    }

    async fn to_record(&self, row: PhotoRow) -> PhotoRecord {
        PhotoRecord {
            remote_url: self.display_url(&row.storage_path).await,
            id: row.id,
            caption: row.caption.unwrap_or_default(),
            story: row.story,
            storage_path: row.storage_path,
            position: row.position,
        }
    }

    #[instrument(skip(self), fields(site_id = %self.site_id))]
    pub(super) async fn load(&self) -> Result<SiteContent, StoreError> {
        let (site, reasons, photos) = tokio::try_join!(
            self.client.get_site(&self.site_id),
            self.client.list_reasons(&self.site_id),
            self.client.list_photos(&self.site_id),
        )?;

        let mut content = SiteContent::default();
        let reasons: Vec<String> = reasons.into_iter().map(|r| r.text).collect();
        match site {
            Some(row) => {
                content.apply_text_fields(row.into_fields(content.text_fields()));
                content.reasons = reasons;
            }
            None => {
                tracing::info!("No site row yet, serving defaults");
                if !reasons.is_empty() {
                    content.reasons = reasons;
                }
            }
        }

        let mut records = Vec::with_capacity(photos.len());
        for row in photos {
            records.push(self.to_record(row).await);
        }
        content.photos = records;
        Ok(content)
    }

    pub(super) async fn save_site(
        &self,
        fields: &TextFields,
        reasons: &[String],
    ) -> Result<(), StoreError> {
        self.client
            .upsert_site(&SiteRow::from_fields(&self.site_id, fields))
            .await?;
        self.client.replace_reasons(&self.site_id, reasons).await?;
        Ok(())
    }

    pub(super) async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.client
            .upload_object(&self.bucket, path, bytes, content_type)
            .await?;
        Ok(())
    }

    pub(super) async fn insert_photo(
        &self,
        storage_path: &str,
        caption: &str,
        position: u32,
    ) -> Result<PhotoRecord, StoreError> {
        let row = self
            .client
            .insert_photo(&NewPhotoRow {
                site_id: self.site_id.as_str(),
                storage_path,
                caption,
                position,
            })
            .await?;
        Ok(self.to_record(row).await)
    }

    pub(super) async fn update_photo(
        &self,
        id: &PhotoId,
        update: &PhotoUpdate,
    ) -> Result<(), StoreError> {
        let patch = PhotoPatch {
            caption: update.caption.as_deref(),
            story: update.story.as_ref().map(Option::as_deref),
            position: update.position,
        };
        self.client.update_photo(&self.site_id, id, &patch).await?;
        Ok(())
    }

    /// Delete the row, then the blob.
    pub(super) async fn delete_photo(&self, photo: &PhotoRecord) -> Result<(), StoreError> {
        self.client.delete_photo(&self.site_id, &photo.id).await?;
        self.client
            .remove_objects(&self.bucket, &[photo.storage_path.as_str()])
            .await?;
        self.urls.invalidate(&photo.storage_path).await;
        Ok(())
    }

    /// Blobs, photo rows, reasons, then the site row back to defaults.
    #[instrument(skip(self), fields(site_id = %self.site_id))]
    pub(super) async fn clear_all(&self) -> Result<(), StoreError> {
        let photos = self.client.list_photos(&self.site_id).await?;
        let paths: Vec<&str> = photos.iter().map(|p| p.storage_path.as_str()).collect();
        self.client.remove_objects(&self.bucket, &paths).await?;
        self.client.delete_photos(&self.site_id).await?;
        self.client.delete_reasons(&self.site_id).await?;
        self.client
            .upsert_site(&SiteRow::from_fields(
                &self.site_id,
                &SiteContent::default().text_fields(),
            ))
            .await?;
        self.urls.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use secrecy::SecretString;
    use url::Url;

    fn backend(signed_url_ttl: Option<Duration>) -> SupabaseBackend {
        let config = SupabaseConfig {
            url: Url::parse("https://abc.supabase.co").unwrap(),
            anon_key: SecretString::from("anon"),
            site_id: SiteId::new("s1"),
            bucket: "love-memories".to_string(),
            signed_url_ttl,
        };
        SupabaseBackend::new(SupabaseClient::new(&config).unwrap(), &config)
    }

    #[tokio::test]
    async fn test_public_url_without_ttl() {
        let backend = backend(None);
        assert_eq!(
            backend.display_url("s1/a.jpg").await,
            "https://abc.supabase.co/storage/v1/object/public/love-memories/s1/a.jpg"
        );
    }

    #[tokio::test]
    async fn test_cached_signed_url_is_reused() {
        let backend = backend(Some(Duration::from_secs(3600)));
        backend
            .urls
            .insert("s1/a.jpg".to_string(), "https://signed/a".to_string())
            .await;
        assert_eq!(backend.display_url("s1/a.jpg").await, "https://signed/a");
    }
}
