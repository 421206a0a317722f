//! In-process backend.
//!
//! Holds rows and blobs in memory. Used for local preview
//! (`HEARTGATE_BACKEND=memory`) and by the router tests, which read the write
//! counter and can make photo inserts fail.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use heartgate_core::{PhotoId, PhotoRecord, SiteContent, SiteId, TextFields};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{PhotoUpdate, StoreError};

/// Site id used for every memory-backed site.
pub const MEMORY_SITE_ID: &str = "local";

/// URL prefix under which memory blobs are served.
pub const MEDIA_PREFIX: &str = "/media/";

/// Rows and blobs kept in memory.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryBackendInner>,
}

struct MemoryBackendInner {
    site_id: SiteId,
    data: Mutex<MemoryData>,
    writes: AtomicUsize,
    fail_photo_inserts: AtomicBool,
}

#[derive(Default)]
struct MemoryData {
    site: Option<TextFields>,
    reasons: Vec<String>,
    photos: Vec<StoredPhoto>,
    blobs: HashMap<String, Vec<u8>>,
}

#[derive(Clone)]
struct StoredPhoto {
    id: PhotoId,
    storage_path: String,
    caption: String,
    story: Option<String>,
    position: u32,
}

impl StoredPhoto {
    fn to_record(&self) -> PhotoRecord {
        PhotoRecord {
            id: self.id.clone(),
            remote_url: media_url(&self.storage_path),
            caption: self.caption.clone(),
            story: self.story.clone(),
            storage_path: self.storage_path.clone(),
            position: self.position,
        }
    }
}

/// Display URL of a memory blob.
#[must_use]
pub fn media_url(path: &str) -> String {
    format!("{MEDIA_PREFIX}{path}")
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend. Loading it yields the default content.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryBackendInner {
                site_id: SiteId::new(MEMORY_SITE_ID),
                data: Mutex::new(MemoryData::default()),
                writes: AtomicUsize::new(0),
                fail_photo_inserts: AtomicBool::new(false),
            }),
        }
    }

    /// Site id of this backend.
    #[must_use]
    pub fn site_id(&self) -> &SiteId {
        &self.inner.site_id
    }

    /// Number of completed writes (site saves, uploads, row changes).
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent photo row inserts fail.
    pub fn fail_photo_inserts(&self, fail: bool) {
        self.inner.fail_photo_inserts.store(fail, Ordering::SeqCst);
    }

    /// Stored blob bytes.
    pub async fn blob(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.data.lock().await.blobs.get(path).cloned()
    }

    /// Number of stored blobs.
    pub async fn blob_count(&self) -> usize {
        self.inner.data.lock().await.blobs.len()
    }

    /// Positions of the stored photo rows, in stored order.
    pub async fn stored_positions(&self) -> Vec<(PhotoId, u32)> {
        let data = self.inner.data.lock().await;
        let mut rows: Vec<_> = data
            .photos
            .iter()
            .map(|p| (p.id.clone(), p.position))
            .collect();
        rows.sort_by_key(|(_, position)| *position);
        rows
    }

    /// Replace the stored text fields and reasons.
    pub async fn seed(&self, content: &SiteContent) {
        let mut data = self.inner.data.lock().await;
        data.site = Some(content.text_fields());
        data.reasons.clone_from(&content.reasons);
    }

    fn wrote(&self) {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
    }

    pub(super) async fn load(&self) -> SiteContent {
        let data = self.inner.data.lock().await;
        let mut content = SiteContent::default();

        if let Some(fields) = data.site.clone() {
            content.apply_text_fields(fields);
            content.reasons.clone_from(&data.reasons);
        } else if !data.reasons.is_empty() {
            content.reasons.clone_from(&data.reasons);
        }

        let mut photos: Vec<_> = data.photos.iter().map(StoredPhoto::to_record).collect();
        photos.sort_by_key(|p| p.position);
        content.photos = photos;
        content
    }

    pub(super) async fn save_site(&self, fields: &TextFields, reasons: &[String]) {
        let mut data = self.inner.data.lock().await;
        data.site = Some(fields.clone());
        data.reasons = reasons.to_vec();
        self.wrote();
    }

    pub(super) async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let mut data = self.inner.data.lock().await;
        if data.blobs.contains_key(path) {
            return Err(StoreError::Rejected(format!("object already exists: {path}")));
        }
        data.blobs.insert(path.to_string(), bytes);
        self.wrote();
        Ok(())
    }

    pub(super) async fn insert_photo(
        &self,
        storage_path: &str,
        caption: &str,
        position: u32,
    ) -> Result<PhotoRecord, StoreError> {
        if self.inner.fail_photo_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("photo insert refused".to_string()));
        }

        let photo = StoredPhoto {
            id: PhotoId::new(Uuid::new_v4().to_string()),
            storage_path: storage_path.to_string(),
            caption: caption.to_string(),
            story: None,
            position,
        };
        let record = photo.to_record();
        self.inner.data.lock().await.photos.push(photo);
        self.wrote();
        Ok(record)
    }

    pub(super) async fn update_photo(
        &self,
        id: &PhotoId,
        update: &PhotoUpdate,
    ) -> Result<(), StoreError> {
        let mut data = self.inner.data.lock().await;
        let photo = data
            .photos
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("photo {id}")))?;

        if let Some(caption) = &update.caption {
            photo.caption.clone_from(caption);
        }
        if let Some(story) = &update.story {
            photo.story.clone_from(story);
        }
        if let Some(position) = update.position {
            photo.position = position;
        }
        self.wrote();
        Ok(())
    }

    pub(super) async fn delete_photo(&self, photo: &PhotoRecord) -> Result<(), StoreError> {
        let mut data = self.inner.data.lock().await;
        let before = data.photos.len();
        data.photos.retain(|p| p.id != photo.id);
        if data.photos.len() == before {
            return Err(StoreError::NotFound(format!("photo {}", photo.id)));
        }
        data.blobs.remove(&photo.storage_path);
        self.wrote();
        Ok(())
    }

    pub(super) async fn clear_all(&self) {
        let mut data = self.inner.data.lock().await;
        data.blobs.clear();
        data.photos.clear();
        data.reasons.clear();
        data.site = Some(SiteContent::default().text_fields());
        self.wrote();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_backend_loads_defaults() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.load().await, SiteContent::default());
    }

    #[tokio::test]
    async fn test_upload_refuses_existing_object() {
        let backend = MemoryBackend::new();
        backend.upload("local/a.jpg", vec![1]).await.unwrap();
        assert!(matches!(
            backend.upload("local/a.jpg", vec![2]).await,
            Err(StoreError::Rejected(_))
        ));
        assert_eq!(backend.blob("local/a.jpg").await, Some(vec![1]));
    }

    #[tokio::test]
    async fn test_clear_all_keeps_row_with_defaults() {
        let backend = MemoryBackend::new();
        let mut content = SiteContent::default();
        content.her_name = "Inas".to_string();
        backend.seed(&content).await;
        backend.upload("local/a.jpg", vec![1]).await.unwrap();
        backend.insert_photo("local/a.jpg", "", 0).await.unwrap();

        backend.clear_all().await;

        let loaded = backend.load().await;
        assert_eq!(loaded, SiteContent::reset_state());
        assert_eq!(backend.blob_count().await, 0);
    }
}
