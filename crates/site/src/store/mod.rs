//! Content store.
//!
//! [`ContentStore`] keeps the in-memory mirror of the site content and
//! forwards every mutation to a [`Backend`]:
//!
//! - `Supabase` - rows and blob storage of the configured project
//! - `Memory` - in-process rows and blobs for local preview and tests
//! - `Offline` - no backend configured; defaults are served and writes are
//!   dropped with a warning
//!
//! Text fields and reasons are saved through the debouncer. Photo operations
//! hit the backend directly. Removals and caption edits update the mirror
//! first; a remote failure is logged and the mirror is not restored.

pub mod memory;
pub mod supabase;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use heartgate_core::{
    PhotoId, PhotoRecord, SiteContent, SiteId, TextFields, ordering, photo_storage_path,
};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::config::PhotoConfig;
use crate::services::debounce::SaveDebouncer;
use crate::services::photo::{self, JPEG_CONTENT_TYPE, JPEG_EXTENSION, PhotoError};
use crate::supabase::SupabaseError;

pub use memory::MemoryBackend;
pub use supabase::SupabaseBackend;

/// Errors from the content store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Supabase(#[from] SupabaseError),

    #[error("photo error: {0}")]
    Photo(#[from] PhotoError),

    /// No backend is configured.
    #[error("no backend configured")]
    Offline,

    #[error("not found: {0}")]
    NotFound(String),

    /// The request was understood but cannot be applied.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Partial update of a photo row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoUpdate {
    pub caption: Option<String>,
    /// `Some(None)` clears the story.
    pub story: Option<Option<String>>,
    pub position: Option<u32>,
}

/// Edit of a photo from the edit panel. `position` is the target display
/// index.
#[derive(Debug, Clone, Default)]
pub struct PhotoEdit {
    pub caption: Option<String>,
    pub story: Option<String>,
    pub position: Option<usize>,
}

/// Where content is persisted.
#[derive(Clone)]
pub enum Backend {
    Supabase(SupabaseBackend),
    Memory(MemoryBackend),
    Offline,
}

impl Backend {
    /// Site id for storage paths, `None` when offline.
    #[must_use]
    pub fn site_id(&self) -> Option<&SiteId> {
        match self {
            Self::Supabase(b) => Some(b.site_id()),
            Self::Memory(b) => Some(b.site_id()),
            Self::Offline => None,
        }
    }

    /// The memory backend, if that is what this is.
    #[must_use]
    pub const fn memory(&self) -> Option<&MemoryBackend> {
        match self {
            Self::Memory(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_offline(&self) -> bool {
        matches!(self, Self::Offline)
    }

    async fn load(&self) -> Result<SiteContent, StoreError> {
        match self {
            Self::Supabase(b) => b.load().await,
            Self::Memory(b) => Ok(b.load().await),
            Self::Offline => Ok(SiteContent::default()),
        }
    }

    async fn save_site(&self, fields: &TextFields, reasons: &[String]) -> Result<(), StoreError> {
        match self {
            Self::Supabase(b) => b.save_site(fields, reasons).await,
            Self::Memory(b) => {
                b.save_site(fields, reasons).await;
                Ok(())
            }
            Self::Offline => Err(StoreError::Offline),
        }
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        match self {
            Self::Supabase(b) => b.upload(path, bytes, JPEG_CONTENT_TYPE).await,
            Self::Memory(b) => b.upload(path, bytes).await,
            Self::Offline => Err(StoreError::Offline),
        }
    }

    async fn insert_photo(
        &self,
        storage_path: &str,
        caption: &str,
        position: u32,
    ) -> Result<PhotoRecord, StoreError> {
        match self {
            Self::Supabase(b) => b.insert_photo(storage_path, caption, position).await,
            Self::Memory(b) => b.insert_photo(storage_path, caption, position).await,
            Self::Offline => Err(StoreError::Offline),
        }
    }

    async fn update_photo(&self, id: &PhotoId, update: &PhotoUpdate) -> Result<(), StoreError> {
        match self {
            Self::Supabase(b) => b.update_photo(id, update).await,
            Self::Memory(b) => b.update_photo(id, update).await,
            Self::Offline => Err(StoreError::Offline),
        }
    }

    async fn delete_photo(&self, photo: &PhotoRecord) -> Result<(), StoreError> {
        match self {
            Self::Supabase(b) => b.delete_photo(photo).await,
            Self::Memory(b) => b.delete_photo(photo).await,
            Self::Offline => Err(StoreError::Offline),
        }
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        match self {
            Self::Supabase(b) => b.clear_all().await,
            Self::Memory(b) => {
                b.clear_all().await;
                Ok(())
            }
            Self::Offline => Err(StoreError::Offline),
        }
    }
}

/// Log a failed background write and report it to Sentry. Offline drops are
/// only a warning.
fn report(operation: &'static str, err: &StoreError) {
    if matches!(err, StoreError::Offline) {
        tracing::warn!(operation, "No backend configured, write dropped");
        return;
    }
    tracing::error!(operation, error = %err, "Content store write failed");
    sentry::capture_error(err);
}

/// The site content mirror and its backend.
#[derive(Clone)]
pub struct ContentStore {
    inner: Arc<ContentStoreInner>,
}

struct ContentStoreInner {
    backend: Backend,
    photos: PhotoConfig,
    mirror: RwLock<SiteContent>,
    dirty: AtomicBool,
    saver: SaveDebouncer,
}

impl ContentStore {
    /// Create a store whose mirror starts at the default content. Call
    /// [`ContentStore::fetch_site`] to load the backend state.
    ///
    /// Must be called inside a tokio runtime; the debounce loop is spawned
    /// here.
    #[must_use]
    pub fn new(backend: Backend, photos: PhotoConfig, debounce: Duration) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<ContentStoreInner>| {
            let weak = weak.clone();
            let saver = SaveDebouncer::spawn(debounce, move || {
                let weak = weak.clone();
                async move {
                    if let Some(inner) = weak.upgrade() {
                        let store = Self { inner };
                        if let Err(e) = store.flush().await {
                            report("save_site", &e);
                        }
                    }
                }
            });

            ContentStoreInner {
                backend,
                photos,
                mirror: RwLock::new(SiteContent::default()),
                dirty: AtomicBool::new(false),
                saver,
            }
        });
        Self { inner }
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    /// Copy of the mirror.
    pub async fn snapshot(&self) -> SiteContent {
        self.inner.mirror.read().await.clone()
    }

    /// Load the site from the backend and replace the mirror.
    ///
    /// # Errors
    ///
    /// Returns error if any of the backend reads fail. The mirror is left
    /// unchanged in that case.
    #[instrument(skip(self))]
    pub async fn fetch_site(&self) -> Result<SiteContent, StoreError> {
        let mut content = self.inner.backend.load().await?;
        ordering::normalize(&mut content.photos);

        *self.inner.mirror.write().await = content.clone();
        tracing::info!(
            photos = content.photos.len(),
            reasons = content.reasons.len(),
            "Loaded site content"
        );
        Ok(content)
    }

    /// Write the mirror's text fields and reasons to the backend now.
    ///
    /// # Errors
    ///
    /// Returns error if the backend write fails, or [`StoreError::Offline`].
    #[instrument(skip(self))]
    pub async fn save_site(&self) -> Result<(), StoreError> {
        self.inner.dirty.store(false, Ordering::SeqCst);
        let (fields, reasons) = {
            let mirror = self.inner.mirror.read().await;
            (mirror.text_fields(), mirror.reasons.clone())
        };
        self.inner.backend.save_site(&fields, &reasons).await
    }

    /// Save now if an edit is waiting for the debouncer.
    ///
    /// # Errors
    ///
    /// Returns error if the save fails.
    pub async fn flush(&self) -> Result<(), StoreError> {
        if self.inner.dirty.load(Ordering::SeqCst) {
            self.save_site().await?;
        }
        Ok(())
    }

    fn schedule_save(&self) {
        self.inner.dirty.store(true, Ordering::SeqCst);
        self.inner.saver.schedule();
    }

    /// Replace every text field; saved after the quiet period.
    pub async fn update_text(&self, fields: TextFields) -> SiteContent {
        let content = {
            let mut mirror = self.inner.mirror.write().await;
            mirror.apply_text_fields(fields);
            mirror.clone()
        };
        self.schedule_save();
        content
    }

    /// Append a reason; saved after the quiet period.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Rejected`] for blank text.
    pub async fn add_reason(&self, text: &str) -> Result<Vec<String>, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::Rejected("reason is empty".to_string()));
        }

        let reasons = {
            let mut mirror = self.inner.mirror.write().await;
            mirror.reasons.push(text.to_string());
            mirror.reasons.clone()
        };
        self.schedule_save();
        Ok(reasons)
    }

    /// Remove the reason at `index`; saved after the quiet period.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `index` is out of range.
    pub async fn remove_reason(&self, index: usize) -> Result<String, StoreError> {
        let removed = {
            let mut mirror = self.inner.mirror.write().await;
            ordering::remove_reason(&mut mirror.reasons, index)
        }
        .ok_or_else(|| StoreError::NotFound(format!("reason {index}")))?;
        self.schedule_save();
        Ok(removed)
    }

    /// Shrink, encode and upload a photo, insert its row and append it to the
    /// gallery.
    ///
    /// A failed row insert leaves the uploaded blob in storage.
    ///
    /// # Errors
    ///
    /// Returns error if the image cannot be processed or any backend write
    /// fails.
    #[instrument(skip(self, raw), fields(size = raw.len()))]
    pub async fn add_photo(&self, raw: Vec<u8>, caption: &str) -> Result<PhotoRecord, StoreError> {
        let site_id = self
            .inner
            .backend
            .site_id()
            .ok_or(StoreError::Offline)?
            .clone();

        let prepared = photo::prepare(raw, self.inner.photos).await?;
        let path = photo_storage_path(&site_id, JPEG_EXTENSION);
        self.inner.backend.upload(&path, prepared.bytes).await?;

        let position = ordering::next_position(&self.inner.mirror.read().await.photos);
        let record = self
            .inner
            .backend
            .insert_photo(&path, caption, position)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    path,
                    "Photo row insert failed, uploaded blob left in storage"
                );
            })?;

        let id = record.id.clone();
        let (record, changed) = {
            let mut mirror = self.inner.mirror.write().await;
            mirror.photos.push(record);
            let changed = ordering::resequence(&mut mirror.photos);
            let record = mirror
                .photo(&id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("photo {id}")))?;
            (record, changed)
        };
        self.write_positions(&changed).await;
        tracing::info!(photo_id = %record.id, "Photo added");
        Ok(record)
    }

    /// Remove a photo from the gallery, then delete its row and blob, then
    /// resequence the rest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no photo has `id`. Backend failures
    /// are logged, not returned.
    #[instrument(skip(self), fields(photo_id = %id))]
    pub async fn remove_photo(&self, id: &PhotoId) -> Result<PhotoRecord, StoreError> {
        let (removed, _) = {
            let mut mirror = self.inner.mirror.write().await;
            ordering::remove_photo(&mut mirror.photos, id)
        }
        .ok_or_else(|| StoreError::NotFound(format!("photo {id}")))?;

        if let Err(e) = self.inner.backend.delete_photo(&removed).await {
            report("remove_photo", &e);
        }
        if let Err(e) = self.resequence().await {
            report("resequence", &e);
        }
        Ok(removed)
    }

    /// Renumber the gallery so each position equals its index and write every
    /// record, one at a time.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure; earlier records stay written.
    #[instrument(skip(self))]
    pub async fn resequence(&self) -> Result<(), StoreError> {
        let positions: Vec<(PhotoId, u32)> = {
            let mut mirror = self.inner.mirror.write().await;
            ordering::resequence(&mut mirror.photos);
            mirror
                .photos
                .iter()
                .map(|p| (p.id.clone(), p.position))
                .collect()
        };

        for (id, position) in &positions {
            let update = PhotoUpdate {
                position: Some(*position),
                ..PhotoUpdate::default()
            };
            self.inner.backend.update_photo(id, &update).await?;
        }
        Ok(())
    }

    /// Edit a photo's caption, story or position. The mirror changes first;
    /// the backend update runs in the background and its errors are logged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id and
    /// [`StoreError::Rejected`] for an out-of-range position.
    #[instrument(skip(self, edit), fields(photo_id = %id))]
    pub async fn update_photo(
        &self,
        id: &PhotoId,
        edit: PhotoEdit,
    ) -> Result<PhotoRecord, StoreError> {
        // An empty story clears it.
        let story = edit.story.map(|story| (!story.is_empty()).then_some(story));

        let (record, changed) = {
            let mut mirror = self.inner.mirror.write().await;
            let index = mirror
                .photos
                .iter()
                .position(|p| &p.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("photo {id}")))?;

            let changed = match edit.position {
                Some(to) => ordering::move_photo(&mut mirror.photos, index, to)
                    .ok_or_else(|| StoreError::Rejected(format!("position {to} out of range")))?,
                None => Vec::new(),
            };

            let photo = mirror
                .photos
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("photo {id}")))?;
            if let Some(caption) = &edit.caption {
                photo.caption.clone_from(caption);
            }
            if let Some(story) = &story {
                photo.story.clone_from(story);
            }
            (photo.clone(), changed)
        };

        let text = PhotoUpdate {
            caption: edit.caption,
            story,
            position: None,
        };
        let store = self.clone();
        let photo_id = id.clone();
        tokio::spawn(async move {
            if (text.caption.is_some() || text.story.is_some())
                && let Err(e) = store.inner.backend.update_photo(&photo_id, &text).await
            {
                report("update_photo", &e);
            }
            store.write_positions(&changed).await;
        });

        Ok(record)
    }

    /// Delete every photo, every reason, and restore the default text fields.
    ///
    /// # Errors
    ///
    /// Returns error if any backend step fails; the mirror is only reset on
    /// success.
    #[instrument(skip(self))]
    pub async fn reset_site(&self) -> Result<(), StoreError> {
        self.inner.backend.clear_all().await?;
        *self.inner.mirror.write().await = SiteContent::reset_state();
        self.inner.dirty.store(false, Ordering::SeqCst);
        tracing::info!("Site content reset");
        Ok(())
    }

    /// Write position changes one at a time, logging failures.
    async fn write_positions(&self, changed: &[(PhotoId, u32)]) {
        for (id, position) in changed {
            let update = PhotoUpdate {
                position: Some(*position),
                ..PhotoUpdate::default()
            };
            if let Err(e) = self.inner.backend.update_photo(id, &update).await {
                report("write_position", &e);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    use crate::services::photo::tests::png;

    fn store(backend: &MemoryBackend, debounce: Duration) -> ContentStore {
        ContentStore::new(
            Backend::Memory(backend.clone()),
            PhotoConfig::default(),
            debounce,
        )
    }

    async fn with_photos(backend: &MemoryBackend, count: usize) -> ContentStore {
        let store = store(backend, Duration::from_millis(10));
        for n in 0..count {
            store.add_photo(png(40, 30), &format!("photo {n}")).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_fetch_site_defaults_when_empty() {
        let backend = MemoryBackend::new();
        let store = store(&backend, Duration::from_millis(10));
        assert_eq!(store.fetch_site().await.unwrap(), SiteContent::default());
    }

    #[tokio::test]
    async fn test_add_photo_appends_and_stores_jpeg() {
        let backend = MemoryBackend::new();
        let store = store(&backend, Duration::from_millis(10));

        let record = store.add_photo(png(2400, 1200), "Paris").await.unwrap();
        assert_eq!(record.position, 0);
        assert!(record.storage_path.starts_with("local/"));
        assert!(record.remote_url.starts_with("/media/local/"));

        let blob = backend.blob(&record.storage_path).await.unwrap();
        let stored = image::load_from_memory(&blob).unwrap();
        assert_eq!((stored.width(), stored.height()), (1200, 600));
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_blob() {
        let backend = MemoryBackend::new();
        let store = store(&backend, Duration::from_millis(10));
        backend.fail_photo_inserts(true);

        assert!(store.add_photo(png(10, 10), "").await.is_err());
        assert_eq!(backend.blob_count().await, 1);
        assert!(store.snapshot().await.photos.is_empty());
    }

    #[tokio::test]
    async fn test_remove_photo_keeps_positions_dense() {
        let backend = MemoryBackend::new();
        let store = with_photos(&backend, 4).await;
        let before = store.snapshot().await.photos;

        store.remove_photo(&before[1].id).await.unwrap();

        let after = store.snapshot().await.photos;
        let positions: Vec<u32> = after.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        let captions: Vec<&str> = after.iter().map(|p| p.caption.as_str()).collect();
        assert_eq!(captions, vec!["photo 0", "photo 2", "photo 3"]);

        let stored: Vec<u32> = backend
            .stored_positions()
            .await
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        assert_eq!(stored, vec![0, 1, 2]);
        assert_eq!(backend.blob_count().await, 3);
    }

    #[tokio::test]
    async fn test_remove_unknown_photo() {
        let backend = MemoryBackend::new();
        let store = with_photos(&backend, 1).await;
        assert!(matches!(
            store.remove_photo(&PhotoId::new("nope")).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_photo_mirror_first() {
        let backend = MemoryBackend::new();
        let store = with_photos(&backend, 3).await;
        let id = store.snapshot().await.photos[2].id.clone();

        let record = store
            .update_photo(
                &id,
                PhotoEdit {
                    caption: Some("Sea".to_string()),
                    story: Some("our first trip".to_string()),
                    position: Some(0),
                },
            )
            .await
            .unwrap();
        assert_eq!(record.position, 0);
        assert_eq!(record.caption, "Sea");

        let photos = store.snapshot().await.photos;
        assert_eq!(photos[0].id, id);
        assert_eq!(photos[0].story.as_deref(), Some("our first trip"));
        assert_eq!(photos[1].caption, "photo 0");
    }

    #[tokio::test]
    async fn test_empty_story_clears_in_backend() {
        let backend = MemoryBackend::new();
        let store = with_photos(&backend, 1).await;
        let id = store.snapshot().await.photos[0].id.clone();

        for story in ["our first trip", ""] {
            store
                .update_photo(
                    &id,
                    PhotoEdit {
                        story: Some(story.to_string()),
                        ..PhotoEdit::default()
                    },
                )
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert_eq!(store.snapshot().await.photos[0].story, None);
        let reloaded = store.fetch_site().await.unwrap();
        assert_eq!(reloaded.photos[0].story, None);
    }

    #[tokio::test]
    async fn test_update_photo_rejects_bad_position() {
        let backend = MemoryBackend::new();
        let store = with_photos(&backend, 2).await;
        let id = store.snapshot().await.photos[0].id.clone();

        let result = store
            .update_photo(
                &id,
                PhotoEdit {
                    position: Some(5),
                    ..PhotoEdit::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_reasons_trim_and_reject_blank() {
        let backend = MemoryBackend::new();
        let store = store(&backend, Duration::from_millis(10));

        let reasons = store.add_reason("  لأنك أنتِ  ").await.unwrap();
        assert_eq!(reasons.last().map(String::as_str), Some("لأنك أنتِ"));
        assert!(matches!(
            store.add_reason("   ").await,
            Err(StoreError::Rejected(_))
        ));
        assert!(matches!(
            store.remove_reason(99).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_edits_are_debounced() {
        let backend = MemoryBackend::new();
        let store = store(&backend, Duration::from_millis(600));

        for name in ["I", "In", "Ina", "Inas"] {
            let mut fields = store.snapshot().await.text_fields();
            fields.her_name = name.to_string();
            store.update_text(fields).await;
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        assert_eq!(backend.writes(), 0);

        tokio::time::advance(Duration::from_millis(700)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(backend.writes(), 1);
        assert_eq!(backend.load().await.her_name, "Inas");
    }

    #[tokio::test]
    async fn test_flush_saves_pending_edit() {
        let backend = MemoryBackend::new();
        let store = store(&backend, Duration::from_secs(60));

        store.add_reason("one more").await.unwrap();
        store.flush().await.unwrap();
        assert!(backend.load().await.reasons.contains(&"one more".to_string()));

        let writes = backend.writes();
        store.flush().await.unwrap();
        assert_eq!(backend.writes(), writes, "nothing pending");
    }

    #[tokio::test]
    async fn test_reset_site() {
        let backend = MemoryBackend::new();
        let store = with_photos(&backend, 2).await;
        store.add_reason("extra").await.unwrap();

        store.reset_site().await.unwrap();

        assert_eq!(store.snapshot().await, SiteContent::reset_state());
        assert_eq!(backend.blob_count().await, 0);
        assert_eq!(store.fetch_site().await.unwrap(), SiteContent::reset_state());
    }

    #[tokio::test]
    async fn test_offline_drops_writes() {
        let store = ContentStore::new(
            Backend::Offline,
            PhotoConfig::default(),
            Duration::from_millis(10),
        );
        assert_eq!(store.fetch_site().await.unwrap(), SiteContent::default());
        assert!(matches!(store.save_site().await, Err(StoreError::Offline)));
        assert!(matches!(
            store.add_photo(png(10, 10), "").await,
            Err(StoreError::Offline)
        ));
    }
}
