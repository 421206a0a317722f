//! `PostgREST` row access.
//!
//! # Tables
//!
//! ```text
//! love_sites    id, her_name, his_name, start_date, hero_subtitle,
//!               love_letter, surprise_text, language, music_enabled
//! love_reasons  site_id, text, position
//! love_photos   id, site_id, storage_path, caption, story, position
//! ```

use chrono::NaiveDate;
use heartgate_core::{Language, PhotoId, SiteId, TextFields};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{SupabaseClient, SupabaseError, check, decode};

const SITES: &str = "rest/v1/love_sites";
const REASONS: &str = "rest/v1/love_reasons";
const PHOTOS: &str = "rest/v1/love_photos";

/// A `love_sites` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRow {
    pub id: String,
    #[serde(default)]
    pub her_name: Option<String>,
    #[serde(default)]
    pub his_name: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub hero_subtitle: Option<String>,
    #[serde(default)]
    pub love_letter: Option<String>,
    #[serde(default)]
    pub surprise_text: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub music_enabled: Option<bool>,
}

impl SiteRow {
    /// Full row for an upsert.
    #[must_use]
    pub fn from_fields(site_id: &SiteId, fields: &TextFields) -> Self {
        Self {
            id: site_id.to_string(),
            her_name: Some(fields.her_name.clone()),
            his_name: Some(fields.my_name.clone()),
            start_date: Some(fields.start_date),
            hero_subtitle: Some(fields.hero_subtitle.clone()),
            love_letter: Some(fields.love_letter.clone()),
            surprise_text: Some(fields.surprise_message.clone()),
            language: Some(fields.language.code().to_string()),
            music_enabled: Some(fields.music_enabled),
        }
    }

    /// Text fields with `defaults` filling any nulls.
    #[must_use]
    pub fn into_fields(self, defaults: TextFields) -> TextFields {
        TextFields {
            her_name: self.her_name.unwrap_or(defaults.her_name),
            my_name: self.his_name.unwrap_or(defaults.my_name),
            start_date: self.start_date.unwrap_or(defaults.start_date),
            hero_subtitle: self.hero_subtitle.unwrap_or(defaults.hero_subtitle),
            love_letter: self.love_letter.unwrap_or(defaults.love_letter),
            surprise_message: self.surprise_text.unwrap_or(defaults.surprise_message),
            language: self
                .language
                .as_deref()
                .map_or(defaults.language, Language::from_code),
            music_enabled: self.music_enabled.unwrap_or(defaults.music_enabled),
        }
    }
}

/// A `love_reasons` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonRow {
    pub site_id: String,
    pub text: String,
    pub position: u32,
}

/// A `love_photos` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRow {
    pub id: PhotoId,
    pub site_id: String,
    pub storage_path: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub story: Option<String>,
    pub position: u32,
}

/// Insert payload for `love_photos`; the id is generated by the database.
#[derive(Debug, Serialize)]
pub struct NewPhotoRow<'a> {
    pub site_id: &'a str,
    pub storage_path: &'a str,
    pub caption: &'a str,
    pub position: u32,
}

/// Partial update for `love_photos`.
#[derive(Debug, Default, Serialize)]
pub struct PhotoPatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<&'a str>,
    /// `Some(None)` sends `null` to clear the story.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<Option<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl SupabaseClient {
    /// Fetch the site row, if it exists.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(site_id = %site_id))]
    pub async fn get_site(&self, site_id: &SiteId) -> Result<Option<SiteRow>, SupabaseError> {
        let mut url = self.url(SITES)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{site_id}"))
            .append_pair("select", "*")
            .append_pair("limit", "1");

        let response = check(self.request(Method::GET, url).send().await?).await?;
        let rows: Vec<SiteRow> = decode(response).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert or replace the site row.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, row), fields(site_id = %row.id))]
    pub async fn upsert_site(&self, row: &SiteRow) -> Result<(), SupabaseError> {
        let url = self.url(SITES)?;
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Reasons for the site, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(site_id = %site_id))]
    pub async fn list_reasons(&self, site_id: &SiteId) -> Result<Vec<ReasonRow>, SupabaseError> {
        let mut url = self.url(REASONS)?;
        url.query_pairs_mut()
            .append_pair("site_id", &format!("eq.{site_id}"))
            .append_pair("select", "site_id,text,position")
            .append_pair("order", "position.asc");

        let response = check(self.request(Method::GET, url).send().await?).await?;
        decode(response).await
    }

    /// Replace every reason of the site.
    ///
    /// # Errors
    ///
    /// Returns error if either the delete or the insert fails. A failed insert
    /// leaves the site without reasons until the next save.
    #[instrument(skip(self, reasons), fields(site_id = %site_id, count = reasons.len()))]
    pub async fn replace_reasons(
        &self,
        site_id: &SiteId,
        reasons: &[String],
    ) -> Result<(), SupabaseError> {
        self.delete_reasons(site_id).await?;
        if reasons.is_empty() {
            return Ok(());
        }

        let rows: Vec<ReasonRow> = reasons
            .iter()
            .zip(0_u32..)
            .map(|(text, position)| ReasonRow {
                site_id: site_id.to_string(),
                text: text.clone(),
                position,
            })
            .collect();

        let response = self
            .request(Method::POST, self.url(REASONS)?)
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Delete every reason of the site.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn delete_reasons(&self, site_id: &SiteId) -> Result<(), SupabaseError> {
        let mut url = self.url(REASONS)?;
        url.query_pairs_mut()
            .append_pair("site_id", &format!("eq.{site_id}"));
        check(self.request(Method::DELETE, url).send().await?).await?;
        Ok(())
    }

    /// Photo rows for the site, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(site_id = %site_id))]
    pub async fn list_photos(&self, site_id: &SiteId) -> Result<Vec<PhotoRow>, SupabaseError> {
        let mut url = self.url(PHOTOS)?;
        url.query_pairs_mut()
            .append_pair("site_id", &format!("eq.{site_id}"))
            .append_pair("select", "*")
            .append_pair("order", "position.asc");

        let response = check(self.request(Method::GET, url).send().await?).await?;
        decode(response).await
    }

    /// Insert a photo row and return it with its generated id.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or no row comes back.
    #[instrument(skip(self, row), fields(path = %row.storage_path))]
    pub async fn insert_photo(&self, row: &NewPhotoRow<'_>) -> Result<PhotoRow, SupabaseError> {
        let response = self
            .request(Method::POST, self.url(PHOTOS)?)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let rows: Vec<PhotoRow> = decode(check(response).await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::Parse("insert returned no row".to_string()))
    }

    /// Patch a photo row.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, patch), fields(photo_id = %id))]
    pub async fn update_photo(
        &self,
        site_id: &SiteId,
        id: &PhotoId,
        patch: &PhotoPatch<'_>,
    ) -> Result<(), SupabaseError> {
        let mut url = self.url(PHOTOS)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("site_id", &format!("eq.{site_id}"));

        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Delete a photo row.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(photo_id = %id))]
    pub async fn delete_photo(&self, site_id: &SiteId, id: &PhotoId) -> Result<(), SupabaseError> {
        let mut url = self.url(PHOTOS)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("site_id", &format!("eq.{site_id}"));
        check(self.request(Method::DELETE, url).send().await?).await?;
        Ok(())
    }

    /// Delete every photo row of the site.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(site_id = %site_id))]
    pub async fn delete_photos(&self, site_id: &SiteId) -> Result<(), SupabaseError> {
        let mut url = self.url(PHOTOS)?;
        url.query_pairs_mut()
            .append_pair("site_id", &format!("eq.{site_id}"));
        check(self.request(Method::DELETE, url).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use heartgate_core::SiteContent;
    use serde_json::json;

    #[test]
    fn test_site_row_round_trips_text_fields() {
        let mut fields = SiteContent::default().text_fields();
        fields.her_name = "Layla".to_string();
        fields.language = Language::En;

        let row = SiteRow::from_fields(&SiteId::new("s1"), &fields);
        assert_eq!(row.his_name.as_deref(), Some(fields.my_name.as_str()));
        assert_eq!(row.language.as_deref(), Some("en"));

        let back = row.into_fields(SiteContent::default().text_fields());
        assert_eq!(back, fields);
    }

    #[test]
    fn test_null_columns_fall_back_to_defaults() {
        let row: SiteRow = serde_json::from_value(json!({
            "id": "s1",
            "her_name": "Mona",
            "start_date": null,
            "surprise_text": null
        }))
        .unwrap();

        let defaults = SiteContent::default().text_fields();
        let fields = row.into_fields(defaults.clone());
        assert_eq!(fields.her_name, "Mona");
        assert_eq!(fields.start_date, defaults.start_date);
        assert_eq!(fields.surprise_message, defaults.surprise_message);
    }

    #[test]
    fn test_photo_patch_skips_unset_fields() {
        let patch = PhotoPatch {
            caption: Some("Beach"),
            ..PhotoPatch::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "caption": "Beach" }));
    }

    #[test]
    fn test_photo_patch_clears_story_with_null() {
        let patch = PhotoPatch {
            story: Some(None),
            ..PhotoPatch::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "story": null }));
    }

    #[test]
    fn test_photo_row_parses_nullable_text() {
        let row: PhotoRow = serde_json::from_value(json!({
            "id": "8f1c",
            "site_id": "s1",
            "storage_path": "s1/8f1c.jpg",
            "caption": null,
            "position": 3
        }))
        .unwrap();
        assert_eq!(row.caption, None);
        assert_eq!(row.story, None);
        assert_eq!(row.position, 3);
    }
}
