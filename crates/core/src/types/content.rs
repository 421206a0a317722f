//! Site content model.
//!
//! `SiteContent` is owned by the remote store and mirrored in memory by the
//! site server. The JSON form uses camelCase keys because it is also what the
//! edit panel script sends and receives.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::id::PhotoId;

/// Display language of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ar,
    En,
}

impl Language {
    /// Language code as stored in the backend row.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::En => "en",
        }
    }

    /// Text direction for the `dir` HTML attribute.
    #[must_use]
    pub const fn direction(self) -> &'static str {
        match self {
            Self::Ar => "rtl",
            Self::En => "ltr",
        }
    }

    /// Parse a backend language code, falling back to Arabic.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "en" => Self::En,
            _ => Self::Ar,
        }
    }
}

/// A photo in the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    pub id: PhotoId,
    /// Display URL, public or signed, resolved when the record was read.
    pub remote_url: String,
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    pub storage_path: String,
    /// Zero-based display position.
    pub position: u32,
}

/// Everything the scenes render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContent {
    pub her_name: String,
    pub my_name: String,
    pub start_date: NaiveDate,
    pub hero_subtitle: String,
    pub love_letter: String,
    pub reasons: Vec<String>,
    pub surprise_message: String,
    pub photos: Vec<PhotoRecord>,
    pub language: Language,
    pub music_enabled: bool,
}

/// The text fields of a site, always written together.
///
/// Saves are full-row upserts, never per-field patches, so the edit panel
/// submits every field each time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFields {
    pub her_name: String,
    pub my_name: String,
    pub start_date: NaiveDate,
    pub hero_subtitle: String,
    pub love_letter: String,
    pub surprise_message: String,
    pub language: Language,
    pub music_enabled: bool,
}

/// Relationship start date used when nothing has been configured.
pub const DEFAULT_START_DATE: (i32, u32, u32) = (2024, 3, 21);

impl Default for SiteContent {
    fn default() -> Self {
        let (y, m, d) = DEFAULT_START_DATE;
        Self {
            her_name: "حبيبتي".to_string(),
            my_name: "حبيبك".to_string(),
            start_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
            hero_subtitle: "قصة بدأت… وغيرت كل شيء".to_string(),
            love_letter: String::new(),
            reasons: vec![
                "لأن ضحكتك تضيء عالمي".to_string(),
                "لأنك تفهمينني بدون كلام".to_string(),
                "لأن قلبك أجمل قلب عرفته".to_string(),
                "لأنك تجعلين كل يوم أجمل".to_string(),
                "لأنني أحبك أكثر كل يوم".to_string(),
            ],
            surprise_message: "إنتِ أجمل قرار في حياتي… وكل سنة وإنتِ حبّي.".to_string(),
            photos: Vec::new(),
            language: Language::Ar,
            music_enabled: false,
        }
    }
}

impl SiteContent {
    /// Snapshot of the text fields.
    #[must_use]
    pub fn text_fields(&self) -> TextFields {
        TextFields {
            her_name: self.her_name.clone(),
            my_name: self.my_name.clone(),
            start_date: self.start_date,
            hero_subtitle: self.hero_subtitle.clone(),
            love_letter: self.love_letter.clone(),
            surprise_message: self.surprise_message.clone(),
            language: self.language,
            music_enabled: self.music_enabled,
        }
    }

    /// Replace every text field at once.
    pub fn apply_text_fields(&mut self, fields: TextFields) {
        self.her_name = fields.her_name;
        self.my_name = fields.my_name;
        self.start_date = fields.start_date;
        self.hero_subtitle = fields.hero_subtitle;
        self.love_letter = fields.love_letter;
        self.surprise_message = fields.surprise_message;
        self.language = fields.language;
        self.music_enabled = fields.music_enabled;
    }

    /// Defaults for the text fields with empty reasons and photos, the state
    /// a reset leaves behind.
    #[must_use]
    pub fn reset_state() -> Self {
        Self {
            reasons: Vec::new(),
            photos: Vec::new(),
            ..Self::default()
        }
    }

    /// Look up a photo by id.
    #[must_use]
    pub fn photo(&self, id: &PhotoId) -> Option<&PhotoRecord> {
        self.photos.iter().find(|p| &p.id == id)
    }
}
