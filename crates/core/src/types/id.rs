//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Backend ids are
//! opaque strings (UUIDs in practice), so the wrappers hold a `String`.

use uuid::Uuid;

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `Display`, `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use heartgate_core::define_id;
/// define_id!(AlbumId);
/// define_id!(TrackId);
///
/// let album = AlbumId::new("a1");
/// let track = TrackId::new("a1");
///
/// // These are different types, so this won't compile:
/// // let _: AlbumId = track;
/// assert_eq!(album.as_str(), track.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(SiteId);
define_id!(PhotoId);

/// Blob storage key for an uploaded photo: `{site_id}/{name}.{ext}`.
///
/// The file name is a fresh UUID so concurrent uploads never collide.
#[must_use]
pub fn photo_storage_path(site_id: &SiteId, extension: &str) -> String {
    format!("{site_id}/{}.{extension}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_conversion() {
        let id = PhotoId::new("0b7c");
        assert_eq!(id.to_string(), "0b7c");
        assert_eq!(String::from(id.clone()), "0b7c");
        assert_eq!(PhotoId::from("0b7c"), id);
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = SiteId::new("site-1");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"site-1\"");
    }

    #[test]
    fn test_photo_storage_path_is_site_scoped() {
        let site = SiteId::new("abc");
        let path = photo_storage_path(&site, "jpg");
        assert!(path.starts_with("abc/"));
        assert!(path.ends_with(".jpg"));

        let other = photo_storage_path(&site, "jpg");
        assert_ne!(path, other);
    }
}
