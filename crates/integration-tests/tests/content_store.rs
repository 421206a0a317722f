//! Integration tests for the edit panel API and the content store behind it.
//!
//! Writes land in the in-memory backend, so each test can check both the
//! JSON the panel receives and what was persisted.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use axum::http::{Method, StatusCode, header};
use heartgate_core::{PhotoId, PhotoRecord, SiteContent};
use heartgate_integration_tests::{EDIT_TOKEN, Part, TestApp, png};
use serde_json::{Value, json};

/// Longer than the test debounce window.
const SETTLE: Duration = Duration::from_millis(200);

fn text_fields(her_name: &str) -> Value {
    json!({
        "herName": her_name,
        "myName": "Omar",
        "startDate": "2023-07-14",
        "heroSubtitle": "every day with you",
        "loveLetter": "Dear Layla,\nthank you.",
        "surpriseMessage": "Dinner at eight",
        "language": "en",
        "musicEnabled": false
    })
}

async fn upload(app: &mut TestApp, caption: &str, sizes: &[(u32, u32)]) -> Vec<PhotoRecord> {
    let mut parts = vec![Part::Text {
        name: "caption",
        value: caption,
    }];
    for (i, (w, h)) in sizes.iter().enumerate() {
        parts.push(Part::File {
            name: "photo",
            file_name: if i == 0 { "first.png" } else { "more.png" },
            bytes: png(*w, *h),
        });
    }
    let response = app.post_multipart("/api/photos", parts).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    response.json()
}

// =============================================================================
// Editor login
// =============================================================================

#[tokio::test]
async fn test_panel_requires_login() {
    let mut app = TestApp::new();

    let page = app.get("/edit").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("action=\"/edit/login\""));

    let api = app
        .json(Method::PUT, "/api/site", &text_fields("Layla"))
        .await;
    assert_eq!(api.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_token_is_refused() {
    let mut app = TestApp::new();

    let response = app
        .post_form("/edit/login", &[("token", "not-the-token-at-all")])
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.contains("Wrong token"));

    let page = app.get("/edit").await;
    assert!(page.body.contains("action=\"/edit/login\""));
}

#[tokio::test]
async fn test_login_opens_panel_and_logout_closes_it() {
    let mut app = TestApp::new();
    app.login_editor().await;

    let page = app.get("/edit").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("id=\"site-form\""));
    assert!(!page.body.contains("not configured"));

    let response = app.post_form("/edit/logout", &[]).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        app.json(Method::POST, "/api/reasons", &json!({ "text": "x" }))
            .await
            .status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_panel_disabled_without_token() {
    let mut app = TestApp::with_env(&[("HEARTGATE_EDIT_TOKEN", "")]);

    let page = app.get("/edit").await;
    assert!(page.body.contains("HEARTGATE_EDIT_TOKEN"));
    assert!(!page.body.contains("action=\"/edit/login\""));

    let response = app.post_form("/edit/login", &[("token", EDIT_TOKEN)]).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Text fields and reasons
// =============================================================================

#[tokio::test]
async fn test_text_update_is_mirrored_then_saved() {
    let mut app = TestApp::new();
    app.login_editor().await;
    let writes_before = app.memory.writes();

    let response = app
        .json(Method::PUT, "/api/site", &text_fields("Layla"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let content: SiteContent = response.json();
    assert_eq!(content.her_name, "Layla");
    assert_eq!(content.start_date.to_string(), "2023-07-14");

    tokio::time::sleep(SETTLE).await;
    assert!(app.memory.writes() > writes_before);

    let stored = app.state.store().fetch_site().await.unwrap();
    assert_eq!(stored.her_name, "Layla");
    assert_eq!(stored.love_letter, "Dear Layla,\nthank you.");
}

#[tokio::test]
async fn test_burst_of_edits_saves_once() {
    let mut app = TestApp::with_env(&[("HEARTGATE_SAVE_DEBOUNCE_MS", "400")]);
    app.login_editor().await;
    let writes_before = app.memory.writes();

    for name in ["L", "La", "Lay", "Layl", "Layla"] {
        app.json(Method::PUT, "/api/site", &text_fields(name)).await;
    }
    assert_eq!(app.memory.writes(), writes_before);
    tokio::time::sleep(Duration::from_millis(1000)).await;

    assert_eq!(app.memory.writes(), writes_before + 1);
    let stored = app.state.store().fetch_site().await.unwrap();
    assert_eq!(stored.her_name, "Layla");
}

#[tokio::test]
async fn test_reasons_add_and_remove() {
    let mut app = TestApp::new();
    app.login_editor().await;
    let initial = app.state.store().snapshot().await.reasons.len();

    let reasons: Vec<String> = app
        .json(
            Method::POST,
            "/api/reasons",
            &json!({ "text": "  the way you laugh  " }),
        )
        .await
        .json();
    assert_eq!(reasons.len(), initial + 1);
    assert_eq!(reasons.last().unwrap(), "the way you laugh");

    let blank = app
        .json(Method::POST, "/api/reasons", &json!({ "text": "   " }))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let removed = app.delete(&format!("/api/reasons/{initial}")).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(app.state.store().snapshot().await.reasons.len(), initial);

    let missing = app.delete("/api/reasons/999").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Photos
// =============================================================================

#[tokio::test]
async fn test_upload_shrinks_and_appends_in_order() {
    let mut app = TestApp::with_env(&[("HEARTGATE_PHOTO_MAX_DIMENSION", "64")]);
    app.login_editor().await;

    let added = upload(&mut app, "Paris", &[(256, 128), (32, 48)]).await;
    assert_eq!(added.len(), 2);
    assert_eq!(added[0].position, 0);
    assert_eq!(added[1].position, 1);
    assert!(added.iter().all(|p| p.caption == "Paris"));
    assert!(added.iter().all(|p| p.storage_path.ends_with(".jpg")));
    assert_eq!(app.memory.blob_count().await, 2);

    let media = app.get(&added[0].remote_url).await;
    assert_eq!(media.status, StatusCode::OK);
    assert_eq!(media.headers[header::CONTENT_TYPE], "image/jpeg");

    let stored = app.memory.blob(&added[0].storage_path).await.unwrap();
    let image = image::load_from_memory(&stored).unwrap();
    assert_eq!((image.width(), image.height()), (64, 32));

    let small = app.memory.blob(&added[1].storage_path).await.unwrap();
    let image = image::load_from_memory(&small).unwrap();
    assert_eq!((image.width(), image.height()), (32, 48));
}

#[tokio::test]
async fn test_upload_rejects_non_images_and_empty_requests() {
    let mut app = TestApp::new();
    app.login_editor().await;

    let response = app
        .post_multipart(
            "/api/photos",
            vec![Part::File {
                name: "photo",
                file_name: "notes.txt",
                bytes: b"not an image".to_vec(),
            }],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post_multipart(
            "/api/photos",
            vec![Part::Text {
                name: "caption",
                value: "nothing attached",
            }],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.memory.blob_count().await, 0);
}

#[tokio::test]
async fn test_delete_closes_the_gap() {
    let mut app = TestApp::new();
    app.login_editor().await;
    let added = upload(&mut app, "", &[(8, 8), (8, 8), (8, 8), (8, 8)]).await;

    let response = app.delete(&format!("/api/photos/{}", added[1].id)).await;
    assert_eq!(response.status, StatusCode::OK);

    let expected: Vec<PhotoId> = [0, 2, 3].iter().map(|&i| added[i].id.clone()).collect();
    let mirror = app.state.store().snapshot().await.photos;
    assert_eq!(
        mirror.iter().map(|p| p.id.clone()).collect::<Vec<_>>(),
        expected
    );
    assert_eq!(
        mirror.iter().map(|p| p.position).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );

    let stored = app.memory.stored_positions().await;
    assert_eq!(
        stored,
        expected.into_iter().zip(0_u32..).collect::<Vec<_>>()
    );
    assert_eq!(app.memory.blob_count().await, 3);
    assert!(app.memory.blob(&added[1].storage_path).await.is_none());
}

#[tokio::test]
async fn test_delete_unknown_photo_is_not_found() {
    let mut app = TestApp::new();
    app.login_editor().await;

    let response = app.delete("/api/photos/does-not-exist").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_caption_story_and_position() {
    let mut app = TestApp::new();
    app.login_editor().await;
    let added = upload(&mut app, "", &[(8, 8), (8, 8), (8, 8)]).await;
    let url = format!("/api/photos/{}", added[2].id);

    let edited: PhotoRecord = app
        .json(
            Method::PATCH,
            &url,
            &json!({ "caption": "Sunset", "story": "We missed the bus", "position": 0 }),
        )
        .await
        .json();
    assert_eq!(edited.caption, "Sunset");
    assert_eq!(edited.story.as_deref(), Some("We missed the bus"));
    assert_eq!(edited.position, 0);

    tokio::time::sleep(SETTLE).await;
    let stored = app.memory.stored_positions().await;
    assert_eq!(
        stored.iter().map(|(id, _)| id.clone()).collect::<Vec<_>>(),
        vec![
            added[2].id.clone(),
            added[0].id.clone(),
            added[1].id.clone()
        ]
    );

    let cleared: PhotoRecord = app
        .json(Method::PATCH, &url, &json!({ "story": "" }))
        .await
        .json();
    assert_eq!(cleared.story, None);

    let out_of_range = app
        .json(Method::PATCH, &url, &json!({ "position": 7 }))
        .await;
    assert_eq!(out_of_range.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_visitor_sees_uploaded_photos() {
    let mut editor = TestApp::new();
    editor.login_editor().await;
    let added = upload(&mut editor, "Rome", &[(8, 8)]).await;

    let mut locked = editor.new_visitor("198.51.100.30");
    assert_eq!(
        locked.get(&added[0].remote_url).await.status,
        StatusCode::UNAUTHORIZED
    );

    let mut visitor = editor.new_visitor("198.51.100.31");
    visitor.unlock().await;
    let content: SiteContent = visitor.get("/api/site").await.json();
    assert_eq!(content.photos.len(), 1);
    assert_eq!(content.photos[0].caption, "Rome");

    let page = visitor.get("/").await;
    assert!(page.body.contains(&added[0].remote_url));
    assert_eq!(
        visitor.get(&added[0].remote_url).await.status,
        StatusCode::OK
    );
}

// =============================================================================
// Reset
// =============================================================================

#[tokio::test]
async fn test_reset_restores_defaults() {
    let mut app = TestApp::new();
    app.login_editor().await;
    app.json(Method::PUT, "/api/site", &text_fields("Layla"))
        .await;
    app.json(Method::POST, "/api/reasons", &json!({ "text": "extra" }))
        .await;
    upload(&mut app, "", &[(8, 8), (8, 8)]).await;

    let response: Value = app.json(Method::POST, "/api/reset", &json!({})).await.json();
    assert_eq!(response["success"], true);

    let defaults = SiteContent::default();
    let mirror = app.state.store().snapshot().await;
    assert_eq!(mirror.her_name, defaults.her_name);
    assert!(mirror.photos.is_empty());
    assert!(mirror.reasons.is_empty());
    assert_eq!(app.memory.blob_count().await, 0);

    // A pending debounced save must not bring the old text back.
    tokio::time::sleep(SETTLE).await;
    let stored = app.state.store().fetch_site().await.unwrap();
    assert_eq!(stored.her_name, defaults.her_name);
}
