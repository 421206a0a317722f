//! Photo management commands.
//!
//! # Usage
//!
//! ```bash
//! hg-cli photos list
//! hg-cli photos add -c "First trip" a.jpg b.jpg
//! hg-cli photos remove <id>
//! hg-cli photos resequence
//! ```

use std::path::PathBuf;

use heartgate_core::PhotoId;

use super::{CliError, connect};

/// Print every photo in display order.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), CliError> {
    let state = connect().await?;
    let content = state.store().snapshot().await;

    if content.photos.is_empty() {
        println!("No photos.");
        return Ok(());
    }
    for photo in &content.photos {
        println!(
            "{:>3}  {}  {}  {}",
            photo.position, photo.id, photo.caption, photo.storage_path
        );
    }
    Ok(())
}

/// Upload files in order, appending them to the gallery.
#[allow(clippy::print_stdout)]
pub async fn add(files: &[PathBuf], caption: &str) -> Result<(), CliError> {
    let state = connect().await?;

    for path in files {
        let raw = tokio::fs::read(path).await?;
        let photo = state.store().add_photo(raw, caption.trim()).await?;
        tracing::info!(
            file = %path.display(),
            id = %photo.id,
            position = photo.position,
            "Uploaded"
        );
        println!("{}  {}", photo.id, path.display());
    }
    Ok(())
}

/// Remove a photo row and its binary.
#[allow(clippy::print_stdout)]
pub async fn remove(id: &str) -> Result<(), CliError> {
    let state = connect().await?;
    let removed = state.store().remove_photo(&PhotoId::new(id)).await?;
    println!("Removed {} ({})", removed.id, removed.storage_path);
    Ok(())
}

/// Rewrite every position from the current display order.
#[allow(clippy::print_stdout)]
pub async fn resequence() -> Result<(), CliError> {
    let state = connect().await?;
    state.store().resequence().await?;
    println!(
        "Resequenced {} photos",
        state.store().snapshot().await.photos.len()
    );
    Ok(())
}
