//! Command implementations.

pub mod photos;
pub mod resize;
pub mod site;

use heartgate_core::DateInputError;
use heartgate_site::config::{BackendKind, ConfigError, SiteConfig};
use heartgate_site::services::photo::PhotoError;
use heartgate_site::state::AppState;
use heartgate_site::store::StoreError;
use heartgate_site::supabase::SupabaseError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Supabase(#[from] SupabaseError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Image error: {0}")]
    Photo(#[from] PhotoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid date: {0}")]
    Date(#[from] DateInputError),

    /// The command needs the hosted backend.
    #[error("No backend configured: set SUPABASE_URL, SUPABASE_ANON_KEY and HEARTGATE_SITE_ID")]
    NoBackend,

    /// A destructive command ran without confirmation.
    #[error("Refusing to {0} without --yes")]
    Unconfirmed(&'static str),
}

/// Connect to the configured backend and load the current content.
pub async fn connect() -> Result<AppState, CliError> {
    let config = SiteConfig::from_env()?;
    if config.backend == BackendKind::Memory || config.supabase.is_none() {
        return Err(CliError::NoBackend);
    }

    let state = AppState::new(config)?;
    state.store().fetch_site().await?;
    Ok(state)
}
