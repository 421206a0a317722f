//! Application state shared across handlers.

use std::sync::Arc;

use heartgate_core::gate::{Verdict, Verifier, VerifyError};
use heartgate_core::{GateDate, GatePolicy, LocalVerifier};

use crate::config::{BackendKind, SiteConfig, UnlockMode};
use crate::store::{Backend, ContentStore, MemoryBackend, SupabaseBackend};
use crate::supabase::functions::RemoteVerifier;
use crate::supabase::{SupabaseClient, SupabaseError};

/// Verifier chosen by `HEARTGATE_UNLOCK_MODE`.
#[derive(Clone)]
pub enum GateVerifier {
    Local(LocalVerifier),
    Remote(RemoteVerifier),
}

impl Verifier for GateVerifier {
    async fn verify(&self, date: GateDate) -> Result<Verdict, VerifyError> {
        match self {
            Self::Local(v) => v.verify(date).await,
            Self::Remote(v) => v.verify(date).await,
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the content store, the gate verifier and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    store: ContentStore,
    verifier: GateVerifier,
}

impl AppState {
    /// Build the state from configuration, choosing the backend and the
    /// verifier.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the Supabase client cannot be built.
    pub fn new(config: SiteConfig) -> Result<Self, SupabaseError> {
        let client = config
            .supabase
            .as_ref()
            .filter(|_| config.backend == BackendKind::Supabase)
            .map(SupabaseClient::new)
            .transpose()?;

        let backend = match (&config.backend, &client, &config.supabase) {
            (BackendKind::Memory, _, _) => Backend::Memory(MemoryBackend::new()),
            (BackendKind::Supabase, Some(client), Some(supabase)) => {
                Backend::Supabase(SupabaseBackend::new(client.clone(), supabase))
            }
            (BackendKind::Supabase, _, _) => {
                tracing::warn!(
                    "SUPABASE_URL, SUPABASE_ANON_KEY or HEARTGATE_SITE_ID missing; \
                     serving defaults and dropping writes"
                );
                Backend::Offline
            }
        };

        let verifier = match (config.gate.mode, client, &config.supabase) {
            (UnlockMode::Remote, Some(client), Some(supabase)) => {
                GateVerifier::Remote(RemoteVerifier::new(client, supabase.site_id.clone()))
            }
            _ => GateVerifier::Local(LocalVerifier::new(config.gate.reference_date)),
        };

        let store = ContentStore::new(backend, config.photos, config.save_debounce);
        Ok(Self::from_parts(config, store, verifier))
    }

    /// Assemble state from prebuilt parts.
    #[must_use]
    pub fn from_parts(config: SiteConfig, store: ContentStore, verifier: GateVerifier) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                verifier,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the content store.
    #[must_use]
    pub fn store(&self) -> &ContentStore {
        &self.inner.store
    }

    /// Get a reference to the gate verifier.
    #[must_use]
    pub fn verifier(&self) -> &GateVerifier {
        &self.inner.verifier
    }

    #[must_use]
    pub fn policy(&self) -> &GatePolicy {
        &self.inner.config.gate.policy
    }
}
