//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Backend (all three or none)
//! - `SUPABASE_URL` - Project base URL (e.g., `https://abc.supabase.co`)
//! - `SUPABASE_ANON_KEY` - Public anon key sent as `apikey` and bearer token
//! - `HEARTGATE_SITE_ID` - Row id of the site in `love_sites`
//!
//! When none are set the server runs offline: defaults are served and writes
//! are dropped with a warning.
//!
//! ## Optional
//! - `HEARTGATE_HOST` - Bind address (default: 127.0.0.1)
//! - `HEARTGATE_PORT` - Listen port (default: 3000)
//! - `HEARTGATE_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `HEARTGATE_BACKEND` - `supabase` (default) or `memory` for a local preview
//! - `HEARTGATE_BUCKET` - Storage bucket (default: `love-memories`)
//! - `HEARTGATE_SIGNED_URL_TTL_SECS` - Serve signed photo URLs valid this long
//!   (default: unset, public URLs)
//! - `HEARTGATE_UNLOCK_MODE` - `local` (default) or `remote`
//! - `HEARTGATE_REFERENCE_DATE` - Gate date for local mode (default: 2024-03-21)
//! - `HEARTGATE_UNLOCK_TTL_HOURS` - Unlock lifetime, at most 87600 (default: 168)
//! - `HEARTGATE_MAX_ATTEMPTS` - Failures before lockout (default: 5)
//! - `HEARTGATE_LOCKOUT_SECS` - Lockout length, at most 315360000 (default: 30)
//! - `HEARTGATE_SAVE_DEBOUNCE_MS` - Quiet period before saving edits (default: 600)
//! - `HEARTGATE_PHOTO_MAX_DIMENSION` - Longest stored photo side (default: 1200)
//! - `HEARTGATE_PHOTO_QUALITY` - JPEG quality 1-100 (default: 82)
//! - `HEARTGATE_ANNIVERSARY` - `MM-DD` to show the anniversary reveal
//! - `HEARTGATE_EDIT_TOKEN` - Edit panel token (min 16 chars, high entropy);
//!   the edit panel is disabled when unset
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use heartgate_core::gate::GatePolicy;
use heartgate_core::imaging::{DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DIMENSION};
use heartgate_core::moments::AnniversaryDay;
use heartgate_core::{GateDate, SiteId};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_EDIT_TOKEN_LENGTH: usize = 16;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Upper bounds for gate durations, about ten years each.
const MAX_UNLOCK_TTL_HOURS: i64 = 24 * 365 * 10;
const MAX_LOCKOUT_SECS: i64 = 60 * 60 * 24 * 365 * 10;

/// Default storage bucket for photos.
pub const DEFAULT_BUCKET: &str = "love-memories";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where content lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Hosted row store and blob storage.
    #[default]
    Supabase,
    /// Process memory, for local previews and tests.
    Memory,
}

/// How gate submissions are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnlockMode {
    /// Compare against `HEARTGATE_REFERENCE_DATE`.
    #[default]
    Local,
    /// Ask the backend's unlock function.
    Remote,
}

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Backend selection
    pub backend: BackendKind,
    /// Supabase connection, if configured
    pub supabase: Option<SupabaseConfig>,
    /// Gate settings
    pub gate: GateConfig,
    /// Photo pipeline settings
    pub photos: PhotoConfig,
    /// Quiet period before edits are saved
    pub save_debounce: Duration,
    /// Day of the year that triggers the anniversary reveal
    pub anniversary: Option<AnniversaryDay>,
    /// Token that unlocks the edit panel
    pub edit_token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Supabase project configuration.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: Url,
    pub anon_key: SecretString,
    pub site_id: SiteId,
    pub bucket: String,
    /// Signed URL lifetime; `None` serves public URLs.
    pub signed_url_ttl: Option<Duration>,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("site_id", &self.site_id)
            .field("bucket", &self.bucket)
            .field("signed_url_ttl", &self.signed_url_ttl)
            .finish()
    }
}

/// Gate configuration.
#[derive(Debug, Clone, Copy)]
pub struct GateConfig {
    pub mode: UnlockMode,
    pub reference_date: GateDate,
    pub unlock_ttl: TimeDelta,
    pub policy: GatePolicy,
}

/// Photo pipeline configuration.
#[derive(Debug, Clone, Copy)]
pub struct PhotoConfig {
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid or if the edit token
    /// fails validation. Partially set backend variables are ignored with a
    /// warning.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`SiteConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let host = env.parse_or("HEARTGATE_HOST", "127.0.0.1".parse::<IpAddr>())?;
        let port = env.parse_or("HEARTGATE_PORT", Ok(3000))?;
        let base_url = env.or_default("HEARTGATE_BASE_URL", "http://localhost:3000");

        let backend = match env.optional("HEARTGATE_BACKEND").as_deref() {
            None | Some("supabase") => BackendKind::Supabase,
            Some("memory") => BackendKind::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "HEARTGATE_BACKEND".to_string(),
                    format!("expected supabase or memory, got {other}"),
                ));
            }
        };

        let supabase = SupabaseConfig::from_env(&env)?;

        let gate = GateConfig::from_env(&env)?;
        if gate.mode == UnlockMode::Remote && (supabase.is_none() || backend == BackendKind::Memory)
        {
            return Err(ConfigError::InvalidEnvVar(
                "HEARTGATE_UNLOCK_MODE".to_string(),
                "remote mode requires SUPABASE_URL, SUPABASE_ANON_KEY and HEARTGATE_SITE_ID"
                    .to_string(),
            ));
        }

        let photos = PhotoConfig {
            max_dimension: env
                .parse_or("HEARTGATE_PHOTO_MAX_DIMENSION", Ok(DEFAULT_MAX_DIMENSION))?,
            jpeg_quality: env.parse_or("HEARTGATE_PHOTO_QUALITY", Ok(DEFAULT_JPEG_QUALITY))?,
        };
        if photos.max_dimension == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "HEARTGATE_PHOTO_MAX_DIMENSION".to_string(),
                "must be positive".to_string(),
            ));
        }
        if !(1..=100).contains(&photos.jpeg_quality) {
            return Err(ConfigError::InvalidEnvVar(
                "HEARTGATE_PHOTO_QUALITY".to_string(),
                "must be between 1 and 100".to_string(),
            ));
        }

        let save_debounce =
            Duration::from_millis(env.parse_or("HEARTGATE_SAVE_DEBOUNCE_MS", Ok(600))?);

        let anniversary = env
            .optional("HEARTGATE_ANNIVERSARY")
            .map(|v| {
                v.parse::<AnniversaryDay>().map_err(|e| {
                    ConfigError::InvalidEnvVar("HEARTGATE_ANNIVERSARY".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let edit_token = env
            .optional("HEARTGATE_EDIT_TOKEN")
            .map(|token| {
                validate_edit_token(&token, "HEARTGATE_EDIT_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(token))
            })
            .transpose()?;

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            supabase,
            gate,
            photos,
            save_debounce,
            anniversary,
            edit_token,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Check a submitted edit token.
    #[must_use]
    pub fn edit_token_matches(&self, candidate: &str) -> bool {
        self.edit_token
            .as_ref()
            .is_some_and(|token| constant_time_compare(token.expose_secret(), candidate))
    }
}

impl SupabaseConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let url = env.optional("SUPABASE_URL");
        let key = env.optional("SUPABASE_ANON_KEY");
        let site = env.optional("HEARTGATE_SITE_ID");

        let (url, anon_key, site_id) = match (url, key, site) {
            (Some(url), Some(key), Some(site)) => (url, key, site),
            (None, None, None) => return Ok(None),
            _ => {
                tracing::warn!(
                    "SUPABASE_URL, SUPABASE_ANON_KEY and HEARTGATE_SITE_ID must be set together; \
                     running without a backend"
                );
                return Ok(None);
            }
        };

        let url = Url::parse(&url)
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string()))?;

        let signed_url_ttl = env
            .optional("HEARTGATE_SIGNED_URL_TTL_SECS")
            .map(|v| {
                v.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "HEARTGATE_SIGNED_URL_TTL_SECS".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(Some(Self {
            url,
            anon_key: SecretString::from(anon_key),
            site_id: SiteId::new(site_id),
            bucket: env.or_default("HEARTGATE_BUCKET", DEFAULT_BUCKET),
            signed_url_ttl,
        }))
    }
}

impl GateConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let mode = match env.optional("HEARTGATE_UNLOCK_MODE").as_deref() {
            None | Some("local") => UnlockMode::Local,
            Some("remote") => UnlockMode::Remote,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "HEARTGATE_UNLOCK_MODE".to_string(),
                    format!("expected local or remote, got {other}"),
                ));
            }
        };

        let reference_date = env
            .or_default("HEARTGATE_REFERENCE_DATE", "2024-03-21")
            .parse::<GateDate>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("HEARTGATE_REFERENCE_DATE".to_string(), e.to_string())
            })?;

        let ttl_hours: i64 = env.parse_or("HEARTGATE_UNLOCK_TTL_HOURS", Ok(168))?;
        let max_attempts: u32 = env.parse_or("HEARTGATE_MAX_ATTEMPTS", Ok(5))?;
        let lockout_secs: i64 = env.parse_or("HEARTGATE_LOCKOUT_SECS", Ok(30))?;

        if ttl_hours <= 0 || max_attempts == 0 || lockout_secs < 0 {
            return Err(ConfigError::InvalidEnvVar(
                "HEARTGATE_UNLOCK_TTL_HOURS/HEARTGATE_MAX_ATTEMPTS/HEARTGATE_LOCKOUT_SECS"
                    .to_string(),
                "must be positive".to_string(),
            ));
        }
        if ttl_hours > MAX_UNLOCK_TTL_HOURS {
            return Err(ConfigError::InvalidEnvVar(
                "HEARTGATE_UNLOCK_TTL_HOURS".to_string(),
                format!("must be at most {MAX_UNLOCK_TTL_HOURS}"),
            ));
        }
        if lockout_secs > MAX_LOCKOUT_SECS {
            return Err(ConfigError::InvalidEnvVar(
                "HEARTGATE_LOCKOUT_SECS".to_string(),
                format!("must be at most {MAX_LOCKOUT_SECS}"),
            ));
        }

        Ok(Self {
            mode,
            reference_date,
            unlock_ttl: TimeDelta::hours(ttl_hours),
            policy: GatePolicy {
                max_attempts,
                lockout: TimeDelta::seconds(lockout_secs),
                ..GatePolicy::default()
            },
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment lookup with the typed helpers used above.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(
        &self,
        key: &str,
        default: Result<T, <T as FromStr>::Err>,
    ) -> Result<T, ConfigError>
    where
        T: FromStr,
        <T as FromStr>::Err: std::fmt::Display,
    {
        self.optional(key)
            .map_or(default, |v| v.trim().parse::<T>())
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Token length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that the edit token is long, not a placeholder and not trivially
/// guessable.
fn validate_edit_token(token: &str, var_name: &str) -> Result<(), ConfigError> {
    if token.chars().count() < MIN_EDIT_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {MIN_EDIT_TOKEN_LENGTH} characters"),
        ));
    }

    let lower = token.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(token);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
            ),
        ));
    }

    Ok(())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<SiteConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SiteConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_run_offline() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.backend, BackendKind::Supabase);
        assert!(config.supabase.is_none());
        assert_eq!(config.gate.mode, UnlockMode::Local);
        assert_eq!(config.gate.reference_date.to_iso(), "2024-03-21");
        assert_eq!(config.gate.unlock_ttl, TimeDelta::days(7));
        assert_eq!(config.gate.policy.max_attempts, 5);
        assert_eq!(config.gate.policy.lockout, TimeDelta::seconds(30));
        assert_eq!(config.save_debounce, Duration::from_millis(600));
        assert_eq!(config.photos.max_dimension, 1200);
        assert_eq!(config.photos.jpeg_quality, 82);
        assert!(config.edit_token.is_none());
        assert!(!config.is_secure());
    }

    #[test]
    fn test_supabase_section_all_or_nothing() {
        let partial = load(&[("SUPABASE_URL", "https://abc.supabase.co")]).unwrap();
        assert!(partial.supabase.is_none());

        let config = load(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("HEARTGATE_SITE_ID", "site-1"),
        ])
        .unwrap();
        let supabase = config.supabase.unwrap();
        assert_eq!(supabase.bucket, DEFAULT_BUCKET);
        assert_eq!(supabase.site_id.as_str(), "site-1");
        assert!(supabase.signed_url_ttl.is_none());
    }

    #[test]
    fn test_remote_mode_needs_backend() {
        let err = load(&[("HEARTGATE_UNLOCK_MODE", "remote")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "HEARTGATE_UNLOCK_MODE"));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        assert!(load(&[("HEARTGATE_PORT", "ninety")]).is_err());
        assert!(load(&[("HEARTGATE_BACKEND", "sqlite")]).is_err());
        assert!(load(&[("HEARTGATE_REFERENCE_DATE", "21-03-2024")]).is_err());
        assert!(load(&[("HEARTGATE_PHOTO_QUALITY", "0")]).is_err());
        assert!(load(&[("HEARTGATE_ANNIVERSARY", "14/02")]).is_err());
        assert!(load(&[("HEARTGATE_MAX_ATTEMPTS", "0")]).is_err());
    }

    #[test]
    fn test_gate_durations_are_bounded() {
        for (key, value) in [
            ("HEARTGATE_UNLOCK_TTL_HOURS", "10000000000"),
            ("HEARTGATE_LOCKOUT_SECS", "9000000000000"),
        ] {
            let err = load(&[(key, value)]).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == key));
        }

        let config = load(&[
            ("HEARTGATE_UNLOCK_TTL_HOURS", "87600"),
            ("HEARTGATE_LOCKOUT_SECS", "315360000"),
        ])
        .unwrap();
        assert_eq!(config.gate.unlock_ttl, TimeDelta::hours(87_600));
        assert_eq!(config.gate.policy.lockout, TimeDelta::seconds(315_360_000));
        assert!(load(&[("HEARTGATE_UNLOCK_TTL_HOURS", "87601")]).is_err());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }

    #[test]
    fn test_reference_date_accepts_slashed() {
        let config = load(&[("HEARTGATE_REFERENCE_DATE", "14/02/2023")]).unwrap();
        assert_eq!(config.gate.reference_date.to_iso(), "2023-02-14");
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_edit_token_validation() {
        assert!(validate_edit_token("short", "T").is_err());
        assert!(validate_edit_token("changeme-changeme-123", "T").is_err());
        assert!(validate_edit_token("aaaaaaaaaaaaaaaaaaaa", "T").is_err());
        assert!(validate_edit_token("k9$Qz!7mWp2#Lx4v", "T").is_ok());
    }

    #[test]
    fn test_edit_token_matches() {
        let config = load(&[("HEARTGATE_EDIT_TOKEN", "k9$Qz!7mWp2#Lx4v")]).unwrap();
        assert!(config.edit_token_matches("k9$Qz!7mWp2#Lx4v"));
        assert!(!config.edit_token_matches("k9$Qz!7mWp2#Lx4"));
        assert!(!load(&[]).unwrap().edit_token_matches(""));
    }

    #[test]
    fn test_supabase_config_debug_redacts_key() {
        let config = load(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_ANON_KEY", "super_secret_anon_key"),
            ("HEARTGATE_SITE_ID", "site-1"),
        ])
        .unwrap();

        let debug_output = format!("{:?}", config.supabase.unwrap());
        assert!(debug_output.contains("abc.supabase.co"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_anon_key"));
    }

    #[test]
    fn test_socket_addr() {
        let config = load(&[("HEARTGATE_HOST", "0.0.0.0"), ("HEARTGATE_PORT", "8080")]).unwrap();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 8080);
    }
}
