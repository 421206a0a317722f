//! Site-wide commands: reset and gate checks.

use heartgate_core::{GateDate, Verdict, Verifier, VerifyError};
use heartgate_site::config::{SiteConfig, UnlockMode};
use heartgate_site::state::AppState;

use super::{CliError, connect};

/// Delete all content and restore the defaults.
#[allow(clippy::print_stdout)]
pub async fn reset(confirmed: bool) -> Result<(), CliError> {
    if !confirmed {
        return Err(CliError::Unconfirmed("reset the site"));
    }

    let state = connect().await?;
    state.store().reset_site().await?;
    tracing::warn!("Site content reset to defaults");
    println!("Site reset.");
    Ok(())
}

/// Run a typed date through the configured verifier.
#[allow(clippy::print_stdout)]
pub async fn check_date(input: &str) -> Result<(), CliError> {
    let date = GateDate::parse(input)?;
    let config = SiteConfig::from_env()?;
    let mode = config.gate.mode;
    let state = AppState::new(config)?;

    let label = match mode {
        UnlockMode::Local => "local",
        UnlockMode::Remote => "remote",
    };
    match state.verifier().verify(date).await {
        Ok(Verdict::Accepted { disclosed }) => {
            let count = disclosed.map_or(0, |photos| photos.len());
            println!(
                "{} accepted ({label}, {count} photos disclosed)",
                date.to_slashed()
            );
        }
        Ok(Verdict::Denied { message }) => {
            println!(
                "{} denied ({label}){}",
                date.to_slashed(),
                message.map(|m| format!(": {m}")).unwrap_or_default()
            );
        }
        Err(VerifyError::Unavailable(reason)) => {
            println!(
                "{} could not be checked ({label}): {reason}",
                date.to_slashed()
            );
        }
    }
    Ok(())
}
