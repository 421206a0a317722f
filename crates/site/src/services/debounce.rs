//! Debounced saves.
//!
//! Edits to the mirror call [`SaveDebouncer::schedule`]. The save runs once
//! the edits have been quiet for the configured period. A save that is
//! already running is not awaited before the next one starts, so the last
//! write wins.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

/// Handle to a background debounce loop.
///
/// Dropping every handle closes the channel; a pending save is flushed
/// immediately and the loop exits.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    tx: mpsc::UnboundedSender<()>,
}

impl SaveDebouncer {
    /// Spawn the debounce loop on the current runtime.
    ///
    /// `save` is called once per quiet period and its future is spawned, not
    /// awaited.
    pub fn spawn<F, Fut>(quiet: Duration, save: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, quiet, save));
        Self { tx }
    }

    /// Request a save after the quiet period, restarting the timer.
    pub fn schedule(&self) {
        if self.tx.send(()).is_err() {
            tracing::warn!("Save debouncer has stopped; edit will not be saved");
        }
    }
}

async fn run<F, Fut>(mut rx: mpsc::UnboundedReceiver<()>, quiet: Duration, save: F)
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    while rx.recv().await.is_some() {
        let mut deadline = Instant::now() + quiet;
        let mut coalesced = 1_usize;

        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(()) => {
                        deadline = Instant::now() + quiet;
                        coalesced += 1;
                    }
                    None => break,
                },
                () = tokio::time::sleep_until(deadline) => break,
            }
        }

        tracing::debug!(coalesced, "Running debounced save");
        tokio::spawn(save());
    }
}
