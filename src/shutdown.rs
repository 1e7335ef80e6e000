//! Cooperative cancellation for the sync pipeline.
//!
//! A signal listener flips a shared flag; every blocking step either checks
//! the flag before it starts or races against it.

use crate::error::{Result, SyncError};
use std::future::Future;
use tokio::sync::watch;

/// Handle observed by the pipeline steps.
#[derive(Clone, Debug)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Owning side of a [`Shutdown`] handle.
#[derive(Debug)]
pub struct Trigger {
    tx: watch::Sender<bool>,
}

impl Trigger {
    pub fn fire(&self) {
        let _ = self.tx.send(true);
    }
}

impl Shutdown {
    pub fn new() -> (Trigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (Trigger { tx }, Shutdown { rx })
    }

    /// Installs a SIGINT/SIGTERM listener that triggers the returned handle.
    pub fn on_signal() -> Shutdown {
        let (trigger, shutdown) = Shutdown::new();
        tokio::spawn(async move {
            wait_for_signal().await;
            tracing::warn!("received shutdown signal, stopping after the current step");
            trigger.fire();
        });
        shutdown
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Fails with [`SyncError::Interrupted`] if shutdown was already requested.
    pub fn check(&self, step: &'static str) -> Result<()> {
        if self.is_triggered() {
            return Err(SyncError::Interrupted(step));
        }
        Ok(())
    }

    /// Runs `fut` unless shutdown is requested first.
    pub async fn guard<T, F>(&self, step: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(step)?;
        tokio::select! {
            biased;
            _ = self.triggered() => Err(SyncError::Interrupted(step)),
            res = fut => res,
        }
    }

    async fn triggered(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|fired| *fired).await.is_err() {
            // Trigger dropped without firing.
            std::future::pending::<()>().await;
        }
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                _ => {
                    tracing::warn!("could not register signal handlers");
                    return std::future::pending().await;
                }
            };
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
