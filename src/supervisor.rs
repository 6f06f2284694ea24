#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

//! Two supervision levels around a polling process: a connection-lifecycle
//! loop that re-establishes sessions forever, and a poll-tick loop that keeps
//! ticking through per-tick failures.

use crate::error::ErrorClass;
use crate::store::PortFuture;
use crate::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

/// A process that can be (re)connected and then polled.
pub trait Supervised: Send {
    fn label(&self) -> String;

    /// Opens every session the process needs.
    fn establish(&mut self) -> PortFuture<'_, ()>;

    fn tick(&mut self) -> PortFuture<'_, ()>;

    fn is_alive(&self) -> PortFuture<'_, bool>;

    fn close(&mut self) -> PortFuture<'_, ()>;
}

#[derive(Debug, Clone, Copy)]
pub struct Supervisor {
    poll_interval: Duration,
}

impl Supervisor {
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Runs `target` until `shutdown` resolves or a fatal error surfaces.
    ///
    /// # Errors
    /// Only errors classified as `ErrorClass::Fatal`.
    pub async fn run<T, F>(&self, target: &mut T, shutdown: F) -> Result<()>
    where
        T: Supervised + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let label = target.label();

        loop {
            let epoch = tokio::select! {
                () = &mut shutdown => None,
                result = self.run_epoch(target) => Some(result),
            };

            match epoch {
                None => break,
                Some(Err(e)) if e.is_fatal() => {
                    error!("{} stopped on fatal error: {}", label, e);
                    close_quietly(target).await;
                    return Err(e);
                }
                Some(Err(e)) => warn!("{} lost its session, reconnecting: {}", label, e),
                Some(Ok(())) => {}
            }

            let resume = tokio::select! {
                () = &mut shutdown => false,
                () = tokio::time::sleep(self.poll_interval) => true,
            };
            if !resume {
                break;
            }
        }

        info!("{} shutting down", label);
        close_quietly(target).await;
        Ok(())
    }

    /// One connection epoch. Returns when the session is lost or a fatal
    /// error occurs; never returns `Ok`.
    async fn run_epoch<T>(&self, target: &mut T) -> Result<()>
    where
        T: Supervised + ?Sized,
    {
        target.establish().await?;
        info!("{} connected", target.label());

        loop {
            if let Err(e) = target.tick().await {
                match e.class() {
                    ErrorClass::Fatal => return Err(e),
                    ErrorClass::Reconnect if !target.is_alive().await.unwrap_or(false) => {
                        return Err(e);
                    }
                    ErrorClass::Reconnect | ErrorClass::Retry => {
                        warn!("{} tick failed: {}", target.label(), e);
                    }
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

async fn close_quietly<T>(target: &mut T)
where
    T: Supervised + ?Sized,
{
    if let Err(e) = target.close().await {
        warn!("{} failed to close cleanly: {}", target.label(), e);
    }
}

/// Resolves on Ctrl-C. A failure to install the handler never resolves.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C"),
        Err(e) => {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
