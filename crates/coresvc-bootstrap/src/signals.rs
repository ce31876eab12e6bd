//! Operator signal handling for graceful shutdown.
//!
//! A trait abstraction rather than a bare `tokio::select!` in [`crate::server`]
//! so tests can drive shutdown deterministically with [`NoOpSignalHandler`]
//! instead of racing a real `SIGTERM`.

use async_trait::async_trait;

#[async_trait]
pub trait SystemSignals: Send + Sync {
    /// Resolves once a shutdown signal has been received.
    async fn wait_for_signal(&self);
}

#[cfg(unix)]
pub struct UnixSignalHandler;

#[cfg(unix)]
#[async_trait]
impl SystemSignals for UnixSignalHandler {
    async fn wait_for_signal(&self) {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM, initiating graceful shutdown"),
            _ = sigint.recv() => tracing::info!("received SIGINT, initiating graceful shutdown"),
        }
    }
}

#[cfg(windows)]
pub struct WindowsSignalHandler;

#[cfg(windows)]
#[async_trait]
impl SystemSignals for WindowsSignalHandler {
    async fn wait_for_signal(&self) {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to register Ctrl+C handler");
        tracing::info!("received Ctrl+C, initiating graceful shutdown");
    }
}

/// Never resolves. Used by tests that trigger shutdown explicitly instead
/// of waiting on a real signal.
pub struct NoOpSignalHandler;

#[async_trait]
impl SystemSignals for NoOpSignalHandler {
    async fn wait_for_signal(&self) {
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
#[must_use]
pub fn default_signal_handler() -> Box<dyn SystemSignals> {
    Box::new(UnixSignalHandler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn noop_handler_never_resolves() {
        let handler = NoOpSignalHandler;
        let result = tokio::time::timeout(Duration::from_millis(20), handler.wait_for_signal()).await;
        assert!(result.is_err(), "NoOpSignalHandler must not resolve on its own");
    }

    #[cfg(unix)]
    #[test]
    fn default_handler_is_unix_on_this_platform() {
        let _handler: Box<dyn SystemSignals> = default_signal_handler();
    }
}

#[cfg(windows)]
#[must_use]
pub fn default_signal_handler() -> Box<dyn SystemSignals> {
    Box::new(WindowsSignalHandler)
}
