//! Composition root: config load → pool → repositories → use cases → dual
//! HTTP servers → signal-driven shutdown. This crate is the only place
//! `coresvc-core`, `coresvc-db`, and `coresvc-http` are wired together.

pub mod compose;
pub mod server;
pub mod signals;

use anyhow::Context as _;

/// Load configuration, wire infrastructure, run both listeners until a
/// shutdown signal is handled, then close the database pool last.
pub async fn run() -> anyhow::Result<()> {
    let config = coresvc_config::Config::load().context("failed to load configuration")?;

    tracing::info!(
        env = ?config.env,
        port = config.port,
        internal_port = config.internal_port,
        jwt_enabled = config.jwt_enabled,
        "starting coresvc"
    );

    let composed = compose::compose(config).await?;
    let pool = composed.pool.clone();

    server::serve(composed.context).await?;

    tracing::info!("closing database pool");
    pool.close().await;

    Ok(())
}

#[cfg(test)]
use tokio_test as _;
