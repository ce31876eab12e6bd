//! Dual-listener startup and the signal-driven shutdown coordinator (spec
//! §4.9): public and internal routers on distinct ports, `SIGINT`/`SIGTERM`
//! flips the shutdown flag, drains in-flight requests with a bounded
//! timeout, and returns once both listeners have stopped. Closing the
//! database pool happens one level up in [`crate::run`], after this
//! function returns, so it is always the last teardown step.

use std::net::SocketAddr;
use std::time::Instant;

use anyhow::Context as _;
use coresvc_http::{internal_router, public_router, AppState};
use tokio::net::TcpListener;

use crate::signals::default_signal_handler;

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let public_addr = format!("0.0.0.0:{}", state.config.port);
    let internal_addr = format!("{}:{}", state.config.internal_bind_address, state.config.internal_port);

    let public_listener = TcpListener::bind(&public_addr)
        .await
        .with_context(|| format!("failed to bind public listener on {public_addr}"))?;
    let internal_listener = TcpListener::bind(&internal_addr)
        .await
        .with_context(|| format!("failed to bind internal listener on {internal_addr}"))?;

    tracing::info!(address = %public_addr, "public listener bound");
    tracing::info!(address = %internal_addr, "internal listener bound");

    let public_app = public_router(state.clone());
    let internal_app = internal_router(state.clone());

    let (public_tx, public_rx) = tokio::sync::oneshot::channel::<()>();
    let (internal_tx, internal_rx) = tokio::sync::oneshot::channel::<()>();

    let public_server = axum::serve(
        public_listener,
        public_app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = public_rx.await;
    });
    let internal_server = axum::serve(internal_listener, internal_app)
        .with_graceful_shutdown(async move {
            let _ = internal_rx.await;
        });

    let public_handle = tokio::spawn(public_server);
    let internal_handle = tokio::spawn(internal_server);

    default_signal_handler().wait_for_signal().await;

    let shutdown_start = Instant::now();
    state.shutdown.begin_shutdown();
    tracing::info!(
        in_flight = state.shutdown.in_flight(),
        "shutdown initiated, rejecting new requests and draining in-flight ones"
    );

    // New connections are already refused by `ShutdownGuard`; these sends
    // tell axum to stop accepting and wait for in-flight requests.
    let _ = public_tx.send(());
    let _ = internal_tx.send(());

    let drain = async {
        let _ = public_handle.await;
        let _ = internal_handle.await;
    };

    match tokio::time::timeout(state.config.shutdown_timeout, drain).await {
        Ok(()) => {
            tracing::info!(
                shutdown_duration_seconds = shutdown_start.elapsed().as_secs_f64(),
                status = "success",
                "servers drained cleanly"
            );
        }
        Err(_) => {
            tracing::warn!(
                shutdown_duration_seconds = shutdown_start.elapsed().as_secs_f64(),
                status = "timeout",
                "shutdown timed out before all requests drained"
            );
        }
    }

    Ok(())
}
