// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the inbound router and event logger monitor.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
            }
        }
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C only");
            if let Err(e) = ctrl_c.await {
                warn!(error = %e, "Ctrl+C handler failed, no shutdown signal available");
                std::future::pending::<()>().await;
            }
            info!("received SIGINT (Ctrl+C), initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl+C handler failed, no shutdown signal available");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, initiating shutdown");
}
