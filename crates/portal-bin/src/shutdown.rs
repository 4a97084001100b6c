// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shutdown coordination for the server process.
//!
//! A [`ShutdownCoordinator`] holds one latched flag in a `watch` channel.
//! OS signals and [`ShutdownCoordinator::initiate_shutdown`] both set it;
//! every [`ShutdownSignal`] resolves once it is set, including signals
//! created afterwards.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::watch;
use tracing::{info, warn};

// =============================================================================
// ShutdownCoordinator
// =============================================================================

/// Latched shutdown flag shared by the runtime and the server.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    flag: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator that has not been triggered.
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self { flag }
    }

    /// Returns a future that resolves once shutdown is initiated.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        let mut rx = self.flag.subscribe();
        ShutdownSignal {
            inner: Box::pin(async move {
                // A closed channel means the coordinator is gone; treat it as shutdown.
                let _ = rx.wait_for(|triggered| *triggered).await;
            }),
        }
    }

    /// Sets the flag. Later calls are no-ops.
    pub fn initiate_shutdown(&self) {
        let first = self.flag.send_if_modified(|triggered| {
            let changed = !*triggered;
            *triggered = true;
            changed
        });
        if first {
            info!("Shutdown initiated");
        }
    }

    /// Returns `true` once shutdown has been initiated.
    pub fn is_shutdown_initiated(&self) -> bool {
        *self.flag.borrow()
    }

    /// Waits for SIGTERM, Ctrl+C or a manual trigger, then sets the flag.
    pub async fn wait_for_shutdown(&self) {
        tokio::select! {
            _ = os_signal() => {}
            _ = self.shutdown_signal() => {}
        }
        self.initiate_shutdown();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn os_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = ctrl_c() => {}
    }
}

#[cfg(not(unix))]
async fn os_signal() {
    ctrl_c().await
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Only a manual trigger can stop the server now.
        warn!(error = %e, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C");
}

// =============================================================================
// ShutdownSignal
// =============================================================================

/// Resolves when the coordinator's flag is set. Passed to axum's
/// graceful shutdown.
pub struct ShutdownSignal {
    inner: Pin<Box<dyn Future<Output = ()> + Send>>,
}

impl Future for ShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.inner.as_mut().poll(cx)
    }
}
