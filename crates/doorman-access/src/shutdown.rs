//! Process-termination handling for the access flow.

use crate::session::SessionStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Turns SIGINT/SIGTERM into a cancelled token and, once the event loop has
/// stopped, cancels every outstanding session timer.
///
/// Pending sessions are not persisted: a restart forgets them and devices
/// simply time out on their own.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    store: SessionStore,
}

impl ShutdownCoordinator {
    pub fn new(store: SessionStore) -> Self {
        Self {
            token: CancellationToken::new(),
            store,
        }
    }

    /// Token observed by long-running loops.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            info!("Shutdown requested");
            self.token.cancel();
        }
    }

    /// Wait for SIGINT or SIGTERM (or an explicit trigger), then cancel.
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            _ = termination_signal() => self.trigger(),
            _ = self.token.cancelled() => {}
        }
    }

    pub fn spawn_signal_listener(&self) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.wait_for_signal().await })
    }

    /// Cancel every pending session timer. Returns how many were pending.
    pub fn clear_sessions(&self) -> usize {
        let cleared = self.store.clear_all();
        info!(cleared, "Pending sessions cleared");
        cleared
    }
}

async fn termination_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
