use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Turns SIGINT/SIGTERM into cancellation of the running sync.
///
/// The first signal cancels the token: mappings finish the page in flight
/// and stop, so cursors written back are all confirmed. A second signal
/// exits at once without saving.
#[derive(Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_handlers(&self) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            while let Some(signal) = next_signal().await {
                if coordinator.requested.swap(true, Ordering::SeqCst) {
                    error!(signal, "Second stop signal, exiting without saving cursors");
                    std::process::exit(ExitCode::ShutdownRequested.as_i32());
                }
                warn!(signal, "Stop requested, finishing the current page");
                coordinator.token.cancel();
            }
        });
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Waits for the next stop signal. `None` when no handler could be installed.
async fn next_signal() -> Option<&'static str> {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal as unix_signal};

        let mut terminate = match unix_signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                return signal::ctrl_c().await.ok().map(|_| "SIGINT");
            }
        };
        tokio::select! {
            res = signal::ctrl_c() => res.ok().map(|_| "SIGINT"),
            _ = terminate.recv() => Some("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.ok().map(|_| "SIGINT")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// A run-level error, or at least one mapping failed.
    GeneralError = 1,
    ShutdownRequested = 130,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
