use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal;
use tokio::sync::Notify;

/// Coordinates graceful shutdown between OS signals and programmatic stops.
pub struct ShutdownManager {
    shutdown: AtomicBool,
    notify: Notify,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            shutdown: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Resolves on ctrl-c, SIGTERM, or `signal_shutdown`.
    ///
    /// OS signal handlers that fail to install are skipped; programmatic
    /// shutdown always works.
    pub async fn wait_for_shutdown(&self) {
        #[cfg(unix)]
        {
            let sigterm = signal::unix::signal(signal::unix::SignalKind::terminate());
            self.wait_with_sigterm(sigterm).await;
        }

        #[cfg(not(unix))]
        {
            let notified = self.notify.notified();
            if !self.is_shutting_down() {
                tokio::select! {
                    Ok(()) = signal::ctrl_c() => {},
                    _ = notified => {},
                }
            }
            self.finish();
        }
    }

    #[cfg(unix)]
    async fn wait_with_sigterm(&self, sigterm: std::io::Result<signal::unix::Signal>) {
        let notified = self.notify.notified();
        if self.is_shutting_down() {
            self.finish();
            return;
        }

        match sigterm {
            Ok(mut sigterm) => {
                tokio::select! {
                    Ok(()) = signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                    _ = notified => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                tokio::select! {
                    Ok(()) = signal::ctrl_c() => {},
                    _ = notified => {},
                }
            }
        }
        self.finish();
    }

    fn finish(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        tracing::info!("Shutting down gracefully...");
    }

    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}
