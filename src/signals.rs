use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Maximum sleep increment; bounds worst-case shutdown latency to one tick.
const TICK: Duration = Duration::from_millis(500);

/// Process-wide cancellation flag. Set exactly once by a termination signal,
/// read repeatedly by the scheduler and the exposition server's shutdown
/// future. Cloning shares the underlying flag.
#[derive(Clone, Debug, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent if signaled multiple times.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early if shutdown is requested. Sleeps in
    /// increments of at most TICK, checking the flag between increments.
    pub async fn sleep_interruptible(&self, duration: Duration) {
        let deadline = tokio::time::Instant::now() + duration;
        while !self.is_requested() {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(remaining.min(TICK)).await;
        }
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&self) {
        while !self.is_requested() {
            tokio::time::sleep(TICK).await;
        }
    }
}

/// Spawn a task that listens for SIGTERM/SIGINT and sets the flag.
#[cfg(unix)]
pub fn spawn_signal_listener(flag: ShutdownFlag) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to setup SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                warn!("Received SIGTERM, initiating graceful shutdown");
            }
            _ = sigint.recv() => {
                warn!("Received SIGINT, initiating graceful shutdown");
            }
        }
        flag.request();
    })
}

/// Windows fallback - only Ctrl+C is supported
#[cfg(not(unix))]
pub fn spawn_signal_listener(flag: ShutdownFlag) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => warn!("Received Ctrl+C, initiating graceful shutdown"),
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C"),
        }
        flag.request();
    })
}
