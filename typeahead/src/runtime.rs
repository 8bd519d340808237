//! Executors shared by every session.
//!
//! Runs are launched on Tokio's blocking pool and fan out on the global Rayon
//! pool. Callers without a Tokio runtime (plain threads, UI loops) get a
//! process-wide fallback runtime.

use std::sync::Once;

use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;

/// Global fallback Tokio runtime for when a session is driven outside any runtime context.
/// Shared across all sessions and never dropped.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .thread_name("typeahead-runtime")
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

static RAYON_INIT: Once = Once::new();

/// Initialize global Rayon thread pool with core reservation and lower priority
pub(crate) fn init_rayon() {
    RAYON_INIT.call_once(|| {
        let num_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        // Leave room for the caller's UI and Tokio threads.
        let rayon_threads = num_threads.saturating_sub(2).max(1);

        let built = rayon::ThreadPoolBuilder::new()
            .num_threads(rayon_threads)
            .thread_name(|i| format!("typeahead-rayon-{}", i))
            .start_handler(|_| {
                use thread_priority::*;
                let _ = set_current_thread_priority(ThreadPriority::Min);
            })
            .build_global();

        // Someone else configured the global pool first; use theirs.
        if let Err(e) = built {
            tracing::debug!(error = %e, "global rayon pool already initialised");
        }
    });
}

/// Current runtime if there is one, otherwise the global fallback
pub(crate) fn runtime_handle() -> tokio::runtime::Handle {
    tokio::runtime::Handle::try_current().unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
}

/// RAII guard that cancels a token when dropped.
/// Dropping the owning session cancels its token, which in turn cancels
/// every run derived from it.
pub(crate) struct DropGuard {
    token: CancellationToken,
}

impl DropGuard {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
