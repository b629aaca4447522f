use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use tokio::spawn as TokioSpawn;

/// Event name frameworks subscribe to for "now listening".
pub const LISTENING_EVENT: &str = "listening";

/// A framework server object that can emit its "listening" notification.
pub trait ListeningNotifier: Send + Sync + 'static {
    fn notify_listening(&self);
}

/// Emits a synthetic "listening" notification for a server that never bound.
///
/// The framework reports every event subscription to
/// [`observe_subscription`](Self::observe_subscription). The first
/// subscription to [`LISTENING_EVENT`] schedules exactly one
/// `notify_listening()` on the next task turn; the shim is detached from then on.
pub struct ArtificialReadiness<N: ListeningNotifier> {
    notifier: Arc<N>,
    armed: AtomicBool,
}

impl<N: ListeningNotifier> ArtificialReadiness<N> {
    pub fn new(notifier: Arc<N>) -> Self {
        Self {
            notifier,
            armed: AtomicBool::new(true),
        }
    }

    pub fn is_detached(&self) -> bool {
        !self.armed.load(Ordering::SeqCst)
    }

    /// Returns true when this subscription triggered the notification.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn observe_subscription(&self, event: &str) -> bool {
        if event != LISTENING_EVENT || !self.armed.swap(false, Ordering::SeqCst) {
            return false;
        }

        debug!("First '{LISTENING_EVENT}' subscription seen, scheduling notification");
        let notifier = Arc::clone(&self.notifier);
        TokioSpawn(async move { notifier.notify_listening() });
        true
    }
}
