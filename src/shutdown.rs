use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Cancellation token for a supervised process.
///
/// Cloneable and cheap to share; `signal()` is idempotent.
/// [`Process::wait`](crate::pty::Process::wait) races the child's exit
/// against this handle and force-terminates the child once signalled,
/// which unblocks the relay loops with end-of-stream.
#[derive(Clone)]
pub struct ShutdownHandle {
    signalled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            signalled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Request cancellation. Only the first call notifies waiters.
    pub fn signal(&self) {
        if !self.signalled.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_signalled(&self) -> bool {
        self.signalled.load(Ordering::SeqCst)
    }

    /// Suspend until `signal()` has been called.
    pub async fn wait(&self) {
        // Subscribe to the Notify before checking the flag, otherwise a
        // signal() landing between the check and the await would find no
        // subscribers and the notification would be lost.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_signalled() {
            return;
        }
        notified.await;
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}
