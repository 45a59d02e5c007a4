//! Subscription handles.
//!
//! A [`Subscription`] keeps a listener registered for as long as it is alive.
//! A [`Watcher`] is the channel flavour: changes are queued and pulled by the
//! consumer, which suits code running on another thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

type Detach = Box<dyn FnOnce() + Send + Sync>;

/// Registration of a listener.
///
/// Dropping the handle (or calling [`Subscription::unsubscribe`]) removes the
/// listener. Once removed it is never invoked again, even if a notification
/// cycle is in progress.
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
pub struct Subscription {
    active: Arc<AtomicBool>,
    detach: Option<Detach>,
}

impl Subscription {
    pub(crate) fn new(active: Arc<AtomicBool>, detach: Detach) -> Self {
        Self {
            active,
            detach: Some(detach),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Remove the listener now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Pull-based view of a change stream.
///
/// Messages arrive in the order they were published.
#[derive(Debug)]
pub struct Watcher<M> {
    receiver: Receiver<M>,
    _subscription: Subscription,
}

impl<M> Watcher<M> {
    pub(crate) fn new(receiver: Receiver<M>, subscription: Subscription) -> Self {
        Self {
            receiver,
            _subscription: subscription,
        }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently queued.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}
