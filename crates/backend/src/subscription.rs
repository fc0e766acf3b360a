//! Cancellable, ordered event subscriptions.
//!
//! Replaces listener callbacks: every subscriber owns a [`Subscription`] that
//! yields events in the order they were published, and stops receiving them
//! once it is dropped or explicitly unsubscribed.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Receiving end of an ordered event sequence.
///
/// Dropping the subscription closes the channel and aborts the background
/// task feeding it, if any.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    task: Option<JoinHandle<()>>,
}

impl<T> Subscription<T> {
    /// Wrap a receiver fed by someone else.
    #[must_use]
    pub const fn new(rx: mpsc::UnboundedReceiver<T>) -> Self {
        Self { rx, task: None }
    }

    /// Wrap a receiver fed by a background task owned by this subscription.
    #[must_use]
    pub const fn with_task(rx: mpsc::UnboundedReceiver<T>, task: JoinHandle<()>) -> Self {
        Self {
            rx,
            task: Some(task),
        }
    }

    /// Wait for the next event. Returns `None` once the publisher is gone.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Stop receiving events.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Inner<T> {
    latest: Option<T>,
    senders: Vec<mpsc::UnboundedSender<T>>,
}

/// Fan-out publisher for [`Subscription`]s.
///
/// In replay mode the last published value is delivered to each new
/// subscriber before anything else, which is how identity listeners learn
/// the current state on registration.
pub struct Broadcaster<T> {
    replay: bool,
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> Broadcaster<T> {
    /// A broadcaster that only delivers events published after subscribing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            replay: false,
            inner: Mutex::new(Inner {
                latest: None,
                senders: Vec::new(),
            }),
        }
    }

    /// A broadcaster that replays the latest value, starting with `initial`.
    #[must_use]
    pub const fn replaying(initial: T) -> Self {
        Self {
            replay: true,
            inner: Mutex::new(Inner {
                latest: Some(initial),
                senders: Vec::new(),
            }),
        }
    }

    /// Register a subscriber.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if self.replay
            && let Some(latest) = inner.latest.clone()
        {
            let _ = tx.send(latest);
        }
        inner.senders.push(tx);
        Subscription::new(rx)
    }

    /// Register a subscriber whose first event is `initial`.
    pub fn subscribe_with(&self, initial: T) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = tx.send(initial);
        inner.senders.push(tx);
        Subscription::new(rx)
    }

    /// Deliver `value` to every live subscriber, dropping closed ones.
    pub fn publish(&self, value: T) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .senders
            .retain(|tx| !tx.is_closed() && tx.send(value.clone()).is_ok());
        if self.replay {
            inner.latest = Some(value);
        }
    }

    /// The latest value, in replay mode.
    pub fn latest(&self) -> Option<T> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .latest
            .clone()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.senders.retain(|tx| !tx.is_closed());
        inner.senders.len()
    }
}

impl<T: Clone> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}
