//! An in-process channel that lets views observe the changes made by other views

use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::event::{ChangeEvent, ChangeKind};
use crate::task::TaskId;

type Handler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

#[derive(Default)]
struct Inner {
    subscribers: Mutex<Subscribers>,
}

/// Identifies an event being delivered by a given broadcaster
type DeliveryKey = (usize, ChangeKind, TaskId);

thread_local! {
    /// The events this thread is currently delivering, i.e. the ones a handler must not publish again.
    /// Publishes from other threads are unrelated, and are always delivered.
    static DELIVERING: RefCell<HashSet<DeliveryKey>> = RefCell::new(HashSet::new());
}

/// Marks an event as being delivered by this thread, until it is dropped (even if a handler panics)
struct Delivering(DeliveryKey);

impl Delivering {
    fn start(key: DeliveryKey) -> Option<Self> {
        let is_new = DELIVERING.with(|delivering| delivering.borrow_mut().insert(key.clone()));
        if is_new { Some(Self(key)) } else { None }
    }
}

impl Drop for Delivering {
    fn drop(&mut self) {
        DELIVERING.with(|delivering| delivering.borrow_mut().remove(&self.0));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Handlers never run while a lock is held, so a poisoned lock still holds consistent data
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}


/// A multi-subscriber event channel.
///
/// This is a cheap handle: clones share the same set of subscribers.
/// Delivery is synchronous, in subscription order. Nothing is stored: a view that subscribes late
/// must fetch the current task list by itself.
#[derive(Clone, Default)]
pub struct ChangeBroadcaster {
    inner: Arc<Inner>,
}

impl ChangeBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. It will be called for every event published until the returned [`Subscription`] is dropped
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let mut subscribers = lock(&self.inner.subscribers);
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.handlers.push((id, Arc::new(handler)));
        log::trace!("New change subscriber #{}", id);

        Subscription { id, inner: Arc::downgrade(&self.inner) }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.subscribers).handlers.len()
    }

    /// Deliver an event to every handler that is subscribed at the time this function is called.
    ///
    /// Handlers may publish, subscribe or unsubscribe. However, publishing the same kind of event for the same task
    /// from within a handler would recurse forever, so such a nested publish is dropped.
    /// Several threads may publish at the same time, including the same kind of event for the same task.
    pub fn publish(&self, event: ChangeEvent) {
        let key = (Arc::as_ptr(&self.inner) as usize, event.kind, event.task.id().clone());
        let _delivering = match Delivering::start(key) {
            Some(delivering) => delivering,
            None => {
                log::warn!("Dropping reentrant '{}' event, it is already being delivered", event);
                return;
            },
        };

        let handlers: Vec<Handler> = lock(&self.inner.subscribers).handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        log::trace!("Delivering '{}' to {} subscriber(s)", event, handlers.len());
        for handler in handlers {
            handler(&event);
        }
    }
}

impl std::fmt::Debug for ChangeBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBroadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}


/// Keeps a handler registered. Dropping it (e.g. when a view is disposed) unsubscribes the handler.
#[must_use = "dropping a Subscription immediately unsubscribes its handler"]
pub struct Subscription {
    id: u64,
    inner: Weak<Inner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // see Drop
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            lock(&inner.subscribers).handlers.retain(|(id, _)| *id != self.id);
            log::trace!("Change subscriber #{} is gone", self.id);
        }
    }
}
