//! The task list as seen by a view
//!
//! A view that renders tasks keeps its own copy of the list, and follows the changes that other views make through
//! the [`ChangeBroadcaster`]. Disposing the view (dropping its [`SyncedTaskList`]) stops the updates.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::event::apply_change;
use crate::provider::broadcaster::{ChangeBroadcaster, Subscription};
use crate::provider::Provider;
use crate::task::{Task, TaskId};
use crate::traits::TaskGateway;

pub struct SyncedTaskList {
    tasks: Arc<Mutex<Vec<Task>>>,
    _subscription: Subscription,
}

fn lock(tasks: &Mutex<Vec<Task>>) -> MutexGuard<'_, Vec<Task>> {
    tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SyncedTaskList {
    /// Start from `initial`, then follow every change published on `broadcaster`
    pub fn new(broadcaster: &ChangeBroadcaster, initial: Vec<Task>) -> Self {
        Self::with_snapshot(broadcaster, move || initial)
    }

    /// A list that starts from the current content of `provider`, and follows its changes
    pub fn follow<G: TaskGateway>(provider: &Provider<G>) -> Self {
        Self::with_snapshot(provider.broadcaster(), || provider.list())
    }

    /// Subscribes first, then takes the snapshot while holding the list.
    ///
    /// Events published meanwhile wait for the snapshot, and are applied on top of it. The reducer is idempotent, so an
    /// event that the snapshot already reflects is harmless.
    fn with_snapshot<F>(broadcaster: &ChangeBroadcaster, snapshot: F) -> Self
    where
        F: FnOnce() -> Vec<Task>,
    {
        let tasks = Arc::new(Mutex::new(Vec::new()));

        let weak: Weak<Mutex<Vec<Task>>> = Arc::downgrade(&tasks);
        let subscription = broadcaster.subscribe(move |event| {
            match weak.upgrade() {
                Some(tasks) => apply_change(&mut lock(&tasks), event),
                None => log::debug!("Ignoring {} for a disposed view", event),
            }
        });

        {
            let mut list = lock(&tasks);
            *list = snapshot();
        }

        Self { tasks, _subscription: subscription }
    }

    pub fn tasks(&self) -> Vec<Task> {
        lock(&self.tasks).clone()
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        lock(&self.tasks).iter().find(|t| t.id() == id).cloned()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        lock(&self.tasks).iter().any(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        lock(&self.tasks).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.tasks).is_empty()
    }

    /// Start over from a freshly fetched list
    pub fn reset(&self, tasks: Vec<Task>) {
        *lock(&self.tasks) = tasks;
    }
}
