//! This modules combines the remote task service and the local cache into a single source of tasks
//!
//! Every change is applied to the local cache right away, then sent to the server. The cache is
//! then reconciled with the reply of the server, or rolled back in case the server failed.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::cache::TaskCache;
use crate::config::Settings;
use crate::event::ChangeEvent;
use crate::task::{check_title, NewTask, Task, TaskId, TaskUpdate};
use crate::traits::{GatewayError, TaskGateway};

pub mod broadcaster;
use broadcaster::{ChangeBroadcaster, Subscription};

/// Why a change could not be made.
///
/// In every case, the local cache has been restored to what it was before the change was attempted.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The change targets a task that is not in the cache
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// The change was refused before reaching the server (e.g. an empty title)
    #[error("{0}")]
    Precondition(String),
    /// The server did not accept the change
    #[error("remote task service failed: {0}")]
    Gateway(#[source] GatewayError),
}

/// What must be done to the cache to revert an optimistic change
#[derive(Debug)]
enum Undo {
    /// Drop a task that has been optimistically added
    Remove(TaskId),
    /// Put back the previous version of a task, if it is still in the cache
    Restore(Task),
    /// Put back a task that has been optimistically removed, at its former position
    Reinsert(usize, Task),
    /// Flip back the completion status of a task.
    ///
    /// If the entry is still the one that was toggled, `previous` is put back as is. Otherwise another change has been
    /// confirmed in the meantime, and only `completed` is restored on top of it.
    Untoggle { previous: Task, toggled: Task },
}

impl Undo {
    fn revert(self, cache: &mut TaskCache) {
        match self {
            Undo::Remove(id) => { cache.remove(&id); },
            Undo::Restore(previous) => {
                if cache.get(previous.id()).is_some() {
                    cache.put(previous);
                } else {
                    log::debug!("{} has vanished in the meantime, not restoring it", previous.id());
                }
            },
            Undo::Reinsert(index, removed) => cache.insert_at(index, removed),
            Undo::Untoggle { previous, toggled } => {
                let current = match cache.get(previous.id()) {
                    None => {
                        log::debug!("{} has vanished in the meantime, not untoggling it", previous.id());
                        return;
                    },
                    Some(current) => current.clone(),
                };
                if current == toggled {
                    cache.put(previous);
                } else if current.completed() != previous.completed() {
                    let mut untoggled = current;
                    untoggled.set_completed(previous.completed());
                    cache.put(untoggled);
                }
            },
        }
    }
}


/// The single owner of the task cache.
///
/// Views only read from it and send it their intents (add, update, remove, toggle). Several views may share a provider
/// (e.g. behind an `Arc`), and issue changes concurrently: each change has its own snapshot and its own rollback.
///
/// Changes to the same task are not serialized: if two of them are in flight at the same time, the reply that
/// lands last wins.
pub struct Provider<G: TaskGateway> {
    gateway: G,
    cache: Arc<Mutex<TaskCache>>,
    broadcaster: ChangeBroadcaster,
    settings: Settings,
}

impl<G: TaskGateway> Provider<G> {
    /// Create a provider with an empty cache. You may want to [`refresh`](Self::refresh) it right away.
    pub fn new(gateway: G) -> Self {
        Self::with_settings(gateway, Settings::default())
    }

    pub fn with_settings(gateway: G, settings: Settings) -> Self {
        Self {
            gateway,
            cache: Arc::new(Mutex::new(TaskCache::new())),
            broadcaster: ChangeBroadcaster::new(),
            settings,
        }
    }

    /// Apart from tests, there are very few reasons to access the gateway directly
    pub fn gateway(&self) -> &G { &self.gateway }
    pub fn settings(&self) -> &Settings { &self.settings }
    pub fn broadcaster(&self) -> &ChangeBroadcaster { &self.broadcaster }

    /// Be notified of every change confirmed by the server, whichever view initiated it
    pub fn subscribe_to_changes<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.broadcaster.subscribe(handler)
    }

    fn lock_cache(&self) -> MutexGuard<'_, TaskCache> {
        // The cache is never left half-modified, so a poisoned lock still holds consistent data
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A copy of the current tasks, in display order
    pub fn list(&self) -> Vec<Task> {
        self.lock_cache().list().to_vec()
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.lock_cache().get(id).cloned()
    }

    /// Replace the cache content with the tasks currently on the server.
    ///
    /// Tasks that are still waiting for the server to confirm their creation are kept at the head.
    /// In case of an error, the cache is left untouched.
    pub async fn refresh(&self) -> Result<(), ProviderError> {
        log::debug!("Fetching every task from the server");
        let fetched = self.gateway.list().await.map_err(ProviderError::Gateway)?;

        let mut cache = self.lock_cache();
        let pending: Vec<Task> = cache.list().iter()
            .filter(|t| t.is_pending())
            .cloned()
            .collect();
        let n_pending = pending.len();
        cache.replace_all(pending.into_iter().chain(fetched).collect());
        log::info!("Cache refreshed: {} task(s), {} of them pending", cache.len(), n_pending);
        Ok(())
    }

    /// Create a task with a title and an optional date
    pub async fn add(&self, title: &str, scheduled_date: Option<NaiveDate>) -> Result<Task, ProviderError> {
        self.add_task(NewTask::new(title, scheduled_date)).await
    }

    /// Create a task.
    ///
    /// A placeholder is shown at the head of the list until the server replies. It is then substituted by the task
    /// returned by the server, and an `add` event is published.
    pub async fn add_task(&self, input: NewTask) -> Result<Task, ProviderError> {
        check_title(&input.title, self.settings.max_title_len).map_err(ProviderError::Precondition)?;

        let placeholder = Task::placeholder(&input, self.best_guess_owner(), &self.settings.placeholder_prefix);
        let placeholder_id = placeholder.id().clone();
        log::debug!("Optimistically adding {} ({:?})", placeholder_id, input.title);

        self.optimistic(
            "add",
            |cache| {
                let undo = Undo::Remove(placeholder.id().clone());
                cache.insert_at(0, placeholder);
                Ok(undo)
            },
            self.gateway.create(&input),
            |cache, _undo, created: &Task| {
                cache.replace(&placeholder_id, created.clone());
                Some(ChangeEvent::add(created.clone()))
            },
        ).await
    }

    /// Change some fields of a task.
    ///
    /// In case of an error, the previous version of the task is restored in the cache, and the caller may also revert
    /// its own transient state (e.g. the content of an edit box).
    pub async fn update(&self, id: &TaskId, update: TaskUpdate) -> Result<Task, ProviderError> {
        if let Some(title) = &update.title {
            check_title(title, self.settings.max_title_len).map_err(ProviderError::Precondition)?;
        }
        let server_id = Self::server_id(id)?;
        log::debug!("Optimistically updating {}", id);

        self.optimistic(
            "update",
            |cache| {
                let previous = cache.get(id).cloned().ok_or_else(|| ProviderError::NotFound(id.clone()))?;
                let mut merged = previous.clone();
                merged.apply_update(&update);
                cache.put(merged);
                Ok(Undo::Restore(previous))
            },
            self.gateway.update(server_id, &update),
            |cache, _undo, updated: &Task| Some(Self::reconcile_update(cache, updated)),
        ).await
    }

    /// Delete a task.
    ///
    /// It disappears from the cache right away. In case of an error, it is put back where it was.
    pub async fn remove(&self, id: &TaskId) -> Result<(), ProviderError> {
        let server_id = Self::server_id(id)?;
        log::debug!("Optimistically removing {}", id);

        self.optimistic(
            "delete",
            |cache| {
                let (index, removed) = cache.remove(id).ok_or_else(|| ProviderError::NotFound(id.clone()))?;
                Ok(Undo::Reinsert(index, removed))
            },
            self.gateway.delete(server_id),
            |_cache, undo, _: &()| match undo {
                Undo::Reinsert(_, removed) => Some(ChangeEvent::delete(removed.clone())),
                _ => None,
            },
        ).await
    }

    /// Flip the completion status of a task.
    ///
    /// In case of an error, only the completion status is flipped back: changes to other fields that the server
    /// confirmed in the meantime are kept.
    pub async fn toggle_complete(&self, id: &TaskId) -> Result<Task, ProviderError> {
        let server_id = Self::server_id(id)?;
        log::debug!("Optimistically toggling {}", id);

        self.optimistic(
            "toggle",
            |cache| {
                let previous = cache.get(id).cloned().ok_or_else(|| ProviderError::NotFound(id.clone()))?;
                let mut toggled = previous.clone();
                toggled.set_completed(previous.completed() == false);
                cache.put(toggled.clone());
                Ok(Undo::Untoggle { previous, toggled })
            },
            self.gateway.toggle_complete(server_id),
            |cache, _undo, toggled: &Task| Some(Self::reconcile_update(cache, toggled)),
        ).await
    }


    /// The snapshot / apply / commit-or-revert protocol shared by every change.
    ///
    /// * `apply` changes the cache and tells how to revert it,
    /// * `remote` is the server call. It only runs once `apply` has succeeded,
    /// * `reconcile` merges the reply of the server into the cache, and returns the event to publish.
    ///
    /// The cache is never locked while waiting for the server.
    async fn optimistic<T, A, F, C>(&self, what: &str, apply: A, remote: F, reconcile: C) -> Result<T, ProviderError>
    where
        A: FnOnce(&mut TaskCache) -> Result<Undo, ProviderError>,
        F: Future<Output = Result<T, GatewayError>>,
        C: FnOnce(&mut TaskCache, &Undo, &T) -> Option<ChangeEvent>,
    {
        let undo = apply(&mut *self.lock_cache())?;

        match remote.await {
            Ok(reply) => {
                let event = reconcile(&mut *self.lock_cache(), &undo, &reply);
                if let Some(event) = event {
                    log::info!("Server confirmed {}", event);
                    self.broadcaster.publish(event);
                }
                Ok(reply)
            },
            Err(err) => {
                log::warn!("Unable to {} on the server: {}. Rolling back", what, err);
                undo.revert(&mut *self.lock_cache());
                Err(ProviderError::Gateway(err))
            },
        }
    }

    /// Replace a task by its version from the server, unless it has been removed in the meantime
    fn reconcile_update(cache: &mut TaskCache, updated: &Task) -> ChangeEvent {
        if cache.get(updated.id()).is_some() {
            cache.put(updated.clone());
        } else {
            log::debug!("{} has been removed meanwhile, not reinserting it", updated.id());
        }
        ChangeEvent::update(updated.clone())
    }

    fn server_id(id: &TaskId) -> Result<&str, ProviderError> {
        id.server_id()
            .ok_or_else(|| ProviderError::Precondition(format!("task {} has not been confirmed by the server yet", id)))
    }

    /// Placeholders need an owner before the server tells the actual one
    fn best_guess_owner(&self) -> String {
        let cached = self.lock_cache().list().iter()
            .map(|t| t.owner().to_string())
            .find(|owner| owner.is_empty() == false);
        cached
            .or_else(|| self.settings.user_id.clone())
            .unwrap_or_default()
    }
}

impl<G: TaskGateway + std::fmt::Debug> std::fmt::Debug for Provider<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("gateway", &self.gateway)
            .field("cache", &*self.lock_cache())
            .field("broadcaster", &self.broadcaster)
            .finish()
    }
}
