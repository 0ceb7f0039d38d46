//! This module provides the in-memory cache of tasks that every view reads from

use std::collections::HashSet;

use crate::task::{Task, TaskId};
use crate::event::{ChangeEvent, ChangeKind};

/// An ordered collection of tasks, without duplicate ids.
///
/// Newly added tasks go at the head. Lookups and removals of missing ids are no-ops, so that a rollback
/// that predates an id can safely run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskCache {
    tasks: Vec<Task>,
}

impl TaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize a cache from a list of tasks (e.g. the result of a fetch from the server).
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut cache = Self::new();
        cache.replace_all(tasks);
        cache
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id() == id)
    }

    /// Replace the task with the same id where it stands, or insert it at the head
    pub fn put(&mut self, task: Task) {
        match self.position(task.id()) {
            Some(index) => self.tasks[index] = task,
            None => self.tasks.insert(0, task),
        }
    }

    /// Insert a task at a given position (clamped to the length of the cache).
    /// Any task with the same id is removed first.
    pub fn insert_at(&mut self, index: usize, task: Task) {
        self.remove(task.id());
        let index = index.min(self.tasks.len());
        self.tasks.insert(index, task);
    }

    /// Remove a task, returning it along with the position it had. This is a no-op for missing ids.
    pub fn remove(&mut self, id: &TaskId) -> Option<(usize, Task)> {
        let index = self.position(id)?;
        Some((index, self.tasks.remove(index)))
    }

    /// Substitute the task `old_id` by `task`, in the same slot.
    ///
    /// If `old_id` is not in the cache anymore, `task` is put instead.
    /// If another slot already holds `task`'s id, that other slot is dropped.
    pub fn replace(&mut self, old_id: &TaskId, task: Task) {
        match self.position(old_id) {
            None => self.put(task),
            Some(index) => {
                let new_id = task.id().clone();
                self.tasks[index] = task;
                let mut i = 0;
                self.tasks.retain(|t| {
                    let keep = i == index || t.id() != &new_id;
                    i += 1;
                    keep
                });
            },
        }
    }

    /// Drop the current content, and use `tasks` instead (keeping their order).
    /// In case an id is duplicated, only its first occurrence is kept.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        let mut seen = HashSet::new();
        self.tasks = tasks.into_iter()
            .filter(|t| {
                if seen.insert(t.id().clone()) {
                    true
                } else {
                    log::warn!("Duplicated task {} in a fetched list. Ignoring it", t.id());
                    false
                }
            })
            .collect();
    }

    /// Follow a change made elsewhere, using the same rules as [`apply_change`](crate::event::apply_change)
    pub fn apply(&mut self, event: &ChangeEvent) {
        match event.kind {
            ChangeKind::Add => self.insert_at(0, event.task.clone()),
            ChangeKind::Update => {
                if let Some(index) = self.position(event.task.id()) {
                    self.tasks[index] = event.task.clone();
                }
            },
            ChangeKind::Delete => { self.remove(event.task.id()); },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: TaskId, title: &str) -> Task {
        Task::new_with_parameters(id, "u-1".into(), title.into(), None, false, None, Utc::now(), Utc::now())
    }

    fn ids(cache: &TaskCache) -> Vec<&str> {
        cache.list().iter().map(|t| t.id().as_str()).collect()
    }

    #[test]
    fn put_get_remove() {
        let mut cache = TaskCache::new();
        cache.put(task("t-1".into(), "one"));
        cache.put(task("t-2".into(), "two"));
        assert_eq!(ids(&cache), vec!["t-2", "t-1"]);

        cache.put(task("t-1".into(), "one, renamed"));
        assert_eq!(ids(&cache), vec!["t-2", "t-1"]);
        assert_eq!(cache.get(&"t-1".into()).map(|t| t.title()), Some("one, renamed"));

        let (index, removed) = cache.remove(&"t-2".into()).unwrap();
        assert_eq!(index, 0);
        assert_eq!(removed.title(), "two");
        assert!(cache.remove(&"t-2".into()).is_none());
        assert!(cache.get(&"t-2".into()).is_none());
    }

    #[test]
    fn replace_keeps_the_slot() {
        let placeholder = TaskId::placeholder("temp-");
        let mut cache = TaskCache::from_tasks(vec![
            task("t-1".into(), "one"),
            task(placeholder.clone(), "new"),
            task("t-2".into(), "two"),
        ]);

        cache.replace(&placeholder, task("t-3".into(), "new"));
        assert_eq!(ids(&cache), vec!["t-1", "t-3", "t-2"]);

        // The confirmed id was already there: no duplicate is created
        let other = TaskId::placeholder("temp-");
        cache.put(task(other.clone(), "again"));
        cache.replace(&other, task("t-2".into(), "two, confirmed"));
        assert_eq!(ids(&cache), vec!["t-2", "t-1", "t-3"]);
        assert_eq!(cache.get(&"t-2".into()).map(|t| t.title()), Some("two, confirmed"));
    }

    #[test]
    fn insert_at_is_clamped() {
        let mut cache = TaskCache::from_tasks(vec![task("t-1".into(), "one")]);
        cache.insert_at(12, task("t-2".into(), "two"));
        assert_eq!(ids(&cache), vec!["t-1", "t-2"]);
        cache.insert_at(0, task("t-2".into(), "two"));
        assert_eq!(ids(&cache), vec!["t-2", "t-1"]);
    }

    #[test]
    fn duplicates_are_dropped_on_load() {
        let cache = TaskCache::from_tasks(vec![
            task("t-1".into(), "first"),
            task("t-1".into(), "second"),
        ]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.list()[0].title(), "first");
    }
}
