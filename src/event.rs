//! Changes that happened to the task list

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::task::Task;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Add,
    Update,
    Delete,
}

impl Display for ChangeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            ChangeKind::Add => write!(f, "add"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Delete => write!(f, "delete"),
        }
    }
}

/// A confirmed change, as published by the [`ChangeBroadcaster`](crate::provider::broadcaster::ChangeBroadcaster).
///
/// `task` is always the authoritative version returned by the server (or, for deletions, the task that has been removed)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub task: Task,
}

impl ChangeEvent {
    pub fn add(task: Task) -> Self     { Self { kind: ChangeKind::Add, task } }
    pub fn update(task: Task) -> Self  { Self { kind: ChangeKind::Update, task } }
    pub fn delete(task: Task) -> Self  { Self { kind: ChangeKind::Delete, task } }
}

impl Display for ChangeEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{} {}", self.kind, self.task.id())
    }
}

/// The reducer every view uses to follow changes: additions are prepended, updates replace by id, deletions filter by id.
///
/// An addition of an id that is already listed replaces the listed task, so that a list never holds the same id twice.
pub fn apply_change(tasks: &mut Vec<Task>, event: &ChangeEvent) {
    let id = event.task.id();
    match event.kind {
        ChangeKind::Add => {
            tasks.retain(|t| t.id() != id);
            tasks.insert(0, event.task.clone());
        },
        ChangeKind::Update => {
            for task in tasks.iter_mut().filter(|t| t.id() == id) {
                *task = event.task.clone();
            }
        },
        ChangeKind::Delete => {
            tasks.retain(|t| t.id() != id);
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::task::TaskId;

    fn task(id: &str, title: &str) -> Task {
        Task::new_with_parameters(TaskId::from(id), "u-1".into(), title.into(), None, false, None, Utc::now(), Utc::now())
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id().as_str()).collect()
    }

    #[test]
    fn reducer() {
        let mut list = vec![task("t-1", "one"), task("t-2", "two")];

        apply_change(&mut list, &ChangeEvent::add(task("t-3", "three")));
        assert_eq!(ids(&list), vec!["t-3", "t-1", "t-2"]);

        apply_change(&mut list, &ChangeEvent::update(task("t-1", "one, renamed")));
        assert_eq!(ids(&list), vec!["t-3", "t-1", "t-2"]);
        assert_eq!(list[1].title(), "one, renamed");

        // updates of unknown ids are ignored
        apply_change(&mut list, &ChangeEvent::update(task("t-9", "nine")));
        assert_eq!(list.len(), 3);

        apply_change(&mut list, &ChangeEvent::delete(task("t-2", "two")));
        assert_eq!(ids(&list), vec!["t-3", "t-1"]);

        // adding an id twice does not duplicate it
        apply_change(&mut list, &ChangeEvent::add(task("t-1", "one again")));
        assert_eq!(ids(&list), vec!["t-1", "t-3"]);
    }
}
