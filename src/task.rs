//! To-do tasks, as known by the remote task service

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};

/// Longest title (in characters) the task service accepts
pub const MAX_TITLE_LEN: usize = 500;

/// The identity of a task.
///
/// A task that has been created locally but not confirmed by the server yet only has a placeholder id.
/// This enum makes it impossible to send such a placeholder to the server by mistake.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskId {
    /// An id assigned by the server
    Confirmed(String),
    /// A temporary id generated by this crate, valid until the server replies
    Pending(String),
}

impl TaskId {
    /// Generate a fresh placeholder id, such as `temp-1718000000000-9f3c2a1b`
    pub fn placeholder(prefix: &str) -> Self {
        let random = Uuid::new_v4().to_simple().to_string();
        TaskId::Pending(format!("{}{}-{}", prefix, Utc::now().timestamp_millis(), &random[..8]))
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskId::Confirmed(id) => id,
            TaskId::Pending(id) => id,
        }
    }

    pub fn is_pending(&self) -> bool {
        match self {
            TaskId::Pending(_) => true,
            _ => false,
        }
    }

    /// Returns the server id, or `None` for a placeholder
    pub fn server_id(&self) -> Option<&str> {
        match self {
            TaskId::Confirmed(id) => Some(id),
            TaskId::Pending(_) => None,
        }
    }
}

impl From<&str> for TaskId {
    /// Ids coming from outside this crate are always server ids
    fn from(id: &str) -> Self {
        TaskId::Confirmed(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        TaskId::Confirmed(id)
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.as_str())
    }
}


/// A to-do task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    /// Opaque id of the user that owns this task
    owner: String,
    title: String,
    description: Option<String>,
    completed: bool,
    /// The day this task is planned for. This has no time component on purpose
    scheduled_date: Option<NaiveDate>,

    /// Server-assigned. For placeholders, this is a local estimate that is discarded once the server replies
    created_at: DateTime<Utc>,
    /// Server-assigned. For placeholders, this is a local estimate that is discarded once the server replies
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a task that has not been confirmed by the server yet.
    /// This picks a new placeholder id.
    pub fn placeholder(input: &NewTask, owner: String, id_prefix: &str) -> Self {
        let now = Utc::now();
        Self::new_with_parameters(
            TaskId::placeholder(id_prefix), owner,
            input.title.clone(), input.description.clone(), false, input.scheduled_date,
            now, now,
        )
    }

    /// Create a new Task instance, that may be known by the server already
    pub fn new_with_parameters(id: TaskId, owner: String,
                               title: String, description: Option<String>,
                               completed: bool, scheduled_date: Option<NaiveDate>,
                               created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
                            ) -> Self
    {
        Self {
            id,
            owner,
            title,
            description,
            completed,
            scheduled_date,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &TaskId     { &self.id          }
    pub fn owner(&self) -> &str     { &self.owner       }
    pub fn title(&self) -> &str     { &self.title       }
    pub fn completed(&self) -> bool { self.completed    }
    pub fn description(&self) -> Option<&str>         { self.description.as_deref() }
    pub fn scheduled_date(&self) -> Option<NaiveDate> { self.scheduled_date }
    pub fn created_at(&self) -> &DateTime<Utc>        { &self.created_at }
    pub fn updated_at(&self) -> &DateTime<Utc>        { &self.updated_at }

    pub fn is_pending(&self) -> bool {
        self.id.is_pending()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Merge the fields set in `update` into this task.
    /// This refreshes its `updated_at` field
    pub fn apply_update(&mut self, update: &TaskUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(date) = update.scheduled_date {
            self.scheduled_date = Some(date);
        }
        self.touch();
    }

    /// Set the completion status.
    /// This refreshes its `updated_at` field
    pub fn set_completed(&mut self, completed: bool) {
        self.touch();
        self.completed = completed;
    }
}


/// What is needed to create a task
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new<S: ToString>(title: S, scheduled_date: Option<NaiveDate>) -> Self {
        Self { title: title.to_string(), description: None, scheduled_date }
    }

    pub fn with_description<S: ToString>(mut self, description: S) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// A partial update of a task.
///
/// Fields that are `None` are left untouched (there is no way to clear a field that has been set).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
}

impl TaskUpdate {
    pub fn title<S: ToString>(title: S) -> Self {
        Self { title: Some(title.to_string()), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.scheduled_date.is_none()
    }
}


/// Checks a title is acceptable for the task service: not blank, and at most `max_len` characters
pub fn check_title(title: &str, max_len: usize) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("task title cannot be empty".to_string());
    }
    let len = title.chars().count();
    if len > max_len {
        return Err(format!("task title too long ({} characters, max {})", len, max_len));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_ids_are_pending_and_unique() {
        let a = TaskId::placeholder("temp-");
        let b = TaskId::placeholder("temp-");
        assert!(a.is_pending());
        assert!(a.as_str().starts_with("temp-"));
        assert_eq!(a.server_id(), None);
        assert_ne!(a, b);

        let confirmed = TaskId::from("t-1");
        assert_eq!(confirmed.server_id(), Some("t-1"));
        assert_ne!(TaskId::Pending("t-1".into()), confirmed);
    }

    #[test]
    fn partial_update_keeps_unset_fields() {
        let input = NewTask::new("Buy milk", NaiveDate::from_ymd_opt(2024, 5, 1))
            .with_description("2 litres");
        let mut task = Task::placeholder(&input, "u-1".to_string(), "temp-");
        let before = *task.updated_at();

        task.apply_update(&TaskUpdate::title("Buy oat milk"));
        assert_eq!(task.title(), "Buy oat milk");
        assert_eq!(task.description(), Some("2 litres"));
        assert_eq!(task.scheduled_date(), NaiveDate::from_ymd_opt(2024, 5, 1));
        assert!(task.updated_at() >= &before);
    }

    #[test]
    fn titles_are_checked() {
        assert!(check_title("Buy milk", MAX_TITLE_LEN).is_ok());
        assert!(check_title("", MAX_TITLE_LEN).is_err());
        assert!(check_title("   ", MAX_TITLE_LEN).is_err());
        assert!(check_title(&"a".repeat(500), MAX_TITLE_LEN).is_ok());
        assert!(check_title(&"a".repeat(501), MAX_TITLE_LEN).is_err());
    }
}
