use std::error::Error;

use async_trait::async_trait;

use crate::task::{NewTask, Task, TaskUpdate};

/// An opaque failure of the remote task service (network error, unexpected status...)
pub type GatewayError = Box<dyn Error + Send + Sync>;

/// The remote source of truth for tasks.
///
/// Every call is attributed to the currently authenticated user by the implementor (e.g. by attaching a session token),
/// that is why no owner is ever passed here.
/// Ids passed to these functions are always server ids, never placeholders.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// Returns every task of the current user
    async fn list(&self) -> Result<Vec<Task>, GatewayError>;
    /// Create a task, and return it as stored by the server
    async fn create(&self, input: &NewTask) -> Result<Task, GatewayError>;
    /// Update some fields of a task, and return it as stored by the server
    async fn update(&self, id: &str, input: &TaskUpdate) -> Result<Task, GatewayError>;
    /// Delete a task. Fails if the server does not know it
    async fn delete(&self, id: &str) -> Result<(), GatewayError>;
    /// Flip the completion status of a task, and return it as stored by the server
    async fn toggle_complete(&self, id: &str) -> Result<Task, GatewayError>;
}
