//! An in-memory task service, used to test providers without a network

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::mock_behaviour::{GatewayCall, MockBehaviour};
use crate::task::{NewTask, Task, TaskId, TaskUpdate};
use crate::traits::{GatewayError, TaskGateway};

#[derive(Debug, Default)]
struct ServerState {
    tasks: Vec<Task>,
    n_created: u32,
}

/// A [`TaskGateway`] that stores tasks in memory, the way the actual task service would.
///
/// Created tasks get ids `t-1`, `t-2`, etc. and are listed newest first.
/// Calls can be made to fail with a [`MockBehaviour`], and can be slowed down to test concurrent changes.
#[derive(Debug)]
pub struct MockGateway {
    owner: String,
    state: Mutex<ServerState>,
    behaviour: Arc<Mutex<MockBehaviour>>,
    latency: Option<Duration>,
    call_latencies: HashMap<GatewayCall, Duration>,
}

impl MockGateway {
    /// An empty service, for the given user
    pub fn new<S: ToString>(owner: S) -> Self {
        Self {
            owner: owner.to_string(),
            state: Mutex::new(ServerState::default()),
            behaviour: Arc::new(Mutex::new(MockBehaviour::new())),
            latency: None,
            call_latencies: HashMap::new(),
        }
    }

    /// Pre-populate the service (e.g. with the tasks of a previous session)
    pub fn with_tasks(self, tasks: Vec<Task>) -> Self {
        self.lock_state().tasks = tasks;
        self
    }

    /// Every call will wait this long before replying
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// `call` will wait this long before replying, whatever the latency of the other calls
    pub fn with_call_latency(mut self, call: GatewayCall, latency: Duration) -> Self {
        self.call_latencies.insert(call, latency);
        self
    }

    /// Use a behaviour that the test can still tweak while the gateway is in use
    pub fn with_behaviour(mut self, behaviour: Arc<Mutex<MockBehaviour>>) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn behaviour(&self) -> Arc<Mutex<MockBehaviour>> {
        Arc::clone(&self.behaviour)
    }

    /// The tasks currently stored by this service
    pub fn tasks(&self) -> Vec<Task> {
        self.lock_state().tasks.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Simulates the network round trip, then asks the mock behaviour whether this call should succeed
    async fn round_trip(&self, call: GatewayCall) -> Result<(), GatewayError> {
        if let Some(latency) = self.call_latencies.get(&call).copied().or(self.latency) {
            tokio::time::sleep(latency).await;
        }
        self.behaviour.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .check(call)
    }

    fn modify<F>(&self, id: &str, f: F) -> Result<Task, GatewayError>
    where
        F: FnOnce(&mut Task),
    {
        let mut state = self.lock_state();
        match state.tasks.iter_mut().find(|t| t.id().as_str() == id) {
            None => Err(format!("Task not found: {}", id).into()),
            Some(task) => {
                f(task);
                Ok(task.clone())
            },
        }
    }
}

#[async_trait]
impl TaskGateway for MockGateway {
    async fn list(&self) -> Result<Vec<Task>, GatewayError> {
        self.round_trip(GatewayCall::List).await?;
        Ok(self.tasks())
    }

    async fn create(&self, input: &NewTask) -> Result<Task, GatewayError> {
        self.round_trip(GatewayCall::Create).await?;

        let mut state = self.lock_state();
        state.n_created += 1;
        let now = Utc::now();
        let task = Task::new_with_parameters(
            TaskId::Confirmed(format!("t-{}", state.n_created)), self.owner.clone(),
            input.title.clone(), input.description.clone(), false, input.scheduled_date,
            now, now,
        );
        state.tasks.insert(0, task.clone());
        Ok(task)
    }

    async fn update(&self, id: &str, input: &TaskUpdate) -> Result<Task, GatewayError> {
        self.round_trip(GatewayCall::Update).await?;
        self.modify(id, |task| task.apply_update(input))
    }

    async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        self.round_trip(GatewayCall::Delete).await?;

        let mut state = self.lock_state();
        let n_before = state.tasks.len();
        state.tasks.retain(|t| t.id().as_str() != id);
        if state.tasks.len() == n_before {
            return Err(format!("Task not found: {}", id).into());
        }
        Ok(())
    }

    async fn toggle_complete(&self, id: &str) -> Result<Task, GatewayError> {
        self.round_trip(GatewayCall::ToggleComplete).await?;
        self.modify(id, |task| {
            let completed = task.completed();
            task.set_completed(completed == false);
        })
    }
}
