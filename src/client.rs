//! This module provides a client to connect to the REST task service

use std::error::Error;
use std::convert::TryFrom;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::config::Settings;
use crate::task::{NewTask, Task, TaskId, TaskUpdate};
use crate::traits::{GatewayError, TaskGateway};

/// A task, as sent by the server
#[derive(Debug, Deserialize)]
struct TaskResponse {
    id: String,
    user_id: String,
    title: String,
    description: Option<String>,
    completed: bool,
    scheduled_date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskResponse> for Task {
    type Error = GatewayError;

    fn try_from(response: TaskResponse) -> Result<Self, Self::Error> {
        if response.id.is_empty() {
            return Err("The server sent a task without id".into());
        }
        Ok(Task::new_with_parameters(
            TaskId::Confirmed(response.id), response.user_id,
            response.title, response.description, response.completed, response.scheduled_date,
            response.created_at, response.updated_at,
        ))
    }
}

/// The server may send timestamps with or without an offset. The ones without are UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_timestamp(&text).map_err(serde::de::Error::custom)
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|err| format!("Invalid timestamp {:?}: {}", text, err))
}


/// A [`TaskGateway`] that talks to the task service over HTTP.
///
/// Every request carries the session token as a bearer token. Getting this token (i.e. logging in) is not the job of this crate.
pub struct Client {
    base_url: Url,
    user_id: String,
    token: String,
    http: reqwest::Client,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>, T: ToString, U: ToString>(api_url: S, user_id: T, token: U) -> Result<Self, Box<dyn Error>> {
        let base_url = Url::parse(api_url.as_ref())?;
        if base_url.cannot_be_a_base() {
            return Err(format!("{} cannot be used as a base URL", base_url).into());
        }

        Ok(Self {
            base_url,
            user_id: user_id.to_string(),
            token: token.to_string(),
            http: reqwest::Client::new(),
        })
    }

    /// Create a client for the service and the user described in `settings`
    pub fn from_settings<U: ToString>(settings: &Settings, token: U) -> Result<Self, Box<dyn Error>> {
        let user_id = settings.user_id.as_ref()
            .ok_or("The settings do not tell which user is logged in")?;
        Self::new(&settings.api_url, user_id, token)
    }

    /// `<base_url>/api/<user_id>/tasks/<extra>...`
    fn tasks_url(&self, extra: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut()
                .map_err(|_| format!("{} cannot be used as a base URL", self.base_url))?;
            segments.pop_if_empty();
            segments.extend(&["api", self.user_id.as_str(), "tasks"]);
            segments.extend(extra);
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, GatewayError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() == false {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Unexpected HTTP status code {:?}: {}", status, body).into());
        }
        Ok(response)
    }

    async fn send_for_task(&self, request: reqwest::RequestBuilder) -> Result<Task, GatewayError> {
        let response: TaskResponse = self.send(request).await?.json().await?;
        Task::try_from(response)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("user_id", &self.user_id)
            .finish()
    }
}

#[async_trait]
impl TaskGateway for Client {
    async fn list(&self) -> Result<Vec<Task>, GatewayError> {
        let url = self.tasks_url(&[])?;
        log::debug!("GET {}", url);
        let responses: Vec<TaskResponse> = self.send(self.http.get(url)).await?.json().await?;
        responses.into_iter()
            .map(Task::try_from)
            .collect()
    }

    async fn create(&self, input: &NewTask) -> Result<Task, GatewayError> {
        let url = self.tasks_url(&[])?;
        log::debug!("POST {}", url);
        self.send_for_task(self.http.post(url).json(input)).await
    }

    async fn update(&self, id: &str, input: &TaskUpdate) -> Result<Task, GatewayError> {
        let url = self.tasks_url(&[id])?;
        log::debug!("PUT {}", url);
        self.send_for_task(self.http.put(url).json(input)).await
    }

    async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        let url = self.tasks_url(&[id])?;
        log::debug!("DELETE {}", url);
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    async fn toggle_complete(&self, id: &str) -> Result<Task, GatewayError> {
        let url = self.tasks_url(&[id, "complete"])?;
        log::debug!("PATCH {}", url);
        self.send_for_task(self.http.patch(url)).await
    }
}
