//! Support for library configuration options

use std::error::Error;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::task::MAX_TITLE_LEN;

/// Where the task service listens, when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// Prefix of the ids given to tasks that the server has not confirmed yet
pub const DEFAULT_PLACEHOLDER_PREFIX: &str = "temp-";

/// Environment variable that overrides [`Settings::api_url`]
pub const API_URL_VAR: &str = "DAYBOOK_API_URL";
/// Environment variable that overrides [`Settings::user_id`]
pub const USER_ID_VAR: &str = "DAYBOOK_USER_ID";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the task service (routes are `<api_url>/api/<user_id>/tasks...`)
    pub api_url: String,
    /// The authenticated user, if known. It is used in request paths, and as the owner of placeholder tasks
    pub user_id: Option<String>,
    pub placeholder_prefix: String,
    /// Titles longer than this (in characters) are refused before reaching the server
    pub max_title_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_id: None,
            placeholder_prefix: DEFAULT_PLACEHOLDER_PREFIX.to_string(),
            max_title_len: MAX_TITLE_LEN,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file. Missing fields get their default value.
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let settings: Self = match std::fs::File::open(path) {
            Err(err) => {
                return Err(format!("Unable to open file {:?}: {}", path, err).into());
            },
            Ok(file) => serde_json::from_reader(file)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Override the fields that are set in the environment (see [`API_URL_VAR`] and [`USER_ID_VAR`])
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_VAR) {
            log::debug!("Using API URL from {}", API_URL_VAR);
            self.api_url = url;
        }
        if let Ok(user) = std::env::var(USER_ID_VAR) {
            self.user_id = Some(user);
        }
        self
    }

    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.max_title_len == 0 {
            return Err("max_title_len must be at least 1".into());
        }
        if self.placeholder_prefix.is_empty() {
            return Err("placeholder_prefix must not be empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "api_url": "https://tasks.example.com", "user_id": "u-42" }}"#).unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.api_url, "https://tasks.example.com");
        assert_eq!(settings.user_id.as_deref(), Some("u-42"));
        assert_eq!(settings.placeholder_prefix, DEFAULT_PLACEHOLDER_PREFIX);
        assert_eq!(settings.max_title_len, MAX_TITLE_LEN);
    }

    #[test]
    fn invalid_files_are_refused() {
        assert!(Settings::from_file(Path::new("/this/file/does/not/exist.json")).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_title_len": 0 }}"#).unwrap();
        assert!(Settings::from_file(file.path()).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(Settings::from_file(file.path()).is_err());
    }
}
