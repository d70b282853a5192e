//! HTTP client for saving the previewed resume, plus the save-button state.
//!
//! No retries: a failed save is reported once and the user decides to retry.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::ResumeRecord;

pub const SAVE_FAILED_FALLBACK: &str = "Failed to save resume";
pub const SAVE_SUCCEEDED_NOTICE: &str = "Resume saved successfully!";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },
}

impl ClientError {
    /// The server's error message, or the generic fallback for transport errors.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Server { message, .. } => message.clone(),
            ClientError::Http(_) => SAVE_FAILED_FALLBACK.to_string(),
        }
    }
}

#[derive(Serialize)]
struct SaveBody<'a> {
    content: &'a str,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct ResumeClient {
    client: Client,
    base_url: String,
    auth_header: Option<(String, String)>,
}

impl ResumeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_header: None,
        }
    }

    /// Sends `name: value` with every request, e.g. the identity header.
    pub fn with_auth_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth_header = Some((name.into(), value.into()));
        self
    }

    /// Saves `markdown` as the caller's resume, replacing any previous one.
    pub async fn save(&self, markdown: &str) -> Result<ResumeRecord, ClientError> {
        let mut request = self
            .client
            .post(format!("{}/api/v1/resume", self.base_url))
            .json(&SaveBody { content: markdown });
        if let Some((name, value)) = &self.auth_header {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| SAVE_FAILED_FALLBACK.to_string());
            warn!("Resume save failed with {status}");
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let saved: ResumeRecord = response.json().await?;
        debug!("Resume {} saved", saved.id);
        Ok(saved)
    }

    /// Runs a save through `tracker`. Does nothing while a save is already in flight.
    pub async fn save_tracked(&self, tracker: &mut SaveTracker, markdown: &str) {
        if !tracker.begin() {
            return;
        }
        let result = self.save(markdown).await;
        tracker.finish(result);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveState {
    Idle,
    InFlight,
    Succeeded(ResumeRecord),
    Failed(String),
}

/// State behind the save button: disabled while in flight, one notice per outcome.
#[derive(Debug, Clone)]
pub struct SaveTracker {
    state: SaveState,
}

impl Default for SaveTracker {
    fn default() -> Self {
        Self {
            state: SaveState::Idle,
        }
    }
}

impl SaveTracker {
    pub fn state(&self) -> &SaveState {
        &self.state
    }

    pub fn is_saving(&self) -> bool {
        self.state == SaveState::InFlight
    }

    /// Moves to `InFlight`. Returns false if a save is already running.
    pub fn begin(&mut self) -> bool {
        if self.is_saving() {
            return false;
        }
        self.state = SaveState::InFlight;
        true
    }

    pub fn finish(&mut self, result: Result<ResumeRecord, ClientError>) {
        self.state = match result {
            Ok(saved) => SaveState::Succeeded(saved),
            Err(e) => SaveState::Failed(e.user_message()),
        };
    }

    /// Text to show the user for the last completed save.
    pub fn notice(&self) -> Option<&str> {
        match &self.state {
            SaveState::Succeeded(_) => Some(SAVE_SUCCEEDED_NOTICE),
            SaveState::Failed(message) => Some(message),
            SaveState::Idle | SaveState::InFlight => None,
        }
    }
}
