use crate::errors::Result;
use crate::shared::constants::BACKUP_NAME_FIELD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lifecycle state reported by the platform for an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    Pending,
    InProgress,
    Complete,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ActivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActivityState::Pending => "pending",
            ActivityState::InProgress => "in progress",
            ActivityState::Complete => "complete",
            ActivityState::Cancelled => "cancelled",
            ActivityState::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Final outcome of a completed activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalStatus {
    Success,
    Failure,
    Cancelled,
    Other(String),
}

impl TerminalStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TerminalStatus::Success)
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalStatus::Success => f.write_str("success"),
            TerminalStatus::Failure => f.write_str("failure"),
            TerminalStatus::Cancelled => f.write_str("cancelled"),
            TerminalStatus::Other(result) => f.write_str(result),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

/// One snapshot of a remote activity as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub environments: Vec<String>,
    pub state: ActivityState,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub completion_percent: u8,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub log: String,
    #[serde(rename = "_links", default)]
    pub links: HashMap<String, Link>,
}

impl Activity {
    pub fn is_complete(&self) -> bool {
        matches!(
            self.state,
            ActivityState::Complete | ActivityState::Cancelled
        )
    }

    /// Operations are advertised as `#<name>` links
    pub fn is_operation_available(&self, operation: &str) -> bool {
        self.links.contains_key(&format!("#{}", operation))
    }

    pub fn operation_link(&self, operation: &str) -> Option<&str> {
        self.links
            .get(&format!("#{}", operation))
            .map(|link| link.href.as_str())
    }

    pub fn self_link(&self) -> Option<&str> {
        self.links.get("self").map(|link| link.href.as_str())
    }

    /// Terminal status, or None while the activity is still running
    pub fn terminal_status(&self) -> Option<TerminalStatus> {
        if !self.is_complete() {
            return None;
        }
        if self.state == ActivityState::Cancelled {
            return Some(TerminalStatus::Cancelled);
        }
        let status = match self.result.as_deref() {
            Some("success") => TerminalStatus::Success,
            Some("failure") => TerminalStatus::Failure,
            Some(other) => TerminalStatus::Other(other.to_string()),
            None => TerminalStatus::Other("unknown".to_string()),
        };
        Some(status)
    }

    pub fn backup_name(&self) -> Option<&str> {
        self.payload
            .get(BACKUP_NAME_FIELD)
            .and_then(|value| value.as_str())
    }
}

/// A handle on one remote asynchronous operation
#[allow(async_fn_in_trait)]
pub trait ActivityHandle {
    /// Latest snapshot fetched for this activity
    fn snapshot(&self) -> &Activity;

    /// Re-fetch the snapshot from the remote source
    async fn refresh(&mut self) -> Result<()>;

    /// Start `operation` on this activity and return the activity it created.
    /// Fails with `OperationNotAvailable` if the snapshot does not offer it.
    async fn perform_operation(&self, operation: &str) -> Result<Self>
    where
        Self: Sized;

    fn id(&self) -> &str {
        &self.snapshot().id
    }

    fn is_complete(&self) -> bool {
        self.snapshot().is_complete()
    }

    fn is_operation_available(&self, operation: &str) -> bool {
        self.snapshot().is_operation_available(operation)
    }

    fn terminal_status(&self) -> Option<TerminalStatus> {
        self.snapshot().terminal_status()
    }
}

/// Lists activities of one environment, most recent first
#[allow(async_fn_in_trait)]
pub trait ActivitySource {
    type Handle: ActivityHandle;

    /// `limit == 0` means no limit
    async fn list_activities(
        &self,
        limit: usize,
        type_filter: Option<&str>,
    ) -> Result<Vec<Self::Handle>>;
}
