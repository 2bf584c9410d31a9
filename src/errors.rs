use thiserror::Error;

/// Error enum for the restore helper using thiserror
#[derive(Error, Debug)]
pub enum PlatformCliError {
    // Conditions reported to the user as a plain message
    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("No backups found")]
    NoBackups,

    #[error("The backup is not complete, so it cannot be restored")]
    BackupIncomplete,

    #[error("The backup cannot be restored")]
    NotRestorable,

    #[error("Operation cancelled by user")]
    UserDeclined,

    #[error("Activity {0} did not complete successfully")]
    OperationFailed(String),

    #[error("Operation not available: {0}")]
    OperationNotAvailable(String),

    #[error("Not found: {0}")]
    ResourceNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // Remote API errors
    #[error("Authentication failed: Invalid or missing API token")]
    AuthenticationFailed,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    // Automatic conversions from standard library and crate errors
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    DialogueError(#[from] dialoguer::Error),

    #[error(transparent)]
    TemplateError(#[from] indicatif::style::TemplateError),
}

impl PlatformCliError {
    /// Classify a non-success HTTP response
    pub fn from_status(status: u16, body: &str, context: &str) -> Self {
        match status {
            401 | 403 => PlatformCliError::AuthenticationFailed,
            404 => PlatformCliError::ResourceNotFound(context.to_string()),
            _ => {
                let message = serde_json::from_str::<serde_json::Value>(body)
                    .ok()
                    .and_then(|v| v["message"].as_str().map(str::to_string))
                    .unwrap_or_else(|| body.trim().to_string());
                PlatformCliError::Api { status, message }
            }
        }
    }

    /// Conditions detected before or after a remote call that only need their message shown
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            PlatformCliError::BackupNotFound(_)
                | PlatformCliError::NoBackups
                | PlatformCliError::BackupIncomplete
                | PlatformCliError::NotRestorable
                | PlatformCliError::UserDeclined
                | PlatformCliError::OperationFailed(_)
                | PlatformCliError::OperationNotAvailable(_)
                | PlatformCliError::ResourceNotFound(_)
                | PlatformCliError::ConfigurationError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PlatformCliError>;
