// Shared constants used across the restore helper

/// Platform API defaults
pub const DEFAULT_API_URL: &str = "https://api.platform.sh/api";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const LOG_FILE_NAME: &str = "platform-restore.log";

/// Activity types and operations
pub const BACKUP_ACTIVITY_TYPE: &str = "environment.backup";
pub const RESTORE_OPERATION: &str = "restore";
pub const BACKUP_NAME_FIELD: &str = "backup_name";

/// Wait output
pub const WAITING_NOTICE: &str = "Waiting...";
pub const LOG_INDENT: &str = "    ";
pub const MULTI_WAIT_INTERVAL_SECS: u64 = 1;

/// Restore messages
pub const RESTORE_SUCCESS_MESSAGE: &str = "The backup was successfully restored";
pub const RESTORE_FAILURE_MESSAGE: &str = "Restoring failed";
