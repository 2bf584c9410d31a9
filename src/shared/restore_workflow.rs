use crate::activity::{ActivityHandle, ActivitySource};
use crate::errors::{PlatformCliError, Result};
use crate::shared::constants::{
    BACKUP_ACTIVITY_TYPE, RESTORE_FAILURE_MESSAGE, RESTORE_OPERATION, RESTORE_SUCCESS_MESSAGE,
};
use crate::shared::polling::wait_and_log;
use crate::shared::ui::ConfirmPrompt;
use crate::utils::format_activity_time;
use std::io::Write;
use std::time::Duration;
use tracing::info;

/// What to restore and how to follow it
#[derive(Debug, Clone)]
pub struct RestoreOptions {
    pub environment_id: String,
    pub backup_name: Option<String>,
    pub wait: bool,
    pub poll_interval: Duration,
}

/// Manage the restore workflow
pub struct RestoreWorkflow<'a, S, P, W> {
    source: &'a S,
    prompt: &'a P,
    out: &'a mut W,
    options: RestoreOptions,
}

impl<'a, S, P, W> RestoreWorkflow<'a, S, P, W>
where
    S: ActivitySource,
    P: ConfirmPrompt,
    W: Write,
{
    pub fn new(source: &'a S, prompt: &'a P, out: &'a mut W, options: RestoreOptions) -> Self {
        Self {
            source,
            prompt,
            out,
            options,
        }
    }

    /// Execute the complete restore workflow
    pub async fn execute(&mut self) -> Result<()> {
        // Phase 1: Backup selection
        let backup = self.select_backup().await?;

        // Phase 2: Precondition check
        ensure_restorable(&backup)?;

        // Phase 3: Confirmation
        let name = backup.snapshot().backup_name().unwrap_or("").to_string();
        self.confirm_restore(&backup, &name)?;

        // Phase 4: Trigger
        info!(backup = %name, "Restoring backup {}", name);
        let mut restore = backup.perform_operation(RESTORE_OPERATION).await?;
        info!(activity = %restore.id(), "Restore activity started");

        if !self.options.wait {
            return Ok(());
        }

        // Phase 5: Wait for the restore activity
        let succeeded = wait_and_log(
            &mut restore,
            &mut *self.out,
            self.options.poll_interval,
            RESTORE_SUCCESS_MESSAGE,
            RESTORE_FAILURE_MESSAGE,
        )
        .await?;

        if succeeded {
            Ok(())
        } else {
            Err(PlatformCliError::OperationFailed(restore.id().to_string()))
        }
    }

    /// Find the named backup, or the most recent one when no name is given
    pub async fn select_backup(&self) -> Result<S::Handle> {
        match &self.options.backup_name {
            Some(name) => find_backup_by_name(self.source, name).await,
            None => {
                info!(
                    environment = %self.options.environment_id,
                    "Finding the most recent backup for the environment {}",
                    self.options.environment_id
                );
                self.source
                    .list_activities(1, Some(BACKUP_ACTIVITY_TYPE))
                    .await?
                    .into_iter()
                    .next()
                    .ok_or(PlatformCliError::NoBackups)
            }
        }
    }

    fn confirm_restore(&self, backup: &S::Handle, name: &str) -> Result<()> {
        let date = format_activity_time(&backup.snapshot().created_at);
        let question = format!(
            "Are you sure you want to restore the backup {} from {}?",
            name, date
        );

        if self.prompt.confirm(&question, false)? {
            Ok(())
        } else {
            Err(PlatformCliError::UserDeclined)
        }
    }
}

/// Search all backups for one whose name matches exactly
pub async fn find_backup_by_name<S: ActivitySource>(source: &S, name: &str) -> Result<S::Handle> {
    source
        .list_activities(0, Some(BACKUP_ACTIVITY_TYPE))
        .await?
        .into_iter()
        .find(|activity| activity.snapshot().backup_name() == Some(name))
        .ok_or_else(|| PlatformCliError::BackupNotFound(name.to_string()))
}

/// A backup can be restored only while the platform offers the restore operation
pub fn ensure_restorable<H: ActivityHandle>(backup: &H) -> Result<()> {
    if backup.is_operation_available(RESTORE_OPERATION) {
        Ok(())
    } else if !backup.is_complete() {
        Err(PlatformCliError::BackupIncomplete)
    } else {
        Err(PlatformCliError::NotRestorable)
    }
}
