use crate::activity::Activity;
use crate::errors::Result;
use crate::shared::constants::RESTORE_OPERATION;
use crate::utils::format_activity_time;
use serde::Serialize;
use std::io::Write;

/// One row of the backup listing
#[derive(Debug, Clone, Serialize)]
pub struct BackupSummary {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub state: String,
    pub result: Option<String>,
    pub restorable: bool,
}

impl BackupSummary {
    pub fn from_activity(activity: &Activity) -> Self {
        Self {
            id: activity.id.clone(),
            name: activity.backup_name().unwrap_or("-").to_string(),
            created_at: activity.created_at.to_rfc3339(),
            state: activity.state.to_string(),
            result: activity.result.clone(),
            restorable: activity.is_operation_available(RESTORE_OPERATION),
        }
    }
}

/// Display formatter for backup listings
pub struct DisplayFormatter;

impl DisplayFormatter {
    /// Write a table of backups, most recent first
    pub fn write_backup_table<W: Write>(
        out: &mut W,
        environment: &str,
        backups: &[Activity],
    ) -> Result<()> {
        writeln!(out)?;
        writeln!(out, "Backups for environment {}:", environment)?;

        if backups.is_empty() {
            writeln!(out, "  None")?;
            return Ok(());
        }

        writeln!(
            out,
            "  {:<32} {:<16} {:<12} {}",
            "NAME", "CREATED", "STATE", "RESTORABLE"
        )?;
        for backup in backups {
            Self::write_backup_row(out, backup)?;
        }
        writeln!(out)?;
        writeln!(out, "{} backups", backups.len())?;
        Ok(())
    }

    fn write_backup_row<W: Write>(out: &mut W, backup: &Activity) -> Result<()> {
        let state = match backup.terminal_status() {
            Some(status) => status.to_string(),
            None => backup.state.to_string(),
        };
        let restorable = if backup.is_operation_available(RESTORE_OPERATION) {
            "yes"
        } else {
            "no"
        };
        writeln!(
            out,
            "  {:<32} {:<16} {:<12} {}",
            backup.backup_name().unwrap_or("-"),
            format_activity_time(&backup.created_at),
            state,
            restorable
        )?;
        Ok(())
    }

    /// Machine-readable listing
    pub fn write_backup_json<W: Write>(out: &mut W, backups: &[Activity]) -> Result<()> {
        let summaries: Vec<BackupSummary> =
            backups.iter().map(BackupSummary::from_activity).collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&summaries)?)?;
        Ok(())
    }
}
