use crate::activity::ActivityHandle;
use crate::config::Config;
use crate::errors::{PlatformCliError, Result};
use crate::shared::client::{PlatformClient, RemoteActivity};
use crate::shared::constants::MULTI_WAIT_INTERVAL_SECS;
use crate::shared::polling::{wait_and_log, wait_multiple};
use indicatif::ProgressDrawTarget;
use std::io;
use std::time::Duration;
use tracing::{info, warn};

/// Wait for existing activities of a project to complete
pub async fn wait_for_activities(
    config: Config,
    project: Option<String>,
    activity_ids: Vec<String>,
) -> Result<()> {
    let project = config.resolve_project(project)?;
    let client = PlatformClient::new(&config)?;

    let mut handles = Vec::with_capacity(activity_ids.len());
    for id in &activity_ids {
        handles.push(RemoteActivity::load(client.clone(), &project, id).await?);
    }

    let mut stderr = io::stderr();

    if let [handle] = handles.as_mut_slice() {
        let id = handle.id().to_string();
        let succeeded = wait_and_log(
            handle,
            &mut stderr,
            config.poll_interval,
            &format!("Activity {} completed successfully", id),
            &format!("Activity {} failed", id),
        )
        .await?;

        return if succeeded {
            Ok(())
        } else {
            Err(PlatformCliError::OperationFailed(id))
        };
    }

    wait_multiple(
        &mut handles,
        &mut stderr,
        Duration::from_secs(MULTI_WAIT_INTERVAL_SECS),
        ProgressDrawTarget::stderr(),
    )
    .await?;

    // Outcomes are reported but do not change the exit status
    for handle in &handles {
        match handle.terminal_status() {
            Some(status) if status.is_success() => {
                info!(activity = %handle.id(), status = %status, "Activity finished")
            }
            Some(status) => warn!(activity = %handle.id(), status = %status, "Activity finished"),
            None => warn!(activity = %handle.id(), "Activity has no terminal status"),
        }
    }

    Ok(())
}
