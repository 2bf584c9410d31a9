use crate::config::Config;
use crate::errors::Result;
use crate::shared::client::{EnvironmentActivities, PlatformClient};
use crate::shared::restore_workflow::{RestoreOptions, RestoreWorkflow};
use crate::shared::ui::TerminalPrompt;
use crate::utils::validate_environment;
use std::io;
use tracing::info;

pub async fn restore_backup(
    config: Config,
    project: Option<String>,
    environment: Option<String>,
    backup_name: Option<String>,
    no_wait: bool,
    assume_yes: bool,
) -> Result<()> {
    let project = config.resolve_project(project)?;
    let environment = config.resolve_environment(environment)?;
    let client = PlatformClient::new(&config)?;

    let environment = validate_environment(&client, &project, &environment).await?;

    let source = EnvironmentActivities::new(client, project, environment.id.clone());
    let prompt = TerminalPrompt::new(assume_yes);
    let mut stderr = io::stderr();
    let options = RestoreOptions {
        environment_id: environment.id,
        backup_name: backup_name.filter(|name| !name.is_empty()),
        wait: !no_wait,
        poll_interval: config.poll_interval,
    };

    RestoreWorkflow::new(&source, &prompt, &mut stderr, options)
        .execute()
        .await?;

    if no_wait {
        info!("Restore started, not waiting for it to complete");
    }
    Ok(())
}
