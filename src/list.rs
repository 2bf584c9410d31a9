use crate::config::Config;
use crate::errors::Result;
use crate::shared::client::PlatformClient;
use crate::shared::constants::BACKUP_ACTIVITY_TYPE;
use crate::shared::display::DisplayFormatter;
use crate::utils::validate_environment;
use std::io;
use tracing::info;

pub async fn list_backups(
    config: Config,
    project: Option<String>,
    environment: Option<String>,
    limit: usize,
    json_output: bool,
) -> Result<()> {
    let project = config.resolve_project(project)?;
    let environment = config.resolve_environment(environment)?;
    let client = PlatformClient::new(&config)?;

    let environment = validate_environment(&client, &project, &environment).await?;

    if !json_output {
        info!(environment = %environment.id, limit = limit, "Listing backups");
    }

    let backups = client
        .list_environment_activities(&project, &environment.id, limit, Some(BACKUP_ACTIVITY_TYPE))
        .await?;

    if json_output {
        DisplayFormatter::write_backup_json(&mut io::stdout(), &backups)?;
    } else {
        DisplayFormatter::write_backup_table(&mut io::stdout(), &environment.id, &backups)?;
    }

    Ok(())
}
