use crate::errors::Result;
use crate::shared::client::{Environment, PlatformClient};
use chrono::{DateTime, Local, Utc};
use tracing::info;

/// Check that the selected environment exists before touching its activities
pub async fn validate_environment(
    client: &PlatformClient,
    project: &str,
    environment: &str,
) -> Result<Environment> {
    // A missing environment surfaces as ResourceNotFound from the client
    let env = client.get_environment(project, environment).await?;
    info!(project = %project, environment = %env.id, "Environment selected");
    Ok(env)
}

/// Format an activity timestamp in local time, minute precision
pub fn format_activity_time(time: &DateTime<Utc>) -> String {
    format_time_in(time, &Local)
}

fn format_time_in<Tz: chrono::TimeZone>(time: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string()
}
