use crate::activity::{Activity, ActivityHandle, ActivitySource};
use crate::config::Config;
use crate::errors::{PlatformCliError, Result};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Environment as returned by the platform API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Response body of an operation call
#[derive(Debug, Default, Deserialize)]
struct OperationResult {
    #[serde(rename = "_embedded", default)]
    embedded: EmbeddedActivities,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddedActivities {
    #[serde(default)]
    activities: Vec<Activity>,
}

/// HTTP client for the platform API
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: Url,
    api_token: Option<String>,
}

impl PlatformClient {
    pub fn new(config: &Config) -> Result<Self> {
        // Trailing slash so relative links resolve below the API path
        let base_url = Url::parse(&format!("{}/", config.api_url)).map_err(|e| {
            PlatformCliError::ConfigurationError(format!(
                "Invalid API URL '{}': {}",
                config.api_url, e
            ))
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("platform-restore/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_token: config.api_token.clone(),
        })
    }

    /// Build an API URL from raw path segments, percent-encoding each one
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                PlatformCliError::ConfigurationError(format!(
                    "API URL cannot have paths: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Resolve an API link: absolute URLs are kept, anything else is relative to the API base
    pub fn resolve_link(&self, href: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(href) {
            return Ok(url);
        }
        self.base_url
            .join(href.trim_start_matches('/'))
            .map_err(|e| PlatformCliError::UnexpectedResponse(format!("bad link '{}': {}", href, e)))
    }

    pub fn activities_url(
        &self,
        project: &str,
        environment: &str,
        limit: usize,
        type_filter: Option<&str>,
    ) -> Result<Url> {
        let mut url = self.endpoint(&[
            "projects",
            project,
            "environments",
            environment,
            "activities",
        ])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(activity_type) = type_filter {
                query.append_pair("type", activity_type);
            }
            if limit > 0 {
                query.append_pair("count", &limit.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        context: &str,
    ) -> Result<T> {
        debug!(method = %method, url = %url, context = %context, "Sending API request");

        let mut request = self.http.request(method, url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(PlatformCliError::from_status(status.as_u16(), &body, context))
        }
    }

    pub async fn get_environment(&self, project: &str, environment: &str) -> Result<Environment> {
        let url = self.endpoint(&["projects", project, "environments", environment])?;
        self.send_json(
            Method::GET,
            url,
            None,
            &format!("environment {} in project {}", environment, project),
        )
        .await
    }

    pub async fn list_environment_activities(
        &self,
        project: &str,
        environment: &str,
        limit: usize,
        type_filter: Option<&str>,
    ) -> Result<Vec<Activity>> {
        let url = self.activities_url(project, environment, limit, type_filter)?;
        self.send_json(
            Method::GET,
            url,
            None,
            &format!("activities of environment {}", environment),
        )
        .await
    }

    pub async fn get_activity(&self, project: &str, id: &str) -> Result<Activity> {
        let url = self.endpoint(&["projects", project, "activities", id])?;
        self.send_json(Method::GET, url, None, &format!("activity {}", id))
            .await
    }

    /// Fetch the latest snapshot of an activity
    pub async fn fetch_activity(&self, activity: &Activity) -> Result<Activity> {
        let url = match (activity.self_link(), activity.project.as_deref()) {
            (Some(href), _) => self.resolve_link(href)?,
            (None, Some(project)) => {
                self.endpoint(&["projects", project, "activities", &activity.id])?
            }
            (None, None) => {
                return Err(PlatformCliError::UnexpectedResponse(format!(
                    "activity {} has no self link",
                    activity.id
                )))
            }
        };
        self.send_json(Method::GET, url, None, &format!("activity {}", activity.id))
            .await
    }

    /// Start an operation advertised by an activity and return the activity it created
    pub async fn run_operation(&self, activity: &Activity, operation: &str) -> Result<Activity> {
        let href = activity
            .operation_link(operation)
            .ok_or_else(|| PlatformCliError::OperationNotAvailable(operation.to_string()))?;
        let url = self.resolve_link(href)?;

        let result: OperationResult = self
            .send_json(
                Method::POST,
                url,
                Some(serde_json::json!({})),
                &format!("{} of activity {}", operation, activity.id),
            )
            .await?;

        result
            .embedded
            .activities
            .into_iter()
            .next()
            .ok_or_else(|| {
                PlatformCliError::UnexpectedResponse(format!(
                    "{} did not start an activity",
                    operation
                ))
            })
    }
}

/// Activity handle backed by the platform API
#[derive(Debug, Clone)]
pub struct RemoteActivity {
    client: PlatformClient,
    data: Activity,
}

impl RemoteActivity {
    pub fn new(client: PlatformClient, data: Activity) -> Self {
        Self { client, data }
    }

    /// Fetch an existing activity by id
    pub async fn load(client: PlatformClient, project: &str, id: &str) -> Result<Self> {
        let data = client.get_activity(project, id).await?;
        Ok(Self::new(client, data))
    }
}

impl ActivityHandle for RemoteActivity {
    fn snapshot(&self) -> &Activity {
        &self.data
    }

    async fn refresh(&mut self) -> Result<()> {
        let latest = self.client.fetch_activity(&self.data).await?;
        if let Some(accepted) = accept_snapshot(&self.data, latest) {
            self.data = accepted;
        }
        Ok(())
    }

    async fn perform_operation(&self, operation: &str) -> Result<Self> {
        if !self.data.is_operation_available(operation) {
            return Err(PlatformCliError::OperationNotAvailable(
                operation.to_string(),
            ));
        }
        let started = self.client.run_operation(&self.data, operation).await?;
        debug!(activity = %started.id, operation = %operation, "Operation started");
        Ok(Self::new(self.client.clone(), started))
    }
}

/// Completion never reverts: a snapshot that un-completes the current one is dropped
fn accept_snapshot(current: &Activity, latest: Activity) -> Option<Activity> {
    if current.is_complete() && !latest.is_complete() {
        warn!(
            activity = %current.id,
            state = %latest.state,
            "Ignoring snapshot that reverts a completed activity"
        );
        return None;
    }
    Some(latest)
}

/// Activities of one environment
pub struct EnvironmentActivities {
    client: PlatformClient,
    project: String,
    environment: String,
}

impl EnvironmentActivities {
    pub fn new(client: PlatformClient, project: String, environment: String) -> Self {
        Self {
            client,
            project,
            environment,
        }
    }
}

impl ActivitySource for EnvironmentActivities {
    type Handle = RemoteActivity;

    async fn list_activities(
        &self,
        limit: usize,
        type_filter: Option<&str>,
    ) -> Result<Vec<RemoteActivity>> {
        let activities = self
            .client
            .list_environment_activities(&self.project, &self.environment, limit, type_filter)
            .await?;

        Ok(activities
            .into_iter()
            .map(|data| RemoteActivity::new(self.client.clone(), data))
            .collect())
    }
}
