//! Scripted activity handles and sources for unit tests.

use crate::activity::{Activity, ActivityHandle, ActivitySource};
use crate::errors::{PlatformCliError, Result};
use serde_json::json;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Build an activity snapshot from the fields tests care about
pub fn activity(id: &str, state: &str, result: Option<&str>, log: &str) -> Activity {
    let mut value = json!({
        "id": id,
        "type": "environment.restore",
        "state": state,
        "created_at": "2024-03-01T10:15:00Z",
        "log": log,
    });
    if let Some(result) = result {
        value["result"] = json!(result);
    }
    serde_json::from_value(value).expect("valid test activity")
}

/// Backup activity with a name and an optional `#restore` link
pub fn backup(name: &str, complete: bool, restorable: bool) -> Activity {
    let state = if complete { "complete" } else { "in_progress" };
    let mut value = json!({
        "id": format!("backup-{}", name),
        "type": "environment.backup",
        "state": state,
        "created_at": "2024-03-01T10:15:00Z",
        "payload": {"backup_name": name},
        "_links": {"self": {"href": format!("/projects/p/activities/backup-{}", name)}},
    });
    if complete {
        value["result"] = json!("success");
    }
    if restorable {
        value["_links"]["#restore"] = json!({"href": format!("/backups/{}/restore", name)});
    }
    serde_json::from_value(value).expect("valid test backup")
}

/// Handle whose refreshes walk through a fixed list of snapshots
#[derive(Debug, Clone)]
pub struct ScriptedActivity {
    pub current: Activity,
    pub upcoming: VecDeque<Activity>,
    pub refresh_calls: usize,
    pub fail_refresh: bool,
    pub operation_result: Option<Box<ScriptedActivity>>,
    pub performed: Rc<RefCell<Vec<String>>>,
}

impl ScriptedActivity {
    pub fn new(current: Activity) -> Self {
        Self {
            current,
            upcoming: VecDeque::new(),
            refresh_calls: 0,
            fail_refresh: false,
            operation_result: None,
            performed: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn then(mut self, next: Activity) -> Self {
        self.upcoming.push_back(next);
        self
    }

    pub fn failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub fn on_operation(mut self, result: ScriptedActivity) -> Self {
        self.operation_result = Some(Box::new(result));
        self
    }
}

impl ActivityHandle for ScriptedActivity {
    fn snapshot(&self) -> &Activity {
        &self.current
    }

    async fn refresh(&mut self) -> Result<()> {
        self.refresh_calls += 1;
        if self.fail_refresh {
            return Err(PlatformCliError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        if let Some(next) = self.upcoming.pop_front() {
            self.current = next;
        }
        Ok(())
    }

    async fn perform_operation(&self, operation: &str) -> Result<Self> {
        if !self.is_operation_available(operation) {
            return Err(PlatformCliError::OperationNotAvailable(operation.to_string()));
        }
        self.performed.borrow_mut().push(operation.to_string());
        self.operation_result
            .as_deref()
            .cloned()
            .ok_or_else(|| PlatformCliError::UnexpectedResponse("no activity".to_string()))
    }
}

/// Source returning a fixed list of backups and recording each query
#[derive(Debug, Default)]
pub struct ScriptedSource {
    pub activities: Vec<ScriptedActivity>,
    pub queries: RefCell<Vec<(usize, Option<String>)>>,
}

impl ScriptedSource {
    pub fn new(activities: Vec<ScriptedActivity>) -> Self {
        Self {
            activities,
            queries: RefCell::new(Vec::new()),
        }
    }
}

impl ActivitySource for ScriptedSource {
    type Handle = ScriptedActivity;

    async fn list_activities(
        &self,
        limit: usize,
        type_filter: Option<&str>,
    ) -> Result<Vec<ScriptedActivity>> {
        self.queries
            .borrow_mut()
            .push((limit, type_filter.map(str::to_string)));

        let matching = self
            .activities
            .iter()
            .filter(|a| type_filter.map_or(true, |t| a.current.activity_type == t))
            .cloned();

        Ok(if limit == 0 {
            matching.collect()
        } else {
            matching.take(limit).collect()
        })
    }
}
