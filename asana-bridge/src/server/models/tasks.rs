use asana_api::endpoints::{
    tasks::{Tag, Task, TaskDetail, User},
    workspaces::Workspace,
};
use asana_api::FieldUpdate;
use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Minimum length of an Asana authorization code.
pub const MIN_AUTH_CODE_LENGTH: usize = 6;

// Tool inputs

fn require_id(name: &str, value: &str) -> Result<(), BridgeError> {
    if value.trim().is_empty() {
        return Err(BridgeError::InvalidInput(format!("{} is required", name)));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RegisterAuthCodeInput {
    /// Authorization code returned from Asana
    pub code: String,
}

impl RegisterAuthCodeInput {
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.code.chars().count() < MIN_AUTH_CODE_LENGTH {
            return Err(BridgeError::InvalidInput(format!(
                "code must be at least {} characters",
                MIN_AUTH_CODE_LENGTH
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksDueTodayInput {
    /// The workspace GID to list tasks from
    #[serde(alias = "workspaceId")]
    pub workspace_gid: String,
    /// Also return tasks that are already completed
    #[serde(default)]
    pub include_completed: bool,
}

impl ListTasksDueTodayInput {
    pub fn validate(&self) -> Result<(), BridgeError> {
        require_id("workspaceGid", &self.workspace_gid)
    }
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchTasksInput {
    /// The workspace GID to search in
    #[serde(alias = "workspaceId")]
    pub workspace_gid: String,
    /// Text to search for in task names and descriptions
    #[serde(default)]
    pub text: Option<String>,
    /// Filter by assignee GIDs
    #[serde(default)]
    pub assignee_any: Option<Vec<String>>,
    /// Filter by project GIDs
    #[serde(default)]
    pub projects_any: Option<Vec<String>>,
    /// Filter by section GIDs
    #[serde(default)]
    pub sections_any: Option<Vec<String>>,
    /// Filter by tag GIDs
    #[serde(default)]
    pub tags_any: Option<Vec<String>>,
    /// Filter by follower GIDs
    #[serde(default)]
    pub followers_any: Option<Vec<String>>,
    /// Filter by completion status
    #[serde(default)]
    pub completed: Option<bool>,
    /// Maximum number of results (max 100)
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SearchTasksInput {
    pub fn validate(&self) -> Result<(), BridgeError> {
        require_id("workspaceGid", &self.workspace_gid)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetTaskInput {
    /// The task GID to retrieve
    #[serde(alias = "taskId")]
    pub task_gid: String,
}

impl GetTaskInput {
    pub fn validate(&self) -> Result<(), BridgeError> {
        require_id("taskGid", &self.task_gid)
    }
}

/// Omitted fields are left alone; `null` clears the field in Asana.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    /// The task GID to update
    #[serde(alias = "taskId")]
    pub task_gid: String,
    /// User GID to assign the task to, or null to unassign
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub assignee: FieldUpdate<String>,
    /// Due date in YYYY-MM-DD format, or null to clear
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub due_on: FieldUpdate<NaiveDate>,
    /// Due date-time in ISO 8601 format, or null to clear
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub due_at: FieldUpdate<DateTime<Utc>>,
    /// Mark task as completed (true) or incomplete (false)
    #[serde(default)]
    pub completed: Option<bool>,
}

impl UpdateTaskInput {
    pub fn validate(&self) -> Result<(), BridgeError> {
        require_id("taskGid", &self.task_gid)
    }

    /// Human readable list of what this update changes.
    pub fn describe_changes(&self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        match &self.assignee {
            FieldUpdate::Unset => {}
            FieldUpdate::Clear => changes.push("assignee removed"),
            FieldUpdate::Value(_) => changes.push("assignee updated"),
        }
        if !self.due_on.is_unset() || !self.due_at.is_unset() {
            changes.push("due date updated");
        }
        match self.completed {
            Some(true) => changes.push("marked complete"),
            Some(false) => changes.push("marked incomplete"),
            None => {}
        }
        changes
    }
}

// Tool results

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    pub gid: String,
    pub name: String,
}

impl From<Workspace> for WorkspaceSummary {
    fn from(workspace: Workspace) -> Self {
        Self {
            gid: workspace.gid,
            name: workspace.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignee {
    pub gid: String,
    pub name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl From<User> for TaskAssignee {
    fn from(user: User) -> Self {
        Self {
            gid: user.gid,
            name: user.name,
            email: user.email,
            photo_url: user.photo.and_then(|photo| photo.image_60x60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub gid: String,
    pub name: String,
    pub permalink_url: String,
    pub completed: bool,
    pub due_on: Option<NaiveDate>,
    pub due_at: Option<DateTime<Utc>>,
    pub assignee: Option<TaskAssignee>,
    pub project_names: Vec<String>,
}

impl From<Task> for TaskSummary {
    fn from(task: Task) -> Self {
        let project_names = task.project_names();
        Self {
            gid: task.gid,
            name: task.name,
            permalink_url: task.permalink_url,
            completed: task.completed,
            due_on: task.due_on,
            due_at: task.due_at,
            assignee: task.assignee.map(TaskAssignee::from),
            project_names,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSummary {
    pub gid: String,
    pub name: String,
}

impl From<Tag> for TagSummary {
    fn from(tag: Tag) -> Self {
        Self {
            gid: tag.gid,
            name: tag.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetailSummary {
    #[serde(flatten)]
    pub task: TaskSummary,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub tags: Vec<TagSummary>,
}

impl From<TaskDetail> for TaskDetailSummary {
    fn from(detail: TaskDetail) -> Self {
        Self {
            task: detail.task.into(),
            notes: detail.notes,
            created_at: detail.created_at,
            modified_at: detail.modified_at,
            tags: detail.tags.into_iter().map(TagSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceListResult {
    pub workspaces: Vec<WorkspaceSummary>,
}

/// Shared by `list-tasks-due-today` and `search-tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResult {
    pub workspace: WorkspaceSummary,
    pub fetched_at_iso: DateTime<Utc>,
    pub tasks: Vec<TaskSummary>,
    pub task_count: usize,
}

impl TaskListResult {
    pub fn new(workspace: WorkspaceSummary, tasks: Vec<TaskSummary>) -> Self {
        Self {
            workspace,
            fetched_at_iso: Utc::now(),
            task_count: tasks.len(),
            tasks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTaskResult {
    pub task: TaskDetailSummary,
    pub fetched_at_iso: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskResult {
    pub task: TaskDetailSummary,
    pub updated_at_iso: DateTime<Utc>,
}
