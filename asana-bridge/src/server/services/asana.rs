use asana_api::{Client, Request};
use chrono::Utc;

use super::CredentialRefresher;
use crate::error::BridgeError;
use crate::server::models::{
    GetTaskInput, GetTaskResult, ListTasksDueTodayInput, SearchTasksInput, TaskListResult,
    TaskSummary, UpdateTaskInput, UpdateTaskResult, WorkspaceListResult, WorkspaceSummary,
};

/// Asana operations performed on behalf of one user identity.
///
/// Every outbound call asks the refresher for a token first; no token is kept
/// between calls.
#[derive(Clone)]
pub struct AsanaService {
    refresher: CredentialRefresher,
    base_url: String,
}

impl AsanaService {
    pub fn new(refresher: CredentialRefresher, base_url: impl Into<String>) -> Self {
        Self {
            refresher,
            base_url: base_url.into(),
        }
    }

    pub fn refresher(&self) -> &CredentialRefresher {
        &self.refresher
    }

    async fn client(&self, user_id: &str) -> Result<Client, BridgeError> {
        let access_token = self.refresher.access_token(user_id).await?;
        Ok(Client::with_base_url(&self.base_url, &access_token))
    }

    async fn workspace(
        &self,
        user_id: &str,
        workspace_gid: &str,
    ) -> Result<WorkspaceSummary, BridgeError> {
        let response = self
            .client(user_id)
            .await?
            .send(Request::workspaces().get(workspace_gid))
            .await?;
        Ok(response.data.into())
    }

    pub async fn list_workspaces(&self, user_id: &str) -> Result<WorkspaceListResult, BridgeError> {
        let response = self
            .client(user_id)
            .await?
            .send(Request::workspaces().list())
            .await?;

        Ok(WorkspaceListResult {
            workspaces: response.data.into_iter().map(Into::into).collect(),
        })
    }

    /// Tasks assigned to the user and due on today's UTC date.
    pub async fn list_tasks_due_today(
        &self,
        user_id: &str,
        input: &ListTasksDueTodayInput,
    ) -> Result<TaskListResult, BridgeError> {
        let now = Utc::now();
        let mut request = Request::tasks()
            .with_workspace(&input.workspace_gid)
            .list_mine()
            .due_on(now.date_naive());
        if !input.include_completed {
            request = request.completed_since(now);
        }

        let response = self.client(user_id).await?.send(request).await?;
        let tasks: Vec<TaskSummary> = response.data.into_iter().map(Into::into).collect();
        tracing::debug!(count = tasks.len(), "Fetched tasks due today");

        let workspace = self.workspace(user_id, &input.workspace_gid).await?;
        Ok(TaskListResult::new(workspace, tasks))
    }

    pub async fn search_tasks(
        &self,
        user_id: &str,
        input: &SearchTasksInput,
    ) -> Result<TaskListResult, BridgeError> {
        let mut request = Request::tasks()
            .with_workspace(&input.workspace_gid)
            .search()
            .assignee_any(input.assignee_any.clone().unwrap_or_default())
            .projects_any(input.projects_any.clone().unwrap_or_default())
            .sections_any(input.sections_any.clone().unwrap_or_default())
            .tags_any(input.tags_any.clone().unwrap_or_default())
            .followers_any(input.followers_any.clone().unwrap_or_default());
        if let Some(text) = input.text.as_deref().filter(|text| !text.is_empty()) {
            request = request.text(text);
        }
        if let Some(completed) = input.completed {
            request = request.completed(completed);
        }
        if let Some(limit) = input.limit {
            request = request.limit(limit);
        }

        let response = self.client(user_id).await?.send(request).await?;
        let tasks: Vec<TaskSummary> = response.data.into_iter().map(Into::into).collect();
        tracing::debug!(count = tasks.len(), "Searched tasks");

        let workspace = self.workspace(user_id, &input.workspace_gid).await?;
        Ok(TaskListResult::new(workspace, tasks))
    }

    pub async fn get_task(
        &self,
        user_id: &str,
        input: &GetTaskInput,
    ) -> Result<GetTaskResult, BridgeError> {
        let response = self
            .client(user_id)
            .await?
            .send(Request::tasks().get(&input.task_gid))
            .await?;

        Ok(GetTaskResult {
            task: response.data.into(),
            fetched_at_iso: Utc::now(),
        })
    }

    /// Sends only the fields present in `input`.
    pub async fn update_task(
        &self,
        user_id: &str,
        input: &UpdateTaskInput,
    ) -> Result<UpdateTaskResult, BridgeError> {
        let mut request = Request::tasks()
            .update(&input.task_gid)
            .assignee(input.assignee.clone())
            .due_on(input.due_on.clone())
            .due_at(input.due_at.clone());
        if let Some(completed) = input.completed {
            request = request.completed(completed);
        }

        let response = self.client(user_id).await?.send(request).await?;
        tracing::info!(task_gid = %input.task_gid, "Updated task");

        Ok(UpdateTaskResult {
            task: response.data.into(),
            updated_at_iso: Utc::now(),
        })
    }
}
