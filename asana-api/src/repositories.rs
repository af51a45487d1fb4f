use crate::endpoints::{
    tasks::{GetTask, ListTasks, SearchTasks, UpdateTask},
    workspaces::{GetWorkspace, ListWorkspaces},
};

#[derive(Default)]
pub struct WorkspaceRepository;

impl WorkspaceRepository {
    pub fn new() -> Self {
        Self
    }

    pub fn list(&self) -> ListWorkspaces {
        ListWorkspaces::new()
    }

    pub fn get(&self, workspace_gid: impl Into<String>) -> GetWorkspace {
        GetWorkspace::new(workspace_gid)
    }
}

#[derive(Default)]
pub struct TaskRepository {
    workspace_gid: String,
}

impl TaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(mut self, workspace_gid: impl Into<String>) -> Self {
        self.workspace_gid = workspace_gid.into();
        self
    }

    /// Tasks assigned to the token's owner in the current workspace.
    pub fn list_mine(&self) -> ListTasks {
        ListTasks::new(self.workspace_gid.clone())
    }

    pub fn search(&self) -> SearchTasks {
        SearchTasks::new(self.workspace_gid.clone())
    }

    pub fn get(&self, task_gid: impl Into<String>) -> GetTask {
        GetTask::new(task_gid)
    }

    pub fn update(&self, task_gid: impl Into<String>) -> UpdateTask {
        UpdateTask::new(task_gid)
    }
}
