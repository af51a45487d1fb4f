use super::{
    comma_separated, DataResponse, FieldUpdate, FieldsQuery, TASK_DETAIL_FIELDS, TASK_FIELDS,
};
use crate::macros::setter;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{Method, Request, RequestData};

/// Largest page Asana's search endpoint will return.
pub const MAX_SEARCH_LIMIT: u32 = 100;

// Common

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub gid: String,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub permalink_url: String,
    #[serde(default)]
    pub due_on: Option<NaiveDate>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

impl Task {
    /// Names of the projects this task belongs to, skipping memberships without one.
    pub fn project_names(&self) -> Vec<String> {
        self.memberships
            .iter()
            .filter_map(|membership| membership.project.as_ref())
            .filter_map(|project| project.name.clone())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub gid: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo: Option<Photo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub image_60x60: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub gid: String,
    pub name: String,
}

fn iso_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// Requests

/// `GET /tasks` scoped to the authenticated user within one workspace.
#[derive(Debug, Clone, Serialize)]
pub struct ListTasks {
    assignee: String,
    workspace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_on: Option<NaiveDate>,
    opt_fields: &'static str,
}

impl ListTasks {
    pub fn new(workspace_gid: impl Into<String>) -> Self {
        Self {
            assignee: "me".to_string(),
            workspace: workspace_gid.into(),
            completed_since: None,
            due_on: None,
            opt_fields: TASK_FIELDS,
        }
    }

    setter!(opt due_on: NaiveDate);

    /// Only return tasks that are incomplete or were completed after `since`.
    pub fn completed_since(mut self, since: DateTime<Utc>) -> Self {
        self.completed_since = Some(iso_timestamp(since));
        self
    }
}

impl Request for ListTasks {
    type Data = Self;
    type Response = TasksResponse;

    fn endpoint(&self) -> Cow<'_, str> {
        "/tasks".into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

/// `GET /workspaces/{gid}/tasks/search`. Filters are ANDed together; the
/// `*.any` filters match any of their gids.
#[derive(Debug, Clone, Serialize)]
pub struct SearchTasks {
    #[serde(skip)]
    workspace_gid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(
        rename = "assignee.any",
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "comma_separated"
    )]
    assignee_any: Vec<String>,
    #[serde(
        rename = "projects.any",
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "comma_separated"
    )]
    projects_any: Vec<String>,
    #[serde(
        rename = "sections.any",
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "comma_separated"
    )]
    sections_any: Vec<String>,
    #[serde(
        rename = "tags.any",
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "comma_separated"
    )]
    tags_any: Vec<String>,
    #[serde(
        rename = "followers.any",
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "comma_separated"
    )]
    followers_any: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    opt_fields: &'static str,
}

impl SearchTasks {
    pub fn new(workspace_gid: impl Into<String>) -> Self {
        Self {
            workspace_gid: workspace_gid.into(),
            text: None,
            assignee_any: Vec::new(),
            projects_any: Vec::new(),
            sections_any: Vec::new(),
            tags_any: Vec::new(),
            followers_any: Vec::new(),
            completed: None,
            limit: None,
            opt_fields: TASK_FIELDS,
        }
    }

    setter!(opt text: String);
    setter!(assignee_any: Vec<String>);
    setter!(projects_any: Vec<String>);
    setter!(sections_any: Vec<String>);
    setter!(tags_any: Vec<String>);
    setter!(followers_any: Vec<String>);
    setter!(opt completed: bool);

    /// Page size, clamped to [`MAX_SEARCH_LIMIT`].
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit.min(MAX_SEARCH_LIMIT));
        self
    }
}

impl Request for SearchTasks {
    type Data = Self;
    type Response = TasksResponse;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/workspaces/{}/tasks/search", self.workspace_gid).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetTask {
    task_gid: String,
    query: FieldsQuery,
}

impl GetTask {
    pub fn new(task_gid: impl Into<String>) -> Self {
        Self {
            task_gid: task_gid.into(),
            query: FieldsQuery {
                opt_fields: TASK_DETAIL_FIELDS,
            },
        }
    }
}

impl Request for GetTask {
    type Data = FieldsQuery;
    type Response = TaskDetailResponse;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/tasks/{}", self.task_gid).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Query(&self.query)
    }
}

/// `PUT /tasks/{gid}` with only the fields that were set.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateTask {
    #[serde(skip)]
    task_gid: String,
    data: TaskUpdate,
}

impl UpdateTask {
    pub fn new(task_gid: impl Into<String>) -> Self {
        Self {
            task_gid: task_gid.into(),
            data: TaskUpdate::default(),
        }
    }

    setter!(update data.assignee: String);
    setter!(update data.due_on: NaiveDate);
    setter!(update data.due_at: DateTime<Utc>);
    setter!(opt data.completed: bool);

    pub fn changes(&self) -> &TaskUpdate {
        &self.data
    }
}

impl Request for UpdateTask {
    type Data = Self;
    type Response = TaskDetailResponse;
    const METHOD: Method = Method::PUT;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/tasks/{}?opt_fields={}", self.task_gid, TASK_DETAIL_FIELDS).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "FieldUpdate::is_unset")]
    pub assignee: FieldUpdate<String>,
    #[serde(skip_serializing_if = "FieldUpdate::is_unset")]
    pub due_on: FieldUpdate<NaiveDate>,
    #[serde(skip_serializing_if = "FieldUpdate::is_unset")]
    pub due_at: FieldUpdate<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

// Responses

pub type TasksResponse = DataResponse<Vec<Task>>;
pub type TaskDetailResponse = DataResponse<TaskDetail>;
