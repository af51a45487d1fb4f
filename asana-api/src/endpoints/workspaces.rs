use super::{DataResponse, FieldsQuery, WORKSPACE_FIELDS};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{Request, RequestData};

// Common

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub gid: String,
    pub name: String,
}

// Requests

#[derive(Debug, Clone, Serialize)]
pub struct ListWorkspaces {
    query: FieldsQuery,
}

impl ListWorkspaces {
    pub fn new() -> Self {
        Self {
            query: FieldsQuery {
                opt_fields: WORKSPACE_FIELDS,
            },
        }
    }
}

impl Default for ListWorkspaces {
    fn default() -> Self {
        Self::new()
    }
}

impl Request for ListWorkspaces {
    type Data = FieldsQuery;
    type Response = WorkspacesResponse;

    fn endpoint(&self) -> Cow<'_, str> {
        "/workspaces".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Query(&self.query)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetWorkspace {
    workspace_gid: String,
    query: FieldsQuery,
}

impl GetWorkspace {
    pub fn new(workspace_gid: impl Into<String>) -> Self {
        Self {
            workspace_gid: workspace_gid.into(),
            query: FieldsQuery {
                opt_fields: WORKSPACE_FIELDS,
            },
        }
    }
}

impl Request for GetWorkspace {
    type Data = FieldsQuery;
    type Response = WorkspaceResponse;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/workspaces/{}", self.workspace_gid).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Query(&self.query)
    }
}

// Responses

pub type WorkspacesResponse = DataResponse<Vec<Workspace>>;
pub type WorkspaceResponse = DataResponse<Workspace>;
