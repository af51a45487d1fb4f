pub mod endpoints;
mod error;
mod macros;
pub mod repositories;

pub use crate::error::AsanaApiError;
pub use crate::endpoints::FieldUpdate;
use repositories::*;
use tower_api_client::{Client as ApiClient, Request as ApiRequest};

pub const BASE_URL: &str = "https://app.asana.com/api/1.0";

/// Bearer-authenticated handle on the Asana REST API.
///
/// The token is fixed for the lifetime of the handle; callers that rotate tokens
/// build a new `Client` per request.
pub struct Client {
    inner: ApiClient,
}

impl Client {
    pub fn new(access_token: &str) -> Self {
        Self::with_base_url(BASE_URL, access_token)
    }

    pub fn with_base_url(base_url: &str, access_token: &str) -> Self {
        Self {
            inner: ApiClient::new(base_url.trim_end_matches('/')).bearer_auth(access_token),
        }
    }

    pub async fn send<R>(&self, request: R) -> Result<R::Response, AsanaApiError>
    where
        R: ApiRequest,
    {
        self.inner.send(request).await.map_err(From::from)
    }
}

pub struct Request;

impl Request {
    pub fn workspaces() -> WorkspaceRepository {
        WorkspaceRepository::new()
    }

    pub fn tasks() -> TaskRepository {
        TaskRepository::new()
    }
}
