//! The MCP server behind `/mcp`: Asana tools plus the tasks widget resource.

use axum::http::request::Parts;
use rmcp::{
    handler::server::{router::tool::ToolRouter, tool::ToolCallContext, wrapper::Parameters},
    model::*,
    service::RequestContext,
    tool, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::BridgeError;
use crate::server::{
    handlers::AuthenticatedUser,
    models::{
        GetTaskInput, ListTasksDueTodayInput, RegisterAuthCodeInput, SearchTasksInput,
        UpdateTaskInput,
    },
    services::AsanaService,
    widget::{self, WIDGET_MIME_TYPE, WIDGET_NAME, WIDGET_URI},
};

#[derive(Clone)]
pub struct AsanaMcpServer {
    asana: AsanaService,
    widget_base_url: String,
    tool_router: ToolRouter<Self>,
}

/// Identity the auth middleware attached to the HTTP request.
fn caller(context: &RequestContext<RoleServer>) -> Result<String, McpError> {
    context
        .extensions
        .get::<Parts>()
        .and_then(|parts| parts.extensions.get::<AuthenticatedUser>())
        .map(|user| user.user_id.clone())
        .ok_or_else(|| McpError::invalid_request("Request is not authenticated", None))
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn structured<T: Serialize>(
    summary: impl Into<String>,
    value: &T,
) -> Result<CallToolResult, BridgeError> {
    let mut result = CallToolResult::success(vec![Content::text(summary.into())]);
    result.structured_content = Some(serde_json::to_value(value)?);
    Ok(result)
}

/// Failures become error results so the assistant can relay them.
fn finish(tool: &str, outcome: Result<CallToolResult, BridgeError>) -> CallToolResult {
    outcome.unwrap_or_else(|err| {
        tracing::warn!(tool, error = %err, "Tool call failed");
        CallToolResult::error(vec![Content::text(err.to_string())])
    })
}

fn with_widget_meta(tool: Tool) -> Tool {
    let Some(meta) = widget::tool_meta(&tool.name) else {
        return tool;
    };
    let Ok(mut value) = serde_json::to_value(&tool) else {
        return tool;
    };
    value["_meta"] = Value::Object(meta);
    serde_json::from_value(value).unwrap_or(tool)
}

#[tool_router]
impl AsanaMcpServer {
    pub fn new(asana: AsanaService, widget_base_url: impl Into<String>) -> Self {
        Self {
            asana,
            widget_base_url: widget_base_url.into(),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "register-auth-code",
        description = "Exchanges an Asana OAuth authorization code for access tokens and stores them for the authenticated user.",
        annotations(title = "Store Asana OAuth code")
    )]
    async fn register_auth_code(
        &self,
        Parameters(input): Parameters<RegisterAuthCodeInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let user_id = caller(&context)?;
        Ok(finish("register-auth-code", self.connect(&user_id, input).await))
    }

    #[tool(
        name = "get-workspaces",
        description = "Fetches the list of Asana workspaces accessible to the user.",
        annotations(title = "List Asana workspaces", read_only_hint = true)
    )]
    async fn get_workspaces(
        &self,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let user_id = caller(&context)?;
        Ok(finish("get-workspaces", self.workspaces(&user_id).await))
    }

    #[tool(
        name = "list-tasks-due-today",
        description = "Returns tasks due today for the selected Asana workspace, optionally including completed tasks.",
        annotations(title = "List tasks due today", read_only_hint = true)
    )]
    async fn list_tasks_due_today(
        &self,
        Parameters(input): Parameters<ListTasksDueTodayInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let user_id = caller(&context)?;
        Ok(finish(
            "list-tasks-due-today",
            self.tasks_due_today(&user_id, input).await,
        ))
    }

    #[tool(
        name = "search-tasks",
        description = "Search for tasks in an Asana workspace using filters like text, assignee, projects, sections, tags and completion status.",
        annotations(title = "Search tasks", read_only_hint = true)
    )]
    async fn search_tasks(
        &self,
        Parameters(input): Parameters<SearchTasksInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let user_id = caller(&context)?;
        Ok(finish("search-tasks", self.search(&user_id, input).await))
    }

    #[tool(
        name = "get-task",
        description = "Retrieves detailed information about a single Asana task including notes, tags and timestamps.",
        annotations(title = "Get task details", read_only_hint = true)
    )]
    async fn get_task(
        &self,
        Parameters(input): Parameters<GetTaskInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let user_id = caller(&context)?;
        Ok(finish("get-task", self.task(&user_id, input).await))
    }

    #[tool(
        name = "update-task",
        description = "Updates a task in Asana. Can modify assignee, due dates and completion status.",
        annotations(title = "Update task")
    )]
    async fn update_task(
        &self,
        Parameters(input): Parameters<UpdateTaskInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let user_id = caller(&context)?;
        Ok(finish("update-task", self.update(&user_id, input).await))
    }
}

impl AsanaMcpServer {
    async fn connect(
        &self,
        user_id: &str,
        input: RegisterAuthCodeInput,
    ) -> Result<CallToolResult, BridgeError> {
        input.validate()?;
        self.asana.refresher().connect(user_id, &input.code).await?;
        Ok(CallToolResult::success(vec![Content::text(
            "Asana account connected successfully.",
        )]))
    }

    async fn workspaces(&self, user_id: &str) -> Result<CallToolResult, BridgeError> {
        let result = self.asana.list_workspaces(user_id).await?;
        let summary = format!("Found {} Asana workspaces.", result.workspaces.len());
        structured(summary, &result)
    }

    async fn tasks_due_today(
        &self,
        user_id: &str,
        input: ListTasksDueTodayInput,
    ) -> Result<CallToolResult, BridgeError> {
        input.validate()?;
        let result = self.asana.list_tasks_due_today(user_id, &input).await?;
        let summary = match result.task_count {
            0 => "No tasks due today.".to_string(),
            n => format!("Fetched {} task{} due today.", n, plural(n)),
        };
        structured(summary, &result)
    }

    async fn search(
        &self,
        user_id: &str,
        input: SearchTasksInput,
    ) -> Result<CallToolResult, BridgeError> {
        input.validate()?;
        let result = self.asana.search_tasks(user_id, &input).await?;
        let summary = match result.task_count {
            0 => "No tasks found matching the search criteria.".to_string(),
            n => format!("Found {} task{} matching the search criteria.", n, plural(n)),
        };
        structured(summary, &result)
    }

    async fn task(&self, user_id: &str, input: GetTaskInput) -> Result<CallToolResult, BridgeError> {
        input.validate()?;
        let result = self.asana.get_task(user_id, &input).await?;
        let summary = format!("Retrieved task: {}", result.task.task.name);
        structured(summary, &result)
    }

    /// The text content is the result itself, serialized, for widgets to parse.
    async fn update(
        &self,
        user_id: &str,
        input: UpdateTaskInput,
    ) -> Result<CallToolResult, BridgeError> {
        input.validate()?;
        let result = self.asana.update_task(user_id, &input).await?;

        let changes = input.describe_changes();
        if changes.is_empty() {
            tracing::info!(task = %result.task.task.name, "Task updated");
        } else {
            tracing::info!(task = %result.task.task.name, changes = %changes.join(", "), "Task updated");
        }

        structured(serde_json::to_string(&result)?, &result)
    }
}

impl ServerHandler for AsanaMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Reads and updates the caller's Asana tasks. Call register-auth-code or \
                 connect through /asana/authorize before using the other tools."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _params: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools: Vec<Tool> = self
            .tool_router
            .list_all()
            .into_iter()
            .map(with_widget_meta)
            .collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        params: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(tool = %params.name, "Calling tool");
        self.tool_router
            .call(ToolCallContext::new(self, params, context))
            .await
    }

    async fn list_resources(
        &self,
        _params: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resource: Resource = serde_json::from_value(json!({
            "uri": WIDGET_URI,
            "name": WIDGET_NAME,
            "mimeType": WIDGET_MIME_TYPE,
        }))
        .map_err(|e| McpError::internal_error(format!("Invalid widget resource: {}", e), None))?;

        Ok(ListResourcesResult::with_all_items(vec![resource]))
    }

    async fn read_resource(
        &self,
        params: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        if params.uri != WIDGET_URI {
            return Err(McpError::invalid_params(
                format!("Resource '{}' not found", params.uri),
                None,
            ));
        }

        let contents: ResourceContents = serde_json::from_value(json!({
            "uri": WIDGET_URI,
            "mimeType": WIDGET_MIME_TYPE,
            "text": widget::widget_html(&self.widget_base_url),
            "_meta": widget::resource_meta(),
        }))
        .map_err(|e| McpError::internal_error(format!("Invalid widget contents: {}", e), None))?;

        Ok(ReadResourceResult {
            contents: vec![contents],
        })
    }
}
