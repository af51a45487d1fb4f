//! The tasks widget: an HTML shell the assistant renders tool results into,
//! plus the `_meta` hints that point tools at it.

use serde_json::{json, Map, Value};

pub const WIDGET_NAME: &str = "tasks-widget";
pub const WIDGET_URI: &str = "ui://widget/tasks.html";
pub const WIDGET_MIME_TYPE: &str = "text/html+skybridge";

const WIDGET_DESCRIPTION: &str =
    "Displays Asana tasks that are due today for the selected workspace.";

/// Shell loading the widget bundle served by the frontend at `base_url`.
pub fn widget_html(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!(
        concat!(
            "<div id=\"tasks-root\"></div>\n",
            "<link rel=\"stylesheet\" href=\"{base}/tasks.css\">\n",
            "<script type=\"module\" src=\"{base}/tasks.js\"></script>"
        ),
        base = base_url
    )
}

/// `_meta` attached to the widget's resource contents.
pub fn resource_meta() -> Value {
    json!({ "openai/widgetDescription": WIDGET_DESCRIPTION })
}

/// `_meta` for the tools whose results the widget renders or refreshes.
pub fn tool_meta(tool_name: &str) -> Option<Map<String, Value>> {
    let (template, invoking, invoked) = match tool_name {
        "list-tasks-due-today" => (true, "Fetching tasks due today…", "Tasks loaded."),
        "search-tasks" => (true, "Searching tasks…", "Search results loaded."),
        "update-task" => (false, "Updating task…", "Task updated."),
        _ => return None,
    };

    let mut meta = Map::new();
    if template {
        meta.insert("openai/outputTemplate".to_string(), json!(WIDGET_URI));
    }
    meta.insert("openai/toolInvocation/invoking".to_string(), json!(invoking));
    meta.insert("openai/toolInvocation/invoked".to_string(), json!(invoked));
    meta.insert("openai/widgetAccessible".to_string(), json!(true));
    Some(meta)
}
