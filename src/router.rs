use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Implementation, InitializeRequestParam,
        InitializeResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo, Tool, ToolsCapability,
    },
    service::RequestContext,
};
use serde_json::json;

use crate::error::DeskError;
use crate::festival::models::Language;
use crate::server::{FestivalMindServer, failure_message, request_language};

#[derive(Clone)]
pub struct Router(pub FestivalMindServer);

fn schema(value: serde_json::Value) -> std::sync::Arc<serde_json::Map<String, serde_json::Value>> {
    std::sync::Arc::new(value.as_object().cloned().unwrap_or_default())
}

fn tool(
    name: &'static str,
    title: &'static str,
    description: &'static str,
    input_schema: std::sync::Arc<serde_json::Map<String, serde_json::Value>>,
) -> Tool {
    Tool {
        name: name.into(),
        title: Some(title.into()),
        description: Some(description.into()),
        input_schema,
        icons: None,
        annotations: None,
        output_schema: None,
        meta: None,
    }
}

/// Every failure becomes a user-facing notification in the caller's
/// language; the technical detail rides along for the developer.
fn to_mcp_error(lang: Language, err: DeskError) -> McpError {
    let code = match &err {
        DeskError::NotFound(_) | DeskError::BadRequest(_) | DeskError::InvalidScore(_) => {
            rmcp::model::ErrorCode::INVALID_PARAMS
        }
        DeskError::Store(_) | DeskError::Export(_) => rmcp::model::ErrorCode::INTERNAL_ERROR,
    };
    tracing::error!("tool call failed: {err}");
    McpError {
        code,
        message: failure_message(lang, &err).to_string().into(),
        data: Some(json!({ "detail": err.to_string() })),
    }
}

impl ServerHandler for Router {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "festival-mind".to_string(),
                title: Some("Festival Mind".to_string()),
                version: "0.1.0".to_string(),
                website_url: None,
                icons: None,
            },
            ..Default::default()
        }
    }

    async fn initialize(
        &self,
        request: InitializeRequestParam,
        _context: RequestContext<rmcp::service::RoleServer>,
    ) -> std::result::Result<InitializeResult, McpError> {
        let mut info = self.get_info();
        info.protocol_version = request.protocol_version.clone();
        Ok(info)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<rmcp::service::RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        let empty = schema(json!({ "type": "object" }));

        let tools = vec![
            tool(
                "health",
                "Health",
                "Check SurrealDB connectivity and config surface",
                empty.clone(),
            ),
            tool(
                "status",
                "Status",
                "Counts submissions, total and per review status",
                empty.clone(),
            ),
            tool(
                "application",
                "Application",
                "Load one application as its normalized view model with score summary",
                schema(json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "Application document id" },
                        "adminId": {
                            "type": "string",
                            "description": "Reviewer id; response points out this reviewer's own score",
                        },
                        "lang": { "type": "string", "enum": ["en", "th"] },
                    },
                    "required": ["id"],
                })),
            ),
            tool(
                "crew",
                "Crew",
                "Filtered, sorted crew view; 5 rows unless revealAll",
                schema(json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "query": { "type": "string", "description": "Case-insensitive substring" },
                        "sortBy": { "type": "string", "enum": ["name", "role", "age"] },
                        "order": { "type": "string", "enum": ["asc", "desc"] },
                        "revealAll": { "type": "boolean" },
                    },
                    "required": ["id"],
                })),
            ),
            tool(
                "set_review_status",
                "Set Review Status",
                "Set the review status and stamp review timestamps",
                schema(json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "status": {
                            "type": "string",
                            "enum": ["pending", "in-progress", "reviewed", "approved", "rejected"],
                        },
                        "lang": { "type": "string", "enum": ["en", "th"] },
                    },
                    "required": ["id", "status"],
                })),
            ),
            tool(
                "set_admin_notes",
                "Set Admin Notes",
                "Replace the free-form admin notes",
                schema(json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "notes": { "type": "string" },
                        "lang": { "type": "string", "enum": ["en", "th"] },
                    },
                    "required": ["id", "notes"],
                })),
            ),
            tool(
                "set_flag",
                "Set Flag",
                "Flag or unflag an application; unflagging always clears the reason",
                schema(json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "flagged": { "type": "boolean" },
                        "reason": { "type": "string" },
                        "lang": { "type": "string", "enum": ["en", "th"] },
                    },
                    "required": ["id", "flagged"],
                })),
            ),
            tool(
                "submit_score",
                "Submit Score",
                "Upsert one reviewer's score (replaces any previous entry by the same reviewer)",
                schema(json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "adminId": { "type": "string" },
                        "adminName": { "type": "string" },
                        "criteria": {
                            "type": "object",
                            "additionalProperties": { "type": "number" },
                        },
                        "totalScore": { "type": "number", "minimum": 0, "maximum": 40 },
                        "comments": { "type": "string" },
                        "lang": { "type": "string", "enum": ["en", "th"] },
                    },
                    "required": ["id", "adminId", "adminName", "totalScore"],
                })),
            ),
            tool(
                "export",
                "Export",
                "Render the application report or the crew-list CSV",
                schema(json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "format": { "type": "string", "enum": ["report", "crew-csv"] },
                        "lang": { "type": "string", "enum": ["en", "th"] },
                    },
                    "required": ["id", "format"],
                })),
            ),
            tool(
                "genre_stats",
                "Genre Stats",
                "Genre distribution across all submissions",
                empty,
            ),
        ];

        Ok(ListToolsResult {
            tools,
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<rmcp::service::RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let lang = request_language(&request);
        let result = match request.name.as_ref() {
            "health" => self.0.handle_health(request).await,
            "status" => self.0.handle_status(request).await,
            "application" => self.0.handle_application(request).await,
            "crew" => self.0.handle_crew(request).await,
            "set_review_status" => self.0.handle_set_review_status(request).await,
            "set_admin_notes" => self.0.handle_set_admin_notes(request).await,
            "set_flag" => self.0.handle_set_flag(request).await,
            "submit_score" => self.0.handle_submit_score(request).await,
            "export" => self.0.handle_export(request).await,
            "genre_stats" => self.0.handle_genre_stats(request).await,
            _ => {
                return Err(McpError {
                    code: rmcp::model::ErrorCode::METHOD_NOT_FOUND,
                    message: format!("Unknown tool: {}", request.name).into(),
                    data: None,
                });
            }
        };
        result.map_err(|e| to_mcp_error(lang, e))
    }
}
