use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};

use crate::dispatch::{ChecklistRequest, CreateContextRequest, Dispatcher, GeneratePlanRequest};
use crate::envelope::respond;

pub const SERVER_NAME: &str = "gemini-planning-server";

const INSTRUCTIONS: &str = r#"Plans software projects with Gemini, grounded in up-to-date library documentation from Context7.

## Workflow
1. `create_project_context` with a project name and requirements. Keep the returned `contextId`.
2. `generate_plan_with_gemini` with that `contextId`, plus any `libraries` whose docs should inform the plan. Each call appends a new plan to the context.
3. `render_plan_checklist` to turn the latest plan into a Markdown checklist.

`generate_plan_with_gemini` also accepts `projectName` + `requirements` instead of a `contextId` and creates the context itself.
Use `test_gemini_connection` and `test_context7_connection` to diagnose upstream problems. Contexts live in memory and are lost when the server exits."#;

#[derive(Clone)]
pub struct PlannerServer {
    dispatcher: Arc<Dispatcher>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PlannerServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Test connection to Gemini")]
    async fn test_gemini_connection(&self) -> Result<CallToolResult, McpError> {
        let outcome = self.dispatcher.test_gemini_connection().await;
        Ok(respond("test_gemini_connection", outcome))
    }

    #[tool(description = "Test connection to Context7 MCP. Reports the available tools, or the error when unreachable.")]
    async fn test_context7_connection(&self) -> Result<CallToolResult, McpError> {
        let outcome = self.dispatcher.test_context7_connection().await;
        Ok(respond("test_context7_connection", outcome))
    }

    #[tool(description = "Create a new project planning context. Requires projectName and requirements; returns the contextId.")]
    fn create_project_context(
        &self,
        Parameters(req): Parameters<CreateContextRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.dispatcher.create_project_context(req);
        Ok(respond("create_project_context", outcome))
    }

    #[tool(description = "Generate implementation plan using Gemini with Context7 docs. Pass contextId, or projectName + requirements to start a new context. Libraries whose docs cannot be fetched are skipped.")]
    async fn generate_plan_with_gemini(
        &self,
        Parameters(req): Parameters<GeneratePlanRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.dispatcher.generate_plan_with_gemini(req).await;
        Ok(respond("generate_plan_with_gemini", outcome))
    }

    #[tool(description = "Render the latest plan of a context as a Markdown checklist")]
    fn render_plan_checklist(
        &self,
        Parameters(req): Parameters<ChecklistRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.dispatcher.render_plan_checklist(req);
        Ok(respond("render_plan_checklist", outcome))
    }
}

#[tool_handler]
impl ServerHandler for PlannerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }
}
