use std::sync::Arc;

use planner_core::{
    render_checklist, ContextStore, LibraryRequest, NewContext, ProjectContext, ReferenceDoc,
    StoreError,
};
use planner_docs::{fetch_library_docs, DocsClient, DocsError};
use planner_suggest::{generate_plan, ExtractError, GenerateError, Generator, PlanError, PROBE_PROMPT};
use rmcp::schemars;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

// --- Requests ---

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContextRequest {
    /// Name of the project
    #[schemars(required)]
    pub project_name: Option<String>,
    /// Project requirements
    #[schemars(required)]
    pub requirements: Option<String>,
    /// Any constraints, e.g. "must run on Raspberry Pi"
    pub constraints: Option<String>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanRequest {
    /// Existing project context ID. When omitted, projectName and requirements are required and a new context is created.
    pub context_id: Option<String>,
    /// Project name (if no contextId)
    pub project_name: Option<String>,
    /// Requirements (if no contextId)
    pub requirements: Option<String>,
    /// Additional constraints for this plan
    pub constraints: Option<String>,
    /// Libraries to fetch Context7 docs for, processed in order
    #[serde(default)]
    pub libraries: Vec<LibraryRequest>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistRequest {
    /// Context ID whose latest plan should be rendered
    #[schemars(required)]
    pub context_id: Option<String>,
}

// --- Outcomes ---

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Json(Value),
    Markdown(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    UpstreamTransport(String),

    #[error("{0}")]
    UpstreamProtocol(String),

    #[error(transparent)]
    PlanExtraction(#[from] ExtractError),
}

impl From<StoreError> for ToolError {
    fn from(e: StoreError) -> Self {
        ToolError::NotFound(e.to_string())
    }
}

impl From<GenerateError> for ToolError {
    fn from(e: GenerateError) -> Self {
        ToolError::UpstreamTransport(e.to_string())
    }
}

impl From<DocsError> for ToolError {
    fn from(e: DocsError) -> Self {
        if e.is_transport() {
            ToolError::UpstreamTransport(e.to_string())
        } else {
            ToolError::UpstreamProtocol(e.to_string())
        }
    }
}

impl From<PlanError> for ToolError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::Generate(e) => e.into(),
            PlanError::Extract(e) => e.into(),
        }
    }
}

// --- Dispatcher ---

/// Owns the context store and the two upstream capabilities.
pub struct Dispatcher {
    store: Arc<dyn ContextStore>,
    generator: Arc<dyn Generator>,
    docs: Arc<dyn DocsClient>,
    docs_url: String,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ContextStore>,
        generator: Arc<dyn Generator>,
        docs: Arc<dyn DocsClient>,
        docs_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            generator,
            docs,
            docs_url: docs_url.into(),
        }
    }

    pub async fn test_gemini_connection(&self) -> Result<ToolOutput, ToolError> {
        let response = self.generator.generate(PROBE_PROMPT).await?;
        Ok(ToolOutput::Json(json!({
            "success": true,
            "message": "Gemini connection successful",
            "model": self.generator.model(),
            "response": response,
        })))
    }

    /// Diagnostic: an upstream failure is reported in the payload, not raised.
    pub async fn test_context7_connection(&self) -> Result<ToolOutput, ToolError> {
        match self.docs.call("tools/list", json!({})).await {
            Ok(tools) => Ok(ToolOutput::Json(json!({
                "success": true,
                "url": self.docs_url,
                "tools": tools,
            }))),
            Err(e) => {
                tracing::warn!(url = %self.docs_url, error = %e, "Context7 connection check failed");
                Ok(ToolOutput::Json(json!({
                    "success": false,
                    "url": self.docs_url,
                    "error": e.to_string(),
                })))
            }
        }
    }

    pub fn create_project_context(
        &self,
        req: CreateContextRequest,
    ) -> Result<ToolOutput, ToolError> {
        let project_name = required(req.project_name, "projectName")?;
        let requirements = required(req.requirements, "requirements")?;

        let context = self.store.create(NewContext {
            project_name,
            requirements,
            constraints: present(req.constraints),
        });
        tracing::info!(context_id = %context.id, "project context created");

        Ok(ToolOutput::Json(json!({
            "success": true,
            "contextId": context.id,
            "message": format!("Created project context: {}", context.id),
            "projectName": context.project_name,
        })))
    }

    pub async fn generate_plan_with_gemini(
        &self,
        req: GeneratePlanRequest,
    ) -> Result<ToolOutput, ToolError> {
        let constraints = present(req.constraints);
        let context = self.resolve_context(
            req.context_id,
            req.project_name,
            req.requirements,
            constraints.clone(),
        )?;

        let docs = self.gather_reference_docs(&req.libraries).await;
        let plan = generate_plan(
            self.generator.as_ref(),
            &context,
            constraints.as_deref(),
            &docs,
        )
        .await?;

        let libraries = req.libraries.into_iter().map(|l| l.name).collect();
        let record = self.store.append_plan(&context.id, plan, libraries)?;
        tracing::info!(context_id = %context.id, plan_id = %record.id, "plan recorded");

        Ok(ToolOutput::Json(json!({
            "success": true,
            "contextId": context.id,
            "plan": record.plan,
            "message": "Plan generated successfully",
        })))
    }

    pub fn render_plan_checklist(&self, req: ChecklistRequest) -> Result<ToolOutput, ToolError> {
        let context_id = required(req.context_id, "contextId")?;
        let context = self.load(&context_id)?;
        let record = context
            .latest_plan()
            .ok_or_else(|| ToolError::NotFound("No plans found".to_string()))?;

        Ok(ToolOutput::Markdown(render_checklist(&context, &record.plan)))
    }

    fn load(&self, id: &str) -> Result<ProjectContext, ToolError> {
        self.store
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()).into())
    }

    /// An explicit id must exist; otherwise name and requirements open a new context.
    fn resolve_context(
        &self,
        context_id: Option<String>,
        project_name: Option<String>,
        requirements: Option<String>,
        constraints: Option<String>,
    ) -> Result<ProjectContext, ToolError> {
        if let Some(id) = present(context_id) {
            return self.load(&id);
        }

        match (present(project_name), present(requirements)) {
            (Some(project_name), Some(requirements)) => Ok(self.store.create(NewContext {
                project_name,
                requirements,
                constraints,
            })),
            _ => Err(ToolError::Validation(
                "Provide contextId OR projectName + requirements".to_string(),
            )),
        }
    }

    /// Fetch docs one library at a time, in request order. A failed library is
    /// logged and left out; the rest still contribute.
    async fn gather_reference_docs(&self, libraries: &[LibraryRequest]) -> Vec<ReferenceDoc> {
        let mut docs = Vec::with_capacity(libraries.len());
        for library in libraries {
            match fetch_library_docs(self.docs.as_ref(), library).await {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    tracing::warn!(library = %library.name, error = %e, "failed to fetch docs");
                }
            }
        }
        docs
    }
}

/// `Some` only for values with non-whitespace content.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, name: &str) -> Result<String, ToolError> {
    present(value).ok_or_else(|| ToolError::Validation(format!("{name} is required")))
}
