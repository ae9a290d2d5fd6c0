pub mod engine;
mod parse;
mod prompt;

use async_trait::async_trait;
use planner_core::{Plan, ProjectContext, ReferenceDoc};
use thiserror::Error;

pub use engine::GeminiGenerator;
pub use parse::extract_plan;
pub use prompt::{format_reference_docs, plan_prompt, PLAN_SCHEMA, PROBE_PROMPT};

/// A text-completion capability: prompt in, generated text out.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier reported back to callers.
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error("build LLM: {0}")]
    Build(String),

    #[error("chat: {0}")]
    Request(String),

    #[error("LLM returned no text")]
    Empty,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to parse plan: {reason}")]
pub struct ExtractError {
    pub reason: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Prompt the model once for a plan and extract it from the reply.
pub async fn generate_plan(
    generator: &dyn Generator,
    context: &ProjectContext,
    constraints: Option<&str>,
    docs: &[ReferenceDoc],
) -> Result<Plan, PlanError> {
    let prompt = plan_prompt(context, constraints, docs);

    tracing::info!(
        context_id = %context.id,
        model = generator.model(),
        reference_docs = docs.len(),
        "generating plan"
    );

    let raw = generator.generate(&prompt).await?;
    tracing::debug!(raw = %raw, "raw model output");

    Ok(extract_plan(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    struct Canned {
        reply: Result<String, GenerateError>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Generator for Canned {
        fn model(&self) -> &str {
            "canned"
        }

        async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
            self.seen.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    fn context() -> ProjectContext {
        ProjectContext {
            id: "todo-app-1".into(),
            project_name: "Todo App".into(),
            requirements: "CRUD todo list".into(),
            constraints: None,
            planning_history: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn generate_plan_prompts_once_and_extracts() {
        let generator = Canned {
            reply: Ok("Sure!\n```json\n{\"overview\": \"todo\"}\n```".into()),
            seen: Mutex::new(vec![]),
        };

        let plan = generate_plan(&generator, &context(), Some("no db"), &[])
            .await
            .unwrap();

        assert_eq!(plan.overview(), Some("todo"));
        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("CONSTRAINTS: no db"));
    }

    #[tokio::test]
    async fn generation_and_extraction_failures_are_distinct() {
        let failing = Canned {
            reply: Err(GenerateError::Request("503".into())),
            seen: Mutex::new(vec![]),
        };
        let err = generate_plan(&failing, &context(), None, &[]).await.unwrap_err();
        assert!(matches!(err, PlanError::Generate(GenerateError::Request(_))));

        let chatty = Canned {
            reply: Ok("I cannot help with that".into()),
            seen: Mutex::new(vec![]),
        };
        let err = generate_plan(&chatty, &context(), None, &[]).await.unwrap_err();
        assert!(matches!(err, PlanError::Extract(_)));
    }
}
