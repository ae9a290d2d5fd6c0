use planner_core::{ProjectContext, ReferenceDoc};

/// Fixed prompt used to check that the model answers at all.
pub const PROBE_PROMPT: &str = "Say \"Connection successful\" in JSON format";

/// Shape the model is asked to answer in.
pub const PLAN_SCHEMA: &str = r#"{
  "overview": "Project description",
  "architecture": [
    { "component": "string", "purpose": "string", "technologies": ["string"] }
  ],
  "implementation_steps": [
    {
      "id": "string",
      "phase": "setup|core|features|testing",
      "description": "string",
      "files_to_create": ["string"],
      "dependencies": ["string"]
    }
  ],
  "file_structure": {},
  "dependencies": [
    { "name": "string", "version": "string", "purpose": "string" }
  ],
  "testing_strategy": "string",
  "deployment_notes": "string"
}"#;

/// Concatenate reference docs under a header naming each library (and topic).
pub fn format_reference_docs(docs: &[ReferenceDoc]) -> String {
    let mut out = String::new();
    for doc in docs {
        out.push_str("\n\nLibrary: ");
        out.push_str(&doc.library);
        if let Some(topic) = &doc.topic {
            out.push_str(" (");
            out.push_str(topic);
            out.push(')');
        }
        out.push('\n');
        out.push_str(&doc.text);
    }
    out
}

/// Build the planning prompt for a context.
///
/// `constraints` overrides the constraints stored on the context when given.
pub fn plan_prompt(
    context: &ProjectContext,
    constraints: Option<&str>,
    docs: &[ReferenceDoc],
) -> String {
    let mut out = String::with_capacity(2048);

    out.push_str("Create a concrete implementation plan for this project.\n\n");
    out.push_str("PROJECT: ");
    out.push_str(&context.project_name);
    out.push('\n');
    out.push_str("REQUIREMENTS: ");
    out.push_str(&context.requirements);
    out.push('\n');

    let constraints = constraints
        .or(context.constraints.as_deref())
        .filter(|c| !c.trim().is_empty());
    if let Some(c) = constraints {
        out.push_str("CONSTRAINTS: ");
        out.push_str(c);
        out.push('\n');
    }

    if !docs.is_empty() {
        out.push_str("\nREFERENCE DOCUMENTATION:\n");
        out.push_str(&format_reference_docs(docs));
        out.push('\n');
    }

    out.push_str("\nRespond with valid JSON using this schema:\n");
    out.push_str(PLAN_SCHEMA);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn context(constraints: Option<&str>) -> ProjectContext {
        ProjectContext {
            id: "todo-app-1".into(),
            project_name: "Todo App".into(),
            requirements: "CRUD todo list".into(),
            constraints: constraints.map(String::from),
            planning_history: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn minimal_prompt_has_project_requirements_and_schema() {
        let prompt = plan_prompt(&context(None), None, &[]);
        assert!(prompt.starts_with("Create a concrete implementation plan"));
        assert!(prompt.contains("PROJECT: Todo App\n"));
        assert!(prompt.contains("REQUIREMENTS: CRUD todo list\n"));
        assert!(!prompt.contains("CONSTRAINTS"));
        assert!(!prompt.contains("REFERENCE DOCUMENTATION"));
        assert!(prompt.ends_with(PLAN_SCHEMA));
    }

    #[test]
    fn explicit_constraints_win_over_stored_ones() {
        let prompt = plan_prompt(&context(Some("stored")), Some("explicit"), &[]);
        assert!(prompt.contains("CONSTRAINTS: explicit\n"));
        assert!(!prompt.contains("stored"));

        let prompt = plan_prompt(&context(Some("stored")), None, &[]);
        assert!(prompt.contains("CONSTRAINTS: stored\n"));
    }

    #[test]
    fn reference_docs_are_embedded_with_headers() {
        let docs = vec![
            ReferenceDoc {
                library: "axum".into(),
                topic: Some("routing".into()),
                text: "Router::new()".into(),
            },
            ReferenceDoc {
                library: "serde".into(),
                topic: None,
                text: "derive".into(),
            },
        ];
        let prompt = plan_prompt(&context(None), None, &docs);
        assert!(prompt.contains(
            "REFERENCE DOCUMENTATION:\n\n\nLibrary: axum (routing)\nRouter::new()\n\nLibrary: serde\nderive\n"
        ));
    }
}
