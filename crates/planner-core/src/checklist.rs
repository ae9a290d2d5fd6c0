use crate::{Dependency, ImplementationStep, Plan, ProjectContext};

const DEFAULT_PHASE: &str = "general";

/// Render a plan as a Markdown checklist.
///
/// Sections appear in a fixed order (title, overview, dependencies, steps grouped
/// by phase) and any section whose source field is missing or empty is left out.
/// The output depends only on the inputs.
pub fn render_checklist(context: &ProjectContext, plan: &Plan) -> String {
    let mut out = String::with_capacity(1024);

    out.push_str("# ");
    out.push_str(&context.project_name);
    out.push_str("\n\n");

    if let Some(overview) = plan.overview() {
        out.push_str("## Overview\n");
        out.push_str(overview);
        out.push_str("\n\n");
    }

    let dependencies = plan.dependencies();
    if !dependencies.is_empty() {
        out.push_str("## Dependencies\n");
        for dep in &dependencies {
            out.push_str("- [ ] ");
            out.push_str(&dependency_line(dep));
            out.push('\n');
        }
        out.push('\n');
    }

    let steps = plan.implementation_steps();
    if !steps.is_empty() {
        out.push_str("## Implementation Steps\n");
        for (phase, steps) in group_by_phase(&steps) {
            out.push_str("\n### ");
            out.push_str(phase);
            out.push('\n');
            for step in steps {
                out.push_str("- [ ] ");
                out.push_str(step.description.as_deref().unwrap_or("(no description)"));
                out.push('\n');
                for file in &step.files_to_create {
                    out.push_str("  - Create: ");
                    out.push_str(file);
                    out.push('\n');
                }
            }
        }
    }

    out
}

fn dependency_line(dep: &Dependency) -> String {
    let mut line = dep.name.clone().unwrap_or_default();
    if let Some(version) = &dep.version {
        line.push('@');
        line.push_str(version);
    }
    if let Some(purpose) = &dep.purpose {
        line.push_str(" - ");
        line.push_str(purpose);
    }
    line
}

/// Group steps by phase, phases in first-seen order.
fn group_by_phase(steps: &[ImplementationStep]) -> Vec<(&str, Vec<&ImplementationStep>)> {
    let mut groups: Vec<(&str, Vec<&ImplementationStep>)> = Vec::new();
    for step in steps {
        let phase = step.phase.as_deref().unwrap_or(DEFAULT_PHASE);
        match groups.iter_mut().find(|(p, _)| *p == phase) {
            Some((_, members)) => members.push(step),
            None => groups.push((phase, vec![step])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

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

    #[test]
    fn renders_all_sections_in_order() {
        let plan = Plan::new(json!({
            "overview": "Simple todo service",
            "dependencies": [
                {"name": "axum", "version": "0.8", "purpose": "HTTP server"},
                {"name": "sqlx", "version": "0.8", "purpose": "database"}
            ],
            "implementation_steps": [
                {"id": "1", "phase": "setup", "description": "Create workspace", "files_to_create": ["Cargo.toml", "src/main.rs"]},
                {"id": "2", "phase": "core", "description": "Todo model"},
                {"id": "3", "phase": "setup", "description": "Configure CI", "files_to_create": [".github/workflows/ci.yml"]},
                {"id": "4", "phase": "testing", "description": "API tests", "files_to_create": []}
            ]
        }));

        let expected = "\
# Todo App

## Overview
Simple todo service

## Dependencies
- [ ] axum@0.8 - HTTP server
- [ ] sqlx@0.8 - database

## Implementation Steps

### setup
- [ ] Create workspace
  - Create: Cargo.toml
  - Create: src/main.rs
- [ ] Configure CI
  - Create: .github/workflows/ci.yml

### core
- [ ] Todo model

### testing
- [ ] API tests
";
        assert_eq!(render_checklist(&context(), &plan), expected);
    }

    #[test]
    fn omits_missing_sections() {
        let plan = Plan::new(json!({"dependencies": [], "implementation_steps": []}));
        assert_eq!(render_checklist(&context(), &plan), "# Todo App\n\n");
    }

    #[test]
    fn partial_entries_render_without_placeholders_for_sections() {
        let plan = Plan::new(json!({
            "dependencies": [{"name": "serde"}, {"name": "tokio", "purpose": "runtime"}],
            "implementation_steps": [{"files_to_create": ["lib.rs"]}]
        }));

        let md = render_checklist(&context(), &plan);
        assert!(!md.contains("## Overview"));
        assert!(md.contains("- [ ] serde\n"));
        assert!(md.contains("- [ ] tokio - runtime\n"));
        assert!(md.contains("### general\n- [ ] (no description)\n  - Create: lib.rs\n"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let plan = Plan::new(json!({
            "overview": "x",
            "implementation_steps": [
                {"phase": "b", "description": "one"},
                {"phase": "a", "description": "two"}
            ]
        }));
        let ctx = context();
        assert_eq!(render_checklist(&ctx, &plan), render_checklist(&ctx, &plan));
    }
}
