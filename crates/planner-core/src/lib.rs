pub mod checklist;
pub mod error;
pub mod settings;
pub mod store;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub use checklist::render_checklist;
pub use error::{SettingsError, StoreError};
pub use settings::Settings;
pub use store::{slugify, ContextStore, InMemoryContextStore};

// --- Contexts ---

/// One in-progress planning session. Owned by a [`ContextStore`]; callers get clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub id: String,
    pub project_name: String,
    pub requirements: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    /// Append-only; the most recent plan is last.
    #[serde(default)]
    pub planning_history: Vec<PlanRecord>,
    pub created_at: DateTime<Utc>,
}

impl ProjectContext {
    pub fn latest_plan(&self) -> Option<&PlanRecord> {
        self.planning_history.last()
    }
}

/// Fields needed to open a new context.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContext {
    pub project_name: String,
    pub requirements: String,
    pub constraints: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub plan: Plan,
    /// Library names requested for this plan, whether or not their docs were fetched.
    #[serde(default)]
    pub libraries: Vec<String>,
}

/// One documentation fetch to run before prompting. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct LibraryRequest {
    /// Library name to resolve, e.g. "axum" or "react"
    pub name: String,
    /// Optional topic to focus the documentation on, e.g. "routing"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Optional token budget for the returned documentation
    #[serde(
        default,
        deserialize_with = "lenient_tokens",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<f64>")]
    pub tokens: Option<u64>,
}

/// Documentation fetched for one library, ready to be embedded in a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDoc {
    pub library: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub text: String,
}

// --- Plans ---

/// A plan as parsed from model output.
///
/// The value is untrusted: nothing about its shape is guaranteed, so it is kept
/// verbatim and read through lenient accessors that skip anything malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan(Value);

impl Plan {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn overview(&self) -> Option<&str> {
        self.0.get("overview").and_then(Value::as_str)
    }

    pub fn implementation_steps(&self) -> Vec<ImplementationStep> {
        self.items("implementation_steps")
    }

    pub fn dependencies(&self) -> Vec<Dependency> {
        self.items("dependencies")
    }

    /// Entries of an array field that deserialize as `T`; anything else is dropped.
    fn items<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.is_object())
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A step of the plan. `phase` is advisory: usually one of setup, core, features, testing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImplementationStep {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phase: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_texts")]
    pub files_to_create: Vec<String>,
    #[serde(default, deserialize_with = "lenient_texts")]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Dependency {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub purpose: Option<String>,
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(&Value::deserialize(de)?))
}

/// Any non-negative number (fractions truncate) or numeric string; anything else is no budget.
fn lenient_tokens<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u64>, D::Error> {
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_texts<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(&other).into_iter().collect(),
    })
}
