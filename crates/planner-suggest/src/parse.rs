use planner_core::Plan;

use crate::ExtractError;

/// A way of locating the JSON candidate inside raw model output.
type Strategy = fn(&str) -> Option<&str>;

/// Tried in order; the first one that finds a candidate decides what gets parsed.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("fenced", fenced_json_block),
    ("braces", outer_braces),
    ("whole", whole_text),
];

/// Pull a plan out of free-form model output.
///
/// A parse failure of the chosen candidate is final; later strategies are not
/// consulted once an earlier one has matched.
pub fn extract_plan(raw: &str) -> Result<Plan, ExtractError> {
    let (name, candidate) = STRATEGIES
        .iter()
        .find_map(|(name, strategy)| strategy(raw).map(|c| (*name, c)))
        .unwrap_or(("whole", raw));

    tracing::debug!(strategy = name, "extracting plan");
    serde_json::from_str(candidate)
        .map(Plan::new)
        .map_err(|e| ExtractError { reason: e.to_string() })
}

/// Inner content of the first ```json fenced block.
fn fenced_json_block(raw: &str) -> Option<&str> {
    const OPEN: &str = "```json";
    const CLOSE: &str = "```";

    let start = raw.find(OPEN)? + OPEN.len();
    let rest = &raw[start..];
    let end = rest.find(CLOSE)?;
    Some(rest[..end].trim())
}

/// From the first `{` to the last `}`.
fn outer_braces(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

fn whole_text(raw: &str) -> Option<&str> {
    Some(raw.trim())
}
