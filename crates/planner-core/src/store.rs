use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeZone, Utc};

use crate::{NewContext, Plan, PlanRecord, ProjectContext, StoreError};

/// Storage for planning contexts. Constructed at startup and handed to whoever
/// dispatches tool calls, so a persistent backend or a test double can stand in.
pub trait ContextStore: Send + Sync {
    /// Open a new context with a fresh `<slug>-<digits>` identifier.
    fn create(&self, new: NewContext) -> ProjectContext;

    fn get(&self, id: &str) -> Option<ProjectContext>;

    /// Append a plan to the context's history and return the stored record.
    fn append_plan(
        &self,
        id: &str,
        plan: Plan,
        libraries: Vec<String>,
    ) -> Result<PlanRecord, StoreError>;
}

/// Lower-case a project name and collapse each run of whitespace into one hyphen.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('-');
                in_space = true;
            }
        } else {
            out.extend(ch.to_lowercase());
            in_space = false;
        }
    }
    out
}

/// Process-lifetime store. No eviction; contexts live until the process exits.
pub struct InMemoryContextStore {
    clock: fn() -> DateTime<Utc>,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    contexts: HashMap<String, ProjectContext>,
    last_stamp: i64,
}

impl Inner {
    /// Millisecond stamp that never repeats, even when the clock stands still.
    fn next_stamp(&mut self, now: DateTime<Utc>) -> i64 {
        let stamp = now.timestamp_millis().max(self.last_stamp + 1);
        self.last_stamp = stamp;
        stamp
    }
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self {
            clock,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStore for InMemoryContextStore {
    fn create(&self, new: NewContext) -> ProjectContext {
        let now = (self.clock)();
        let mut inner = self.lock();
        let stamp = inner.next_stamp(now);

        let context = ProjectContext {
            id: format!("{}-{}", slugify(&new.project_name), stamp),
            project_name: new.project_name,
            requirements: new.requirements,
            constraints: new.constraints,
            planning_history: Vec::new(),
            created_at: now,
        };
        tracing::debug!(context_id = %context.id, "created project context");

        inner.contexts.insert(context.id.clone(), context.clone());
        context
    }

    fn get(&self, id: &str) -> Option<ProjectContext> {
        self.lock().contexts.get(id).cloned()
    }

    fn append_plan(
        &self,
        id: &str,
        plan: Plan,
        libraries: Vec<String>,
    ) -> Result<PlanRecord, StoreError> {
        let now = (self.clock)();
        let mut inner = self.lock();
        if !inner.contexts.contains_key(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let stamp = inner.next_stamp(now);

        let record = PlanRecord {
            id: format!("plan-{}", stamp),
            timestamp: Utc.timestamp_millis_opt(stamp).single().unwrap_or(now),
            plan,
            libraries,
        };

        let context = inner
            .contexts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        context.planning_history.push(record.clone());
        Ok(record)
    }
}
