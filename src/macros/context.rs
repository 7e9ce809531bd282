//! Per-expansion state.
//!
//! One `ExpansionContext` exists for each top-level expansion call. It
//! borrows the registry read-only and owns what changes while the driver runs:
//! the chain of macros on the current path, the transition count and the
//! optional trace. It is dropped when the expansion returns.
//!
//! Hygiene tags come from a process-wide counter, so no two expansions ever
//! share a tag, even when they run in separate contexts or threads.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::macros::registry::MacroRegistry;
use crate::macros::types::ExpansionStep;

/// Where the driver is in its state machine, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    Scanning,
    Matched,
    Substituted,
    Terminal,
    Failed,
}

/// Next hygiene tag to hand out. Starts at 1; `Scope::Macro(0)` is never issued.
static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub(crate) struct ExpansionContext<'r> {
    registry: &'r MacroRegistry,
    transitions: usize,
    path: Vec<String>,
    trace: Option<Vec<ExpansionStep>>,
    state: ExpansionState,
}

impl<'r> ExpansionContext<'r> {
    pub(crate) fn new(registry: &'r MacroRegistry, record_trace: bool) -> Self {
        ExpansionContext {
            registry,
            transitions: 0,
            path: Vec::new(),
            trace: record_trace.then(Vec::new),
            state: ExpansionState::Scanning,
        }
    }

    pub(crate) fn registry(&self) -> &'r MacroRegistry {
        self.registry
    }

    /// Allocates the hygiene tag for the next expansion. Tags are never
    /// handed out twice within one process.
    pub(crate) fn fresh_tag(&mut self) -> u64 {
        NEXT_TAG.fetch_add(1, Ordering::Relaxed)
    }

    /// Matched→Substituted transitions taken so far, over the whole tree.
    pub(crate) fn transitions(&self) -> usize {
        self.transitions
    }

    /// Macro names expanded on the path from the root to the current node.
    pub(crate) fn path(&self) -> &[String] {
        &self.path
    }

    pub(crate) fn transition(&mut self, state: ExpansionState) {
        tracing::trace!(
            from = ?self.state,
            to = ?state,
            depth = self.path.len(),
            "expansion state"
        );
        if state == ExpansionState::Substituted {
            self.transitions += 1;
        }
        self.state = state;
    }

    pub(crate) fn enter(&mut self, macro_name: &str) {
        self.path.push(macro_name.to_string());
    }

    /// Drops the macros entered since the path had length `len`.
    pub(crate) fn truncate_path(&mut self, len: usize) {
        self.path.truncate(len);
    }

    pub(crate) fn record(&mut self, step: impl FnOnce() -> ExpansionStep) {
        if let Some(trace) = self.trace.as_mut() {
            trace.push(step());
        }
    }

    pub(crate) fn into_trace(self) -> Vec<ExpansionStep> {
        self.trace.unwrap_or_default()
    }
}
