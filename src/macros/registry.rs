//! Macro registry for storage and structural lookup of macro clauses.
//!
//! # Features
//! - Each macro name owns an ordered list of (pattern, transformer) clauses.
//!   `register` appends; lookup tries clauses in registration order and the
//!   first match wins.
//! - A call is a macro call iff its operator symbol has at least one clause.
//!   The check runs on the unexpanded call, so transformers receive trees.
//! - Terminal primitives are fixed per registry and cannot be registered as
//!   macros.
//!
//! # Thread Safety
//! Build the registry once, then hand out `&MacroRegistry` (or wrap it in an
//! `Arc`). An [`crate::macros::Expander`] borrows it immutably, so no
//! registration can interleave with an expansion. Transformers are
//! `Send + Sync`, which makes the registry `Send + Sync` as well.
//!
//! # Example
//! ```rust
//! use splice::ast::Node;
//! use splice::macros::{MacroOutput, MacroRegistry, Pattern};
//! let mut reg = MacroRegistry::new();
//! reg.register("twice", Pattern::exact(1), |args: &[Node]| {
//!     Ok(MacroOutput::from_template(&Node::block(vec![
//!         Node::unquote("a"),
//!         Node::unquote("b"),
//!     ]))?
//!     .bind("a", args[0].clone())
//!     .bind("b", args[0].clone()))
//! })
//! .unwrap();
//! assert!(reg.is_macro("twice"));
//! assert!(reg.lookup("twice", &[Node::int(1)]).is_some());
//! assert!(reg.lookup("twice", &[]).is_none());
//! ```

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;

use crate::ast::builder::UNQUOTE;
use crate::ast::Node;
use crate::macros::types::{Clause, ClauseMatch, MacroDef, MacroOutput, Pattern, Transformer};
use crate::{ErrorContext, SpliceError};

/// Irreducible core forms: conditional dispatch, sequencing, binding.
pub static DEFAULT_PRIMITIVES: Lazy<BTreeSet<String>> = Lazy::new(|| {
    ["case", "__block__", "="]
        .iter()
        .map(|name| name.to_string())
        .collect()
});

#[derive(Debug, Clone)]
pub struct MacroRegistry {
    macros: HashMap<String, MacroDef>,
    primitives: BTreeSet<String>,
}

impl Default for MacroRegistry {
    fn default() -> Self {
        Self::with_primitives(DEFAULT_PRIMITIVES.iter().cloned())
    }
}

impl MacroRegistry {
    /// An empty registry over the default primitive set.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry whose terminal primitives are exactly `primitives`.
    pub fn with_primitives<I, S>(primitives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MacroRegistry {
            macros: HashMap::new(),
            primitives: primitives.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends a clause to `name`.
    ///
    /// # Errors
    /// `ReservedName` if `name` is a terminal primitive or the unquote marker.
    pub fn register<F>(
        &mut self,
        name: &str,
        pattern: Pattern,
        transformer: F,
    ) -> Result<(), SpliceError>
    where
        F: Fn(&[Node]) -> Result<MacroOutput, SpliceError> + Send + Sync + 'static,
    {
        self.register_transformer(name, pattern, Transformer::new(transformer))
    }

    pub fn register_transformer(
        &mut self,
        name: &str,
        pattern: Pattern,
        transformer: Transformer,
    ) -> Result<(), SpliceError> {
        if name == UNQUOTE || self.primitives.contains(name) {
            return Err(SpliceError::ReservedName {
                name: name.to_string(),
                ctx: ErrorContext::none(),
            });
        }
        let def = self
            .macros
            .entry(name.to_string())
            .or_insert_with(|| MacroDef {
                name: name.to_string(),
                clauses: Vec::new(),
            });
        def.clauses.push(Clause {
            pattern,
            transformer,
        });
        tracing::trace!(
            macro_name = name,
            clauses = def.clauses.len(),
            "registered macro clause"
        );
        Ok(())
    }

    /// First clause of `name` whose pattern accepts `args`.
    pub fn lookup(&self, name: &str, args: &[Node]) -> Option<ClauseMatch<'_>> {
        self.macros.get(name).and_then(|def| {
            def.clauses
                .iter()
                .enumerate()
                .find(|(_, clause)| clause.pattern.matches(args))
                .map(|(index, clause)| ClauseMatch { index, clause })
        })
    }

    pub fn is_macro(&self, name: &str) -> bool {
        self.macros
            .get(name)
            .is_some_and(|def| !def.clauses.is_empty())
    }

    pub fn is_primitive(&self, name: &str) -> bool {
        self.primitives.contains(name)
    }

    pub fn primitives(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.macros.get(name)
    }

    pub fn clause_count(&self, name: &str) -> usize {
        self.macros.get(name).map_or(0, |def| def.clauses.len())
    }

    /// Removes every clause of `name`.
    pub fn unregister(&mut self, name: &str) -> Option<MacroDef> {
        self.macros.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.macros.keys()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}
