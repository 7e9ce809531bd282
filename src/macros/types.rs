//! Core types for the macro system
//!
//! This module defines the fundamental types used throughout the macro system:
//! patterns and the shapes they test, transformers, clauses, the output a
//! transformer hands back, and the trace record of one expansion step.
//!
//! ## Ownership
//!
//! - `Transformer` is an `Arc` around a closure, cheap to clone and shareable
//!   across threads.
//! - `MacroOutput` owns its template and bindings; the driver consumes it.
//! - `ExpansionStep` owns copies of the trees it records.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use difference::{Changeset, Difference};
use serde::{Deserialize, Serialize};

use crate::ast::{Literal, Node};
use crate::macros::quote::{quote, Quoted};
use crate::macros::substitute::Bindings;
use crate::SpliceError;

// ============================================================================
// PATTERNS
// ============================================================================

/// How many arguments a clause accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Any => true,
        }
    }
}

/// Structural test on a single, unexpanded argument tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Any,
    Literal,
    Binding,
    /// A call, optionally with a given operator symbol and argument count.
    Call {
        operator: Option<String>,
        arity: Option<usize>,
    },
}

impl Shape {
    /// Any call whose operator is the symbol `operator`.
    pub fn call(operator: impl Into<String>) -> Self {
        Shape::Call {
            operator: Some(operator.into()),
            arity: None,
        }
    }

    pub fn call_arity(operator: impl Into<String>, arity: usize) -> Self {
        Shape::Call {
            operator: Some(operator.into()),
            arity: Some(arity),
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        match (self, node) {
            (Shape::Any, _) => true,
            (Shape::Literal, Node::Literal(_)) => true,
            (Shape::Binding, Node::Binding(_)) => true,
            (Shape::Call { operator, arity }, Node::Call(call)) => {
                let operator_ok = match operator {
                    Some(expected) => call.operator_name() == Some(expected.as_str()),
                    None => true,
                };
                operator_ok && arity.map_or(true, |n| call.arity() == n)
            }
            _ => false,
        }
    }
}

/// Arity plus optional per-position argument shapes.
///
/// # Examples
///
/// ```rust
/// use splice::ast::Node;
/// use splice::macros::{Pattern, Shape};
/// let pattern = Pattern::exact(1).with_arg(0, Shape::call_arity("+", 2));
/// assert!(pattern.matches(&[Node::binop("+", Node::int(1), Node::int(2))]));
/// assert!(!pattern.matches(&[Node::binop("-", Node::int(1), Node::int(2))]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    arity: Arity,
    shapes: Vec<(usize, Shape)>,
}

impl Pattern {
    pub fn exact(arity: usize) -> Self {
        Self::with_arity(Arity::Exact(arity))
    }

    pub fn at_least(arity: usize) -> Self {
        Self::with_arity(Arity::AtLeast(arity))
    }

    pub fn any() -> Self {
        Self::with_arity(Arity::Any)
    }

    pub fn with_arity(arity: Arity) -> Self {
        Pattern {
            arity,
            shapes: Vec::new(),
        }
    }

    /// Requires argument `index` to have `shape`.
    pub fn with_arg(mut self, index: usize, shape: Shape) -> Self {
        self.shapes.push((index, shape));
        self
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn matches(&self, args: &[Node]) -> bool {
        self.arity.accepts(args.len())
            && self
                .shapes
                .iter()
                .all(|(index, shape)| args.get(*index).is_some_and(|arg| shape.matches(arg)))
    }
}

// ============================================================================
// TRANSFORMERS AND CLAUSES
// ============================================================================

pub type TransformFn = dyn Fn(&[Node]) -> Result<MacroOutput, SpliceError> + Send + Sync;

/// A pure function from the unexpanded argument trees of a call to the
/// template it expands into.
#[derive(Clone)]
pub struct Transformer(Arc<TransformFn>);

impl Transformer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Node]) -> Result<MacroOutput, SpliceError> + Send + Sync + 'static,
    {
        Transformer(Arc::new(f))
    }

    pub fn apply(&self, args: &[Node]) -> Result<MacroOutput, SpliceError> {
        (self.0)(args)
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transformer(<fn>)")
    }
}

#[derive(Debug, Clone)]
pub struct Clause {
    pub pattern: Pattern,
    pub transformer: Transformer,
}

/// A macro name with its clauses in registration order.
#[derive(Debug, Clone)]
pub struct MacroDef {
    pub name: String,
    pub clauses: Vec<Clause>,
}

/// Result of a successful lookup: the first matching clause and its position.
#[derive(Debug, Clone, Copy)]
pub struct ClauseMatch<'a> {
    pub index: usize,
    pub clause: &'a Clause,
}

// ============================================================================
// TRANSFORMER OUTPUT
// ============================================================================

/// What a transformer returns: a quoted template, the values for its
/// placeholders, and the identifiers that opt out of hygiene.
///
/// The template and the bindings stay separate until the driver has run the
/// hygiene pass over the template, which is how it tells identifiers the macro
/// wrote apart from identifiers the caller passed in.
#[derive(Debug, Clone)]
pub struct MacroOutput {
    template: Quoted,
    bindings: Bindings,
    unhygienic: BTreeSet<String>,
}

impl MacroOutput {
    pub fn new(template: Quoted) -> Self {
        MacroOutput {
            template,
            bindings: Bindings::new(),
            unhygienic: BTreeSet::new(),
        }
    }

    /// Quotes `template` and wraps it.
    pub fn from_template(template: &Node) -> Result<Self, SpliceError> {
        Ok(Self::new(quote(template)?))
    }

    pub fn bind(mut self, id: impl Into<String>, value: impl Into<Node>) -> Self {
        self.bindings.insert(id, value);
        self
    }

    pub fn bind_literal(self, id: impl Into<String>, value: Literal) -> Self {
        self.bind(id, Node::Literal(value))
    }

    /// Marks `name` as caller-scoped: the hygiene pass leaves it capturable.
    pub fn unhygienic(mut self, name: impl Into<String>) -> Self {
        self.unhygienic.insert(name.into());
        self
    }

    pub fn template(&self) -> &Quoted {
        &self.template
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn unhygienic_names(&self) -> &BTreeSet<String> {
        &self.unhygienic
    }

    pub fn into_parts(self) -> (Quoted, Bindings, BTreeSet<String>) {
        (self.template, self.bindings, self.unhygienic)
    }
}

// ============================================================================
// TRACE
// ============================================================================

/// A single macro expansion step, for traceability.
#[derive(Debug, Clone)]
pub struct ExpansionStep {
    pub macro_name: String,
    /// Index of the clause that matched.
    pub clause: usize,
    /// Hygiene tag allocated for this expansion.
    pub tag: u64,
    /// Transitions already taken on the path to this call.
    pub depth: usize,
    pub input: Node,
    pub output: Node,
}

impl ExpansionStep {
    /// Line diff between the tree forms of input and output.
    pub fn diff(&self) -> String {
        let before = self.input.tree();
        let after = self.output.tree();
        let changeset = Changeset::new(before.trim_end(), after.trim_end(), "\n");
        let mut out = String::new();
        for diff in &changeset.diffs {
            let (marker, text) = match diff {
                Difference::Same(text) => ("  ", text),
                Difference::Add(text) => ("+ ", text),
                Difference::Rem(text) => ("- ", text),
            };
            for line in text.lines() {
                out.push_str(marker);
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

impl fmt::Display for ExpansionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (clause {}, tag {}): {} => {}",
            self.depth, self.macro_name, self.clause, self.tag, self.input, self.output
        )
    }
}
