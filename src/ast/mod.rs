//! Node model for the splice engine
//!
//! Every expression the engine sees is one of four node shapes: a literal, a
//! call, a placeholder left behind by quoting, or a binding name carrying a
//! hygiene scope. The set is closed; every consumer matches it exhaustively.
//!
//! Nodes are immutable values. Call arguments live behind an `Arc<[Node]>`, so
//! a transformation that rebuilds one call shares every untouched sub-tree
//! with the tree it came from.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Represents a span in the caller's source text.
///
/// The engine never reads source itself; spans are carried through expansion
/// so that errors and traces can point back at the text an external parser
/// built the tree from.
///
/// # Examples
///
/// ```rust
/// use splice::ast::Span;
/// let span = Span { start: 0, end: 5 };
/// assert_eq!(span.len(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of a diagnostic label: the length, but at least one column.
    pub fn label_len(&self) -> usize {
        self.len().max(1)
    }
}

/// Hygiene tag of a binding name.
///
/// `Caller` marks identifiers written at the call site. `Macro(n)` marks
/// identifiers introduced by the template of expansion number `n`; tags are
/// never reused within one expansion context.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Scope {
    #[default]
    Caller,
    Macro(u64),
}

/// Atomic, self-representing values.
///
/// Floats compare by bit pattern, so `NaN` equals itself and `0.0` differs
/// from `-0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
    /// A symbol used as a value, e.g. `:ok` or `nil`.
    Atom(String),
    Pair(Box<Literal>, Box<Literal>),
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Integer(a), Literal::Integer(b)) => a == b,
            (Literal::Float(a), Literal::Float(b)) => a.to_bits() == b.to_bits(),
            (Literal::Bool(a), Literal::Bool(b)) => a == b,
            (Literal::String(a), Literal::String(b)) => a == b,
            (Literal::Atom(a), Literal::Atom(b)) => a == b,
            (Literal::Pair(a1, b1), Literal::Pair(a2, b2)) => a1 == a2 && b1 == b2,
            _ => false,
        }
    }
}

impl Eq for Literal {}

/// An identifier together with the scope it was introduced in.
///
/// Two bindings denote the same logical variable only when both the name and
/// the scope agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    pub scope: Scope,
}

/// Bookkeeping attached to a call. Never part of structural equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Source position of the call, if the tree builder knew it.
    pub span: Option<Span>,
    /// Expansion that produced this call; `None` for caller-written calls.
    pub context: Option<Scope>,
    /// Free-form entries for external collaborators.
    pub extra: im::HashMap<String, Literal>,
}

/// The head of a call: a plain symbol or an arbitrary nested node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operator {
    Symbol(String),
    Node(Arc<Node>),
}

/// The uniform three-part shape every non-literal expression reduces to.
///
/// Fields are private: once built, the argument count cannot change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    operator: Operator,
    meta: Metadata,
    args: Arc<[Node]>,
}

/// The universal expression representation.
///
/// # Examples
///
/// ```rust
/// use splice::ast::Node;
/// let sum = Node::binop("+", Node::int(1), Node::var("x"));
/// assert_eq!(sum.to_string(), "+(1, x)");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Literal(Literal),
    Call(Call),
    /// Injection point left by quoting; must not survive substitution.
    Placeholder(String),
    Binding(Binding),
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Metadata {
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_context(mut self, scope: Scope) -> Self {
        self.context = Some(scope);
        self
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: Literal) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Literal> {
        self.extra.get(key)
    }
}

impl Operator {
    /// Returns the symbol name, if this operator is a plain symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Operator::Symbol(name) => Some(name),
            Operator::Node(_) => None,
        }
    }
}

impl PartialEq for Call {
    fn eq(&self, other: &Self) -> bool {
        self.operator == other.operator && self.args == other.args
    }
}

impl Call {
    pub fn new(operator: Operator, meta: Metadata, args: impl Into<Arc<[Node]>>) -> Self {
        Call {
            operator,
            meta,
            args: args.into(),
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Symbol name of the operator; `None` for nested-node operators.
    pub fn operator_name(&self) -> Option<&str> {
        self.operator.as_symbol()
    }

    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    pub fn args(&self) -> &[Node] {
        &self.args
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Same operator and arguments, different bookkeeping.
    pub fn with_meta(&self, meta: Metadata) -> Call {
        Call {
            operator: self.operator.clone(),
            meta,
            args: Arc::clone(&self.args),
        }
    }
}

impl Node {
    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Node::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Node::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_binding(&self) -> Option<&Binding> {
        match self {
            Node::Binding(binding) => Some(binding),
            _ => None,
        }
    }

    /// Operator symbol of a call node.
    pub fn operator_name(&self) -> Option<&str> {
        self.as_call().and_then(Call::operator_name)
    }

    /// Arguments of a call node; empty for every other shape.
    pub fn args(&self) -> &[Node] {
        match self {
            Node::Call(call) => call.args(),
            _ => &[],
        }
    }

    pub fn span(&self) -> Option<Span> {
        self.as_call().and_then(|call| call.meta().span)
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal(_))
    }

    /// Visits every node in pre-order, nested operators before arguments.
    pub fn walk<F: FnMut(&Node)>(&self, f: &mut F) {
        f(self);
        if let Node::Call(call) = self {
            if let Operator::Node(op) = call.operator() {
                op.walk(f);
            }
            for arg in call.args() {
                arg.walk(f);
            }
        }
    }

    pub fn contains_placeholder(&self) -> bool {
        let mut found = false;
        self.walk(&mut |node| found |= matches!(node, Node::Placeholder(_)));
        found
    }

    /// Counts call nodes satisfying `pred` anywhere in the tree.
    pub fn count_calls<P: Fn(&Call) -> bool>(&self, pred: P) -> usize {
        let mut count = 0;
        self.walk(&mut |node| {
            if let Node::Call(call) = node {
                if pred(call) {
                    count += 1;
                }
            }
        });
        count
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<Literal> for Node {
    fn from(lit: Literal) -> Self {
        Node::Literal(lit)
    }
}

impl From<Binding> for Node {
    fn from(binding: Binding) -> Self {
        Node::Binding(binding)
    }
}

impl From<Call> for Node {
    fn from(call: Call) -> Self {
        Node::Call(call)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Literal(Literal::Integer(value))
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Literal(Literal::Float(value))
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Literal(Literal::Bool(value))
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Literal(Literal::String(value.to_string()))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Literal(Literal::String(value))
    }
}

impl From<&str> for Operator {
    fn from(name: &str) -> Self {
        Operator::Symbol(name.to_string())
    }
}

impl From<Node> for Operator {
    fn from(node: Node) -> Self {
        Operator::Node(Arc::new(node))
    }
}

// ============================================================================
// MODULE EXPORTS
// ============================================================================

pub mod builder;
pub mod pretty;
