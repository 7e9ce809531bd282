//! Minimal expression builder.
//!
//! Stands in for an external parser: tests and macro authors assemble trees
//! directly with these constructors. Nothing here validates shape beyond what
//! the types already enforce.

use super::{Binding, Call, Literal, Metadata, Node, Operator, Scope, Span};

/// Operator of the marker that [`crate::macros::quote`] turns into a placeholder.
pub const UNQUOTE: &str = "unquote";

impl Literal {
    pub fn atom(name: impl Into<String>) -> Self {
        Literal::Atom(name.into())
    }

    pub fn pair(left: Literal, right: Literal) -> Self {
        Literal::Pair(Box::new(left), Box::new(right))
    }
}

impl Binding {
    /// A binding written at the call site.
    pub fn caller(name: impl Into<String>) -> Self {
        Binding {
            name: name.into(),
            scope: Scope::Caller,
        }
    }

    pub fn in_scope(name: impl Into<String>, scope: Scope) -> Self {
        Binding {
            name: name.into(),
            scope,
        }
    }
}

impl Node {
    pub fn int(value: i64) -> Node {
        Node::Literal(Literal::Integer(value))
    }

    pub fn float(value: f64) -> Node {
        Node::Literal(Literal::Float(value))
    }

    pub fn bool(value: bool) -> Node {
        Node::Literal(Literal::Bool(value))
    }

    pub fn string(value: impl Into<String>) -> Node {
        Node::Literal(Literal::String(value.into()))
    }

    pub fn atom(name: impl Into<String>) -> Node {
        Node::Literal(Literal::atom(name))
    }

    pub fn nil() -> Node {
        Node::atom("nil")
    }

    pub fn pair(left: Literal, right: Literal) -> Node {
        Node::Literal(Literal::pair(left, right))
    }

    /// A caller-scoped binding name.
    pub fn var(name: impl Into<String>) -> Node {
        Node::Binding(Binding::caller(name))
    }

    pub fn scoped_var(name: impl Into<String>, scope: Scope) -> Node {
        Node::Binding(Binding::in_scope(name, scope))
    }

    pub fn placeholder(id: impl Into<String>) -> Node {
        Node::Placeholder(id.into())
    }

    /// `operator(args...)` with empty metadata.
    pub fn call(operator: impl Into<Operator>, args: Vec<Node>) -> Node {
        Node::Call(Call::new(operator.into(), Metadata::default(), args))
    }

    pub fn call_with(operator: impl Into<Operator>, meta: Metadata, args: Vec<Node>) -> Node {
        Node::Call(Call::new(operator.into(), meta, args))
    }

    /// `operator(args...)` positioned at `span`.
    pub fn call_at(operator: impl Into<Operator>, span: Span, args: Vec<Node>) -> Node {
        Node::call_with(operator, Metadata::default().with_span(span), args)
    }

    pub fn binop(operator: &str, left: Node, right: Node) -> Node {
        Node::call(operator, vec![left, right])
    }

    /// A sequence of expressions, `__block__(exprs...)`.
    pub fn block(exprs: Vec<Node>) -> Node {
        Node::call("__block__", exprs)
    }

    /// A `do:` keyword block, `do_block(body)` or `do_block(body, else_body)`.
    pub fn do_block(bodies: Vec<Node>) -> Node {
        Node::call("do_block", bodies)
    }

    /// A clause arm `->(pattern, body)`.
    pub fn arrow(pattern: Node, body: Node) -> Node {
        Node::binop("->", pattern, body)
    }

    /// A match/binding `=(target, value)`.
    pub fn assign(target: Node, value: Node) -> Node {
        Node::binop("=", target, value)
    }

    /// The marker that quoting replaces with a placeholder for `id`.
    pub fn unquote(id: impl Into<String>) -> Node {
        Node::call(UNQUOTE, vec![Node::atom(id)])
    }
}
