//! Quoting builder.
//!
//! A template is an ordinary tree in which some sub-trees are wrapped in the
//! marker `unquote(id)`. Quoting replaces each marker with `Placeholder(id)`
//! and records the ids, so the tree can later be filled in by
//! [`crate::macros::substitute::unquote`].

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ast::builder::UNQUOTE;
use crate::ast::{Call, Literal, Node, Operator, Span};
use crate::{err_msg, ErrorContext, SpliceError};

/// A template tree with its injection points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quoted {
    tree: Node,
    targets: Vec<String>,
}

impl Quoted {
    pub fn tree(&self) -> &Node {
        &self.tree
    }

    /// Placeholder ids in first-occurrence (pre-order) order.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn into_tree(self) -> Node {
        self.tree
    }

    /// Same targets, rewritten tree. Used by passes that never add or drop
    /// placeholders.
    pub(crate) fn map_tree(self, tree: Node) -> Quoted {
        Quoted {
            tree,
            targets: self.targets,
        }
    }
}

/// Converts a template into a quoted tree.
///
/// # Errors
///
/// - `DuplicateUnquoteTarget` when two markers (or placeholders) share an id.
/// - `MalformedUnquote` when an `unquote` call does not carry exactly one
///   atom or binding naming its target.
///
/// # Examples
///
/// ```rust
/// use splice::ast::Node;
/// use splice::macros::quote;
/// let template = Node::binop("+", Node::unquote("a"), Node::int(1));
/// let quoted = quote(&template).unwrap();
/// assert_eq!(quoted.tree().to_string(), "+(unquote(a), 1)");
/// assert_eq!(quoted.targets(), ["a".to_string()]);
/// ```
pub fn quote(template: &Node) -> Result<Quoted, SpliceError> {
    let mut targets = Vec::new();
    let mut seen = HashSet::new();
    let tree = quote_node(template, &mut targets, &mut seen)?;
    Ok(Quoted { tree, targets })
}

fn quote_node(
    node: &Node,
    targets: &mut Vec<String>,
    seen: &mut HashSet<String>,
) -> Result<Node, SpliceError> {
    match node {
        Node::Literal(_) | Node::Binding(_) => Ok(node.clone()),
        Node::Placeholder(id) => {
            record_target(id, None, targets, seen)?;
            Ok(node.clone())
        }
        Node::Call(call) if call.operator_name() == Some(UNQUOTE) => {
            let id = unquote_target(call)?;
            record_target(&id, call.meta().span, targets, seen)?;
            Ok(Node::Placeholder(id))
        }
        Node::Call(call) => {
            let operator = match call.operator() {
                Operator::Symbol(_) => call.operator().clone(),
                Operator::Node(inner) => {
                    Operator::Node(Arc::new(quote_node(inner, targets, seen)?))
                }
            };
            let mut args = Vec::with_capacity(call.arity());
            for arg in call.args() {
                args.push(quote_node(arg, targets, seen)?);
            }
            Ok(Node::Call(Call::new(operator, call.meta().clone(), args)))
        }
    }
}

/// Extracts the target id from an `unquote(id)` marker.
fn unquote_target(call: &Call) -> Result<String, SpliceError> {
    match call.args() {
        [Node::Literal(Literal::Atom(id))] => Ok(id.clone()),
        [Node::Binding(binding)] => Ok(binding.name.clone()),
        _ => Err(err_msg!(
            MalformedUnquote,
            "expected unquote(<identifier>), found {}",
            call
        )
        .with_span(call.meta().span)),
    }
}

fn record_target(
    id: &str,
    span: Option<Span>,
    targets: &mut Vec<String>,
    seen: &mut HashSet<String>,
) -> Result<(), SpliceError> {
    if !seen.insert(id.to_string()) {
        return Err(SpliceError::DuplicateUnquoteTarget {
            target: id.to_string(),
            ctx: ErrorContext::at(span),
        });
    }
    targets.push(id.to_string());
    Ok(())
}
