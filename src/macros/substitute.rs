//! Unquote substitutor.
//!
//! Fills the placeholders of a quoted tree from a [`Bindings`] map. The pass
//! is deep and single: a node that was substituted in is never scanned again,
//! so a binding whose value itself contains placeholders cannot recurse.

use std::sync::Arc;

use crate::ast::{Call, Node, Operator};
use crate::macros::quote::Quoted;
use crate::{ErrorContext, SpliceError};

/// Placeholder id to replacement node.
///
/// Backed by a persistent map, so cloning a set of bindings to extend it for
/// a nested template is cheap.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: im::HashMap<String, Node>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `id`. Plain Rust values are wrapped as literals.
    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.values.insert(id.into(), value.into())
    }

    pub fn with(mut self, id: impl Into<String>, value: impl Into<Node>) -> Self {
        self.insert(id, value);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.values.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for (id, value) in iter {
            bindings.insert(id, value);
        }
        bindings
    }
}

/// Realizes a quoted template.
///
/// # Errors
///
/// `UnresolvedPlaceholder` for the first placeholder whose id is not bound.
///
/// # Examples
///
/// ```rust
/// use splice::ast::Node;
/// use splice::macros::{quote, unquote, Bindings};
/// let quoted = quote(&Node::binop("*", Node::unquote("n"), Node::int(2))).unwrap();
/// let node = unquote(&quoted, &Bindings::new().with("n", 21_i64)).unwrap();
/// assert_eq!(node, Node::binop("*", Node::int(21), Node::int(2)));
/// ```
pub fn unquote(quoted: &Quoted, bindings: &Bindings) -> Result<Node, SpliceError> {
    for id in bindings.ids() {
        if !quoted.targets().contains(id) {
            tracing::trace!(id = %id, "binding has no matching placeholder");
        }
    }
    substitute(quoted.tree(), bindings)
}

/// Replaces every placeholder in `node` from `bindings`.
pub fn substitute(node: &Node, bindings: &Bindings) -> Result<Node, SpliceError> {
    match node {
        Node::Literal(_) | Node::Binding(_) => Ok(node.clone()),
        Node::Placeholder(id) => bindings
            .get(id)
            .cloned()
            .ok_or_else(|| SpliceError::UnresolvedPlaceholder {
                target: id.clone(),
                ctx: ErrorContext::none(),
            }),
        Node::Call(call) => substitute_call(call, bindings),
    }
}

fn substitute_call(call: &Call, bindings: &Bindings) -> Result<Node, SpliceError> {
    let operator = match call.operator() {
        Operator::Symbol(_) => call.operator().clone(),
        Operator::Node(inner) => Operator::Node(Arc::new(substitute(inner, bindings)?)),
    };
    let args = call
        .args()
        .iter()
        .map(|arg| substitute(arg, bindings))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.with_span(call.meta().span))?;
    Ok(Node::Call(Call::new(operator, call.meta().clone(), args)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use crate::macros::quote::quote;
    use crate::ErrorKind;

    #[test]
    fn substitution_is_deep() {
        let template = Node::call(
            "case",
            vec![
                Node::unquote("cond"),
                Node::do_block(vec![Node::arrow(Node::bool(true), Node::unquote("body"))]),
            ],
        );
        let quoted = quote(&template).unwrap();
        let bindings = Bindings::new()
            .with("cond", Node::var("ready"))
            .with("body", "go");
        let node = unquote(&quoted, &bindings).unwrap();
        assert_eq!(node.to_string(), r#"case(ready, do_block(->(true, "go")))"#);
        assert!(!node.contains_placeholder());
    }

    #[test]
    fn missing_binding_fails_fast() {
        let quoted = quote(&Node::binop("+", Node::unquote("a"), Node::unquote("b"))).unwrap();
        let err = unquote(&quoted, &Bindings::new().with("a", 1_i64)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedPlaceholder);
        assert!(matches!(
            err,
            SpliceError::UnresolvedPlaceholder { ref target, .. } if target == "b"
        ));
    }

    #[test]
    fn substituted_nodes_are_not_rescanned() {
        let quoted = quote(&Node::call("f", vec![Node::unquote("x")])).unwrap();
        // The value holds a placeholder for its own id; one pass leaves it be.
        let bindings = Bindings::new().with("x", Node::placeholder("x"));
        let node = unquote(&quoted, &bindings).unwrap();
        assert_eq!(node, Node::call("f", vec![Node::placeholder("x")]));
    }

    #[test]
    fn literal_values_are_wrapped() {
        let quoted = quote(&Node::unquote("v")).unwrap();
        let pair = Literal::pair(Literal::atom("ok"), Literal::Integer(1));
        let node = unquote(&quoted, &Bindings::new().with("v", pair.clone())).unwrap();
        assert_eq!(node, Node::Literal(pair));
    }
}
