//! Hygiene sanitizer.
//!
//! Runs over a transformer's quoted template *before* substitution. Every
//! binding in the template text is retagged with the fresh scope of this
//! expansion; placeholders are left alone, so whatever the caller passed in
//! keeps the scope it already had once substitution fills them.
//!
//! A transformer may opt a name out with [`crate::macros::MacroOutput::unhygienic`].
//! Opted-out bindings get the scope of the call site instead, which makes them
//! visible to (and able to capture) the caller's identifiers of that name.
//!
//! Calls in the template are stamped with the expansion scope in their
//! metadata. A macro call produced by this template therefore knows its own
//! caller scope when it is expanded in turn.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::ast::{Binding, Call, Node, Operator, Scope, Span};
use crate::macros::quote::Quoted;

/// Everything the sanitizer needs to know about one expansion occurrence.
#[derive(Debug, Clone, Copy)]
pub struct HygieneScope<'a> {
    /// Fresh tag allocated for this expansion.
    pub tag: u64,
    /// Scope of the call being expanded.
    pub caller: Scope,
    /// Names the transformer opted out of hygiene.
    pub opt_out: &'a BTreeSet<String>,
    /// Span of the call site, inherited by template calls that have none.
    pub call_span: Option<Span>,
}

impl<'a> HygieneScope<'a> {
    pub fn new(tag: u64, call: &Call, opt_out: &'a BTreeSet<String>) -> Self {
        HygieneScope {
            tag,
            caller: caller_scope(call),
            opt_out,
            call_span: call.meta().span,
        }
    }

    fn scope_for(&self, name: &str) -> Scope {
        if self.opt_out.contains(name) {
            self.caller
        } else {
            Scope::Macro(self.tag)
        }
    }
}

/// Scope a call was written in: the expansion that produced it, or the caller.
pub fn caller_scope(call: &Call) -> Scope {
    call.meta().context.unwrap_or(Scope::Caller)
}

/// Retags the bindings of a template for one expansion.
pub fn sanitize(quoted: Quoted, scope: &HygieneScope<'_>) -> Quoted {
    let tree = sanitize_node(quoted.tree(), scope);
    quoted.map_tree(tree)
}

fn sanitize_node(node: &Node, scope: &HygieneScope<'_>) -> Node {
    match node {
        Node::Literal(_) | Node::Placeholder(_) => node.clone(),
        Node::Binding(binding) => Node::Binding(Binding {
            name: binding.name.clone(),
            scope: scope.scope_for(&binding.name),
        }),
        Node::Call(call) => {
            let operator = match call.operator() {
                Operator::Symbol(_) => call.operator().clone(),
                Operator::Node(inner) => Operator::Node(Arc::new(sanitize_node(inner, scope))),
            };
            let args: Vec<Node> = call
                .args()
                .iter()
                .map(|arg| sanitize_node(arg, scope))
                .collect();
            let mut meta = call.meta().clone().with_context(Scope::Macro(scope.tag));
            if meta.span.is_none() {
                meta.span = scope.call_span;
            }
            Node::Call(Call::new(operator, meta, args))
        }
    }
}
