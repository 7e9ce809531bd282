//! Expansion driver.
//!
//! Walks a tree top-down. A call whose operator names a registered macro is
//! rewritten (lookup, transformer, hygiene, substitution) and the replacement
//! is walked again one level deeper; terminal primitives and ordinary calls
//! are kept and only their children are walked. Because every replacement is
//! re-scanned before the walk moves on, one traversal reaches the fixpoint,
//! which a second read-only traversal then verifies.
//!
//! ## Recursion and Depth
//!
//! Depth is the number of rewrites on the path from the root to the current
//! node. Arguments of a rewritten call inherit the depth of the rewrite that
//! produced them. Exceeding [`ExpansionConfig::max_depth`] fails with
//! `ExpansionDepthExceeded` and the chain of macro names on the path.

use std::sync::Arc;

use crate::ast::{Call, Node, Operator};
use crate::config::ExpansionConfig;
use crate::macros::context::{ExpansionContext, ExpansionState};
use crate::macros::hygiene::{sanitize, HygieneScope};
use crate::macros::registry::MacroRegistry;
use crate::macros::substitute::unquote;
use crate::macros::types::ExpansionStep;
use crate::{err_msg, ErrorContext, SpliceError};

// =============================
// Public API for macro expansion
// =============================

/// Expands `root` to its fixpoint against `registry` with default settings.
///
/// # Examples
///
/// ```rust
/// use splice::ast::Node;
/// use splice::macros::{expand, register_std_macros, MacroRegistry};
/// let mut registry = MacroRegistry::new();
/// register_std_macros(&mut registry).unwrap();
/// let call = Node::call("unless", vec![
///     Node::bool(false),
///     Node::do_block(vec![Node::string("entered")]),
/// ]);
/// let expanded = expand(&call, &registry).unwrap();
/// assert_eq!(expanded.operator_name(), Some("case"));
/// ```
pub fn expand(root: &Node, registry: &MacroRegistry) -> Result<Node, SpliceError> {
    Expander::new(registry).expand(root)
}

/// True when no call in `node` names a macro of `registry`.
pub fn is_fully_expanded(node: &Node, registry: &MacroRegistry) -> bool {
    node.count_calls(|call| call.operator_name().is_some_and(|name| registry.is_macro(name))) == 0
}

/// The result of a traced expansion.
#[derive(Debug, Clone)]
pub struct Expanded {
    pub node: Node,
    /// Matched→Substituted transitions over the whole tree.
    pub transitions: usize,
    /// One step per rewrite, in the order they happened; empty unless
    /// `record_trace` is set.
    pub trace: Vec<ExpansionStep>,
}

/// Expands trees against a borrowed, read-only registry.
#[derive(Debug, Clone)]
pub struct Expander<'r> {
    registry: &'r MacroRegistry,
    config: ExpansionConfig,
}

impl<'r> Expander<'r> {
    pub fn new(registry: &'r MacroRegistry) -> Self {
        Expander {
            registry,
            config: ExpansionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExpansionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    /// Expands `root` until no macro call remains.
    pub fn expand(&self, root: &Node) -> Result<Node, SpliceError> {
        self.expand_traced(root).map(|expanded| expanded.node)
    }

    /// Like [`Expander::expand`], also reporting transitions and the trace.
    ///
    /// # Errors
    /// `Config` when the configured depth is outside the supported range,
    /// before anything is expanded.
    pub fn expand_traced(&self, root: &Node) -> Result<Expanded, SpliceError> {
        self.config.validate()?;
        let mut ctx = ExpansionContext::new(self.registry, self.config.record_trace);
        let result = self
            .expand_node(root, &mut ctx, 0)
            .and_then(|node| self.verify(node));
        match result {
            Ok(node) => {
                tracing::debug!(transitions = ctx.transitions(), "expansion reached fixpoint");
                Ok(Expanded {
                    node,
                    transitions: ctx.transitions(),
                    trace: ctx.into_trace(),
                })
            }
            Err(err) => {
                ctx.transition(ExpansionState::Failed);
                tracing::debug!(error = %err, path = ?ctx.path(), "expansion failed");
                Err(err)
            }
        }
    }

    /// Rewrites `node` once if it is a macro call, without walking the result.
    ///
    /// The rewrite is sanitized and substituted exactly as in a full
    /// expansion. Any other node is returned unchanged.
    pub fn expand_once(&self, node: &Node) -> Result<Node, SpliceError> {
        let Node::Call(call) = node else {
            return Ok(node.clone());
        };
        let Some(name) = call.operator_name() else {
            return Ok(node.clone());
        };
        if !self.registry.is_macro(name) {
            return Ok(node.clone());
        }
        let mut ctx = ExpansionContext::new(self.registry, false);
        self.rewrite(name, call, &mut ctx, 0)
    }

    // =============================
    // Internal expansion helpers
    // =============================

    fn expand_node(
        &self,
        node: &Node,
        ctx: &mut ExpansionContext<'r>,
        depth: usize,
    ) -> Result<Node, SpliceError> {
        match node {
            Node::Literal(_) | Node::Binding(_) => Ok(node.clone()),
            Node::Placeholder(id) => Err(err_msg!(
                InvariantViolation,
                "placeholder `{}` reached the expansion driver",
                id
            )),
            Node::Call(call) => {
                ctx.transition(ExpansionState::Scanning);
                match call.operator_name() {
                    Some(name) if ctx.registry().is_macro(name) => {
                        self.expand_macro_call(name, call, ctx, depth)
                    }
                    Some(name) if ctx.registry().is_primitive(name) => {
                        ctx.transition(ExpansionState::Terminal);
                        self.expand_children(call, ctx, depth)
                    }
                    _ => self.expand_children(call, ctx, depth),
                }
            }
        }
    }

    /// Expands a macro call and every macro call its rewrites produce at the
    /// same position. The chain is walked in a loop; only children recurse.
    fn expand_macro_call(
        &self,
        name: &str,
        call: &Call,
        ctx: &mut ExpansionContext<'r>,
        depth: usize,
    ) -> Result<Node, SpliceError> {
        let entered = ctx.path().len();
        let mut depth = depth;
        let mut current = self.rewrite_checked(name, call, ctx, depth)?;
        loop {
            depth += 1;
            let next = match &current {
                Node::Call(call) => match call.operator_name() {
                    Some(name) if ctx.registry().is_macro(name) => {
                        ctx.transition(ExpansionState::Scanning);
                        Some(self.rewrite_checked(name, call, ctx, depth)?)
                    }
                    _ => None,
                },
                _ => None,
            };
            match next {
                Some(replacement) => current = replacement,
                None => break,
            }
        }
        let expanded = self.expand_node(&current, ctx, depth)?;
        ctx.truncate_path(entered);
        Ok(expanded)
    }

    /// Depth guard, then one rewrite. On success `name` joins the path.
    fn rewrite_checked(
        &self,
        name: &str,
        call: &Call,
        ctx: &mut ExpansionContext<'r>,
        depth: usize,
    ) -> Result<Node, SpliceError> {
        if depth >= self.config.max_depth {
            let mut path = ctx.path().to_vec();
            path.push(name.to_string());
            return Err(SpliceError::ExpansionDepthExceeded {
                limit: self.config.max_depth,
                path,
                ctx: ErrorContext::at(call.meta().span),
            });
        }
        ctx.transition(ExpansionState::Matched);
        let replacement = self.rewrite(name, call, ctx, depth)?;
        ctx.transition(ExpansionState::Substituted);
        ctx.enter(name);
        Ok(replacement)
    }

    /// One Matched→Substituted step: lookup, transform, sanitize, substitute.
    fn rewrite(
        &self,
        name: &str,
        call: &Call,
        ctx: &mut ExpansionContext<'r>,
        depth: usize,
    ) -> Result<Node, SpliceError> {
        let span = call.meta().span;
        let Some(matched) = ctx.registry().lookup(name, call.args()) else {
            return Err(SpliceError::NoMatchingClause {
                macro_name: name.to_string(),
                arity: call.arity(),
                node: call.to_string(),
                ctx: ErrorContext::at(span),
            });
        };

        let output = matched
            .clause
            .transformer
            .apply(call.args())
            .map_err(|e| e.in_macro(name).with_span(span))?;
        let (template, bindings, opt_out) = output.into_parts();

        let tag = ctx.fresh_tag();
        let sanitized = sanitize(template, &HygieneScope::new(tag, call, &opt_out));
        let replacement = unquote(&sanitized, &bindings).map_err(|e| {
            e.with_span(span)
                .with_help(format!("macro `{}` must bind every unquote target", name))
        })?;

        tracing::debug!(
            macro_name = name,
            clause = matched.index,
            tag,
            depth,
            "expanded macro call"
        );
        ctx.record(|| ExpansionStep {
            macro_name: name.to_string(),
            clause: matched.index,
            tag,
            depth,
            input: Node::Call(call.clone()),
            output: replacement.clone(),
        });
        Ok(replacement)
    }

    fn expand_children(
        &self,
        call: &Call,
        ctx: &mut ExpansionContext<'r>,
        depth: usize,
    ) -> Result<Node, SpliceError> {
        let operator = match call.operator() {
            Operator::Symbol(_) => call.operator().clone(),
            Operator::Node(inner) => Operator::Node(Arc::new(self.expand_node(inner, ctx, depth)?)),
        };
        let mut args = Vec::with_capacity(call.arity());
        for arg in call.args() {
            args.push(self.expand_node(arg, ctx, depth)?);
        }
        Ok(Node::Call(Call::new(operator, call.meta().clone(), args)))
    }

    /// Fixpoint check: no placeholder and no macro call may survive.
    fn verify(&self, node: Node) -> Result<Node, SpliceError> {
        if !self.config.verify_fixpoint {
            return Ok(node);
        }
        let mut violation = None;
        node.walk(&mut |n| {
            if violation.is_some() {
                return;
            }
            match n {
                Node::Placeholder(id) => {
                    violation = Some(format!("placeholder `{}` survived expansion", id));
                }
                Node::Call(call) => {
                    let surviving = call
                        .operator_name()
                        .filter(|name| self.registry.is_macro(name));
                    if let Some(name) = surviving {
                        violation =
                            Some(format!("macro call `{}` survived expansion: {}", name, call));
                    }
                }
                Node::Literal(_) | Node::Binding(_) => {}
            }
        });
        match violation {
            Some(message) => Err(err_msg!(InvariantViolation, "{}", message)),
            None => Ok(node),
        }
    }
}
