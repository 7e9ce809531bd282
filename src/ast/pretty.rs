//! Diagnostic printers for nodes.
//!
//! Two forms: the one-line `Display` form (`if(x, do_block(1))`) and the
//! tree-drawing form from [`Node::tree`], with the operator as root and the
//! arguments as ordered children. Neither is meant to be parsed back.

use std::fmt::{self, Display, Formatter, Write};

use super::{Binding, Call, Literal, Node, Operator, Scope};

// ============================================================================
// ONE-LINE FORM
// ============================================================================

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(n) => write!(f, "{:?}", n),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Atom(name) if name == "nil" => f.write_str("nil"),
            Literal::Atom(name) => write!(f, ":{}", name),
            Literal::Pair(left, right) => write!(f, "{{{}, {}}}", left, right),
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Caller => f.write_str("caller"),
            Scope::Macro(tag) => write!(f, "macro#{}", tag),
        }
    }
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.scope {
            Scope::Caller => f.write_str(&self.name),
            Scope::Macro(tag) => write!(f, "{}#{}", self.name, tag),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Symbol(name) => f.write_str(name),
            Operator::Node(node) => write!(f, "({})", node),
        }
    }
}

impl Display for Call {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.operator())?;
        for (i, arg) in self.args().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(lit) => write!(f, "{}", lit),
            Node::Call(call) => write!(f, "{}", call),
            Node::Placeholder(id) => write!(f, "unquote({})", id),
            Node::Binding(binding) => write!(f, "{}", binding),
        }
    }
}

// ============================================================================
// TREE-DRAWING FORM
// ============================================================================

impl Node {
    /// Renders the node as an indented tree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use splice::ast::Node;
    /// let node = Node::call("unless", vec![
    ///     Node::bool(false),
    ///     Node::do_block(vec![Node::string("entered")]),
    /// ]);
    /// assert_eq!(
    ///     node.tree(),
    ///     "unless\n├── false\n└── do_block\n    └── \"entered\"\n"
    /// );
    /// ```
    pub fn tree(&self) -> String {
        let mut out = String::new();
        out.push_str(&head(self));
        out.push('\n');
        draw_children(self, "", &mut out);
        out
    }
}

/// Label of a node in the tree form: the operator for calls, the value otherwise.
fn head(node: &Node) -> String {
    match node {
        Node::Call(call) => call.operator().to_string(),
        other => other.to_string(),
    }
}

fn draw_children(node: &Node, prefix: &str, out: &mut String) {
    let args = node.args();
    for (i, child) in args.iter().enumerate() {
        let last = i + 1 == args.len();
        let connector = if last { "└── " } else { "├── " };
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}{}{}", prefix, connector, head(child));
        let extension = if last { "    " } else { "│   " };
        draw_children(child, &format!("{}{}", prefix, extension), out);
    }
}
