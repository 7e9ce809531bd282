//! Standard macros.
//!
//! Conditionals layered on the terminal `case` primitive:
//!
//! ```text
//! unless(c, do_block(b))     => if(!(c), do_block(b))
//! if(c, do_block(b))         => case(c, do_block(->(true, b), ->(false, nil)))
//! if(c, do_block(b, e))      => case(c, do_block(->(true, b), ->(false, e)))
//! or(l, r)                   => __block__(
//!                                   =(tmp, l),
//!                                   case(tmp, do_block(->(false, r), ->(nil, r), ->(_, tmp))))
//! ```
//!
//! `tmp` in `or` is introduced by the template, so hygiene keeps it apart
//! from any `tmp` the caller passes in.

use crate::ast::Node;
use crate::macros::registry::MacroRegistry;
use crate::macros::types::{MacroOutput, Pattern, Shape};
use crate::{err_msg, SpliceError};

// ===================================================================================================
// REGISTRY: Standard Macro Registration
// ===================================================================================================

/// Registers all standard macros in the given registry.
///
/// Fails only if the registry reserves one of the names as a primitive.
pub fn register_std_macros(registry: &mut MacroRegistry) -> Result<(), SpliceError> {
    // Control flow
    registry.register(
        "if",
        Pattern::exact(2).with_arg(1, Shape::call_arity("do_block", 1)),
        expand_if,
    )?;
    registry.register(
        "if",
        Pattern::exact(2).with_arg(1, Shape::call_arity("do_block", 2)),
        expand_if,
    )?;
    registry.register(
        "unless",
        Pattern::exact(2).with_arg(1, Shape::call("do_block")),
        expand_unless,
    )?;

    // Short-circuit
    registry.register("or", Pattern::exact(2), expand_or)?;
    Ok(())
}

// ===================================================================================================
// MACRO IMPLEMENTATIONS
// ===================================================================================================

fn expand_if(args: &[Node]) -> Result<MacroOutput, SpliceError> {
    let (cond, block) = expect_two(args, "if")?;
    let Some(then_branch) = block.args().first() else {
        return Err(err_msg!(Transform, "if needs a do block with a body"));
    };
    let else_branch = block.args().get(1).cloned().unwrap_or_else(Node::nil);

    let template = Node::call(
        "case",
        vec![
            Node::unquote("cond"),
            Node::do_block(vec![
                Node::arrow(Node::bool(true), Node::unquote("then")),
                Node::arrow(Node::bool(false), Node::unquote("else")),
            ]),
        ],
    );
    Ok(MacroOutput::from_template(&template)?
        .bind("cond", cond.clone())
        .bind("then", then_branch.clone())
        .bind("else", else_branch))
}

fn expand_unless(args: &[Node]) -> Result<MacroOutput, SpliceError> {
    let (cond, block) = expect_two(args, "unless")?;
    let template = Node::call(
        "if",
        vec![
            Node::call("!", vec![Node::unquote("cond")]),
            Node::unquote("block"),
        ],
    );
    Ok(MacroOutput::from_template(&template)?
        .bind("cond", cond.clone())
        .bind("block", block.clone()))
}

fn expand_or(args: &[Node]) -> Result<MacroOutput, SpliceError> {
    let (left, right) = expect_two(args, "or")?;
    let tmp = Node::var("tmp");
    let template = Node::block(vec![
        Node::assign(tmp.clone(), Node::unquote("left")),
        Node::call(
            "case",
            vec![
                tmp.clone(),
                Node::do_block(vec![
                    Node::arrow(Node::bool(false), Node::unquote("right")),
                    Node::arrow(Node::nil(), Node::unquote("fallback")),
                    Node::arrow(Node::var("_"), tmp),
                ]),
            ],
        ),
    ]);
    Ok(MacroOutput::from_template(&template)?
        .bind("left", left.clone())
        .bind("right", right.clone())
        .bind("fallback", right.clone()))
}

// ===================================================================================================
// INTERNAL HELPERS
// ===================================================================================================

fn expect_two<'a>(args: &'a [Node], name: &str) -> Result<(&'a Node, &'a Node), SpliceError> {
    match args {
        [first, second] => Ok((first, second)),
        _ => Err(err_msg!(
            Transform,
            "{} expects 2 arguments, got {}",
            name,
            args.len()
        )),
    }
}
