//! Registry dispatch: clause selection, reserved names, shared read-only use.

mod common;

use std::sync::Arc;

use splice::ast::Node;
use splice::macros::{expand, is_fully_expanded, MacroOutput, MacroRegistry, Pattern, Shape};
use splice::{ErrorKind, SpliceError};

fn say_clause(
    label: &'static str,
) -> impl Fn(&[Node]) -> Result<MacroOutput, SpliceError> + Send + Sync + 'static {
    move |args: &[Node]| {
        Ok(MacroOutput::from_template(&Node::call(
            "puts",
            vec![Node::string(label), Node::unquote("expr")],
        ))?
        .bind("expr", args[0].clone()))
    }
}

fn say_registry() -> MacroRegistry {
    let mut registry = MacroRegistry::new();
    registry
        .register(
            "say",
            Pattern::exact(1).with_arg(0, Shape::call_arity("+", 2)),
            say_clause("sum"),
        )
        .unwrap();
    registry
        .register(
            "say",
            Pattern::exact(1).with_arg(0, Shape::call_arity("*", 2)),
            say_clause("product"),
        )
        .unwrap();
    registry
}

#[test]
fn clauses_dispatch_on_argument_shape() {
    let registry = say_registry();
    assert_eq!(registry.clause_count("say"), 2);

    let sum = Node::call("say", vec![Node::binop("+", Node::int(1), Node::int(2))]);
    let product = Node::call("say", vec![Node::binop("*", Node::int(3), Node::int(4))]);

    assert_eq!(
        expand(&sum, &registry).unwrap().to_string(),
        r#"puts("sum", +(1, 2))"#
    );
    assert_eq!(
        expand(&product, &registry).unwrap().to_string(),
        r#"puts("product", *(3, 4))"#
    );
}

#[test]
fn unmatched_call_reports_no_matching_clause() {
    let registry = say_registry();
    let call = Node::call("say", vec![Node::binop("-", Node::int(1), Node::int(2))]);

    let err = expand(&call, &registry).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoMatchingClause);
    match err {
        SpliceError::NoMatchingClause {
            macro_name,
            arity,
            node,
            ..
        } => {
            assert_eq!(macro_name, "say");
            assert_eq!(arity, 1);
            assert_eq!(node, "say(-(1, 2))");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn wrong_arity_also_fails_to_match() {
    let registry = say_registry();
    let call = Node::call("say", vec![]);
    assert!(registry.lookup("say", call.args()).is_none());
    assert_eq!(
        expand(&call, &registry).unwrap_err().kind(),
        ErrorKind::NoMatchingClause
    );
}

#[test]
fn first_registered_clause_wins_on_overlap() {
    let mut registry = MacroRegistry::new();
    registry
        .register("m", Pattern::any(), |_: &[Node]| {
            MacroOutput::from_template(&Node::atom("first"))
        })
        .unwrap();
    registry
        .register("m", Pattern::exact(1), |_: &[Node]| {
            MacroOutput::from_template(&Node::atom("second"))
        })
        .unwrap();

    let matched = registry.lookup("m", &[Node::int(1)]).unwrap();
    assert_eq!(matched.index, 0);
    assert_eq!(
        expand(&Node::call("m", vec![Node::int(1)]), &registry).unwrap(),
        Node::atom("first")
    );
}

#[test]
fn primitives_and_unquote_are_reserved() {
    let mut registry = MacroRegistry::new();
    for name in ["case", "__block__", "=", "unquote"] {
        let err = registry
            .register(name, Pattern::any(), |_: &[Node]| {
                MacroOutput::from_template(&Node::nil())
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReservedName, "{name}");
    }
    assert!(registry.is_empty());
}

#[test]
fn custom_primitive_set_replaces_the_default() {
    let mut registry = MacroRegistry::with_primitives(["cond"]);
    assert!(registry.is_primitive("cond"));
    assert!(!registry.is_primitive("case"));
    registry
        .register("case", Pattern::any(), |_: &[Node]| {
            MacroOutput::from_template(&Node::call("cond", vec![]))
        })
        .unwrap();
    assert!(registry.is_macro("case"));
    assert!(registry
        .register("cond", Pattern::any(), |_: &[Node]| {
            MacroOutput::from_template(&Node::nil())
        })
        .is_err());
}

#[test]
fn unregister_removes_every_clause() {
    let mut registry = common::std_registry();
    assert_eq!(registry.clause_count("if"), 2);
    let removed = registry.unregister("if").unwrap();
    assert_eq!(removed.clauses.len(), 2);
    assert!(!registry.is_macro("if"));
    assert_eq!(registry.clause_count("if"), 0);
}

#[test]
fn frozen_registry_is_shared_across_threads() {
    let registry = Arc::new(common::std_registry());
    let handles: Vec<_> = (0..4i64)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let call = Node::call("or", vec![Node::bool(i % 2 == 0), Node::int(i)]);
                expand(&call, &registry)
            })
        })
        .collect();

    for handle in handles {
        let node = handle.join().unwrap().unwrap();
        assert!(is_fully_expanded(&node, &registry));
        assert_eq!(node.operator_name(), Some("__block__"));
    }
}
