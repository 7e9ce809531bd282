//! # Splice Test Helpers
//!
//! Shared fixtures for the integration suites: a registry with the standard
//! macros, a tree assertion that prints a line diff, and a tiny evaluator for
//! expanded trees so tests can check what an expansion *means*.

#![allow(dead_code)]

use std::collections::HashMap;

use difference::{Changeset, Difference};
use splice::ast::{Binding, Literal, Node};
use splice::config::ExpansionConfig;
use splice::macros::{register_std_macros, Expanded, Expander, MacroRegistry};

pub fn std_registry() -> MacroRegistry {
    let mut registry = MacroRegistry::new();
    register_std_macros(&mut registry).expect("standard macros register");
    registry
}

/// Expands with the trace on, so tests can read the hygiene tag of each step.
pub fn expand_traced(node: &Node, registry: &MacroRegistry) -> Expanded {
    Expander::new(registry)
        .with_config(ExpansionConfig::default().with_trace(true))
        .expand_traced(node)
        .expect("expansion succeeds")
}

/// Structural equality with a readable failure.
pub fn assert_tree_eq(actual: &Node, expected: &Node) {
    if actual == expected {
        return;
    }
    let expected_tree = expected.tree();
    let actual_tree = actual.tree();
    let changeset = Changeset::new(&expected_tree, &actual_tree, "\n");
    let mut report = String::new();
    for diff in &changeset.diffs {
        let (marker, text) = match diff {
            Difference::Same(text) => ("  ", text),
            Difference::Add(text) => ("+ ", text),
            Difference::Rem(text) => ("- ", text),
        };
        for line in text.lines() {
            report.push_str(marker);
            report.push_str(line);
            report.push('\n');
        }
    }
    panic!("trees differ (- expected, + actual):\n{}", report);
}

// ============================================================================
// TEST-ONLY EVALUATOR
// ============================================================================

/// Variables are keyed by name *and* scope, exactly as hygiene intends.
pub type Env = HashMap<Binding, Literal>;

pub fn eval(node: &Node) -> Result<Literal, String> {
    eval_in(node, &mut Env::new())
}

pub fn eval_in(node: &Node, env: &mut Env) -> Result<Literal, String> {
    match node {
        Node::Literal(lit) => Ok(lit.clone()),
        Node::Binding(binding) => env
            .get(binding)
            .cloned()
            .ok_or_else(|| format!("unbound variable {}", binding)),
        Node::Placeholder(id) => Err(format!("placeholder {} reached evaluation", id)),
        Node::Call(call) => {
            let args = call.args();
            match call.operator_name() {
                Some("__block__") => {
                    let mut last = Literal::atom("nil");
                    for arg in args {
                        last = eval_in(arg, env)?;
                    }
                    Ok(last)
                }
                Some("=") => {
                    let [Node::Binding(target), value] = args else {
                        return Err(format!("bad assignment {}", call));
                    };
                    let value = eval_in(value, env)?;
                    env.insert(target.clone(), value.clone());
                    Ok(value)
                }
                Some("!") => match eval_in(&args[0], env)? {
                    Literal::Bool(b) => Ok(Literal::Bool(!b)),
                    Literal::Atom(a) if a == "nil" => Ok(Literal::Bool(true)),
                    other => Err(format!("! applied to {}", other)),
                },
                Some(op @ ("+" | "-" | "*")) => {
                    let (Literal::Integer(a), Literal::Integer(b)) =
                        (eval_in(&args[0], env)?, eval_in(&args[1], env)?)
                    else {
                        return Err(format!("{} expects integers", op));
                    };
                    Ok(Literal::Integer(match op {
                        "+" => a + b,
                        "-" => a - b,
                        _ => a * b,
                    }))
                }
                Some("case") => eval_case(args, env),
                other => Err(format!("cannot evaluate operator {:?}", other)),
            }
        }
    }
}

fn eval_case(args: &[Node], env: &mut Env) -> Result<Literal, String> {
    let [subject, clauses] = args else {
        return Err("case expects a subject and a do block".to_string());
    };
    let value = eval_in(subject, env)?;
    for clause in clauses.args() {
        let [pattern, body] = clause.args() else {
            return Err(format!("bad case clause {}", clause));
        };
        match pattern {
            Node::Binding(binding) => {
                if binding.name != "_" {
                    env.insert(binding.clone(), value.clone());
                }
                return eval_in(body, env);
            }
            Node::Literal(lit) if *lit == value => return eval_in(body, env),
            _ => {}
        }
    }
    Err(format!("no case clause matches {}", value))
}
