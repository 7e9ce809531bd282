//! # Splice Macro Expansion System
//!
//! This module is responsible for the purely syntactic transformation of a
//! tree before anything evaluates it. Macros rewrite matching calls into
//! simpler forms until only terminal primitives, ordinary calls, literals and
//! bindings remain.
//!
//! ## Core Principles
//!
//! - **Syntactic Only**: transformers see unexpanded argument trees, never values.
//! - **Pure Transformation**: a transformer maps arguments to a quoted template
//!   plus bindings; the driver does the rest.
//! - **Hygienic**: names a template introduces get a fresh scope per expansion.
//! - **Inspectable**: expansions can be traced step by step.
//!
//! ## Pipeline for one call
//!
//! 1. [`MacroRegistry::lookup`] picks the first clause whose [`Pattern`] matches.
//! 2. The clause's transformer returns a [`MacroOutput`].
//! 3. [`hygiene::sanitize`] retags the template's bindings.
//! 4. [`unquote`] fills the placeholders.
//! 5. The result replaces the call and is expanded again.

pub mod context;
pub mod expander;
pub mod hygiene;
pub mod quote;
pub mod registry;
pub mod std;
pub mod substitute;
pub mod types;

pub use context::ExpansionState;
pub use expander::{expand, is_fully_expanded, Expanded, Expander};
pub use quote::{quote, Quoted};
pub use registry::{MacroRegistry, DEFAULT_PRIMITIVES};
pub use self::std::register_std_macros;
pub use substitute::{substitute, unquote, Bindings};
pub use types::{
    Arity, Clause, ClauseMatch, ExpansionStep, MacroDef, MacroOutput, Pattern, Shape, Transformer,
};
