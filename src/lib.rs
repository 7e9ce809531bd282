pub use crate::diagnostics::{ErrorContext, ErrorKind, SpliceError};

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod macros;
