//! Unified, `miette`-based diagnostics for the splice engine.
//!
//! Every failure of quoting, substitution, registration or expansion is a
//! [`SpliceError`]. Nothing is recovered internally: the first error aborts the
//! expansion and reaches the caller unchanged.
//!
//! # Error Construction
//!
//! - Message-only variants go through `err_msg!`:
//!   `err_msg!(InvariantViolation, "placeholder `{}` survived", id)`
//! - Structured variants are built directly and refined with
//!   [`SpliceError::with_span`], [`SpliceError::with_help`] and
//!   [`SpliceError::with_source`].
//!
//! The engine has no source text of its own. An external parser that does can
//! attach it with `with_source`, and miette will then render labelled spans.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::ast::Span;

pub type SourceArc = Arc<NamedSource<String>>;

// ============================================================================
// ERROR CLASSIFICATION
// ============================================================================

/// Field-less mirror of the [`SpliceError`] variants, for matching in callers
/// and tests without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DuplicateUnquoteTarget,
    MalformedUnquote,
    UnresolvedPlaceholder,
    NoMatchingClause,
    ExpansionDepthExceeded,
    ReservedName,
    Transform,
    Config,
    InvariantViolation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DuplicateUnquoteTarget => "duplicate_unquote_target",
            ErrorKind::MalformedUnquote => "malformed_unquote",
            ErrorKind::UnresolvedPlaceholder => "unresolved_placeholder",
            ErrorKind::NoMatchingClause => "no_matching_clause",
            ErrorKind::ExpansionDepthExceeded => "expansion_depth_exceeded",
            ErrorKind::ReservedName => "reserved_name",
            ErrorKind::Transform => "transform",
            ErrorKind::Config => "config",
            ErrorKind::InvariantViolation => "invariant_violation",
        }
    }

    /// True for errors that mean the engine itself is broken.
    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorKind::InvariantViolation)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ERROR CONTEXT
// ============================================================================

/// Where an error happened and how to fix it.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub source: Option<SourceArc>,
    pub span: Option<Span>,
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn at(span: Option<Span>) -> Self {
        Self {
            span,
            ..Self::default()
        }
    }
}

// ============================================================================
// THE ERROR TYPE
// ============================================================================

#[derive(Debug, Error)]
pub enum SpliceError {
    #[error("duplicate unquote target `{target}` in template")]
    DuplicateUnquoteTarget { target: String, ctx: ErrorContext },

    #[error("malformed unquote: {message}")]
    MalformedUnquote { message: String, ctx: ErrorContext },

    #[error("unresolved placeholder `{target}`")]
    UnresolvedPlaceholder { target: String, ctx: ErrorContext },

    #[error("no clause of macro `{macro_name}` matches {arity} argument(s): {node}")]
    NoMatchingClause {
        macro_name: String,
        arity: usize,
        node: String,
        ctx: ErrorContext,
    },

    #[error("macro expansion depth limit ({limit}) exceeded: {}", .path.join(" -> "))]
    ExpansionDepthExceeded {
        limit: usize,
        path: Vec<String>,
        ctx: ErrorContext,
    },

    #[error("`{name}` is reserved and cannot be registered as a macro")]
    ReservedName { name: String, ctx: ErrorContext },

    #[error("transformer failed{}: {message}", in_macro(.macro_name))]
    Transform {
        message: String,
        macro_name: Option<String>,
        ctx: ErrorContext,
    },

    #[error("configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    #[error("internal invariant violated: {message}")]
    InvariantViolation { message: String, ctx: ErrorContext },
}

fn in_macro(name: &Option<String>) -> String {
    name.as_ref()
        .map(|n| format!(" in macro `{}`", n))
        .unwrap_or_default()
}

impl SpliceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpliceError::DuplicateUnquoteTarget { .. } => ErrorKind::DuplicateUnquoteTarget,
            SpliceError::MalformedUnquote { .. } => ErrorKind::MalformedUnquote,
            SpliceError::UnresolvedPlaceholder { .. } => ErrorKind::UnresolvedPlaceholder,
            SpliceError::NoMatchingClause { .. } => ErrorKind::NoMatchingClause,
            SpliceError::ExpansionDepthExceeded { .. } => ErrorKind::ExpansionDepthExceeded,
            SpliceError::ReservedName { .. } => ErrorKind::ReservedName,
            SpliceError::Transform { .. } => ErrorKind::Transform,
            SpliceError::Config { .. } => ErrorKind::Config,
            SpliceError::InvariantViolation { .. } => ErrorKind::InvariantViolation,
        }
    }

    pub fn ctx(&self) -> &ErrorContext {
        match self {
            SpliceError::DuplicateUnquoteTarget { ctx, .. }
            | SpliceError::MalformedUnquote { ctx, .. }
            | SpliceError::UnresolvedPlaceholder { ctx, .. }
            | SpliceError::NoMatchingClause { ctx, .. }
            | SpliceError::ExpansionDepthExceeded { ctx, .. }
            | SpliceError::ReservedName { ctx, .. }
            | SpliceError::Transform { ctx, .. }
            | SpliceError::Config { ctx, .. }
            | SpliceError::InvariantViolation { ctx, .. } => ctx,
        }
    }

    fn ctx_mut(&mut self) -> &mut ErrorContext {
        match self {
            SpliceError::DuplicateUnquoteTarget { ctx, .. }
            | SpliceError::MalformedUnquote { ctx, .. }
            | SpliceError::UnresolvedPlaceholder { ctx, .. }
            | SpliceError::NoMatchingClause { ctx, .. }
            | SpliceError::ExpansionDepthExceeded { ctx, .. }
            | SpliceError::ReservedName { ctx, .. }
            | SpliceError::Transform { ctx, .. }
            | SpliceError::Config { ctx, .. }
            | SpliceError::InvariantViolation { ctx, .. } => ctx,
        }
    }

    /// Sets the span unless one is already recorded.
    pub fn with_span(mut self, span: Option<Span>) -> Self {
        let ctx = self.ctx_mut();
        if ctx.span.is_none() {
            ctx.span = span;
        }
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.ctx_mut().help = Some(help.into());
        self
    }

    /// Attaches the caller's source text so spans render as labels.
    pub fn with_source(mut self, name: impl AsRef<str>, text: impl Into<String>) -> Self {
        self.ctx_mut().source = Some(Arc::new(NamedSource::new(name, text.into())));
        self
    }

    /// Names the macro a transformer error came from, if the transformer did not.
    pub fn in_macro(mut self, name: &str) -> Self {
        if let SpliceError::Transform { macro_name, .. } = &mut self {
            if macro_name.is_none() {
                *macro_name = Some(name.to_string());
            }
        }
        self
    }

    fn default_help(&self) -> Option<&'static str> {
        match self {
            SpliceError::DuplicateUnquoteTarget { .. } => {
                Some("give every unquote in one template a distinct identifier")
            }
            SpliceError::UnresolvedPlaceholder { .. } => {
                Some("the transformer must bind every unquote target of its template")
            }
            SpliceError::NoMatchingClause { .. } => {
                Some("check the arity and argument shapes the macro's clauses accept")
            }
            SpliceError::ExpansionDepthExceeded { .. } => {
                Some("a macro keeps producing calls to itself; make its recursion terminate")
            }
            SpliceError::InvariantViolation { .. } => {
                Some("this is an engine bug, not a problem with the input")
            }
            _ => None,
        }
    }
}

impl Diagnostic for SpliceError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!("splice::{}", self.kind())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        if let Some(help) = &self.ctx().help {
            return Some(Box::new(help));
        }
        self.default_help()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.ctx();
        // Labels without source text cannot be rendered.
        ctx.source.as_ref()?;
        let span = ctx.span?;
        let label = LabeledSpan::new(Some(self.kind().to_string()), span.start, span.label_len());
        Some(Box::new(std::iter::once(label)))
    }
}

/// Constructs a message-carrying `SpliceError` variant with no context.
///
/// Supports `format!` arguments after the message.
#[macro_export]
macro_rules! err_msg {
    (Transform, $($arg:tt)+) => {
        $crate::SpliceError::Transform {
            message: format!($($arg)+),
            macro_name: None,
            ctx: $crate::ErrorContext::none(),
        }
    };
    (Config, $($arg:tt)+) => {
        $crate::SpliceError::Config {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    ($variant:ident, $($arg:tt)+) => {
        $crate::SpliceError::$variant {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::none(),
        }
    };
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    #[test]
    fn err_msg_formats_arguments() {
        let err = err_msg!(InvariantViolation, "placeholder `{}` survived", "x");
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert_eq!(
            err.to_string(),
            "internal invariant violated: placeholder `x` survived"
        );
    }

    #[test]
    fn transform_error_names_macro_once() {
        let err = err_msg!(Transform, "bad input").in_macro("if").in_macro("unless");
        assert_eq!(err.to_string(), "transformer failed in macro `if`: bad input");
    }

    #[test]
    fn report_renders_source_label_and_help() {
        let err = SpliceError::NoMatchingClause {
            macro_name: "say".to_string(),
            arity: 1,
            node: "say(-(1, 2))".to_string(),
            ctx: ErrorContext::none(),
        }
        .with_span(Some(Span { start: 0, end: 12 }))
        .with_source("input.ex", "say(1 - 2)  ");
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("no_matching_clause"));
        assert!(output.contains("check the arity"));
    }

    #[test]
    fn with_span_keeps_first_span() {
        let err = err_msg!(MalformedUnquote, "oops")
            .with_span(Some(Span { start: 1, end: 2 }))
            .with_span(Some(Span { start: 5, end: 9 }));
        assert_eq!(err.ctx().span, Some(Span { start: 1, end: 2 }));
    }
}
