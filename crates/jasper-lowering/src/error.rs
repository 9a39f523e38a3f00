//! Error types for class analysis and lowering
//!
//! Provides structured error types with source locations. Every error is
//! terminal for the member or class being analyzed: it unwinds the current
//! class's lowering and is reported to the caller, which decides whether to
//! retry, skip, or abort the whole run. Nothing here is retried internally or
//! silently recovered.

use jasper_ast::Span;
use thiserror::Error;

pub type LowerResult<T> = Result<T, LowerError>;

/// Errors raised during class analysis and structural lowering.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LowerError {
    /// A name collides with a same-generation entry in the same scope, or a
    /// virtual method is redeclared with an incompatible signature.
    #[error("Redeclaration of '{name}'")]
    Redeclare {
        /// The colliding name
        name: String,
        /// Location of the original declaration, when known
        original: Option<Span>,
        /// Location of the redeclaration
        span: Span,
    },

    /// A variable or function reference has no binding in any enclosing frame.
    #[error("Unknown identifier '{name}'")]
    UnknownIdentifier {
        /// The unresolved name
        name: String,
        /// Location of the reference
        span: Span,
    },

    /// A class-scoped tracker was requested for a class never registered.
    /// Internal-consistency fault: well-formed pipelines register every class
    /// before opening its scope.
    #[error("Class '{name}' is not defined")]
    ClassNotDefined {
        /// The unregistered class name
        name: String,
        /// Location of the request
        span: Span,
    },

    /// Multiple structurally valid candidates matched a method or constructor
    /// call. Carries the full candidate list for diagnostics.
    #[error("Ambiguous reference to '{name}'")]
    AmbiguousMember {
        /// The ambiguous member name
        name: String,
        /// Human-readable signatures of every candidate
        candidates: Vec<String>,
        /// Location of the call
        span: Span,
    },

    /// A `this(...)`/`super(...)` delegation names a parameter combination
    /// with no matching constructor in the target class.
    #[error("No constructor of '{class}' accepts ({})", params.join(", "))]
    NoConstructor {
        /// The delegation target class
        class: String,
        /// Display forms of the attempted parameter types
        params: Vec<String>,
        /// Location of the delegation
        span: Span,
    },

    /// A constructor body contains an explicit `return` with a value.
    /// Constructors only implicitly return the receiver.
    #[error("Constructor of '{class}' cannot return a value")]
    IllegalReturnInConstructor {
        /// The owning class
        class: String,
        /// Location of the offending return
        span: Span,
    },
}

impl LowerError {
    /// Get the primary span associated with this error.
    pub fn span(&self) -> Span {
        match self {
            LowerError::Redeclare { span, .. } => *span,
            LowerError::UnknownIdentifier { span, .. } => *span,
            LowerError::ClassNotDefined { span, .. } => *span,
            LowerError::AmbiguousMember { span, .. } => *span,
            LowerError::NoConstructor { span, .. } => *span,
            LowerError::IllegalReturnInConstructor { span, .. } => *span,
        }
    }

    /// Stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            LowerError::Redeclare { .. } => "E0201",
            LowerError::UnknownIdentifier { .. } => "E0202",
            LowerError::ClassNotDefined { .. } => "E0203",
            LowerError::AmbiguousMember { .. } => "E0204",
            LowerError::NoConstructor { .. } => "E0205",
            LowerError::IllegalReturnInConstructor { .. } => "E0206",
        }
    }
}

/// Non-fatal findings surfaced alongside analysis. Warnings never abort a
/// class's lowering.
#[derive(Debug, Clone, PartialEq)]
pub enum LowerWarning {
    /// A declaration in an inner scope shadows an outer binding.
    ShadowedVariable {
        /// Variable name
        name: String,
        /// Location of the shadowed declaration
        original: Span,
        /// Location of the shadowing declaration
        shadow: Span,
    },
}

impl LowerWarning {
    /// Get the primary span associated with this warning.
    pub fn span(&self) -> Span {
        match self {
            LowerWarning::ShadowedVariable { shadow, .. } => *shadow,
        }
    }

    /// Stable diagnostic code for this warning.
    pub fn code(&self) -> &'static str {
        match self {
            LowerWarning::ShadowedVariable { .. } => "W0201",
        }
    }
}
