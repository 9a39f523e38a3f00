//! Diagnostic infrastructure for error reporting
//!
//! Wraps lowering errors and warnings into rendered diagnostics with source
//! context and stable codes.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream, WriteColor};
use jasper_ast::Span;

use crate::error::{LowerError, LowerWarning};

/// A diagnostic message with source context and a stable code.
pub struct Diagnostic {
    inner: CsDiagnostic<usize>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(severity).with_message(message),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.inner = self.inner.with_code(code);
        self
    }

    pub fn with_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        self.inner = self
            .inner
            .with_labels(vec![
                Label::primary(file_id, span.start..span.end).with_message(message)
            ]);
        self
    }

    pub fn with_secondary_label(
        mut self,
        file_id: usize,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        self.inner = self.inner.with_labels(vec![
            Label::secondary(file_id, span.start..span.end).with_message(message),
        ]);
        self
    }

    /// Build the rendered diagnostic for a lowering error.
    pub fn from_error(file_id: usize, error: &LowerError) -> Self {
        let mut diagnostic = Self::error(error.to_string())
            .with_code(error.code())
            .with_label(file_id, error.span(), "");
        if let LowerError::AmbiguousMember { candidates, .. } = error {
            diagnostic.inner = diagnostic.inner.with_notes(
                candidates
                    .iter()
                    .map(|c| format!("candidate: {c}"))
                    .collect(),
            );
        }
        diagnostic
    }

    /// Build the rendered diagnostic for a lowering warning.
    pub fn from_warning(file_id: usize, warning: &LowerWarning) -> Self {
        match warning {
            LowerWarning::ShadowedVariable {
                name,
                original,
                shadow,
            } => Self::warning(format!("'{name}' shadows an outer declaration"))
                .with_code(warning.code())
                .with_label(file_id, *shadow, "shadowing declaration")
                .with_secondary_label(file_id, *original, "originally declared here"),
        }
    }
}

/// Owns registered source files and renders diagnostics against them.
pub struct DiagnosticEmitter {
    files: SimpleFiles<String, String>,
}

impl Default for DiagnosticEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticEmitter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
        }
    }

    /// Register a source file; the returned id keys labels to it.
    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    /// Render one diagnostic to the given stream.
    pub fn emit_to(
        &self,
        writer: &mut dyn WriteColor,
        diagnostic: &Diagnostic,
    ) -> Result<(), codespan_reporting::files::Error> {
        let config = term::Config::default();
        term::emit(writer, &config, &self.files, &diagnostic.inner)
    }

    /// Render one diagnostic to stderr.
    pub fn emit(&self, diagnostic: &Diagnostic) -> Result<(), codespan_reporting::files::Error> {
        let mut stream = StandardStream::stderr(ColorChoice::Auto);
        self.emit_to(&mut stream, diagnostic)
    }
}
