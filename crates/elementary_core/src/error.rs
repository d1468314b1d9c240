//! Compile-time diagnostics (C1) and the crate's top-level error type.

use derive_more::{Display, Error, From};

/// A single static diagnostic, attributed to the source line of the
/// offending node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

/// Append-only collector of diagnostics for one compile. Never panics or
/// aborts a walk on its own; callers decide whether to keep descending.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    silent: bool,
}

impl Diagnostics {
    pub fn new(silent: bool) -> Self {
        Self {
            entries: Vec::new(),
            silent,
        }
    }

    /// Records a diagnostic. In silent mode this only logs; the compile is
    /// never failed by it.
    pub fn error(&mut self, line: u32, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(line, message);
        if self.silent {
            tracing::warn!(line = diagnostic.line, message = %diagnostic.message, "suppressed by ejs_off");
        } else {
            tracing::trace!(line = diagnostic.line, message = %diagnostic.message, "diagnostic");
        }
        self.entries.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, d) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

/// Returned by [`crate::compile`] when the rewriter collected at least one
/// diagnostic (and the pipeline is not running in silent mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub errors: Vec<Diagnostic>,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

impl From<Diagnostics> for CompileError {
    fn from(diagnostics: Diagnostics) -> Self {
        Self {
            errors: diagnostics.into_vec(),
        }
    }
}

/// The bug-in-implementation message (§7): raised when an internal invariant
/// is violated rather than a student program failing a legitimate check.
pub const INTERNAL_BUG_MESSAGE: &str = "potential bug in ElementaryJS";

pub fn internal_bug(context: impl std::fmt::Display) -> boa_engine::JsError {
    boa_engine::JsNativeError::error()
        .with_message(format!("{INTERNAL_BUG_MESSAGE}: {context}"))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display_includes_line_number() {
        let d = Diagnostic::new(3, "Use 'let' or 'const' to declare a variable.");
        assert_eq!(d.to_string(), "Line 3: Use 'let' or 'const' to declare a variable.");
    }

    #[test]
    fn diagnostics_joins_multiple_entries_with_newlines() {
        let mut diagnostics = Diagnostics::new(false);
        diagnostics.error(1, "first");
        diagnostics.error(2, "second");
        assert_eq!(diagnostics.to_string(), "Line 1: first\nLine 2: second");
    }

    #[test]
    fn silent_mode_still_records_but_is_flagged() {
        let mut diagnostics = Diagnostics::new(true);
        diagnostics.error(1, "ignored at runtime");
        assert!(diagnostics.is_silent());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn compile_error_carries_the_diagnostics_vec_through() {
        let mut diagnostics = Diagnostics::new(false);
        diagnostics.error(5, "boom");
        let err = CompileError::from(diagnostics);
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].line, 5);
    }
}

/// Top-level error type for embedders that need to distinguish failure kinds
/// that occur outside of the compiled program itself (parse failures, engine
/// invariant violations). `CompileError` and runtime exceptions are *not*
/// variants here — they are ordinary return values, per the taxonomy in §7.
#[derive(Display, Debug, Error, From)]
pub enum Error {
    #[display(fmt = "syntax error: {message}")]
    Syntax { message: String, line: u32 },
    #[display(fmt = "engine error: {source}")]
    Engine { source: boa_engine::JsError },
    #[display(fmt = "{}: {context}", INTERNAL_BUG_MESSAGE)]
    Bug { context: String },
}

pub type Result<T> = std::result::Result<T, Error>;
