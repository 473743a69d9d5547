//! Compiler-facing interfaces and value types shared by the build driver.
//! This crate serves as the boundary between the incremental builder and the
//! underlying compiler implementation.

use std::fmt;

pub mod cancellation;
pub mod node;
pub mod program;

pub use cancellation::*;
pub use node::*;
pub use program::*;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };
        write!(f, "{}", text)
    }
}

// --- Diagnostic Structures ---

/// A diagnostic produced by the compiler. Diagnostics are values carried
/// through the builder, never failures.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: i32,
    pub file: Option<String>,
    pub start: Option<usize>,
    pub length: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            file: None,
            start: None,
            length: None,
            message: message.into(),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

// --- Emit ---

/// Source map information for one emitted output.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMapData {
    pub input_source_file_names: Vec<String>,
    pub source_map: String,
}

/// The outcome of an emit request against the program.
#[derive(Debug, Clone, Default)]
pub struct EmitResult {
    pub emit_skipped: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub emitted_files: Vec<String>,
    pub source_maps: Vec<SourceMapData>,
}
