//! Warnings and errors accumulated while parsing or upgrading.
//!
//! Problems with individual tables, columns or rows never abort a run. They are
//! recorded here and the affected element is dropped, so a caller can show
//! every problem from one pass.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Valid but lossy: deleted columns, deleted rows, empty tables.
    Warning,
    /// Structural problem: the element was dropped or flagged.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Where a diagnostic applies. Row and line numbers are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagnosticContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl DiagnosticContext {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::default()
        }
    }

    pub fn line(line: usize) -> Self {
        Self {
            line: Some(line),
            ..Self::default()
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for DiagnosticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref table) = self.table {
            parts.push(format!("table {}", table));
        }
        if let Some(ref column) = self.column {
            parts.push(format!("column {}", column));
        }
        if let Some(row) = self.row {
            parts.push(format!("row {}", row));
        }
        if let Some(line) = self.line {
            parts.push(format!("line {}", line));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// One recorded problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<DiagnosticContext>,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            context: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: DiagnosticContext) -> Self {
        self.context = Some(context);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref ctx) = self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

/// Ordered warning and error lists for one parse or upgrade run.
///
/// A diagnostic identical to one already recorded (same severity, message
/// and context) is dropped, so a problem repeated on many rows is reported
/// once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "DiagnosticLists")]
pub struct Diagnostics {
    warnings: Vec<Diagnostic>,
    errors: Vec<Diagnostic>,
    #[serde(skip)]
    seen: HashSet<Diagnostic>,
}

/// Serialized form of [`Diagnostics`].
#[derive(Deserialize)]
struct DiagnosticLists {
    #[serde(default)]
    warnings: Vec<Diagnostic>,
    #[serde(default)]
    errors: Vec<Diagnostic>,
}

impl From<DiagnosticLists> for Diagnostics {
    fn from(lists: DiagnosticLists) -> Self {
        let mut diagnostics = Self::new();
        for diagnostic in lists.errors.into_iter().chain(lists.warnings) {
            diagnostics.push(diagnostic);
        }
        diagnostics
    }
}

impl PartialEq for Diagnostics {
    fn eq(&self, other: &Self) -> bool {
        self.warnings == other.warnings && self.errors == other.errors
    }
}

impl Eq for Diagnostics {}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Returns false if it was a duplicate.
    pub fn push(&mut self, diagnostic: Diagnostic) -> bool {
        if !self.seen.insert(diagnostic.clone()) {
            return false;
        }
        tracing::debug!(severity = %diagnostic.severity, "{}", diagnostic);
        match diagnostic.severity {
            Severity::Warning => self.warnings.push(diagnostic),
            Severity::Error => self.errors.push(diagnostic),
        }
        true
    }

    pub fn warn(&mut self, message: impl Into<String>, context: Option<DiagnosticContext>) -> bool {
        let mut diagnostic = Diagnostic::warning(message);
        diagnostic.context = context;
        self.push(diagnostic)
    }

    pub fn error(&mut self, message: impl Into<String>, context: Option<DiagnosticContext>) -> bool {
        let mut diagnostic = Diagnostic::error(message);
        diagnostic.context = context;
        self.push(diagnostic)
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len() + self.errors.len()
    }

    /// Errors first, then warnings, each in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn extend(&mut self, other: Diagnostics) {
        for diagnostic in other.errors.into_iter().chain(other.warnings) {
            self.push(diagnostic);
        }
    }
}
