//! Diagnostics reported by the pipeline.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A message about a pass run, optionally tied to a pass and a unit of IR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub pass: Option<String>,
    pub unit: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            pass: None,
            unit: None,
        }
    }

    pub fn with_pass(mut self, pass: impl Into<String>) -> Self {
        self.pass = Some(pass.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.severity)?;
        if let Some(pass) = &self.pass {
            write!(f, "[{}] ", pass)?;
        }
        if let Some(unit) = &self.unit {
            write!(f, "{}: ", unit)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Receiver for pipeline diagnostics.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: &Diagnostic);
}

/// Sink that forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        let pass = diagnostic.pass.as_deref().unwrap_or("-");
        let unit = diagnostic.unit.as_deref().unwrap_or("-");
        match diagnostic.severity {
            Severity::Error => tracing::error!(pass, unit, "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(pass, unit, "{}", diagnostic.message),
            Severity::Note => tracing::info!(pass, unit, "{}", diagnostic.message),
        }
    }
}

/// Collects diagnostics in memory.
impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

/// Shared sink, for callers that inspect diagnostics after handing the sink
/// to a pipeline.
impl<S: DiagnosticSink> DiagnosticSink for Arc<Mutex<S>> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        match self.lock() {
            Ok(mut sink) => sink.emit(diagnostic),
            Err(_) => tracing::warn!("diagnostic sink poisoned, dropping: {}", diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::error("boom")
            .with_pass("shape_inference")
            .with_unit("@main");
        assert_eq!(diagnostic.to_string(), "error: [shape_inference] @main: boom");
        assert_eq!(Diagnostic::error("boom").to_string(), "error: boom");
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.emit(&Diagnostic::error("first"));
        TracingSink.emit(&Diagnostic::error("logged only"));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].severity, Severity::Error);
    }
}
