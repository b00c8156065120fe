// diag.rs — Diagnostics model
//
// Shared diagnostic types for the parser and the CLI. Fatal schema errors are
// converted to error-level diagnostics for display; non-fatal findings are
// returned as warnings next to the parsed model.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0101`, `W0101`).
///
/// Codes are `&'static str` constants defined in the `codes` module. Once
/// assigned, a code keeps its meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    // Model-level errors
    pub const MALFORMED_CONFIG: DiagCode = DiagCode("E0000");
    pub const MISSING_KEY: DiagCode = DiagCode("E0001");
    pub const INVALID_MODEL_NAME: DiagCode = DiagCode("E0002");
    pub const INVALID_BUILDER: DiagCode = DiagCode("E0003");
    pub const INVALID_BASERATE: DiagCode = DiagCode("E0004");

    // Channel errors
    pub const MISSING_CHANNEL_NAME: DiagCode = DiagCode("E0101");
    pub const TOO_MANY_DOTS: DiagCode = DiagCode("E0102");
    pub const INVALID_IDENTIFIER: DiagCode = DiagCode("E0103");
    pub const INVALID_DIMENSION: DiagCode = DiagCode("E0104");
    pub const UNKNOWN_DATA_TYPE: DiagCode = DiagCode("E0105");
    pub const MALFORMED_CHANNEL: DiagCode = DiagCode("E0106");

    // Warnings
    pub const UNKNOWN_KEY: DiagCode = DiagCode("W0001");
    pub const UNUSED_FIELD: DiagCode = DiagCode("W0101");
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic about the model configuration.
///
/// `location` names the offending config entry, e.g. `parameters[2]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub location: Option<String>,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code, location or hint.
    pub fn new(level: DiagLevel, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            location: None,
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(code: DiagCode, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Warning, message).with_code(code)
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach the config location the diagnostic refers to.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagLevel::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        match &self.code {
            Some(code) => write!(f, "{}[{}]: ", level, code)?,
            None => write!(f, "{}: ", level)?,
        }
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}
