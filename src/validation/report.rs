//! Validation report types for structured error reporting.
//!
//! Validation never throws: every problem becomes a [`ValidationError`]
//! collected into a [`ValidationReport`], which can be displayed, written as
//! JSON, or handed to a callback.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// All problems found by one or more validation passes.
///
/// Errors are de-duplicated on `(model_name, field, error, value)`; adding
/// the same problem twice keeps the first.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    #[serde(skip)]
    seen: BTreeSet<DedupeKey>,
}

type DedupeKey = (String, String, ErrorCode, Option<String>);

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error unless an identical one is already present.
    pub fn add(&mut self, error: ValidationError) {
        if self.seen.insert(error.key()) {
            self.errors.push(error);
        }
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        for error in other.errors {
            self.add(error);
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no problems at all.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if validation passed in strict mode (no errors or warnings).
    pub fn is_ok_strict(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for error in &self.errors {
            writeln!(f, "  {}", error)?;
        }

        Ok(())
    }
}

/// A single validation problem.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationError {
    pub severity: Severity,
    /// Tag type (or `"result"`) the problem belongs to.
    pub model_name: String,
    /// Attribute or record field at fault.
    pub field: String,
    pub error: ErrorCode,
    /// The offending value, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// What would have been accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_type: Option<String>,
}

impl ValidationError {
    pub fn new(error: ErrorCode, model_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            model_name: model_name.into(),
            field: field.into(),
            error,
            value: None,
            valid_type: None,
        }
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn valid_type(mut self, valid_type: impl Into<String>) -> Self {
        self.valid_type = Some(valid_type.into());
        self
    }

    pub fn warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    fn key(&self) -> DedupeKey {
        (
            self.model_name.clone(),
            self.field.clone(),
            self.error,
            self.value.clone(),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {} in {}.{}",
            severity, self.error, self.model_name, self.field
        )?;
        if let Some(value) = &self.value {
            write!(f, ": '{}'", value)?;
        }
        if let Some(valid_type) = &self.valid_type {
            write!(f, " (expected {})", valid_type)?;
        }
        Ok(())
    }
}

/// The severity of a validation problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious but loadable.
    Warning,
    /// Invalid configuration or data.
    Error,
}

/// A stable code identifying the kind of problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ErrorCode {
    /// A referenced tag name does not exist.
    #[serde(rename = "ERR_TAG_NOT_FOUND")]
    TagNotFound,
    /// A tag type is unknown, or a control cannot target the object.
    #[serde(rename = "ERR_TAG_UNSUPPORTED")]
    TagUnsupported,
    /// A required attribute or field is missing.
    #[serde(rename = "ERR_REQUIRED")]
    Required,
    /// A value has the wrong type.
    #[serde(rename = "ERR_BAD_TYPE")]
    BadType,
    /// An option tag sits outside a control that accepts it.
    #[serde(rename = "ERR_PARENT_TAG")]
    ParentTag,
    #[serde(rename = "ERR_GENERAL")]
    General,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::TagNotFound => "ERR_TAG_NOT_FOUND",
            ErrorCode::TagUnsupported => "ERR_TAG_UNSUPPORTED",
            ErrorCode::Required => "ERR_REQUIRED",
            ErrorCode::BadType => "ERR_BAD_TYPE",
            ErrorCode::ParentTag => "ERR_PARENT_TAG",
            ErrorCode::General => "ERR_GENERAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
