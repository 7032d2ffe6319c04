use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for labelcore operations.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration document is not well-formed markup.
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Unknown tag type '{name}'; registered tags: {}", known.join(", "))]
    UnknownTag { name: String, known: Vec<String> },

    #[error("No view registered for model '{name}'; registered views: {}", known.join(", "))]
    UnknownView { name: String, known: Vec<String> },

    #[error("Unknown tool '{name}'; registered tools: {}", known.join(", "))]
    UnknownTool { name: String, known: Vec<String> },

    #[error("Tag '{tag}' references toName '{to_name}' which does not exist; known names: {}", known.join(", "))]
    UnresolvedToName {
        tag: String,
        to_name: String,
        known: Vec<String>,
    },

    #[error("Tag name '{name}' is used more than once in the configuration")]
    DuplicateName { name: String },

    #[error("Value type mismatch for control '{control}': expected {expected}, got {found}")]
    ValueTypeMismatch {
        control: String,
        expected: String,
        found: String,
    },

    #[error("Failed to parse task from {path}: {source}")]
    TaskJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse task data from {path}: {source}")]
    TaskYamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write JSON: {source}")]
    JsonWrite {
        #[source]
        source: serde_json::Error,
    },

    #[error("'{name}' is not a control tag; known names: {}", known.join(", "))]
    NotAControl { name: String, known: Vec<String> },

    #[error("Tag '{name}' is read-only")]
    ReadOnly { name: String },

    #[error("Annotation '{0}' not found")]
    AnnotationNotFound(String),

    #[error("Region '{0}' not found")]
    RegionNotFound(String),

    #[error("History item {0} not found")]
    HistoryNotFound(usize),

    /// A persistence or UI collaborator reported a failure. In-memory state
    /// is left as it was.
    #[error("{action} failed: {message}")]
    Collaborator { action: String, message: String },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl LabelError {
    /// True for failures that abort configuration initialization (bad markup
    /// or unresolvable references) as opposed to runtime misuse.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            LabelError::ConfigParse { .. }
                | LabelError::UnknownTag { .. }
                | LabelError::UnknownView { .. }
                | LabelError::UnresolvedToName { .. }
                | LabelError::DuplicateName { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_lists_registered_names() {
        let err = LabelError::UnknownTag {
            name: "widget".into(),
            known: vec!["choices".into(), "image".into()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown tag type 'widget'; registered tags: choices, image"
        );
        assert!(err.is_config_error());
    }
}
