//! The initialization boundary.
//!
//! Compile and registry failures never escape as errors past this point:
//! they turn into an [`EditorState::Failed`] carrying what an error view
//! needs to show.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use super::{AnnotationStore, StoreOptions};
use crate::config::compile;
use crate::error::LabelError;
use crate::registry::TagRegistry;

#[derive(Debug)]
pub enum EditorState {
    Ready(Box<AnnotationStore>),
    Failed(ConfigErrorView),
}

impl EditorState {
    pub fn store(&self) -> Option<&AnnotationStore> {
        match self {
            EditorState::Ready(store) => Some(&**store),
            EditorState::Failed(_) => None,
        }
    }

    pub fn store_mut(&mut self) -> Option<&mut AnnotationStore> {
        match self {
            EditorState::Ready(store) => Some(&mut **store),
            EditorState::Failed(_) => None,
        }
    }

    pub fn into_store(self) -> Result<AnnotationStore, ConfigErrorView> {
        match self {
            EditorState::Ready(store) => Ok(*store),
            EditorState::Failed(view) => Err(view),
        }
    }
}

/// What the error view shows instead of the editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigErrorView {
    pub message: String,
    /// True for configuration problems, false for anything else.
    pub config_error: bool,
}

impl From<&LabelError> for ConfigErrorView {
    fn from(err: &LabelError) -> Self {
        Self {
            message: err.to_string(),
            config_error: err.is_config_error(),
        }
    }
}

/// Compiles `config_text` against the task data and builds a store.
pub fn initialize(
    registry: Arc<TagRegistry>,
    config_text: &str,
    task_data: Value,
    options: StoreOptions,
) -> EditorState {
    let built = compile(config_text, &task_data)
        .and_then(|config| AnnotationStore::new(registry, config, task_data, options));
    match built {
        Ok(store) => {
            info!(tags = store.tree().len(), "editor ready");
            EditorState::Ready(Box::new(store))
        }
        Err(err) => {
            error!(error = %err, "failed to initialize editor");
            EditorState::Failed(ConfigErrorView::from(&err))
        }
    }
}
