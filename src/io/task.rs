//! Label Studio task files.
//!
//! A task is `{id?, data, annotations[], predictions[]}` where every
//! annotation carries a `result` array of wire records. The legacy
//! `completions` key is accepted in place of `annotations`. Files ending in
//! `.yaml`/`.yml` are read as YAML with the same structure.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::LabelError;
use crate::model::{AnnotationId, WireRecord};
use crate::store::{AnnotationInput, AnnotationStore};

/// One task with its annotations and predictions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, deserialize_with = "flexible_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default = "empty_object")]
    pub data: Value,

    #[serde(default, alias = "completions")]
    pub annotations: Vec<TaskAnnotation>,

    #[serde(default)]
    pub predictions: Vec<TaskAnnotation>,
}

/// An annotation or prediction entry of a task.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskAnnotation {
    #[serde(default, deserialize_with = "flexible_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub result: Vec<WireRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<Vec<WireRecord>>,

    #[serde(default)]
    pub ground_truth: bool,

    #[serde(default)]
    pub was_cancelled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Keys this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskAnnotation {
    pub fn to_input(&self) -> AnnotationInput {
        AnnotationInput {
            id: self.id.clone(),
            result: self.result.clone(),
            draft: self.draft.clone(),
            ground_truth: self.ground_truth,
            skipped: self.was_cancelled,
            user_generate: false,
        }
    }
}

impl Task {
    /// Adds every prediction and annotation of the task to `store`.
    ///
    /// Returns the ids of the loaded annotations, in file order.
    pub fn load_into(&self, store: &mut AnnotationStore) -> Vec<AnnotationId> {
        for prediction in &self.predictions {
            store.add_prediction(&prediction.to_input());
        }
        let ids: Vec<AnnotationId> = self
            .annotations
            .iter()
            .map(|annotation| store.add_annotation(&annotation.to_input()))
            .collect();
        debug!(
            annotations = ids.len(),
            predictions = self.predictions.len(),
            "loaded task"
        );
        ids
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

// Task and annotation ids come as numbers from the server and as strings
// from hand-written files.
fn flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Int(n) => n.to_string(),
        RawId::Text(s) => s,
    }))
}

/// Reads a task from a JSON or YAML file.
pub fn read_task(path: &Path) -> Result<Task, LabelError> {
    let file = File::open(path).map_err(LabelError::Io)?;
    let reader = BufReader::new(file);

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_reader(reader).map_err(|source| LabelError::TaskYamlParse {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_reader(reader).map_err(|source| LabelError::TaskJsonParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Parse a task from a JSON string.
pub fn from_task_str(json: &str) -> Result<Task, LabelError> {
    serde_json::from_str(json).map_err(|source| LabelError::TaskJsonParse {
        path: Path::new("<string>").to_path_buf(),
        source,
    })
}

/// Parse a task from JSON bytes.
pub fn from_task_slice(bytes: &[u8]) -> Result<Task, LabelError> {
    serde_json::from_slice(bytes).map_err(|source| LabelError::TaskJsonParse {
        path: Path::new("<bytes>").to_path_buf(),
        source,
    })
}

/// Serialize exported records as a pretty JSON array.
pub fn to_records_string(records: &[WireRecord]) -> Result<String, LabelError> {
    serde_json::to_string_pretty(records).map_err(|source| LabelError::JsonWrite { source })
}
