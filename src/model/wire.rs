//! Wire (JSON) records exchanged with the outside world.
//!
//! One [`WireResult`] is emitted per result; relations between regions are
//! emitted as separate [`WireRelation`] records in the same array.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::kinds::ResultType;

fn is_false(value: &bool) -> bool {
    !*value
}

/// A serialized result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireResult {
    /// Region id; shared by every result attached to the same region.
    pub id: String,

    /// Control tag name (annotation-scope suffix stripped).
    pub from_name: String,

    /// Object tag name.
    pub to_name: String,

    #[serde(rename = "type")]
    pub result_type: ResultType,

    /// Region geometry plus the main payload under the type's value key.
    #[serde(default)]
    pub value: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    #[serde(
        rename = "parentID",
        alias = "parent_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_index: Option<u64>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub readonly: bool,

    /// Set on prediction results produced by interactive (assisted) tools.
    #[serde(default, skip_serializing_if = "is_false")]
    pub interactive_mode: bool,

    /// Record-level keys this crate does not interpret (`original_width`,
    /// `image_rotation`, ...). Kept so records survive a round trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WireResult {
    /// The raw main payload, if the type has a value key and it is present.
    pub fn main_value(&self) -> Option<&Value> {
        self.result_type
            .value_key()
            .and_then(|key| self.value.get(key))
    }
}

/// Direction of a relation between two regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationDirection {
    Left,
    #[default]
    Right,
    Bi,
}

/// Marker for the `type: "relation"` field of relation records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationTag {
    #[default]
    Relation,
}

/// A serialized relation between two regions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireRelation {
    pub from_id: String,
    pub to_id: String,
    #[serde(rename = "type")]
    pub tag: RelationTag,
    #[serde(default)]
    pub direction: RelationDirection,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Any record of an exported annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireRecord {
    Relation(WireRelation),
    Result(WireResult),
}

impl WireRecord {
    pub fn as_result(&self) -> Option<&WireResult> {
        match self {
            WireRecord::Result(result) => Some(result),
            WireRecord::Relation(_) => None,
        }
    }
}
