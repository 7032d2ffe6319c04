//! The main payload of a result.

use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use super::kinds::{ResultType, ValueShape};

/// The single populated field of a result's `value`.
///
/// Which variant is valid for a result is decided by its [`ResultType`]
/// (see [`ResultType::value_shape`]).
#[derive(Clone, Debug, PartialEq)]
pub enum MainValue {
    /// Labels, choices and transcription lines.
    List(Vec<String>),
    /// Taxonomy selections, one path per selection.
    Paths(Vec<Vec<String>>),
    /// Ratings and numbers.
    Number(f64),
    /// Date/time strings.
    Text(String),
    /// Ranker buckets (bucket name -> ordered items).
    Buckets(BTreeMap<String, Vec<String>>),
}

impl MainValue {
    /// The shape this value has, used to check it against a result type.
    pub fn shape(&self) -> ValueShape {
        match self {
            MainValue::List(_) => ValueShape::StringList,
            MainValue::Paths(_) => ValueShape::PathList,
            MainValue::Number(_) => ValueShape::Number,
            MainValue::Text(_) => ValueShape::Text,
            MainValue::Buckets(_) => ValueShape::Buckets,
        }
    }

    /// True for an explicit empty list (`[]`).
    pub fn is_empty_list(&self) -> bool {
        match self {
            MainValue::List(items) => items.is_empty(),
            MainValue::Paths(paths) => paths.is_empty(),
            _ => false,
        }
    }

    /// Reads the payload for `result_type` out of a raw JSON value.
    ///
    /// Returns `None` when the payload does not have the shape the type
    /// expects.
    pub fn from_json(result_type: ResultType, raw: &Value) -> Option<Self> {
        match result_type.value_shape() {
            ValueShape::StringList => string_list(raw).map(MainValue::List),
            ValueShape::PathList => raw
                .as_array()?
                .iter()
                .map(string_list)
                .collect::<Option<Vec<_>>>()
                .map(MainValue::Paths),
            ValueShape::Number => raw.as_f64().map(MainValue::Number),
            ValueShape::Text => raw.as_str().map(|s| MainValue::Text(s.to_string())),
            ValueShape::Buckets => raw
                .as_object()?
                .iter()
                .map(|(bucket, items)| string_list(items).map(|items| (bucket.clone(), items)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(MainValue::Buckets),
            ValueShape::Geometry => None,
        }
    }

    /// Renders the payload back to JSON.
    pub fn to_json(&self) -> Value {
        match self {
            MainValue::List(items) => strings_to_json(items),
            MainValue::Paths(paths) => Value::Array(paths.iter().map(|p| strings_to_json(p)).collect()),
            MainValue::Number(n) => number_to_json(*n),
            MainValue::Text(s) => Value::String(s.clone()),
            MainValue::Buckets(buckets) => {
                let mut map = Map::new();
                for (bucket, items) in buckets {
                    map.insert(bucket.clone(), strings_to_json(items));
                }
                Value::Object(map)
            }
        }
    }

    /// Merges a candidate label set from another control of the same kind.
    ///
    /// List values intersect (keeping this value's order); scalar values
    /// only merge when they are equal. Non-label results compare by
    /// equality instead, see [`ResultItem::merge_main_value`].
    ///
    /// [`ResultItem::merge_main_value`]: crate::model::ResultItem::merge_main_value
    pub fn merge(&self, candidate: &MainValue) -> Option<MainValue> {
        match (self, candidate) {
            (MainValue::List(current), MainValue::List(other)) => Some(MainValue::List(
                current
                    .iter()
                    .filter(|item| other.contains(item))
                    .cloned()
                    .collect(),
            )),
            (MainValue::Paths(current), MainValue::Paths(other)) => Some(MainValue::Paths(
                current
                    .iter()
                    .filter(|path| other.contains(path))
                    .cloned()
                    .collect(),
            )),
            (current, other) if current == other => Some(other.clone()),
            _ => None,
        }
    }
}

fn string_list(raw: &Value) -> Option<Vec<String>> {
    raw.as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn strings_to_json(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

// Integral numbers go back out as integers so `"rating": 3` stays `3`.
fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}
