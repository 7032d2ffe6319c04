//! Regions (areas) and the results attached to them.

use serde_json::{Map, Value};

use super::ids::{guid, RegionId, ResultId};
use super::kinds::{RegionKind, ResultType, ValueShape};
use super::value::MainValue;
use super::wire::WireResult;
use crate::error::LabelError;
use crate::tags::ScopedName;

/// Origin stamped on regions drawn by hand.
pub const MANUAL_ORIGIN: &str = "manual";

/// One control's contribution to a region.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultItem {
    pub id: ResultId,
    pub from_name: ScopedName,
    pub to_name: ScopedName,
    pub result_type: ResultType,
    /// `None` until the control sets a value. Geometry-only types never
    /// carry one.
    pub value: Option<MainValue>,
    pub score: Option<f64>,
    pub meta: Option<Value>,
}

impl ResultItem {
    pub fn new(from_name: ScopedName, to_name: ScopedName, result_type: ResultType) -> Self {
        Self {
            id: ResultId::generate(),
            from_name,
            to_name,
            result_type,
            value: None,
            score: None,
            meta: None,
        }
    }

    pub fn main_value(&self) -> Option<&MainValue> {
        self.value.as_ref()
    }

    /// False when the main value is missing or an empty list.
    ///
    /// Geometry-only results always have a value: the region shape is it.
    pub fn has_value(&self) -> bool {
        if self.result_type.value_shape() == ValueShape::Geometry {
            return true;
        }
        self.value.as_ref().is_some_and(|v| !v.is_empty_list())
    }

    /// Replaces the main value. The value must have the shape the result
    /// type declares.
    pub fn set_value(&mut self, value: MainValue) -> Result<(), LabelError> {
        let expected = self.result_type.value_shape();
        if value.shape() != expected {
            return Err(LabelError::ValueTypeMismatch {
                control: self.from_name.base().to_string(),
                expected: format!("{expected:?}"),
                found: format!("{:?}", value.shape()),
            });
        }
        self.value = Some(value);
        Ok(())
    }

    /// Combines this result's value with one from a sibling control.
    ///
    /// Label sets intersect. Every other type keeps the candidate only when
    /// it equals the current value.
    pub fn merge_main_value(&self, candidate: &MainValue) -> Option<MainValue> {
        let current = self.value.as_ref()?;
        if self.result_type.is_labels() {
            current.merge(candidate)
        } else {
            (current == candidate).then(|| candidate.clone())
        }
    }

    /// Selected strings for list-shaped values (labels, choices).
    pub fn list_values(&self) -> &[String] {
        match &self.value {
            Some(MainValue::List(items)) => items,
            _ => &[],
        }
    }
}

/// A labeled area inside an object.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    /// Exported id, shared by every result on the region.
    pub id: RegionId,
    /// Internal id, unique per region instance.
    pub pid: String,
    pub kind: RegionKind,
    /// Object the region lives in.
    pub object: ScopedName,
    /// Geometry (`x`, `y`, `points`, `start`, ...), without the main value.
    pub shape: Map<String, Value>,
    pub hidden: bool,
    pub selected: bool,
    pub highlighted: bool,
    pub score: Option<f64>,
    pub parent_id: Option<RegionId>,
    pub item_index: Option<u64>,
    pub readonly: bool,
    pub origin: String,
    pub interactive_mode: bool,
    /// Record-level keys carried through unchanged.
    pub extra: Map<String, Value>,
    pub results: Vec<ResultItem>,
}

impl Region {
    pub fn new(kind: RegionKind, object: ScopedName, shape: Map<String, Value>) -> Self {
        Self::with_id(RegionId::generate(), kind, object, shape)
    }

    pub fn with_id(
        id: RegionId,
        kind: RegionKind,
        object: ScopedName,
        shape: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            pid: guid(),
            kind,
            object,
            shape,
            hidden: false,
            selected: false,
            highlighted: false,
            score: None,
            parent_id: None,
            item_index: None,
            readonly: false,
            origin: MANUAL_ORIGIN.to_string(),
            interactive_mode: false,
            extra: Map::new(),
            results: vec![],
        }
    }

    /// Geometry-bearing kinds need a shape to be exported.
    pub fn has_serializable_shape(&self) -> bool {
        !self.kind.requires_shape() || !self.shape.is_empty()
    }

    /// Whether any labels-family result on this region selects `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.results
            .iter()
            .filter(|r| r.result_type.is_labels())
            .any(|r| r.list_values().iter().any(|v| v == label))
    }

    pub fn result_by_control(&self, control: &str) -> Option<&ResultItem> {
        self.results.iter().find(|r| r.from_name.base() == control)
    }

    pub fn result_by_control_mut(&mut self, control: &str) -> Option<&mut ResultItem> {
        self.results.iter_mut().find(|r| r.from_name.base() == control)
    }

    /// The wire record for one result on this region.
    pub fn to_wire(&self, result: &ResultItem) -> WireResult {
        let mut value = self.shape.clone();
        if let (Some(key), Some(main)) = (result.result_type.value_key(), &result.value) {
            value.insert(key.to_string(), main.to_json());
        }

        WireResult {
            id: self.id.to_string(),
            from_name: result.from_name.base().to_string(),
            to_name: result.to_name.base().to_string(),
            result_type: result.result_type,
            value,
            score: result.score.or(self.score),
            meta: result.meta.clone(),
            origin: Some(self.origin.clone()),
            parent_id: self.parent_id.as_ref().map(RegionId::to_string),
            item_index: self.item_index,
            readonly: self.readonly,
            interactive_mode: self.interactive_mode,
            extra: self.extra.clone(),
        }
    }
}
