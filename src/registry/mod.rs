//! Tag registry and type dispatch.
//!
//! The registry answers three independent questions:
//!
//! 1. which model (and which renderer) handles a given tag type
//! 2. which region kinds may live inside a given object type, optionally
//!    sniffing a serialized value to pick one
//! 3. which interactive drawing tool is registered under a name
//!
//! Registration is append-only. Lookups of unknown keys fail with an error
//! listing every registered name; they never fall back to a default.
//!
//! The registry is an explicit value: build one (usually with
//! [`TagRegistry::standard`]) at startup and pass it by reference to the
//! compiler and the store.

mod standard;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::LabelError;
use crate::model::{RegionKind, ResultType};

/// Broad role of a tag in the configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// Holds the data being labeled (`Image`, `Text`, ...).
    Object,
    /// Produces results (`Labels`, `Choices`, `TextArea`, ...).
    Control,
    /// An option inside a control (`Label`, `Choice`, ...).
    Label,
    /// Layout and decoration (`View`, `Header`, ...).
    Visual,
}

/// The runtime model of a tag type; instantiates live tags from nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct TagModel {
    pub type_name: String,
    pub kind: TagKind,
    /// Result type produced by a control.
    pub result_type: Option<ResultType>,
    /// Object types a control may target. Empty means any object.
    pub object_types: Vec<String>,
    /// Types that may enclose a label tag. Empty means any parent.
    pub parent_types: Vec<String>,
}

impl TagModel {
    pub fn object(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            kind: TagKind::Object,
            result_type: None,
            object_types: vec![],
            parent_types: vec![],
        }
    }

    pub fn control(type_name: &str, result_type: ResultType, object_types: &[&str]) -> Self {
        Self {
            type_name: type_name.to_string(),
            kind: TagKind::Control,
            result_type: Some(result_type),
            object_types: object_types.iter().map(|s| s.to_string()).collect(),
            parent_types: vec![],
        }
    }

    pub fn label(type_name: &str, parent_types: &[&str]) -> Self {
        Self {
            type_name: type_name.to_string(),
            kind: TagKind::Label,
            result_type: None,
            object_types: vec![],
            parent_types: parent_types.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn visual(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            kind: TagKind::Visual,
            result_type: None,
            object_types: vec![],
            parent_types: vec![],
        }
    }

    /// Whether this control can target an object of `object_type`.
    pub fn supports_object(&self, object_type: &str) -> bool {
        self.object_types.is_empty() || self.object_types.iter().any(|t| t == object_type)
    }
}

/// The rendering side of a tag type. Rendering itself lives outside this
/// crate; the registry only keeps the association.
pub trait Renderer: fmt::Debug + Send + Sync {
    /// Name of the component that draws the tag.
    fn component(&self) -> &str;
}

/// A renderer identified by component name only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentView(pub String);

impl Renderer for ComponentView {
    fn component(&self) -> &str {
        &self.0
    }
}

/// Predicate over a raw serialized result value.
pub type Detector = fn(&Value) -> bool;

#[derive(Clone, Copy)]
struct RegionType {
    kind: RegionKind,
    detector: Option<Detector>,
}

/// An interactive drawing tool.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolModel {
    pub name: String,
    /// Region kind the tool creates.
    pub region: RegionKind,
    /// Control types whose labels the tool can apply.
    pub control_types: Vec<String>,
}

/// Process-wide table of tag models, renderers, region kinds and tools.
#[derive(Default)]
pub struct TagRegistry {
    models: BTreeMap<String, TagModel>,
    views: BTreeMap<String, Arc<dyn Renderer>>,
    regions: BTreeMap<String, Vec<RegionType>>,
    tools: BTreeMap<String, ToolModel>,
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagRegistry")
            .field("tags", &self.tag_names())
            .field("tools", &self.tool_names())
            .finish()
    }
}

impl TagRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry populated with the standard tag set.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        standard::register_all(&mut registry);
        registry
    }

    /// Registers a tag type with its model and renderer.
    pub fn add_tag(&mut self, type_name: &str, model: TagModel, renderer: Arc<dyn Renderer>) {
        let key = type_name.to_lowercase();
        debug!(tag = %key, "registering tag");
        self.models.insert(key.clone(), model);
        self.views.insert(key, renderer);
    }

    /// Looks up the model for a (lower-cased) tag type.
    pub fn model_by_tag(&self, type_name: &str) -> Result<&TagModel, LabelError> {
        self.models
            .get(type_name)
            .ok_or_else(|| LabelError::UnknownTag {
                name: type_name.to_string(),
                known: self.tag_names(),
            })
    }

    /// Looks up the renderer registered for a model.
    pub fn view_by_model(&self, model_name: &str) -> Result<&Arc<dyn Renderer>, LabelError> {
        self.views
            .get(model_name)
            .ok_or_else(|| LabelError::UnknownView {
                name: model_name.to_string(),
                known: self.views.keys().cloned().collect(),
            })
    }

    /// Registered tag types, sorted.
    pub fn tag_names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    /// Declares that regions of `kind` may live inside `object_type`.
    ///
    /// A `detector` claims serialized values that must become this kind.
    pub fn add_region_type(
        &mut self,
        kind: RegionKind,
        object_type: &str,
        detector: Option<Detector>,
    ) {
        self.regions
            .entry(object_type.to_lowercase())
            .or_default()
            .push(RegionType { kind, detector });
    }

    /// Region kinds valid inside `object_type`, in registration order.
    pub fn region_kinds_for(&self, object_type: &str) -> Vec<RegionKind> {
        self.regions
            .get(object_type)
            .map(|types| types.iter().map(|t| t.kind).collect())
            .unwrap_or_default()
    }

    /// Region kinds that could hold `value` inside `object_type`.
    ///
    /// Detectors are tried in registration order; the first that claims the
    /// value wins outright. When none does, every kind registered without a
    /// detector is returned, which can be more than one.
    pub fn available_areas(&self, object_type: &str, value: &Value) -> Vec<RegionKind> {
        let Some(types) = self.regions.get(object_type) else {
            return vec![];
        };

        if let Some(found) = types
            .iter()
            .find(|t| t.detector.is_some_and(|detect| detect(value)))
        {
            return vec![found.kind];
        }

        types
            .iter()
            .filter(|t| t.detector.is_none())
            .map(|t| t.kind)
            .collect()
    }

    /// Registers an interactive tool.
    pub fn add_tool(&mut self, model: ToolModel) {
        debug!(tool = %model.name, "registering tool");
        self.tools.insert(model.name.to_lowercase(), model);
    }

    /// Looks up a tool by name.
    pub fn tool(&self, name: &str) -> Result<&ToolModel, LabelError> {
        self.tools
            .get(&name.to_lowercase())
            .ok_or_else(|| LabelError::UnknownTool {
                name: name.to_string(),
                known: self.tool_names(),
            })
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}
