//! Plain node tree produced by the configuration compiler.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// An attribute value after compilation.
///
/// The literals `"true"` and `"false"` become booleans; everything else is
/// kept verbatim as a string.
#[derive(Clone, PartialEq, Eq)]
pub enum AttrValue {
    Bool(bool),
    Str(String),
}

impl AttrValue {
    pub fn from_literal(raw: &str) -> Self {
        match raw {
            "true" => AttrValue::Bool(true),
            "false" => AttrValue::Bool(false),
            other => AttrValue::Str(other.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            AttrValue::Bool(_) => None,
        }
    }

    /// Booleans as-is; strings are truthy unless empty.
    pub fn truthy(&self) -> bool {
        match self {
            AttrValue::Bool(b) => *b,
            AttrValue::Str(s) => !s.is_empty(),
        }
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Str(s) => f.write_str(s),
        }
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttrValue::Bool(b) => serializer.serialize_bool(*b),
            AttrValue::Str(s) => serializer.serialize_str(s),
        }
    }
}

/// One element of a compiled configuration.
///
/// Attribute names are lower-cased (`toName` is stored as `toname`).
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigNode {
    /// The element's `id` attribute if given, otherwise a fresh identifier.
    pub id: String,
    /// Lower-cased tag name; the key into the tag registry.
    pub node_type: String,
    /// Tag name as written in the document.
    pub tag_name: String,
    /// Text content of leaf nodes, or raw inner markup for raw-markup tags.
    pub value: Option<String>,
    pub children: Vec<ConfigNode>,
    pub attributes: BTreeMap<String, AttrValue>,
}

impl ConfigNode {
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// A string attribute; booleans are not strings.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(AttrValue::as_str)
    }

    /// A flag attribute; absent means false.
    pub fn attr_flag(&self, key: &str) -> bool {
        self.attr(key).map(AttrValue::truthy).unwrap_or(false)
    }

    /// The `name` attribute.
    pub fn name(&self) -> Option<&str> {
        self.attr_str("name")
    }

    /// Depth-first, pre-order walk over this node and its descendants.
    pub fn walk(&self) -> Vec<&ConfigNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Structural equality that ignores generated ids.
    pub fn same_shape(&self, other: &ConfigNode) -> bool {
        self.node_type == other.node_type
            && self.tag_name == other.tag_name
            && self.value == other.value
            && self.attributes == other.attributes
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_shape(b))
    }
}

const RESERVED_KEYS: [&str; 5] = ["id", "type", "tagName", "value", "children"];

// Flattened `{id, type, tagName, value?, children?, ...attributes}`.
// Attributes that collide with the structural keys are skipped.
impl Serialize for ConfigNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("type", &self.node_type)?;
        map.serialize_entry("tagName", &self.tag_name)?;
        match (&self.value, self.attributes.get("value")) {
            (Some(value), _) => map.serialize_entry("value", value)?,
            (None, Some(value)) => map.serialize_entry("value", value)?,
            (None, None) => {}
        }
        if !self.children.is_empty() {
            map.serialize_entry("children", &self.children)?;
        }
        for (key, value) in &self.attributes {
            if RESERVED_KEYS.contains(&key.as_str()) || key == "tagname" {
                continue;
            }
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(node_type: &str, attrs: &[(&str, AttrValue)]) -> ConfigNode {
        ConfigNode {
            id: "x".into(),
            node_type: node_type.into(),
            tag_name: node_type.into(),
            value: None,
            children: vec![],
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn literal_booleans_become_bools() {
        assert_eq!(AttrValue::from_literal("true"), AttrValue::Bool(true));
        assert_eq!(AttrValue::from_literal("false"), AttrValue::Bool(false));
        assert_eq!(
            AttrValue::from_literal("True"),
            AttrValue::Str("True".into())
        );
    }

    #[test]
    fn serializes_flat() {
        let node = leaf(
            "label",
            &[
                ("value", AttrValue::Str("Cat".into())),
                ("selected", AttrValue::Bool(true)),
            ],
        );
        let json = serde_json::to_value(&node).expect("serialize");
        assert_eq!(
            json,
            json!({"id": "x", "type": "label", "tagName": "label", "value": "Cat", "selected": true})
        );
    }

    #[test]
    fn same_shape_ignores_ids() {
        let a = leaf("image", &[("name", AttrValue::Str("img".into()))]);
        let mut b = a.clone();
        b.id = "other".into();
        assert!(a.same_shape(&b));
        b.attributes
            .insert("name".into(), AttrValue::Str("img2".into()));
        assert!(!a.same_shape(&b));
    }
}
