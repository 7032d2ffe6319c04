//! Configuration compiler.
//!
//! Turns a labeling configuration (element-per-tag markup) plus the task data
//! into a plain [`ConfigNode`] tree:
//!
//! - tag names are lower-cased into the node `type`
//! - attribute names are lower-cased; `"true"`/`"false"` become booleans
//! - `<Repeater on="$items">` clones its children once per element of the
//!   bound array, replacing the index token (`{{idx}}` unless `indexFlag`
//!   names another) in every descendant attribute
//! - leaves keep their text content as `value`; raw-markup tags keep their
//!   inner markup verbatim
//!
//! The output is a pure function of the inputs, apart from generated ids.

pub mod data_path;
mod node;

pub use node::{AttrValue, ConfigNode};

use std::collections::BTreeMap;

use roxmltree::{Document, Node};
use serde_json::Value;
use tracing::debug;

use crate::error::LabelError;
use crate::model::guid;

/// Lower-cased tag name of the iteration element.
pub const REPEATER_TYPE: &str = "repeater";

/// Index token used when a repeater has no `indexFlag`.
pub const DEFAULT_INDEX_FLAG: &str = "{{idx}}";

/// Tags whose inner content is kept as raw markup instead of being compiled.
const RAW_MARKUP_TAGS: [&str; 2] = ["hypertext", "style"];

/// Compile a configuration document against the task data.
pub fn compile(config_text: &str, task_data: &Value) -> Result<ConfigNode, LabelError> {
    let document = Document::parse(config_text).map_err(|source| LabelError::ConfigParse {
        message: source.to_string(),
    })?;

    let compiler = Compiler {
        source: config_text,
        data: task_data,
    };
    let root = compiler.build(document.root_element(), &[]);

    debug!(
        root = %root.node_type,
        nodes = root.walk().len(),
        "compiled configuration"
    );
    Ok(root)
}

/// An active index substitution: `(token, index)`.
type Substitution = (String, usize);

struct Compiler<'a> {
    source: &'a str,
    data: &'a Value,
}

impl Compiler<'_> {
    fn build(&self, node: Node<'_, '_>, subs: &[Substitution]) -> ConfigNode {
        let tag_name = node.tag_name().name().to_string();
        let node_type = tag_name.to_lowercase();

        let attributes: BTreeMap<String, AttrValue> = node
            .attributes()
            .map(|attr| {
                let raw = substitute(attr.value(), subs);
                (attr.name().to_lowercase(), AttrValue::from_literal(&raw))
            })
            .collect();

        let id = attributes
            .get("id")
            .and_then(AttrValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(guid);

        let element_children: Vec<Node<'_, '_>> =
            node.children().filter(|child| child.is_element()).collect();

        let (value, children) = if node_type == REPEATER_TYPE {
            (None, self.expand_repeater(&attributes, &element_children, subs))
        } else if RAW_MARKUP_TAGS.contains(&node_type.as_str()) {
            (self.inner_markup(node), vec![])
        } else if element_children.is_empty() {
            (text_content(node), vec![])
        } else {
            let children = element_children
                .iter()
                .map(|child| self.build(*child, subs))
                .collect();
            (None, children)
        };

        ConfigNode {
            id,
            node_type,
            tag_name,
            value,
            children,
            attributes,
        }
    }

    /// One `view` per array element, each holding a fresh copy of the
    /// repeater's children.
    fn expand_repeater(
        &self,
        attributes: &BTreeMap<String, AttrValue>,
        template: &[Node<'_, '_>],
        subs: &[Substitution],
    ) -> Vec<ConfigNode> {
        let token = attributes
            .get("indexflag")
            .and_then(AttrValue::as_str)
            .filter(|flag| !flag.is_empty())
            .unwrap_or(DEFAULT_INDEX_FLAG);

        let count = match attributes.get("on").and_then(AttrValue::as_str) {
            Some(path) => match data_path::resolve(self.data, path) {
                Some(Value::Array(items)) => items.len(),
                _ => {
                    debug!(path, "repeater data is missing or not an array");
                    0
                }
            },
            None => {
                debug!("repeater has no 'on' attribute");
                0
            }
        };

        (0..count)
            .map(|idx| {
                let mut scoped = subs.to_vec();
                scoped.push((token.to_string(), idx));
                ConfigNode {
                    id: guid(),
                    node_type: "view".to_string(),
                    tag_name: "View".to_string(),
                    value: None,
                    children: template
                        .iter()
                        .map(|child| self.build(*child, &scoped))
                        .collect(),
                    attributes: BTreeMap::new(),
                }
            })
            .collect()
    }

    fn inner_markup(&self, node: Node<'_, '_>) -> Option<String> {
        let first = node.first_child()?;
        let last = node.last_child()?;
        let inner = self.source.get(first.range().start..last.range().end)?.trim();
        (!inner.is_empty()).then(|| inner.to_string())
    }
}

fn text_content(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

// Innermost repeater wins when two repeaters share a token.
fn substitute(raw: &str, subs: &[Substitution]) -> String {
    let mut out = raw.to_string();
    for (token, idx) in subs.iter().rev() {
        if out.contains(token.as_str()) {
            out = out.replace(token.as_str(), &idx.to_string());
        }
    }
    out
}
