//! Live tag instances.
//!
//! [`TagTree::instantiate`] consumes a compiled [`ConfigNode`] tree, creates
//! one [`TagInstance`] per node through the [`TagRegistry`], and links the
//! instances into the `names`/`toNames` maps. Tags are stored in an arena and
//! refer to each other by [`TagId`]; results refer to tags by name only.

mod names;
pub mod traits;

pub use names::{NameRegistry, ScopedName};
pub use traits::{
    Capabilities, ControlBehavior, ObjectSource, PerItem, PerRegion, ReadOnly, VisibleWhen,
    Visibility,
};

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::{AttrValue, ConfigNode};
use crate::error::LabelError;
use crate::model::{AnnotationId, ResultType, TagId};
use crate::registry::{TagKind, TagModel, TagRegistry};

/// A live node of the configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct TagInstance {
    pub id: TagId,
    /// Id of the configuration node this tag was built from.
    pub config_id: String,
    /// Lower-cased tag type.
    pub type_name: String,
    pub tag_name: String,
    pub kind: TagKind,
    pub name: Option<String>,
    /// Object names this control is bound to.
    pub to_name: Vec<String>,
    /// `value` attribute, or text content for leaves.
    pub value: Option<String>,
    pub attributes: BTreeMap<String, AttrValue>,
    pub parent: Option<TagId>,
    pub children: Vec<TagId>,
    pub caps: Capabilities,
}

impl TagInstance {
    fn from_model(model: &TagModel, node: &ConfigNode, id: TagId, parent: Option<TagId>) -> Self {
        let to_name = node
            .attr_str("toname")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id,
            config_id: node.id.clone(),
            type_name: node.node_type.clone(),
            tag_name: node.tag_name.clone(),
            kind: model.kind,
            name: node.name().map(str::to_string),
            to_name,
            value: node
                .attr("value")
                .map(AttrValue::to_string)
                .or_else(|| node.value.clone()),
            attributes: node.attributes.clone(),
            parent,
            children: vec![],
            caps: Capabilities::assemble(node, model),
        }
    }

    pub fn is_control(&self) -> bool {
        self.kind == TagKind::Control
    }

    pub fn is_object(&self) -> bool {
        self.kind == TagKind::Object
    }

    pub fn result_type(&self) -> Option<ResultType> {
        self.caps.control.as_ref().map(|c| c.result_type)
    }

    pub fn is_read_only(&self) -> bool {
        self.caps.read_only.is_some()
    }

    /// This tag's name bound to one annotation.
    pub fn bound_name(&self, annotation: &AnnotationId) -> Option<ScopedName> {
        self.name
            .as_deref()
            .map(|name| ScopedName::new(name, Some(annotation)))
    }
}

/// One option of a control, as seen by label lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelDef {
    pub value: String,
    pub alias: Option<String>,
    pub background: Option<String>,
    /// The designated "empty" label of an `allowEmpty` control.
    pub is_empty: bool,
}

impl LabelDef {
    fn empty() -> Self {
        Self {
            value: String::new(),
            alias: None,
            background: None,
            is_empty: true,
        }
    }
}

/// Arena of live tags plus the name maps linking them.
#[derive(Clone, Debug)]
pub struct TagTree {
    nodes: Vec<TagInstance>,
    names: NameRegistry,
}

impl TagTree {
    /// Builds live tags from a compiled configuration.
    ///
    /// Fails when a tag type is not registered, a name is used twice, or a
    /// `toName` does not resolve. A control without `toName` is bound to the
    /// only object tag when the configuration has exactly one.
    pub fn instantiate(registry: &TagRegistry, root: ConfigNode) -> Result<Self, LabelError> {
        let mut tree = Self {
            nodes: Vec::new(),
            names: NameRegistry::new(),
        };
        tree.add(registry, root, None)?;
        tree.link_names()?;
        debug!(
            tags = tree.nodes.len(),
            names = tree.names.base_names().len(),
            "instantiated tag tree"
        );
        Ok(tree)
    }

    fn add(
        &mut self,
        registry: &TagRegistry,
        mut node: ConfigNode,
        parent: Option<TagId>,
    ) -> Result<TagId, LabelError> {
        let model = registry.model_by_tag(&node.node_type)?;
        let id = TagId(self.nodes.len());
        let children = std::mem::take(&mut node.children);
        self.nodes
            .push(TagInstance::from_model(model, &node, id, parent));

        for child in children {
            let child_id = self.add(registry, child, Some(id))?;
            self.nodes[id.0].children.push(child_id);
        }
        Ok(id)
    }

    fn link_names(&mut self) -> Result<(), LabelError> {
        for tag in &self.nodes {
            if let Some(name) = &tag.name {
                self.names.register(name, tag.id)?;
            }
        }

        let objects: Vec<&str> = self
            .nodes
            .iter()
            .filter(|t| t.is_object())
            .filter_map(|t| t.name.as_deref())
            .collect();
        let inferred = match objects.as_slice() {
            [only] => Some(only.to_string()),
            _ => None,
        };

        for idx in 0..self.nodes.len() {
            if !self.nodes[idx].is_control() {
                continue;
            }
            if self.nodes[idx].to_name.is_empty() {
                match &inferred {
                    Some(object) => self.nodes[idx].to_name = vec![object.clone()],
                    None => return Err(self.unresolved(idx, "")),
                }
            }
            for to_name in self.nodes[idx].to_name.clone() {
                if !self.names.contains(&to_name) {
                    return Err(self.unresolved(idx, &to_name));
                }
                self.names.bind(&to_name, TagId(idx));
            }
        }
        Ok(())
    }

    fn unresolved(&self, idx: usize, to_name: &str) -> LabelError {
        let tag = &self.nodes[idx];
        LabelError::UnresolvedToName {
            tag: tag.name.clone().unwrap_or_else(|| tag.type_name.clone()),
            to_name: to_name.to_string(),
            known: self.names.base_names().to_vec(),
        }
    }

    pub fn root(&self) -> &TagInstance {
        &self.nodes[0]
    }

    pub fn get(&self, id: TagId) -> Option<&TagInstance> {
        self.nodes.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagInstance> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    pub fn names_mut(&mut self) -> &mut NameRegistry {
        &mut self.names
    }

    /// Resolves a (possibly scoped) name to its tag.
    pub fn resolve(&self, name: &ScopedName) -> Option<&TagInstance> {
        self.names.resolve(name).and_then(|id| self.get(id))
    }

    pub fn by_name(&self, name: &str) -> Option<&TagInstance> {
        self.names.get(name).and_then(|id| self.get(id))
    }

    /// The tag itself followed by its ancestors up to the root.
    pub fn self_and_ancestors(&self, id: TagId) -> impl Iterator<Item = &TagInstance> {
        std::iter::successors(self.get(id), move |tag| tag.parent.and_then(|p| self.get(p)))
    }

    /// All descendants, depth first.
    pub fn descendants(&self, id: TagId) -> Vec<&TagInstance> {
        let mut out = Vec::new();
        let mut stack: Vec<TagId> = self
            .get(id)
            .map(|t| t.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if let Some(tag) = self.get(next) {
                out.push(tag);
                stack.extend(tag.children.iter().rev().copied());
            }
        }
        out
    }

    /// Options declared under a control.
    pub fn labels_of(&self, control: TagId) -> Vec<LabelDef> {
        self.descendants(control)
            .into_iter()
            .filter(|t| t.kind == TagKind::Label)
            .map(|t| LabelDef {
                value: t.value.clone().unwrap_or_default(),
                alias: t.attributes.get("alias").map(AttrValue::to_string),
                background: t.attributes.get("background").map(AttrValue::to_string),
                is_empty: false,
            })
            .collect()
    }

    /// Finds an option by value or alias; `None` asks for the empty label.
    pub fn find_label(&self, control: TagId, value: Option<&str>) -> Option<LabelDef> {
        match value {
            Some(value) => self
                .labels_of(control)
                .into_iter()
                .find(|l| l.value == value || l.alias.as_deref() == Some(value)),
            None => self
                .get(control)
                .and_then(|t| t.caps.control.as_ref())
                .filter(|c| c.allow_empty)
                .map(|_| LabelDef::empty()),
        }
    }

    /// Object type a control's result lands on (`image`, `text`, ...).
    pub fn object_type_of(&self, to_name: &ScopedName) -> Option<&str> {
        self.resolve(to_name)
            .filter(|t| t.is_object())
            .map(|t| t.type_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile;
    use serde_json::json;

    fn tree(config: &str) -> Result<TagTree, LabelError> {
        let registry = TagRegistry::standard();
        TagTree::instantiate(&registry, compile(config, &json!({}))?)
    }

    #[test]
    fn single_object_infers_to_name() {
        let tree = tree(
            r#"<View><Labels name="l"><Label value="Cat"/></Labels><Text name="txt" value="$t"/></View>"#,
        )
        .expect("instantiate");
        let labels = tree.by_name("l").expect("labels tag");
        assert_eq!(labels.to_name, vec!["txt".to_string()]);
        let txt = tree.by_name("txt").expect("text tag");
        assert_eq!(tree.names().controls_for("txt"), &[labels.id]);
        assert!(txt.is_object());
    }

    #[test]
    fn ambiguous_missing_to_name_fails() {
        let err = tree(
            r#"<View><Choices name="c"/><Text name="a" value="x"/><Text name="b" value="y"/></View>"#,
        )
        .expect_err("ambiguous");
        assert!(matches!(err, LabelError::UnresolvedToName { ref tag, .. } if tag == "c"));
    }

    #[test]
    fn unresolved_to_name_lists_known_names() {
        let err = tree(r#"<View><Choices name="c" toName="nope"/><Text name="a" value="x"/></View>"#)
            .expect_err("unresolved");
        match err {
            LabelError::UnresolvedToName { to_name, known, .. } => {
                assert_eq!(to_name, "nope");
                assert_eq!(known, vec!["c".to_string(), "a".to_string()]);
            }
            other => panic!("expected UnresolvedToName, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_names_fail() {
        let err = tree(r#"<View><Text name="a" value="x"/><Text name="a" value="y"/></View>"#)
            .expect_err("duplicate");
        assert!(matches!(err, LabelError::DuplicateName { .. }));
    }

    #[test]
    fn unknown_tag_type_fails() {
        let err = tree(r#"<View><Widget name="w"/></View>"#).expect_err("unknown");
        assert!(matches!(err, LabelError::UnknownTag { ref name, .. } if name == "widget"));
    }

    #[test]
    fn find_label_by_value_alias_and_empty() {
        let tree = tree(
            r#"<View><Labels name="l" toName="t" allowEmpty="true"><Label value="Cat" alias="c"/><Label value="Dog"/></Labels><Text name="t" value="x"/></View>"#,
        )
        .expect("instantiate");
        let control = tree.by_name("l").expect("labels").id;
        assert_eq!(tree.find_label(control, Some("Dog")).map(|l| l.value), Some("Dog".into()));
        assert_eq!(tree.find_label(control, Some("c")).map(|l| l.value), Some("Cat".into()));
        assert_eq!(tree.find_label(control, Some("Bird")), None);
        assert!(tree.find_label(control, None).expect("empty label").is_empty);
    }

    #[test]
    fn ancestors_walk_to_root() {
        let tree = tree(
            r#"<View><View name="inner"><Choices name="c" toName="t"><Choice value="a"/></Choices></View><Text name="t" value="x"/></View>"#,
        )
        .expect("instantiate");
        let choices = tree.by_name("c").expect("choices");
        let chain: Vec<&str> = tree
            .self_and_ancestors(choices.id)
            .map(|t| t.type_name.as_str())
            .collect();
        assert_eq!(chain, vec!["choices", "view", "view"]);
    }
}
