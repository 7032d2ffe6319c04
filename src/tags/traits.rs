//! Capability traits assembled onto tag instances.
//!
//! A live tag is not an instance of a class hierarchy. Its behavior comes
//! from small, independent capability structs picked at construction time
//! from the tag's model and attributes:
//!
//! - [`ControlBehavior`]: result type and value rules of a control
//! - [`Visibility`]: `visibleWhen` gating
//! - [`PerRegion`]: results attach to an existing region
//! - [`PerItem`]: results carry the object item index
//! - [`ReadOnly`]: the tag refuses edits
//! - [`ObjectSource`]: an object's data binding (`value="$image"`)
//!
//! Capabilities are built independently of each other with one exception:
//! [`PerRegion`] is built after [`Visibility`] and reuses its
//! `whenLabelValue`, so the label gate lives in one place.

use serde_json::Value;

use crate::config::{data_path, AttrValue, ConfigNode};
use crate::model::ResultType;
use crate::registry::{TagKind, TagModel};

/// A capability that may or may not apply to a tag.
pub trait Capability: Sized {
    fn from_node(node: &ConfigNode, model: &TagModel) -> Option<Self>;
}

/// Value rules of a control tag.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlBehavior {
    pub result_type: ResultType,
    /// An explicit empty selection is meaningful (`allowEmpty`).
    pub allow_empty: bool,
    pub required: bool,
    /// More than one option may be selected (`choice="multiple"`).
    pub multiple: bool,
}

impl Capability for ControlBehavior {
    fn from_node(node: &ConfigNode, model: &TagModel) -> Option<Self> {
        if model.kind != TagKind::Control {
            return None;
        }
        Some(Self {
            result_type: model.result_type?,
            allow_empty: node.attr_flag("allowempty"),
            required: node.attr_flag("required"),
            multiple: node.attr_str("choice") == Some("multiple"),
        })
    }
}

/// Condition under which a tag is shown (and its results exported).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibleWhen {
    ChoiceSelected,
    ChoiceUnselected,
    RegionSelected,
    NoRegionSelected,
}

impl VisibleWhen {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "choice-selected" => Some(VisibleWhen::ChoiceSelected),
            "choice-unselected" => Some(VisibleWhen::ChoiceUnselected),
            "region-selected" => Some(VisibleWhen::RegionSelected),
            "no-region-selected" => Some(VisibleWhen::NoRegionSelected),
            _ => None,
        }
    }
}

/// `visibleWhen` / `whenTagName` / `whenChoiceValue` / `whenLabelValue`.
#[derive(Clone, Debug, PartialEq)]
pub struct Visibility {
    pub visible_when: Option<VisibleWhen>,
    pub when_tag_name: Option<String>,
    pub when_choice_value: Vec<String>,
    pub when_label_value: Option<String>,
}

impl Visibility {
    /// Whether a set of selected choices satisfies this condition.
    ///
    /// `choices` yields `(control name, selected values)` for every choices
    /// result in the annotation, excluding the result being checked.
    pub fn choice_condition<'a, I>(&self, choices: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a [String])>,
    {
        let selected = choices.into_iter().any(|(control, values)| {
            if let Some(tag) = &self.when_tag_name {
                if tag != control {
                    return false;
                }
            }
            if self.when_choice_value.is_empty() {
                !values.is_empty()
            } else {
                values.iter().any(|v| self.when_choice_value.contains(v))
            }
        });

        match self.visible_when {
            Some(VisibleWhen::ChoiceSelected) => selected,
            Some(VisibleWhen::ChoiceUnselected) => !selected,
            _ => true,
        }
    }
}

impl Capability for Visibility {
    fn from_node(node: &ConfigNode, _model: &TagModel) -> Option<Self> {
        let visible_when = node.attr_str("visiblewhen").and_then(VisibleWhen::parse);
        let when_label_value = node.attr_str("whenlabelvalue").map(str::to_string);
        if visible_when.is_none() && when_label_value.is_none() {
            return None;
        }
        Some(Self {
            visible_when,
            when_tag_name: node.attr_str("whentagname").map(str::to_string),
            when_choice_value: node
                .attr_str("whenchoicevalue")
                .map(|raw| {
                    raw.split(',')
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            when_label_value,
        })
    }
}

/// Results of this control decorate an existing region.
#[derive(Clone, Debug, PartialEq)]
pub struct PerRegion {
    /// Only export when the region carries this label.
    pub when_label_value: Option<String>,
}

impl PerRegion {
    fn after_visibility(node: &ConfigNode, visibility: Option<&Visibility>) -> Option<Self> {
        if !node.attr_flag("perregion") {
            return None;
        }
        Some(Self {
            when_label_value: visibility.and_then(|v| v.when_label_value.clone()),
        })
    }
}

/// Results of this control carry the object's current item index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PerItem;

impl Capability for PerItem {
    fn from_node(node: &ConfigNode, _model: &TagModel) -> Option<Self> {
        node.attr_flag("peritem").then_some(PerItem)
    }
}

/// The tag refuses edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadOnly;

impl Capability for ReadOnly {
    fn from_node(node: &ConfigNode, _model: &TagModel) -> Option<Self> {
        node.attr_flag("readonly").then_some(ReadOnly)
    }
}

/// Where an object tag takes its data from.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectSource {
    /// `$key` reference or literal.
    pub value: Option<String>,
}

impl ObjectSource {
    /// Resolves the binding against the task data.
    pub fn resolve(&self, task_data: &Value) -> Option<String> {
        self.value
            .as_deref()
            .and_then(|raw| data_path::resolve_text(task_data, raw))
    }
}

impl Capability for ObjectSource {
    fn from_node(node: &ConfigNode, model: &TagModel) -> Option<Self> {
        if model.kind != TagKind::Object {
            return None;
        }
        let value = node
            .attr("value")
            .map(AttrValue::to_string)
            .or_else(|| node.value.clone());
        Some(Self { value })
    }
}

/// Every capability a tag carries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Capabilities {
    pub control: Option<ControlBehavior>,
    pub visibility: Option<Visibility>,
    pub per_region: Option<PerRegion>,
    pub per_item: Option<PerItem>,
    pub read_only: Option<ReadOnly>,
    pub object: Option<ObjectSource>,
}

impl Capabilities {
    pub fn assemble(node: &ConfigNode, model: &TagModel) -> Self {
        let visibility = Visibility::from_node(node, model);
        let per_region = PerRegion::after_visibility(node, visibility.as_ref());
        Self {
            control: ControlBehavior::from_node(node, model),
            per_region,
            visibility,
            per_item: PerItem::from_node(node, model),
            read_only: ReadOnly::from_node(node, model),
            object: ObjectSource::from_node(node, model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile;
    use serde_json::json;

    fn first_child(config: &str) -> ConfigNode {
        compile(config, &json!({}))
            .expect("compile")
            .children
            .remove(0)
    }

    #[test]
    fn control_behavior_reads_flags() {
        let node = first_child(
            r#"<View><Choices name="c" toName="t" choice="multiple" required="true"/></View>"#,
        );
        let model = TagModel::control("choices", ResultType::Choices, &[]);
        let caps = Capabilities::assemble(&node, &model);
        let control = caps.control.expect("control");
        assert!(control.multiple);
        assert!(control.required);
        assert!(!control.allow_empty);
        assert!(caps.visibility.is_none());
        assert!(caps.object.is_none());
    }

    #[test]
    fn per_region_reuses_label_gate() {
        let node = first_child(
            r#"<View><TextArea name="t" toName="img" perRegion="true" whenLabelValue="Cat"/></View>"#,
        );
        let model = TagModel::control("textarea", ResultType::TextArea, &[]);
        let caps = Capabilities::assemble(&node, &model);
        assert_eq!(
            caps.per_region,
            Some(PerRegion {
                when_label_value: Some("Cat".into())
            })
        );
    }

    #[test]
    fn choice_condition_filters_by_tag_and_value() {
        let node = first_child(
            r#"<View><Rating name="r" toName="t" visibleWhen="choice-selected" whenTagName="sentiment" whenChoiceValue="Positive, Neutral"/></View>"#,
        );
        let visibility =
            Visibility::from_node(&node, &TagModel::visual("rating")).expect("visibility");

        let positive = vec!["Positive".to_string()];
        let negative = vec!["Negative".to_string()];
        assert!(visibility.choice_condition([("sentiment", positive.as_slice())]));
        assert!(!visibility.choice_condition([("sentiment", negative.as_slice())]));
        assert!(!visibility.choice_condition([("other", positive.as_slice())]));
        assert!(!visibility.choice_condition(std::iter::empty()));
    }

    #[test]
    fn choice_unselected_inverts() {
        let node = first_child(
            r#"<View><Rating name="r" toName="t" visibleWhen="choice-unselected"/></View>"#,
        );
        let visibility =
            Visibility::from_node(&node, &TagModel::visual("rating")).expect("visibility");
        let any = vec!["x".to_string()];
        assert!(visibility.choice_condition(std::iter::empty()));
        assert!(!visibility.choice_condition([("c", any.as_slice())]));
    }

    #[test]
    fn object_source_resolves_task_data() {
        let node = first_child(r#"<View><Image name="img" value="$image"/></View>"#);
        let source = ObjectSource::from_node(&node, &TagModel::object("image")).expect("object");
        assert_eq!(
            source.resolve(&json!({"image": "a.jpg"})).as_deref(),
            Some("a.jpg")
        );
    }
}
