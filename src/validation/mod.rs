//! Configuration and result validation.
//!
//! Two validators share one report type:
//!
//! - [`validate_config`] checks a compiled configuration against the tag
//!   registry: references, control/object compatibility, required and
//!   numeric attributes, option placement, name uniqueness
//! - [`validate_results`] checks wire records against a live tag tree
//!
//! Reports are not delivered synchronously to observers. They wait in an
//! [`ErrorQueue`] until the owner drains it on its next tick.

mod report;

pub use report::{ErrorCode, Severity, ValidationError, ValidationReport};

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ConfigNode;
use crate::model::{MainValue, WireRecord, WireResult};
use crate::registry::{TagKind, TagModel, TagRegistry};
use crate::tags::TagTree;

/// Attributes that must parse as numbers when present.
const NUMERIC_ATTRIBUTES: [&str; 4] = ["maxrating", "min", "max", "step"];

/// Model name used for problems found in result records.
const RESULT_MODEL: &str = "result";

/// What [`validate`] should check.
#[derive(Clone, Copy, Debug)]
pub enum ValidationTarget<'a> {
    Config(&'a ConfigNode),
    Results(&'a [WireRecord]),
}

/// Runs the validator matching `target`.
///
/// Result validation needs a tag tree; without one every record reference
/// is unresolvable, so the caller is expected to pass it.
pub fn validate(
    target: ValidationTarget<'_>,
    registry: &TagRegistry,
    tree: &TagTree,
) -> ValidationReport {
    match target {
        ValidationTarget::Config(root) => validate_config(root, registry),
        ValidationTarget::Results(records) => validate_results(records, tree),
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Validates a compiled configuration.
pub fn validate_config(root: &ConfigNode, registry: &TagRegistry) -> ValidationReport {
    let mut report = ValidationReport::new();
    let nodes = root.walk();

    let mut names: BTreeMap<&str, &ConfigNode> = BTreeMap::new();
    for node in nodes.iter().copied() {
        if let Some(name) = node.name() {
            if names.insert(name, node).is_some() {
                report.add(
                    ValidationError::new(ErrorCode::General, &node.node_type, "name")
                        .value(name)
                        .valid_type("unique name"),
                );
            }
        }
    }

    let objects: Vec<&ConfigNode> = nodes
        .iter()
        .copied()
        .filter(|n| {
            registry
                .model_by_tag(&n.node_type)
                .is_ok_and(|m| m.kind == TagKind::Object)
        })
        .collect();

    let mut checker = ConfigChecker {
        registry,
        names: &names,
        objects: &objects,
        report: &mut report,
    };
    checker.check(root, &mut Vec::new());

    debug!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "validated configuration"
    );
    report
}

struct ConfigChecker<'a, 'n> {
    registry: &'a TagRegistry,
    names: &'a BTreeMap<&'n str, &'n ConfigNode>,
    objects: &'a [&'n ConfigNode],
    report: &'a mut ValidationReport,
}

impl<'n> ConfigChecker<'_, 'n> {
    fn check(&mut self, node: &'n ConfigNode, ancestors: &mut Vec<&'n ConfigNode>) {
        match self.registry.model_by_tag(&node.node_type) {
            Ok(model) => {
                self.check_numeric(node);
                match model.kind {
                    TagKind::Control => self.check_control(node, model),
                    TagKind::Object => self.check_required(node, &["name", "value"]),
                    TagKind::Label => self.check_label(node, model, ancestors),
                    TagKind::Visual => {}
                }
            }
            Err(_) => self.report.add(
                ValidationError::new(ErrorCode::TagUnsupported, &node.node_type, "type")
                    .value(&node.tag_name),
            ),
        }

        ancestors.push(node);
        for child in &node.children {
            self.check(child, ancestors);
        }
        ancestors.pop();
    }

    fn check_required(&mut self, node: &ConfigNode, attributes: &[&str]) {
        for attr in attributes {
            let present = node.attr(attr).is_some() || (*attr == "value" && node.value.is_some());
            if !present {
                self.report
                    .add(ValidationError::new(ErrorCode::Required, &node.node_type, *attr));
            }
        }
    }

    fn check_numeric(&mut self, node: &ConfigNode) {
        for attr in NUMERIC_ATTRIBUTES {
            if let Some(raw) = node.attr(attr) {
                let text = raw.to_string();
                if text.trim().parse::<f64>().is_err() {
                    self.report.add(
                        ValidationError::new(ErrorCode::BadType, &node.node_type, attr)
                            .value(text)
                            .valid_type("number"),
                    );
                }
            }
        }
    }

    fn check_control(&mut self, node: &ConfigNode, model: &TagModel) {
        self.check_required(node, &["name"]);

        let targets: Vec<&str> = node
            .attr_str("toname")
            .map(|raw| raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        if targets.is_empty() {
            if self.objects.len() != 1 {
                self.report.add(
                    ValidationError::new(ErrorCode::Required, &node.node_type, "toname")
                        .valid_type("name of an object tag"),
                );
            }
            return;
        }

        for target in targets {
            let Some(object) = self.names.get(target) else {
                self.report.add(
                    ValidationError::new(ErrorCode::TagNotFound, &node.node_type, "toname")
                        .value(target),
                );
                continue;
            };
            let is_object = self.objects.iter().any(|o| std::ptr::eq(*o, *object));
            if !is_object || !model.supports_object(&object.node_type) {
                let valid = if model.object_types.is_empty() {
                    "object tag".to_string()
                } else {
                    model.object_types.join("|")
                };
                self.report.add(
                    ValidationError::new(ErrorCode::TagUnsupported, &node.node_type, "toname")
                        .value(&object.node_type)
                        .valid_type(valid),
                );
            }
        }
    }

    fn check_label(&mut self, node: &ConfigNode, model: &TagModel, ancestors: &[&ConfigNode]) {
        self.check_required(node, &["value"]);
        if model.parent_types.is_empty() {
            return;
        }

        let parent = ancestors.iter().rev().find(|a| {
            self.registry
                .model_by_tag(&a.node_type)
                .is_ok_and(|m| m.kind == TagKind::Control)
        });
        let parent_type = parent.map(|p| p.node_type.as_str());
        if !parent_type.is_some_and(|t| model.parent_types.iter().any(|p| p == t)) {
            self.report.add(
                ValidationError::new(ErrorCode::ParentTag, &node.node_type, "parent")
                    .value(parent_type.unwrap_or("none"))
                    .valid_type(model.parent_types.join("|")),
            );
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Validates wire records against the live tag tree.
pub fn validate_results(records: &[WireRecord], tree: &TagTree) -> ValidationReport {
    let mut report = ValidationReport::new();

    let result_ids: Vec<&str> = records
        .iter()
        .filter_map(WireRecord::as_result)
        .map(|r| r.id.as_str())
        .collect();

    for record in records {
        match record {
            WireRecord::Result(result) => check_result(result, tree, &mut report),
            WireRecord::Relation(relation) => {
                for (field, id) in [("from_id", &relation.from_id), ("to_id", &relation.to_id)] {
                    if !result_ids.contains(&id.as_str()) {
                        report.add(
                            ValidationError::new(ErrorCode::General, "relation", field)
                                .value(id.as_str())
                                .valid_type("id of a result in the same annotation"),
                        );
                    }
                }
            }
        }
    }

    debug!(
        records = records.len(),
        errors = report.error_count(),
        "validated results"
    );
    report
}

fn check_result(result: &WireResult, tree: &TagTree, report: &mut ValidationReport) {
    let control = tree.by_name(&result.from_name).filter(|t| t.is_control());
    let object = tree.by_name(&result.to_name).filter(|t| t.is_object());

    if control.is_none() {
        report.add(
            ValidationError::new(ErrorCode::TagNotFound, RESULT_MODEL, "from_name")
                .value(&result.from_name),
        );
    }
    if object.is_none() {
        report.add(
            ValidationError::new(ErrorCode::TagNotFound, RESULT_MODEL, "to_name")
                .value(&result.to_name),
        );
    }
    let Some(control) = control else {
        return;
    };

    if object.is_some() && !control.to_name.iter().any(|n| n == &result.to_name) {
        report.add(
            ValidationError::new(ErrorCode::TagUnsupported, RESULT_MODEL, "to_name")
                .value(&result.to_name)
                .valid_type(control.to_name.join("|")),
        );
    }

    if let Some(expected) = control.result_type() {
        if expected != result.result_type {
            report.add(
                ValidationError::new(ErrorCode::BadType, RESULT_MODEL, "type")
                    .value(result.result_type.as_str())
                    .valid_type(expected.as_str()),
            );
            return;
        }
    }

    if let Some(key) = result.result_type.value_key() {
        match result.main_value() {
            None => report.add(
                ValidationError::new(ErrorCode::Required, RESULT_MODEL, "value")
                    .value(key)
                    .warning(),
            ),
            Some(raw) if MainValue::from_json(result.result_type, raw).is_none() => report.add(
                ValidationError::new(ErrorCode::BadType, RESULT_MODEL, "value")
                    .value(raw.to_string())
                    .valid_type(format!("{:?}", result.result_type.value_shape())),
            ),
            Some(_) => {}
        }
    }
}

// ============================================================================
// Deferred delivery
// ============================================================================

/// Holds reports until the next tick.
#[derive(Debug, Default)]
pub struct ErrorQueue {
    pending: Option<ValidationReport>,
}

impl ErrorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a report; empty reports are ignored.
    pub fn enqueue(&mut self, report: ValidationReport) {
        if report.is_clean() {
            return;
        }
        self.pending.get_or_insert_with(ValidationReport::new).merge(report);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes everything queued since the last drain.
    pub fn drain(&mut self) -> Option<ValidationReport> {
        self.pending.take()
    }
}
