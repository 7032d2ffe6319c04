//! Annotations: one labeler's (or model's) regions and results for a task.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::history::{History, Snapshot};
use super::ids::{AnnotationId, RegionId};
use super::kinds::{RegionKind, ResultType};
use super::region::{Region, ResultItem};
use super::relation::Relation;
use super::value::MainValue;
use super::wire::{RelationDirection, WireRecord, WireResult};
use crate::error::LabelError;
use crate::registry::TagRegistry;
use crate::tags::{LabelDef, ScopedName, TagInstance, TagTree};

/// What an annotation-shaped entity stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Annotation,
    Prediction,
    /// A read-only snapshot of a server history entry.
    History,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnnotationState {
    #[default]
    Draft,
    Submitted,
}

/// Saved versions of an annotation's result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Versions {
    pub draft: Option<Vec<WireRecord>>,
    pub result: Option<Vec<WireRecord>>,
}

#[derive(Clone, Debug)]
pub struct Annotation {
    pub id: AnnotationId,
    pub kind: EntityKind,
    regions: Vec<Region>,
    relations: Vec<Relation>,
    /// Waiting for the second end of a relation.
    pub relation_mode: bool,
    history: History,
    pub versions: Versions,
    pub state: AnnotationState,
    pub user_generate: bool,
    pub sent_user_generate: bool,
    pub skipped: bool,
    pub ground_truth: bool,
    pub editable: bool,
    pub parent_prediction: Option<AnnotationId>,
    pub parent_annotation: Option<AnnotationId>,
    /// Changed since the last draft save.
    pub draft_dirty: bool,
    current_items: BTreeMap<String, u64>,
}

impl Annotation {
    pub fn new(id: AnnotationId, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            regions: vec![],
            relations: vec![],
            relation_mode: false,
            history: History::default(),
            versions: Versions::default(),
            state: AnnotationState::Draft,
            user_generate: false,
            sent_user_generate: false,
            skipped: false,
            ground_truth: false,
            editable: kind == EntityKind::Annotation,
            parent_prediction: None,
            parent_annotation: None,
            draft_dirty: false,
            current_items: BTreeMap::new(),
        }
    }

    /// Builds an annotation from wire records; see [`Annotation::deserialize`].
    pub fn from_records(
        id: AnnotationId,
        kind: EntityKind,
        records: &[WireRecord],
        tree: &TagTree,
        registry: &TagRegistry,
    ) -> (Self, Vec<String>) {
        let mut annotation = Self::new(id, kind);
        let skipped = annotation.deserialize(records, tree, registry);
        (annotation, skipped)
    }

    // ========================================================================
    // Regions and results
    // ========================================================================

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| &r.id == id)
    }

    /// Direct access for display flags (`hidden`, `highlighted`). Not
    /// recorded in the undo history.
    pub fn region_mut(&mut self, id: &RegionId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| &r.id == id)
    }

    fn region_index(&self, id: &RegionId) -> Result<usize, LabelError> {
        self.regions
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| LabelError::RegionNotFound(id.to_string()))
    }

    pub fn results(&self) -> impl Iterator<Item = (&Region, &ResultItem)> {
        self.regions
            .iter()
            .flat_map(|region| region.results.iter().map(move |result| (region, result)))
    }

    fn ensure_editable(&self) -> Result<(), LabelError> {
        if self.editable {
            Ok(())
        } else {
            Err(LabelError::ReadOnly {
                name: self.id.to_string(),
            })
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            regions: self.regions.clone(),
            relations: self.relations.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.regions = snapshot.regions;
        self.relations = snapshot.relations;
        self.relation_mode = false;
        self.draft_dirty = true;
    }

    fn record(&mut self) {
        let before = self.snapshot();
        self.history.record(before);
        self.draft_dirty = true;
    }

    /// Adds an empty region inside the object named `object`.
    pub fn create_region(
        &mut self,
        kind: RegionKind,
        object: &str,
        shape: Map<String, Value>,
    ) -> Result<RegionId, LabelError> {
        self.ensure_editable()?;
        self.record();
        let region = Region::new(kind, ScopedName::new(object, Some(&self.id)), shape);
        let id = region.id.clone();
        debug!(annotation = %self.id, region = %id, %kind, "created region");
        self.regions.push(region);
        Ok(id)
    }

    /// Sets the value `control` contributes to a region, creating the
    /// result when the control has none there yet.
    pub fn set_result(
        &mut self,
        tree: &TagTree,
        region: &RegionId,
        control: &str,
        value: MainValue,
    ) -> Result<(), LabelError> {
        self.ensure_editable()?;
        let tag = control_tag(tree, control)?;
        let result_type = tag.result_type().ok_or_else(|| not_a_control(tree, control))?;
        if tag.is_read_only() {
            return Err(LabelError::ReadOnly {
                name: control.to_string(),
            });
        }

        let idx = self.region_index(region)?;
        if self.regions[idx].readonly {
            return Err(LabelError::ReadOnly {
                name: region.to_string(),
            });
        }

        let mut result = match self.regions[idx].result_by_control(control) {
            Some(existing) => existing.clone(),
            None => ResultItem::new(
                ScopedName::new(control, Some(&self.id)),
                self.regions[idx].object.clone(),
                result_type,
            ),
        };
        result.set_value(value)?;

        let item_index = tag.caps.per_item.map(|_| {
            self.current_items
                .get(self.regions[idx].object.base())
                .copied()
                .unwrap_or(0)
        });

        self.record();
        let target = &mut self.regions[idx];
        if item_index.is_some() {
            target.item_index = item_index;
        }
        match target.result_by_control_mut(control) {
            Some(existing) => *existing = result,
            None => target.results.push(result),
        }
        Ok(())
    }

    /// Sets the item index per-item controls stamp for `object`.
    pub fn select_item(&mut self, object: &str, index: u64) {
        self.current_items.insert(object.to_string(), index);
    }

    // ========================================================================
    // Selection and relations
    // ========================================================================

    pub fn select_area(&mut self, id: &RegionId) -> Result<(), LabelError> {
        let idx = self.region_index(id)?;
        for region in &mut self.regions {
            region.selected = false;
        }
        self.regions[idx].selected = true;
        Ok(())
    }

    /// Deselects every region and leaves relation mode.
    pub fn unselect_areas(&mut self) {
        for region in &mut self.regions {
            region.selected = false;
        }
        self.relation_mode = false;
    }

    pub fn selected_region(&self) -> Option<&Region> {
        self.regions.iter().find(|r| r.selected)
    }

    /// Enters relation mode from the selected region. False when nothing is
    /// selected.
    pub fn start_relation_mode(&mut self) -> bool {
        self.relation_mode = self.selected_region().is_some();
        self.relation_mode
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn add_relation(
        &mut self,
        from: &RegionId,
        to: &RegionId,
        direction: RelationDirection,
    ) -> Result<(), LabelError> {
        self.ensure_editable()?;
        self.region_index(from)?;
        self.region_index(to)?;
        self.relation_mode = false;
        if self
            .relations
            .iter()
            .any(|r| &r.from_id == from && &r.to_id == to)
        {
            return Ok(());
        }
        self.record();
        self.relations.push(Relation {
            direction,
            ..Relation::new(from.clone(), to.clone())
        });
        Ok(())
    }

    pub fn delete_relation(&mut self, from: &RegionId, to: &RegionId) -> bool {
        let Some(idx) = self
            .relations
            .iter()
            .position(|r| &r.from_id == from && &r.to_id == to)
        else {
            return false;
        };
        self.record();
        self.relations.remove(idx);
        true
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Deletes a region with its results and every relation touching it.
    /// Children pointing at it lose their parent.
    pub fn delete_region(&mut self, id: &RegionId) -> Result<Region, LabelError> {
        let idx = self.region_index(id)?;
        self.record();
        Ok(self.remove_region_at(idx))
    }

    fn remove_region_at(&mut self, idx: usize) -> Region {
        if self.regions[idx].selected {
            self.unselect_areas();
        }
        let removed = self.regions.remove(idx);
        self.relations.retain(|r| !r.touches(&removed.id));
        for region in &mut self.regions {
            if region.parent_id.as_ref() == Some(&removed.id) {
                region.parent_id = None;
            }
        }
        debug!(annotation = %self.id, region = %removed.id, "deleted region");
        removed
    }

    /// Detaches the result `control` put on a region.
    ///
    /// A transcription result takes its region with it when nothing else is
    /// left on the region.
    pub fn delete_result(
        &mut self,
        region: &RegionId,
        control: &str,
    ) -> Result<Option<ResultItem>, LabelError> {
        let idx = self.region_index(region)?;
        let Some(pos) = self.regions[idx]
            .results
            .iter()
            .position(|r| r.from_name.base() == control)
        else {
            return Ok(None);
        };

        self.record();
        let removed = self.regions[idx].results.remove(pos);
        if removed.result_type == ResultType::TextArea && self.regions[idx].results.is_empty() {
            self.remove_region_at(idx);
        }
        Ok(Some(removed))
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Exported records: every result that has a value, sits on a region
    /// with a serializable shape, and can be submitted; then the relations.
    pub fn serialize(&self, tree: &TagTree) -> Vec<WireRecord> {
        self.collect_records(|region, result| self.can_be_submitted(tree, region, result))
    }

    /// Like [`Annotation::serialize`] without visibility gating.
    pub fn serialize_raw(&self) -> Vec<WireRecord> {
        self.collect_records(|_, _| true)
    }

    fn collect_records<F>(&self, keep: F) -> Vec<WireRecord>
    where
        F: Fn(&Region, &ResultItem) -> bool,
    {
        let mut records: Vec<WireRecord> = self
            .results()
            .filter(|(region, result)| region.has_serializable_shape() && result.has_value())
            .filter(|(region, result)| keep(*region, *result))
            .map(|(region, result)| WireRecord::Result(region.to_wire(result)))
            .collect();

        records.extend(
            self.relations
                .iter()
                .filter(|r| self.region(&r.from_id).is_some() && self.region(&r.to_id).is_some())
                .map(|r| WireRecord::Relation(r.to_wire())),
        );
        records
    }

    /// Whether a result passes its control's visibility rules.
    ///
    /// A per-region control gated on a label needs its region to carry the
    /// label. Choice-based visibility applies to the control and to every
    /// enclosing tag.
    pub fn can_be_submitted(&self, tree: &TagTree, region: &Region, result: &ResultItem) -> bool {
        let Some(control) = tree.resolve(&result.from_name) else {
            return false;
        };

        if let Some(label) = control
            .caps
            .per_region
            .as_ref()
            .and_then(|p| p.when_label_value.as_deref())
        {
            if !region.has_label(label) {
                return false;
            }
        }

        let choices: Vec<(&str, &[String])> = self
            .results()
            .map(|(_, r)| r)
            .filter(|r| r.result_type == ResultType::Choices && r.from_name != result.from_name)
            .map(|r| (r.from_name.base(), r.list_values()))
            .collect();

        tree.self_and_ancestors(control.id).all(|tag| {
            tag.caps
                .visibility
                .as_ref()
                .map_or(true, |v| v.choice_condition(choices.iter().copied()))
        })
    }

    /// Loads wire records, grouping results that share an id into one
    /// region. Returns the ids of records that could not be loaded.
    ///
    /// Clears the undo history.
    pub fn deserialize(
        &mut self,
        records: &[WireRecord],
        tree: &TagTree,
        registry: &TagRegistry,
    ) -> Vec<String> {
        let mut skipped = Vec::new();

        for record in records {
            if let WireRecord::Result(result) = record {
                if let Err(err) = self.load_result(result, tree, registry) {
                    warn!(annotation = %self.id, record = %result.id, error = %err, "skipping result");
                    skipped.push(result.id.clone());
                }
            }
        }

        for record in records {
            if let WireRecord::Relation(wire) = record {
                let relation = Relation::from_wire(wire);
                let known = self.region(&relation.from_id).is_some()
                    && self.region(&relation.to_id).is_some();
                if known {
                    self.relations.push(relation);
                } else {
                    warn!(annotation = %self.id, from = %wire.from_id, to = %wire.to_id, "skipping relation with unknown endpoint");
                    skipped.push(format!("{}->{}", wire.from_id, wire.to_id));
                }
            }
        }

        self.history.reset();
        debug!(
            annotation = %self.id,
            regions = self.regions.len(),
            skipped = skipped.len(),
            "deserialized annotation"
        );
        skipped
    }

    fn load_result(
        &mut self,
        record: &WireResult,
        tree: &TagTree,
        registry: &TagRegistry,
    ) -> Result<(), LabelError> {
        let control = control_tag(tree, &record.from_name)?;
        let object = tree
            .by_name(&record.to_name)
            .filter(|t| t.is_object())
            .ok_or_else(|| LabelError::UnresolvedToName {
                tag: record.from_name.clone(),
                to_name: record.to_name.clone(),
                known: tree.names().base_names().to_vec(),
            })?;

        let value_key = record.result_type.value_key();
        let value = match record.main_value() {
            Some(raw) => Some(MainValue::from_json(record.result_type, raw).ok_or_else(|| {
                LabelError::ValueTypeMismatch {
                    control: record.from_name.clone(),
                    expected: format!("{:?}", record.result_type.value_shape()),
                    found: raw.to_string(),
                }
            })?),
            None => None,
        };

        let mut shape = record.value.clone();
        if let Some(key) = value_key {
            shape.remove(key);
        }

        let kind = record
            .result_type
            .implied_region()
            .or_else(|| {
                record
                    .result_type
                    .is_labels()
                    .then(|| {
                        registry
                            .available_areas(&object.type_name, &Value::Object(shape.clone()))
                            .first()
                            .copied()
                    })
                    .flatten()
            })
            .unwrap_or(RegionKind::Classification);

        let scope = self.id.clone();
        let id = RegionId::new(record.id.clone());
        let idx = match self.regions.iter().position(|r| r.id == id) {
            Some(idx) => idx,
            None => {
                self.regions.push(Region::with_id(
                    id,
                    kind,
                    ScopedName::new(record.to_name.clone(), Some(&scope)),
                    Map::new(),
                ));
                self.regions.len() - 1
            }
        };

        let region = &mut self.regions[idx];
        if region.kind == RegionKind::Classification && kind != RegionKind::Classification {
            region.kind = kind;
        }
        if region.shape.is_empty() {
            region.shape = shape;
        }
        if region.parent_id.is_none() {
            region.parent_id = record.parent_id.as_deref().map(RegionId::from);
        }
        region.item_index = region.item_index.or(record.item_index);
        region.readonly |= record.readonly || control.is_read_only();
        region.interactive_mode |= record.interactive_mode;
        if let Some(origin) = &record.origin {
            region.origin = origin.clone();
        }
        for (key, value) in &record.extra {
            region
                .extra
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        let result = ResultItem {
            value,
            score: record.score,
            meta: record.meta.clone(),
            ..ResultItem::new(
                ScopedName::new(record.from_name.clone(), Some(&scope)),
                ScopedName::new(record.to_name.clone(), Some(&scope)),
                record.result_type,
            )
        };
        match region.result_by_control_mut(&record.from_name) {
            Some(existing) => *existing = result,
            None => region.results.push(result),
        }
        Ok(())
    }

    /// Labels selected on a region, resolved through the controls' options.
    ///
    /// An explicit empty selection maps to the empty label when the control
    /// allows one. Stored values that match no option are dropped.
    pub fn selected_labels(&self, tree: &TagTree, region: &RegionId) -> Vec<LabelDef> {
        let Some(region) = self.region(region) else {
            return vec![];
        };

        let mut labels = Vec::new();
        for result in region.results.iter().filter(|r| r.result_type.is_labels()) {
            let Some(control) = tree.resolve(&result.from_name) else {
                continue;
            };
            match &result.value {
                Some(value) if value.is_empty_list() => {
                    labels.extend(tree.find_label(control.id, None));
                }
                _ => labels.extend(
                    result
                        .list_values()
                        .iter()
                        .filter_map(|v| tree.find_label(control.id, Some(v))),
                ),
            }
        }
        labels
    }

    // ========================================================================
    // History and versions
    // ========================================================================

    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn reset_history(&mut self) {
        self.history.reset();
    }

    /// Stores the current export as the draft version.
    pub fn save_draft(&mut self, tree: &TagTree) -> Vec<WireRecord> {
        let records = self.serialize(tree);
        self.versions.draft = Some(records.clone());
        self.draft_dirty = false;
        records
    }

    /// Stores the current export as the submitted result.
    pub fn submit(&mut self, tree: &TagTree) -> Vec<WireRecord> {
        let records = self.serialize(tree);
        self.versions.result = Some(records.clone());
        self.versions.draft = None;
        self.state = AnnotationState::Submitted;
        self.skipped = false;
        self.draft_dirty = false;
        if self.user_generate {
            self.sent_user_generate = true;
        }
        debug!(annotation = %self.id, records = records.len(), "submitted annotation");
        records
    }

    /// Re-submits an already submitted annotation.
    pub fn update(&mut self, tree: &TagTree) -> Vec<WireRecord> {
        self.submit(tree)
    }

    pub fn skip(&mut self) {
        self.skipped = true;
        self.state = AnnotationState::Submitted;
        self.versions.draft = None;
        self.draft_dirty = false;
    }

    /// A rejected review returns the annotation to an editable draft.
    pub fn reject(&mut self) {
        self.state = AnnotationState::Draft;
        self.skipped = false;
        self.editable = true;
    }

    pub fn set_ground_truth(&mut self, value: bool) {
        self.ground_truth = value;
    }
}

fn not_a_control(tree: &TagTree, name: &str) -> LabelError {
    LabelError::NotAControl {
        name: name.to_string(),
        known: tree
            .iter()
            .filter(|t| t.is_control())
            .filter_map(|t| t.name.clone())
            .collect(),
    }
}

fn control_tag<'t>(tree: &'t TagTree, name: &str) -> Result<&'t TagInstance, LabelError> {
    tree.by_name(name)
        .filter(|t| t.is_control())
        .ok_or_else(|| not_a_control(tree, name))
}
