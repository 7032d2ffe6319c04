//! The annotation store: every annotation, prediction and history snapshot
//! of one task, plus what is selected.
//!
//! The store owns the live [`TagTree`] and therefore the `names` /
//! `toNames` maps. At most one entity is selected at a time; selecting a
//! history snapshot clears the entity selection and the reverse. In
//! viewing-all mode nothing is selected.
//!
//! Two effects are deferred to the next tick, driven by
//! [`AnnotationStore::run_pending`]: delivery of validation errors, and the
//! debounced redraw request.

mod hooks;
mod init;
mod remap;

pub use hooks::{NoopHooks, RedrawDebouncer, StoreHooks, DEFAULT_REDRAW_WINDOW};
pub use init::{initialize, ConfigErrorView, EditorState};
pub use remap::remap_records;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ConfigNode;
use crate::error::LabelError;
use crate::model::{Annotation, AnnotationId, EntityKind, TagId, WireRecord};
use crate::registry::TagRegistry;
use crate::tags::TagTree;
use crate::validation::{self, ErrorQueue, ValidationReport, ValidationTarget};

/// Runtime switches of a store.
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// New annotations start from the first prediction's results.
    pub inherit_predictions: bool,
    pub redraw_window: Duration,
    /// Keep the undo history of an annotation when it loses selection.
    pub retain_history_on_select: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            inherit_predictions: false,
            redraw_window: DEFAULT_REDRAW_WINDOW,
            retain_history_on_select: false,
        }
    }
}

/// An annotation or prediction as loaded from a task.
#[derive(Clone, Debug, Default)]
pub struct AnnotationInput {
    pub id: Option<String>,
    pub result: Vec<WireRecord>,
    pub draft: Option<Vec<WireRecord>>,
    pub ground_truth: bool,
    pub skipped: bool,
    pub user_generate: bool,
}

/// A server-side history entry of the selected annotation.
#[derive(Clone, Debug, Default)]
pub struct HistoryItem {
    pub id: String,
    pub action: Option<String>,
    pub result: Vec<WireRecord>,
}

/// Points at an annotation or a prediction of the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityRef {
    Annotation(AnnotationId),
    Prediction(AnnotationId),
}

impl EntityRef {
    pub fn id(&self) -> &AnnotationId {
        match self {
            EntityRef::Annotation(id) | EntityRef::Prediction(id) => id,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// One annotation or prediction is shown.
    #[default]
    Single,
    /// A read-only history snapshot is shown.
    History,
    /// Every annotation is shown side by side; nothing is selected.
    ViewingAll,
}

pub struct AnnotationStore {
    registry: Arc<TagRegistry>,
    config: ConfigNode,
    tree: TagTree,
    task_data: Value,
    options: StoreOptions,
    annotations: Vec<Annotation>,
    predictions: Vec<Annotation>,
    history: Vec<HistoryItem>,
    selected: Option<EntityRef>,
    selected_history: Option<(usize, Annotation)>,
    view: ViewMode,
    queue: ErrorQueue,
    delivered: ValidationReport,
    hooks: Box<dyn StoreHooks>,
    redraw: RedrawDebouncer,
}

impl fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("annotations", &self.annotations.len())
            .field("predictions", &self.predictions.len())
            .field("history", &self.history.len())
            .field("selected", &self.selected)
            .field("view", &self.view)
            .finish()
    }
}

impl AnnotationStore {
    /// Instantiates the tag tree for `config` and queues a configuration
    /// validation pass.
    pub fn new(
        registry: Arc<TagRegistry>,
        config: ConfigNode,
        task_data: Value,
        options: StoreOptions,
    ) -> Result<Self, LabelError> {
        let tree = TagTree::instantiate(&registry, config.clone())?;
        let redraw = RedrawDebouncer::new(options.redraw_window);
        let mut store = Self {
            registry,
            config,
            tree,
            task_data,
            options,
            annotations: vec![],
            predictions: vec![],
            history: vec![],
            selected: None,
            selected_history: None,
            view: ViewMode::Single,
            queue: ErrorQueue::new(),
            delivered: ValidationReport::new(),
            hooks: Box::new(NoopHooks),
            redraw,
        };
        let config = store.config.clone();
        store.validate(ValidationTarget::Config(&config));
        Ok(store)
    }

    pub fn with_hooks(mut self, hooks: Box<dyn StoreHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ConfigNode {
        &self.config
    }

    pub fn tree(&self) -> &TagTree {
        &self.tree
    }

    pub fn task_data(&self) -> &Value {
        &self.task_data
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn predictions(&self) -> &[Annotation] {
        &self.predictions
    }

    pub fn history_items(&self) -> &[HistoryItem] {
        &self.history
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view
    }

    pub fn selected_ref(&self) -> Option<&EntityRef> {
        self.selected.as_ref()
    }

    /// The selected annotation or prediction.
    pub fn selected(&self) -> Option<&Annotation> {
        self.selected.as_ref().and_then(|r| self.entity(r))
    }

    pub fn selected_mut(&mut self) -> Option<&mut Annotation> {
        let selected = self.selected.clone()?;
        self.entity_mut(&selected)
    }

    /// The history snapshot being shown, with its index.
    pub fn selected_history(&self) -> Option<(usize, &Annotation)> {
        self.selected_history.as_ref().map(|(idx, a)| (*idx, a))
    }

    pub fn entity(&self, entity: &EntityRef) -> Option<&Annotation> {
        let (list, id) = match entity {
            EntityRef::Annotation(id) => (&self.annotations, id),
            EntityRef::Prediction(id) => (&self.predictions, id),
        };
        list.iter().find(|a| &a.id == id)
    }

    fn entity_mut(&mut self, entity: &EntityRef) -> Option<&mut Annotation> {
        let (list, id) = match entity {
            EntityRef::Annotation(id) => (&mut self.annotations, id),
            EntityRef::Prediction(id) => (&mut self.predictions, id),
        };
        list.iter_mut().find(|a| &a.id == id)
    }

    /// Every tag name, scoped aliases of live annotations included.
    pub fn names(&self) -> &BTreeMap<String, TagId> {
        self.tree.names().names()
    }

    /// Object name -> controls bound to it.
    pub fn to_names(&self) -> &BTreeMap<String, Vec<TagId>> {
        self.tree.names().to_names()
    }

    /// The data an object tag shows, resolved against the task.
    pub fn object_value(&self, object: &str) -> Option<String> {
        self.tree
            .by_name(object)
            .and_then(|tag| tag.caps.object.as_ref())
            .and_then(|source| source.resolve(&self.task_data))
    }

    // ========================================================================
    // Loading
    // ========================================================================

    fn load(&mut self, input: &AnnotationInput, kind: EntityKind) -> AnnotationId {
        let id = input
            .id
            .as_deref()
            .map(AnnotationId::from)
            .unwrap_or_else(AnnotationId::generate);
        let (mut annotation, skipped) =
            Annotation::from_records(id.clone(), kind, &input.result, &self.tree, &self.registry);
        if !skipped.is_empty() {
            warn!(annotation = %id, skipped = skipped.len(), "some records were not loaded");
        }
        annotation.versions.result = Some(input.result.clone());
        annotation.versions.draft = input.draft.clone();
        annotation.ground_truth = input.ground_truth;
        annotation.skipped = input.skipped;
        annotation.user_generate = input.user_generate;

        self.validate(ValidationTarget::Results(&input.result));
        self.tree.names_mut().add_scope(&id);
        match kind {
            EntityKind::Prediction => self.predictions.push(annotation),
            _ => self.annotations.push(annotation),
        }
        debug!(annotation = %id, ?kind, "loaded entity");
        id
    }

    pub fn add_annotation(&mut self, input: &AnnotationInput) -> AnnotationId {
        self.load(input, EntityKind::Annotation)
    }

    pub fn add_prediction(&mut self, input: &AnnotationInput) -> AnnotationId {
        self.load(input, EntityKind::Prediction)
    }

    pub fn add_history_item(&mut self, item: HistoryItem) {
        self.history.push(item);
    }

    // ========================================================================
    // Creation and deletion
    // ========================================================================

    /// Creates an empty annotation at the front of the list.
    ///
    /// With prediction inheritance on, it is seeded from the non-interactive
    /// results of every prediction. Each prediction is remapped on its own,
    /// so equal region ids in two predictions stay separate regions. The
    /// first prediction is recorded as the parent.
    pub fn create_annotation(&mut self, user_generate: bool) -> AnnotationId {
        let id = AnnotationId::generate();
        let mut annotation = Annotation::new(id.clone(), EntityKind::Annotation);
        annotation.user_generate = user_generate;

        if self.options.inherit_predictions && !self.predictions.is_empty() {
            let records: Vec<WireRecord> = self
                .predictions
                .iter()
                .flat_map(|p| remap_records(&p.serialize_raw(), |r| !r.interactive_mode))
                .collect();
            annotation.deserialize(&records, &self.tree, &self.registry);
            annotation.parent_prediction = self.predictions.first().map(|p| p.id.clone());
        }

        self.tree.names_mut().add_scope(&id);
        self.annotations.insert(0, annotation);
        info!(annotation = %id, "created annotation");
        id
    }

    /// Creates an annotation holding a copy of `source` under fresh ids.
    pub fn add_annotation_from_prediction(
        &mut self,
        source: &EntityRef,
    ) -> Result<AnnotationId, LabelError> {
        let entity = self
            .entity(source)
            .ok_or_else(|| LabelError::AnnotationNotFound(source.id().to_string()))?;
        let records = remap_records(&entity.serialize_raw(), |_| true);

        let id = AnnotationId::generate();
        let mut annotation = Annotation::new(id.clone(), EntityKind::Annotation);
        annotation.user_generate = true;
        annotation.deserialize(&records, &self.tree, &self.registry);
        match source {
            EntityRef::Prediction(parent) => annotation.parent_prediction = Some(parent.clone()),
            EntityRef::Annotation(parent) => annotation.parent_annotation = Some(parent.clone()),
        }

        self.tree.names_mut().add_scope(&id);
        self.annotations.insert(0, annotation);
        info!(annotation = %id, source = %source.id(), "created annotation from entity");
        Ok(id)
    }

    /// Removes an annotation, clears links to it, and selects the first
    /// remaining one.
    pub fn delete_annotation(&mut self, id: &AnnotationId) -> Result<(), LabelError> {
        let idx = self
            .annotations
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| LabelError::AnnotationNotFound(id.to_string()))?;
        self.annotations.remove(idx);
        self.tree.names_mut().drop_scope(id);

        for other in &mut self.annotations {
            if other.parent_annotation.as_ref() == Some(id) {
                other.parent_annotation = None;
            }
        }
        self.hooks.on_delete_annotation(id);
        self.release_selection();
        self.selected = None;
        info!(annotation = %id, "deleted annotation");

        if let Some(first) = self.annotations.first().map(|a| a.id.clone()) {
            self.select_entity(EntityRef::Annotation(first));
        }
        Ok(())
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Selects an annotation; an unknown id falls back to the first one.
    pub fn select_annotation(&mut self, id: &AnnotationId) -> Result<AnnotationId, LabelError> {
        let target = if self.annotations.iter().any(|a| &a.id == id) {
            id.clone()
        } else {
            let first = self
                .annotations
                .first()
                .map(|a| a.id.clone())
                .ok_or_else(|| LabelError::AnnotationNotFound(id.to_string()))?;
            debug!(requested = %id, fallback = %first, "unknown annotation; selecting first");
            first
        };
        self.select_entity(EntityRef::Annotation(target.clone()));
        Ok(target)
    }

    /// Selects a prediction; an unknown id falls back to the first one.
    pub fn select_prediction(&mut self, id: &AnnotationId) -> Result<AnnotationId, LabelError> {
        let target = if self.predictions.iter().any(|p| &p.id == id) {
            id.clone()
        } else {
            self.predictions
                .first()
                .map(|p| p.id.clone())
                .ok_or_else(|| LabelError::AnnotationNotFound(id.to_string()))?
        };
        self.select_entity(EntityRef::Prediction(target.clone()));
        Ok(target)
    }

    /// Shows a history entry as a read-only snapshot.
    pub fn select_history(&mut self, index: usize) -> Result<(), LabelError> {
        let item = self
            .history
            .get(index)
            .ok_or(LabelError::HistoryNotFound(index))?;
        let (snapshot, _) = Annotation::from_records(
            AnnotationId::new(format!("history-{}", item.id)),
            EntityKind::History,
            &item.result,
            &self.tree,
            &self.registry,
        );

        self.release_selection();
        self.selected = None;
        self.selected_history = Some((index, snapshot));
        self.view = ViewMode::History;
        self.redraw.request(Instant::now());
        debug!(index, "selected history item");
        Ok(())
    }

    fn select_entity(&mut self, target: EntityRef) {
        self.release_selection();
        self.selected_history = None;
        self.view = ViewMode::Single;

        let editable = matches!(target, EntityRef::Annotation(_));
        if let Some(entity) = self.entity_mut(&target) {
            entity.editable = editable;
        }
        self.hooks.rebind_hotkeys(target.id());
        info!(entity = %target.id(), "selected");
        self.selected = Some(target);
        self.redraw.request(Instant::now());
    }

    fn release_selection(&mut self) {
        let retain = self.options.retain_history_on_select;
        if let Some(current) = self.selected.clone() {
            if let Some(entity) = self.entity_mut(&current) {
                entity.unselect_areas();
                if !retain {
                    entity.reset_history();
                }
            }
        }
    }

    /// Enters or leaves viewing-all mode.
    ///
    /// Entering flushes the selected annotation's pending draft and clears
    /// the selection. Leaving selects the first annotation.
    pub fn toggle_viewing_all_annotations(&mut self) -> ViewMode {
        if self.view == ViewMode::ViewingAll {
            self.view = ViewMode::Single;
            if let Some(first) = self.annotations.first().map(|a| a.id.clone()) {
                self.select_entity(EntityRef::Annotation(first));
            }
            return self.view;
        }

        if let Err(err) = self.save_draft() {
            warn!(error = %err, "draft save failed; keeping in-memory state");
        }
        self.release_selection();
        self.selected = None;
        self.selected_history = None;
        self.view = ViewMode::ViewingAll;
        self.redraw.request(Instant::now());
        self.view
    }

    /// Hands the selected annotation's unsaved changes to the draft hook.
    pub fn save_draft(&mut self) -> Result<(), LabelError> {
        let Some(EntityRef::Annotation(id)) = self.selected.clone() else {
            return Ok(());
        };
        let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) else {
            return Ok(());
        };
        if !annotation.draft_dirty {
            return Ok(());
        }

        let records = annotation.serialize(&self.tree);
        self.hooks.save_draft(&id, &records)?;
        annotation.versions.draft = Some(records);
        annotation.draft_dirty = false;
        debug!(annotation = %id, "draft saved");
        Ok(())
    }

    // ========================================================================
    // Validation and deferred work
    // ========================================================================

    /// Validates a configuration or a set of records. Errors are delivered
    /// on the next [`AnnotationStore::run_pending`], never synchronously.
    pub fn validate(&mut self, target: ValidationTarget<'_>) {
        let report = validation::validate(target, &self.registry, &self.tree);
        self.queue.enqueue(report);
    }

    /// Errors delivered so far.
    pub fn validation_errors(&self) -> &ValidationReport {
        &self.delivered
    }

    pub fn has_pending_work(&self) -> bool {
        self.queue.has_pending() || self.redraw.is_pending()
    }

    pub fn request_redraw(&mut self, now: Instant) {
        self.redraw.request(now);
    }

    /// The next tick: delivers queued validation errors and fires a due
    /// redraw.
    pub fn run_pending(&mut self, now: Instant) {
        if let Some(report) = self.queue.drain() {
            self.hooks.on_validation_errors(&report);
            self.delivered.merge(report);
        }
        if self.redraw.poll(now) {
            self.hooks.redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile;
    use crate::model::{MainValue, RegionKind};
    use serde_json::{json, Map};
    use std::cell::RefCell;
    use std::rc::Rc;

    const CONFIG: &str = r#"<View>
  <Image name="img" value="$image"/>
  <RectangleLabels name="label" toName="img">
    <Label value="Cat"/>
    <Label value="Dog"/>
  </RectangleLabels>
</View>"#;

    #[derive(Default)]
    struct Recorded {
        hotkeys: Vec<AnnotationId>,
        drafts: Vec<usize>,
        reports: Vec<usize>,
        redraws: usize,
        fail_drafts: bool,
    }

    struct Recorder(Rc<RefCell<Recorded>>);

    impl StoreHooks for Recorder {
        fn rebind_hotkeys(&mut self, selected: &AnnotationId) {
            self.0.borrow_mut().hotkeys.push(selected.clone());
        }

        fn save_draft(
            &mut self,
            annotation: &AnnotationId,
            records: &[WireRecord],
        ) -> Result<(), LabelError> {
            let mut state = self.0.borrow_mut();
            if state.fail_drafts {
                return Err(LabelError::Collaborator {
                    action: format!("saving draft of {annotation}"),
                    message: "offline".into(),
                });
            }
            state.drafts.push(records.len());
            Ok(())
        }

        fn on_validation_errors(&mut self, report: &ValidationReport) {
            self.0.borrow_mut().reports.push(report.errors.len());
        }

        fn redraw(&mut self) {
            self.0.borrow_mut().redraws += 1;
        }
    }

    fn store_with(options: StoreOptions) -> (AnnotationStore, Rc<RefCell<Recorded>>) {
        let registry = Arc::new(TagRegistry::standard());
        let data = json!({"image": "a.jpg"});
        let config = compile(CONFIG, &data).expect("compile");
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let store = AnnotationStore::new(registry, config, data, options)
            .expect("store")
            .with_hooks(Box::new(Recorder(recorded.clone())));
        (store, recorded)
    }

    fn records(json: Value) -> Vec<WireRecord> {
        serde_json::from_value(json).expect("records")
    }

    fn boxes() -> Vec<WireRecord> {
        records(json!([
            {"id": "r1", "from_name": "label", "to_name": "img", "type": "rectanglelabels",
             "value": {"x": 1, "y": 1, "width": 5, "height": 5, "rectanglelabels": ["Cat"]}},
            {"id": "r2", "from_name": "label", "to_name": "img", "type": "rectanglelabels",
             "value": {"x": 2, "y": 2, "width": 5, "height": 5, "rectanglelabels": ["Dog"]},
             "parentID": "r1"},
            {"id": "r3", "from_name": "label", "to_name": "img", "type": "rectanglelabels",
             "value": {"x": 3, "y": 3, "width": 5, "height": 5, "rectanglelabels": ["Dog"]},
             "interactive_mode": true}
        ]))
    }

    fn input(id: &str, result: Vec<WireRecord>) -> AnnotationInput {
        AnnotationInput {
            id: Some(id.to_string()),
            result,
            ..AnnotationInput::default()
        }
    }

    #[test]
    fn unknown_selection_falls_back_to_first() {
        let (mut store, recorded) = store_with(StoreOptions::default());
        store.add_annotation(&input("a1", vec![]));
        store.add_annotation(&input("a2", vec![]));

        let selected = store
            .select_annotation(&AnnotationId::from("missing"))
            .expect("select");
        assert_eq!(selected, AnnotationId::from("a1"));
        assert!(store.selected().expect("selected").editable);
        assert_eq!(recorded.borrow().hotkeys, vec![AnnotationId::from("a1")]);
    }

    #[test]
    fn selecting_resets_previous_history_and_regions() {
        let (mut store, _) = store_with(StoreOptions::default());
        store.add_annotation(&input("a1", boxes()));
        store.add_annotation(&input("a2", vec![]));
        store.select_annotation(&AnnotationId::from("a1")).expect("a1");

        let tree = store.tree().clone();
        let first = store.selected_mut().expect("a1");
        let region = first.regions()[0].id.clone();
        first.select_area(&region).expect("select area");
        first
            .set_result(&tree, &region, "label", MainValue::List(vec!["Dog".into()]))
            .expect("relabel");
        assert!(first.can_undo());

        store.select_annotation(&AnnotationId::from("a2")).expect("a2");
        let first = &store.annotations()[0];
        assert!(!first.can_undo());
        assert!(first.selected_region().is_none());
    }

    #[test]
    fn inherited_annotation_skips_interactive_results() {
        let options = StoreOptions {
            inherit_predictions: true,
            ..StoreOptions::default()
        };
        let (mut store, _) = store_with(options);
        store.add_prediction(&input("p1", boxes()));

        let id = store.create_annotation(true);
        let annotation = &store.annotations()[0];
        assert_eq!(annotation.id, id);
        assert_eq!(annotation.parent_prediction, Some(AnnotationId::from("p1")));
        assert_eq!(annotation.regions().len(), 2);

        let ids: Vec<String> = annotation.regions().iter().map(|r| r.id.to_string()).collect();
        assert!(!ids.contains(&"r1".to_string()));
        assert_eq!(annotation.regions()[1].parent_id, Some(annotation.regions()[0].id.clone()));
        assert!(store.names().contains_key(&format!("label#{id}")));
    }

    #[test]
    fn inherited_annotation_collects_every_prediction() {
        let options = StoreOptions {
            inherit_predictions: true,
            ..StoreOptions::default()
        };
        let (mut store, _) = store_with(options);
        store.add_prediction(&input("p1", boxes()));
        store.add_prediction(&input("p2", boxes()));

        store.create_annotation(true);
        let annotation = &store.annotations()[0];
        assert_eq!(annotation.parent_prediction, Some(AnnotationId::from("p1")));
        assert_eq!(annotation.regions().len(), 4);

        let mut ids: Vec<String> = annotation.regions().iter().map(|r| r.id.to_string()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert_eq!(annotation.regions()[1].parent_id, Some(annotation.regions()[0].id.clone()));
        assert_eq!(annotation.regions()[3].parent_id, Some(annotation.regions()[2].id.clone()));
    }

    #[test]
    fn annotation_from_prediction_keeps_parent_links() {
        let (mut store, _) = store_with(StoreOptions::default());
        store.add_prediction(&input("p1", boxes()));

        let id = store
            .add_annotation_from_prediction(&EntityRef::Prediction(AnnotationId::from("p1")))
            .expect("copy");
        let copy = &store.annotations()[0];
        assert_eq!(copy.id, id);
        assert_eq!(copy.regions().len(), 3);
        assert_eq!(copy.regions()[1].parent_id, Some(copy.regions()[0].id.clone()));
        assert_eq!(copy.parent_prediction, Some(AnnotationId::from("p1")));

        let err = store
            .add_annotation_from_prediction(&EntityRef::Prediction(AnnotationId::from("nope")))
            .expect_err("missing");
        assert!(matches!(err, LabelError::AnnotationNotFound(_)));
    }

    #[test]
    fn delete_clears_links_and_selects_first() {
        let (mut store, _) = store_with(StoreOptions::default());
        let source = store.add_annotation(&input("a1", boxes()));
        let copy = store
            .add_annotation_from_prediction(&EntityRef::Annotation(source.clone()))
            .expect("copy");
        store.select_annotation(&source).expect("select");

        store.delete_annotation(&source).expect("delete");
        assert_eq!(store.annotations().len(), 1);
        assert_eq!(store.annotations()[0].parent_annotation, None);
        assert_eq!(store.selected_ref(), Some(&EntityRef::Annotation(copy)));
        assert!(!store.names().contains_key("label#a1"));
    }

    #[test]
    fn deleting_another_annotation_releases_the_selection() {
        let (mut store, _) = store_with(StoreOptions::default());
        store.add_annotation(&input("a1", vec![]));
        store.add_annotation(&input("a2", boxes()));
        store.add_annotation(&input("a3", vec![]));
        store.select_annotation(&AnnotationId::from("a2")).expect("a2");

        let tree = store.tree().clone();
        let edited = store.selected_mut().expect("a2");
        let region = edited.regions()[0].id.clone();
        edited.select_area(&region).expect("select area");
        edited
            .set_result(&tree, &region, "label", MainValue::List(vec!["Dog".into()]))
            .expect("relabel");
        assert!(edited.can_undo());

        store.delete_annotation(&AnnotationId::from("a3")).expect("delete");
        assert_eq!(
            store.selected_ref(),
            Some(&EntityRef::Annotation(AnnotationId::from("a1")))
        );
        let released = &store.annotations()[1];
        assert_eq!(released.id, AnnotationId::from("a2"));
        assert!(!released.can_undo());
        assert!(released.selected_region().is_none());
    }

    #[test]
    fn viewing_all_flushes_draft_and_survives_failures() {
        let (mut store, recorded) = store_with(StoreOptions::default());
        store.add_annotation(&input("a1", vec![]));
        store.select_annotation(&AnnotationId::from("a1")).expect("select");
        let tree = store.tree().clone();
        let annotation = store.selected_mut().expect("selected");
        let region = annotation
            .create_region(
                RegionKind::Rectangle,
                "img",
                match json!({"x": 1, "y": 1, "width": 1, "height": 1}) {
                    Value::Object(map) => map,
                    _ => Map::new(),
                },
            )
            .expect("region");
        annotation
            .set_result(&tree, &region, "label", MainValue::List(vec!["Cat".into()]))
            .expect("label");

        recorded.borrow_mut().fail_drafts = true;
        assert_eq!(store.toggle_viewing_all_annotations(), ViewMode::ViewingAll);
        assert!(store.selected().is_none());
        assert!(store.annotations()[0].draft_dirty);
        assert_eq!(store.annotations()[0].regions().len(), 1);

        assert_eq!(store.toggle_viewing_all_annotations(), ViewMode::Single);
        recorded.borrow_mut().fail_drafts = false;
        let annotation = store.selected_mut().expect("reselected");
        annotation.draft_dirty = true;
        store.toggle_viewing_all_annotations();
        assert_eq!(recorded.borrow().drafts, vec![1]);
        assert!(!store.annotations()[0].draft_dirty);
    }

    #[test]
    fn history_and_annotation_selection_are_exclusive() {
        let (mut store, _) = store_with(StoreOptions::default());
        store.add_annotation(&input("a1", vec![]));
        store.add_history_item(HistoryItem {
            id: "h1".into(),
            action: Some("submitted".into()),
            result: boxes(),
        });
        store.select_annotation(&AnnotationId::from("a1")).expect("select");

        store.select_history(0).expect("history");
        assert!(store.selected().is_none());
        let (idx, snapshot) = store.selected_history().expect("snapshot");
        assert_eq!(idx, 0);
        assert!(!snapshot.editable);
        assert_eq!(snapshot.regions().len(), 3);
        assert_eq!(store.view_mode(), ViewMode::History);

        store.select_annotation(&AnnotationId::from("a1")).expect("back");
        assert!(store.selected_history().is_none());
        assert!(matches!(
            store.select_history(7),
            Err(LabelError::HistoryNotFound(7))
        ));
    }

    #[test]
    fn validation_errors_arrive_on_next_tick() {
        let (mut store, recorded) = store_with(StoreOptions::default());
        store.add_annotation(&input(
            "a1",
            records(json!([
                {"id": "x", "from_name": "ghost", "to_name": "img", "type": "choices", "value": {}}
            ])),
        ));
        assert!(recorded.borrow().reports.is_empty());
        assert!(store.validation_errors().is_clean());
        assert!(store.has_pending_work());

        let now = Instant::now();
        store.run_pending(now);
        assert_eq!(recorded.borrow().reports, vec![1]);
        assert_eq!(store.validation_errors().error_count(), 1);

        store.run_pending(now);
        assert_eq!(recorded.borrow().reports.len(), 1);
    }

    #[test]
    fn redraw_is_debounced() {
        let (mut store, recorded) = store_with(StoreOptions::default());
        let start = Instant::now();
        store.request_redraw(start);
        store.request_redraw(start + Duration::from_millis(10));
        store.run_pending(start + Duration::from_millis(20));
        assert_eq!(recorded.borrow().redraws, 0);
        store.run_pending(start + Duration::from_millis(45));
        assert_eq!(recorded.borrow().redraws, 1);
    }

    #[test]
    fn object_values_resolve_against_task() {
        let (store, _) = store_with(StoreOptions::default());
        assert_eq!(store.object_value("img").as_deref(), Some("a.jpg"));
        assert_eq!(store.object_value("label"), None);
    }
}
