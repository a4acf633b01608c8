//! The layout engine: one object owning the model and its controllers.
//!
//! Every mutation goes through [`Engine`], which resolves placements,
//! records undo snapshots, keeps the selection consistent and emits a
//! [`RenderSnapshot`] to the rendering collaborator after each change.

use crate::catalog::EquipmentDescriptor;
use crate::config::EngineConfig;
use crate::drag::{DragOutcome, DragPreview, DragSession, DropZones};
use crate::geometry::{
    Device, DeviceId, Enclosure, EntityKind, EntityRef, GeometryModel, LayoutDocument, Manager, ManagerId,
    ModelError, Mounting, Rack, RackHeight, RackId, floor_origin_y,
};
use crate::history::HistoryManager;
use crate::input::{InputEvent, InputState, Key, MouseButton};
use crate::placement::{Placement, PlacementEngine, PlacementError};
use crate::selection::{Selection, SelectionController, hit_test};
use crate::view::ViewTransform;
use kurbo::{Point, Vec2};
use thiserror::Error;
use uuid::Uuid;

/// Asks the user to approve a destructive operation.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Receives a read-only view of the engine after every state change.
pub trait RenderSink {
    fn render(&mut self, snapshot: &RenderSnapshot);
}

impl<F: FnMut(&RenderSnapshot)> RenderSink for F {
    fn render(&mut self, snapshot: &RenderSnapshot) {
        self(snapshot)
    }
}

/// Everything a renderer needs to paint one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub racks: Vec<Rack>,
    pub managers: Vec<Manager>,
    pub devices: Vec<Device>,
    pub selection: Selection,
    pub drag_preview: Option<DragPreview>,
    pub valid_drop_zones: Option<DropZones>,
    pub view: ViewTransform,
}

/// Why a deletion did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteError {
    #[error("{0:?} does not exist")]
    NotFound(EntityRef),
    #[error("nothing is selected")]
    NothingSelected,
    #[error("deletion declined")]
    Declined,
}

/// Result of feeding one input event to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// Nothing changed.
    Ignored,
    /// View, selection or layout changed.
    Changed,
    /// A drag gesture ended.
    Drag(DragOutcome),
}

pub struct Engine {
    model: GeometryModel,
    view: ViewTransform,
    drag: DragSession,
    history: HistoryManager,
    selection: SelectionController,
    input: InputState,
    config: EngineConfig,
    confirm: Box<dyn Confirm>,
    render: Box<dyn RenderSink>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("model", &self.model)
            .field("view", &self.view)
            .field("drag", &self.drag)
            .field("history", &self.history)
            .field("selection", &self.selection)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine with its collaborators. Seeds the default rack
    /// unless the config turns that off.
    pub fn new(config: EngineConfig, confirm: impl Confirm + 'static, render: impl RenderSink + 'static) -> Self {
        let mut engine = Self {
            model: GeometryModel::new(),
            view: ViewTransform::with_zoom_bounds(config.min_zoom, config.max_zoom),
            drag: DragSession::new(),
            history: HistoryManager::new(config.history_capacity),
            selection: SelectionController::new(),
            input: InputState::new(),
            config,
            confirm: Box::new(confirm),
            render: Box::new(render),
        };
        if engine.config.seed_default_rack {
            engine.seed_default_rack();
        }
        log::info!("Engine ready with {} rack(s)", engine.model.rack_count());
        engine
    }

    /// Headless engine that approves every confirmation and renders nothing.
    pub fn headless(config: EngineConfig) -> Self {
        Self::new(config, |_: &str| true, |_: &RenderSnapshot| {})
    }

    fn seed_default_rack(&mut self) {
        let origin = Point::new(self.config.default_anchor_x, floor_origin_y(RackHeight::U42.units()));
        self.model
            .add_rack(Rack::new(origin, RackHeight::U42, Enclosure::Open, Mounting::Floor));
    }

    pub fn model(&self) -> &GeometryModel {
        &self.model
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn selection(&self) -> Selection {
        self.selection.selection()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Copy of the current layout.
    pub fn document(&self) -> LayoutDocument {
        self.model.document()
    }

    /// Replace the layout with a document. Undoable.
    pub fn load_document(&mut self, document: LayoutDocument) -> Result<(), ModelError> {
        let model = GeometryModel::from_document(document)?;
        self.history.push(self.model.document());
        self.model = model;
        self.selection.retain_existing(&self.model);
        self.drag.cancel();
        log::info!(
            "Loaded layout: {} racks, {} managers, {} devices",
            self.model.rack_count(),
            self.model.manager_count(),
            self.model.device_count()
        );
        self.emit();
        Ok(())
    }

    /// Start a fresh session on a stored document. Unlike
    /// [`Engine::load_document`] this cannot be undone.
    pub fn open_document(&mut self, document: LayoutDocument) -> Result<(), ModelError> {
        self.load_document(document)?;
        self.history.clear();
        Ok(())
    }

    /// Current render snapshot.
    pub fn snapshot(&self) -> RenderSnapshot {
        let preview = self.drag.preview().cloned();
        RenderSnapshot {
            racks: self.model.racks().cloned().collect(),
            managers: self.model.managers().cloned().collect(),
            devices: self.model.devices().cloned().collect(),
            selection: self.selection.selection(),
            valid_drop_zones: preview.as_ref().and_then(DragPreview::drop_zones),
            drag_preview: preview,
            view: self.view.clone(),
        }
    }

    fn emit(&mut self) {
        let snapshot = self.snapshot();
        self.render.render(&snapshot);
    }

    fn placement_engine(&self) -> PlacementEngine<'_> {
        PlacementEngine::new(&self.model, &self.config)
    }

    /// Snapshot, insert and announce a resolved placement.
    fn commit(&mut self, placement: Placement) -> EntityRef {
        self.history.push(self.model.document());
        let entity = placement.commit(&mut self.model);
        log::info!("Placed {:?}", entity);
        self.emit();
        entity
    }

    fn rejected<T>(&self, what: &str, error: PlacementError) -> Result<T, PlacementError> {
        log::warn!("Placement of {} rejected: {}", what, error);
        Err(error)
    }

    /// Place a rack or manager identified by its type tag at a world point.
    pub fn place_infrastructure(&mut self, type_tag: &str, point: Point) -> Result<EntityRef, PlacementError> {
        let resolved = self.placement_engine().resolve_infrastructure(type_tag, point);
        match resolved {
            Ok(placement) => Ok(self.commit(placement)),
            Err(error) => self.rejected(type_tag, error),
        }
    }

    /// Place a device into the rack under a world point.
    /// Rack and manager descriptors are rejected; see [`Engine::place_descriptor`].
    pub fn place_device(&mut self, descriptor: &EquipmentDescriptor, point: Point) -> Result<EntityRef, PlacementError> {
        if descriptor.is_infrastructure {
            return self.rejected(&descriptor.type_tag, PlacementError::NotADevice(descriptor.type_tag.clone()));
        }
        self.place_descriptor(descriptor, point)
    }

    /// Place any palette item at a world point.
    pub fn place_descriptor(&mut self, descriptor: &EquipmentDescriptor, point: Point) -> Result<EntityRef, PlacementError> {
        let resolved = self.placement_engine().resolve(descriptor, point);
        match resolved {
            Ok(placement) => Ok(self.commit(placement)),
            Err(error) => self.rejected(&descriptor.type_tag, error),
        }
    }

    /// Delete a rack. Racks holding devices need confirmation first.
    pub fn delete_rack(&mut self, id: RackId) -> Result<(), DeleteError> {
        if self.model.rack(id).is_none() {
            return Err(DeleteError::NotFound(EntityRef::Rack(id)));
        }
        let occupants = self.model.devices_in_rack(id).count();
        if occupants > 0 {
            let message = format!("Delete this rack and the {occupants} device(s) mounted in it?");
            if !self.confirm.confirm(&message) {
                log::warn!("Deletion of rack {} declined", id);
                return Err(DeleteError::Declined);
            }
        }

        self.history.push(self.model.document());
        if let Some((_, devices)) = self.model.remove_rack(id) {
            log::info!("Deleted rack {} with {} device(s)", id, devices.len());
        }
        self.after_delete();
        Ok(())
    }

    pub fn delete_manager(&mut self, id: ManagerId) -> Result<(), DeleteError> {
        if self.model.manager(id).is_none() {
            return Err(DeleteError::NotFound(EntityRef::Manager(id)));
        }
        self.history.push(self.model.document());
        self.model.remove_manager(id);
        log::info!("Deleted manager {}", id);
        self.after_delete();
        Ok(())
    }

    pub fn delete_device(&mut self, id: DeviceId) -> Result<(), DeleteError> {
        if self.model.device(id).is_none() {
            return Err(DeleteError::NotFound(EntityRef::Device(id)));
        }
        self.history.push(self.model.document());
        self.model.remove_device(id);
        log::info!("Deleted device {}", id);
        self.after_delete();
        Ok(())
    }

    pub fn delete(&mut self, entity: EntityRef) -> Result<(), DeleteError> {
        match entity {
            EntityRef::Rack(id) => self.delete_rack(id),
            EntityRef::Manager(id) => self.delete_manager(id),
            EntityRef::Device(id) => self.delete_device(id),
        }
    }

    /// Delete whatever is selected.
    pub fn delete_selected(&mut self) -> Result<EntityRef, DeleteError> {
        let entity = self.selection.selection().entity().ok_or(DeleteError::NothingSelected)?;
        self.delete(entity)?;
        Ok(entity)
    }

    fn after_delete(&mut self) {
        self.selection.retain_existing(&self.model);
        self.emit();
    }

    /// Restore the state before the last mutation.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo(self.model.document()) else {
            log::debug!("Nothing to undo");
            return false;
        };
        self.model.restore(previous);
        self.selection.retain_existing(&self.model);
        log::info!("Undo ({} step(s) left)", self.history.len());
        self.emit();
        true
    }

    /// Reapply the last undone mutation.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(self.model.document()) else {
            log::debug!("Nothing to redo");
            return false;
        };
        self.model.restore(next);
        self.selection.retain_existing(&self.model);
        log::info!("Redo");
        self.emit();
        true
    }

    /// Remove every rack, manager and device. Undoable.
    pub fn clear_all(&mut self) -> bool {
        if self.model.is_empty() {
            return false;
        }
        self.history.push(self.model.document());
        self.model.clear();
        self.selection.clear();
        log::info!("Cleared layout");
        self.emit();
        true
    }

    /// Pan the view by a screen-space delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.view.pan(delta);
        self.emit();
    }

    /// Zoom about the viewport center. Returns false at the zoom bounds.
    pub fn zoom(&mut self, factor: f64) -> bool {
        let changed = self.view.zoom_by(factor);
        if changed {
            self.emit();
        }
        changed
    }

    /// Select an element by id and kind. Unknown ids are ignored.
    pub fn select(&mut self, id: Uuid, kind: EntityKind) -> bool {
        let entity = EntityRef::new(id, kind);
        if !self.model.contains(entity) {
            log::warn!("Cannot select missing {:?}", entity);
            return false;
        }
        self.selection.select(entity);
        self.emit();
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        if self.selection.selection().is_empty() {
            return false;
        }
        self.selection.clear();
        self.emit();
        true
    }

    /// Feed one input event, with positions in screen coordinates.
    pub fn handle_event(&mut self, event: InputEvent) -> EventOutcome {
        match event {
            InputEvent::PointerDown { position, button } => self.pointer_down(position, button),
            InputEvent::PointerMove { position } => match self.input.move_to(position) {
                Some(delta) => {
                    self.pan(delta);
                    EventOutcome::Changed
                }
                None => EventOutcome::Ignored,
            },
            InputEvent::PointerUp { position, button } => {
                self.input.release(position, button);
                EventOutcome::Ignored
            }
            InputEvent::Wheel { position, delta } => {
                let factor = if delta.y < 0.0 {
                    self.config.zoom_step
                } else if delta.y > 0.0 {
                    1.0 / self.config.zoom_step
                } else {
                    return EventOutcome::Ignored;
                };
                if self.view.zoom_at(position, factor) {
                    self.emit();
                    EventOutcome::Changed
                } else {
                    EventOutcome::Ignored
                }
            }
            InputEvent::DragStart(descriptor) => {
                self.drag.begin(descriptor);
                self.emit();
                EventOutcome::Changed
            }
            InputEvent::DragOver { position } => {
                let world = self.view.screen_to_world(position);
                let engine = PlacementEngine::new(&self.model, &self.config);
                if self.drag.update(world, &engine) {
                    self.emit();
                    EventOutcome::Changed
                } else {
                    EventOutcome::Ignored
                }
            }
            InputEvent::Drop { position } => self.drop_at(position),
            InputEvent::DragLeave | InputEvent::DragEnd => self.cancel_drag(),
            InputEvent::Key { key } => self.key(key),
            InputEvent::Resize { size } => {
                self.view.resize(size);
                self.emit();
                EventOutcome::Changed
            }
        }
    }

    fn pointer_down(&mut self, position: Point, button: MouseButton) -> EventOutcome {
        self.input.press(position, button);
        match button {
            MouseButton::Middle => {
                self.input.begin_pan(position);
                EventOutcome::Ignored
            }
            MouseButton::Left => {
                let world = self.view.screen_to_world(position);
                match hit_test(&self.model, world) {
                    Some(entity) => {
                        self.selection.select(entity);
                        self.emit();
                        EventOutcome::Changed
                    }
                    None => {
                        self.input.begin_pan(position);
                        if self.clear_selection() {
                            EventOutcome::Changed
                        } else {
                            EventOutcome::Ignored
                        }
                    }
                }
            }
            MouseButton::Right => EventOutcome::Ignored,
        }
    }

    fn drop_at(&mut self, position: Point) -> EventOutcome {
        let Some(descriptor) = self.drag.finish() else {
            return EventOutcome::Ignored;
        };
        let world = self.view.screen_to_world(position);
        let outcome = match self.place_descriptor(&descriptor, world) {
            Ok(entity) => DragOutcome::Dropped(entity),
            Err(error) => {
                // Rejections change nothing but the drag state.
                self.emit();
                DragOutcome::Rejected(error)
            }
        };
        EventOutcome::Drag(outcome)
    }

    fn cancel_drag(&mut self) -> EventOutcome {
        if self.drag.cancel() {
            self.emit();
            EventOutcome::Drag(DragOutcome::Cancelled)
        } else {
            EventOutcome::Ignored
        }
    }

    fn key(&mut self, key: Key) -> EventOutcome {
        let changed = match key {
            Key::Delete => match self.delete_selected() {
                Ok(_) => true,
                Err(error) => {
                    log::debug!("Delete key ignored: {}", error);
                    false
                }
            },
            Key::Escape => {
                if self.drag.is_dragging() {
                    return self.cancel_drag();
                }
                self.clear_selection()
            }
            Key::ZoomIn => self.zoom(self.config.zoom_step),
            Key::ZoomOut => self.zoom(1.0 / self.config.zoom_step),
            Key::Undo => self.undo(),
            Key::Redo => self.redo(),
        };
        if changed { EventOutcome::Changed } else { EventOutcome::Ignored }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InfrastructureKind;
    use crate::geometry::{FLOOR_Y, ManagerWidth, UNIT_HEIGHT};
    use crate::placement::collides;
    use kurbo::Size;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn empty_engine() -> Engine {
        Engine::headless(EngineConfig {
            seed_default_rack: false,
            ..EngineConfig::default()
        })
    }

    fn only_rack(engine: &Engine) -> Rack {
        engine.model().racks().next().cloned().unwrap()
    }

    #[test]
    fn test_seeds_default_rack() {
        let engine = Engine::headless(EngineConfig::default());
        assert_eq!(engine.model().rack_count(), 1);
        let rack = only_rack(&engine);
        assert_eq!(rack.height, RackHeight::U42);
        assert!(rack.is_floor_anchored());
        assert!(!engine.history().can_undo());
    }

    #[test]
    fn test_full_height_rack_always_on_floor() {
        let mut engine = Engine::headless(EngineConfig::default());
        for drop in [Point::new(900.0, -400.0), Point::new(-300.0, 5000.0), Point::new(40.0, 40.0)] {
            let entity = engine.place_infrastructure("rack-42u-enclosed", drop).unwrap();
            let rack = engine.model().rack(entity.id()).unwrap();
            assert!((rack.origin.y - (FLOOR_Y - 42.0 * UNIT_HEIGHT)).abs() < 1e-9);
            assert_eq!(rack.mounting, Mounting::Floor);
        }
    }

    #[test]
    fn test_stacking_within_limit() {
        let mut engine = empty_engine();
        let base = engine.place_infrastructure("rack-24u-open", Point::new(400.0, 900.0)).unwrap();
        let base = engine.model().rack(base.id()).cloned().unwrap();

        let above = Point::new(base.center_x(), base.origin.y - 100.0);
        let stacked = engine.place_infrastructure("rack-12u-open", above).unwrap();
        let stacked = engine.model().rack(stacked.id()).unwrap();
        assert_eq!(stacked.mounting, Mounting::StackAbove);
        assert!((stacked.origin.x - base.origin.x).abs() < 1e-9);
        assert!(stacked.bounds().y1 <= base.bounds().y0 + 1e-9);
    }

    #[test]
    fn test_stacking_over_limit_falls_back() {
        let mut engine = empty_engine();
        let base = engine.place_infrastructure("rack-24u-open", Point::new(400.0, 900.0)).unwrap();
        let base = engine.model().rack(base.id()).cloned().unwrap();

        let above = Point::new(base.center_x(), base.origin.y - 100.0);
        let placed = engine.place_infrastructure("rack-24u-open", above).unwrap();
        let placed = engine.model().rack(placed.id()).unwrap();
        assert!(!placed.mounting.is_stacked());
        assert!(placed.is_floor_anchored());
        assert!(placed.bounds().x0 >= base.bounds().x1 - 1e-9);
    }

    #[test]
    fn test_undo_restores_each_step() {
        let mut engine = Engine::headless(EngineConfig::default());
        let rack = only_rack(&engine);
        let mut states = vec![engine.document()];
        for i in 0..10u32 {
            let point = Point::new(rack.center_x(), rack.unit_top(i * 4 + 1) + 1.0);
            engine.place_device(&EquipmentDescriptor::device("server-1u", 1), point).unwrap();
            states.push(engine.document());
        }

        for expected in states.iter().rev().skip(1) {
            assert!(engine.undo());
            assert_eq!(&engine.document(), expected);
        }
        assert!(!engine.undo());
    }

    #[test]
    fn test_eleventh_snapshot_is_evicted() {
        let mut engine = Engine::headless(EngineConfig::default());
        let rack = only_rack(&engine);
        let initial = engine.document();
        for i in 0..11u32 {
            let point = Point::new(rack.center_x(), rack.unit_top(i * 3 + 1) + 1.0);
            engine.place_device(&EquipmentDescriptor::device("server-1u", 1), point).unwrap();
        }

        let mut undone = 0;
        while engine.undo() {
            undone += 1;
        }
        assert_eq!(undone, 10);
        assert_ne!(engine.document(), initial);
        assert_eq!(engine.model().device_count(), 1);
    }

    #[test]
    fn test_redo_after_undo() {
        let mut engine = Engine::headless(EngineConfig::default());
        let rack = only_rack(&engine);
        let device = engine
            .place_device(&EquipmentDescriptor::device("ups-3u", 3), rack.anchor())
            .unwrap();
        assert!(engine.undo());
        assert!(!engine.model().contains(device));
        assert!(engine.redo());
        assert!(engine.model().contains(device));
        assert!(!engine.redo());
    }

    fn rack_with_three_devices(answer: bool) -> (Engine, RackId, Rc<RefCell<Vec<String>>>) {
        let prompts = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&prompts);
        let mut engine = Engine::new(
            EngineConfig::default(),
            move |message: &str| {
                log.borrow_mut().push(message.to_string());
                answer
            },
            |_: &RenderSnapshot| {},
        );
        let rack = only_rack(&engine);
        for unit in [1, 10, 20] {
            let point = Point::new(rack.center_x(), rack.unit_top(unit) + 1.0);
            engine.place_device(&EquipmentDescriptor::device("server-1u", 1), point).unwrap();
        }
        (engine, rack.id, prompts)
    }

    #[test]
    fn test_delete_rack_declined() {
        let (mut engine, rack_id, prompts) = rack_with_three_devices(false);
        let before = engine.document();
        let undo_depth = engine.history().len();

        assert_eq!(engine.delete_rack(rack_id), Err(DeleteError::Declined));
        assert_eq!(prompts.borrow().len(), 1);
        assert_eq!(engine.document(), before);
        assert_eq!(engine.history().len(), undo_depth);
    }

    #[test]
    fn test_delete_rack_confirmed_cascades() {
        let (mut engine, rack_id, prompts) = rack_with_three_devices(true);
        assert_eq!(engine.delete_rack(rack_id), Ok(()));
        assert_eq!(prompts.borrow().len(), 1);
        assert!(engine.model().rack(rack_id).is_none());
        assert_eq!(engine.model().device_count(), 0);

        assert!(engine.undo());
        assert_eq!(engine.model().devices_in_rack(rack_id).count(), 3);
    }

    #[test]
    fn test_delete_empty_rack_skips_confirmation() {
        let prompts = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&prompts);
        let mut engine = Engine::new(
            EngineConfig::default(),
            move |_: &str| {
                *counter.borrow_mut() += 1;
                false
            },
            |_: &RenderSnapshot| {},
        );
        let rack = only_rack(&engine);
        assert_eq!(engine.delete_rack(rack.id), Ok(()));
        assert_eq!(*prompts.borrow(), 0);
        assert_eq!(engine.delete_rack(rack.id), Err(DeleteError::NotFound(EntityRef::Rack(rack.id))));
    }

    #[test]
    fn test_manager_against_enclosed_rack_is_rejected() {
        let mut engine = empty_engine();
        let rack = engine.place_infrastructure("rack-42u-enclosed", Point::ZERO).unwrap();
        let result = engine.place_infrastructure("manager-6in", Point::new(700.0, 600.0));
        assert_eq!(result, Err(PlacementError::EnclosedRack(rack.id())));
        assert_eq!(engine.model().manager_count(), 0);
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_manager_matches_rack_extent() {
        let mut engine = Engine::headless(EngineConfig::default());
        let rack = only_rack(&engine);
        let entity = engine
            .place_infrastructure("manager-10in", Point::new(rack.bounds().x1 + 10.0, 600.0))
            .unwrap();
        let manager = engine.model().manager(entity.id()).unwrap();
        assert_eq!(manager.width, ManagerWidth::Wide);
        assert_eq!(manager.height_u, rack.height_u());
        assert!((manager.bounds().height() - rack.bounds().height()).abs() < 1e-9);
    }

    #[test]
    fn test_device_tie_snaps_to_lower_unit() {
        let mut engine = Engine::headless(EngineConfig::default());
        let rack = only_rack(&engine);
        let on_six = Point::new(rack.center_x(), rack.origin.y + 130.0);
        let first = engine.place_device(&EquipmentDescriptor::device("switch-1u", 1), on_six).unwrap();
        assert_eq!(engine.model().device(first.id()).unwrap().start_unit, 6);

        let second = engine.place_device(&EquipmentDescriptor::device("switch-1u", 1), on_six).unwrap();
        assert_eq!(engine.model().device(second.id()).unwrap().start_unit, 5);
    }

    #[test]
    fn test_rejected_device_records_nothing() {
        let mut engine = Engine::headless(EngineConfig::default());
        let result = engine.place_device(&EquipmentDescriptor::device("server-1u", 1), Point::new(-5000.0, 0.0));
        assert_eq!(result, Err(PlacementError::NoTargetRack));
        assert!(!engine.history().can_undo());
    }

    #[test]
    fn test_clear_all_is_undoable() {
        let mut engine = Engine::headless(EngineConfig::default());
        let before = engine.document();
        assert!(engine.clear_all());
        assert!(engine.model().is_empty());
        assert!(!engine.clear_all());
        assert!(engine.undo());
        assert_eq!(engine.document(), before);
    }

    #[test]
    fn test_selection_is_exclusive_and_cleared_by_delete() {
        let mut engine = Engine::headless(EngineConfig::default());
        let rack = only_rack(&engine);
        let device = engine
            .place_device(&EquipmentDescriptor::device("server-2u", 2), rack.anchor())
            .unwrap();

        assert!(engine.select(rack.id, EntityKind::Rack));
        assert_eq!(engine.selection(), Selection::Infrastructure(EntityRef::Rack(rack.id)));
        assert!(engine.select(device.id(), EntityKind::Device));
        assert_eq!(engine.selection(), Selection::Device(device));
        assert!(!engine.select(Uuid::new_v4(), EntityKind::Manager));

        assert_eq!(engine.delete_selected(), Ok(device));
        assert!(engine.selection().is_empty());
        assert_eq!(engine.delete_selected(), Err(DeleteError::NothingSelected));
    }

    #[test]
    fn test_drag_and_drop_device() {
        let mut engine = Engine::headless(EngineConfig::default());
        let rack = only_rack(&engine);
        let screen = engine.view().world_to_screen(Point::new(rack.center_x(), rack.origin.y + 130.0));

        engine.handle_event(InputEvent::DragStart(EquipmentDescriptor::device("server-1u", 1)));
        assert_eq!(engine.handle_event(InputEvent::DragOver { position: screen }), EventOutcome::Changed);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.valid_drop_zones.as_ref().map(|z| z.units.len()), Some(42));

        let outcome = engine.handle_event(InputEvent::Drop { position: screen });
        let EventOutcome::Drag(DragOutcome::Dropped(entity)) = outcome else {
            panic!("expected a drop, got {outcome:?}");
        };
        assert_eq!(engine.model().device(entity.id()).unwrap().start_unit, 6);
        assert!(!engine.drag().is_dragging());
        assert!(engine.snapshot().drag_preview.is_none());
    }

    #[test]
    fn test_drop_outside_rack_is_rejected() {
        let mut engine = Engine::headless(EngineConfig::default());
        engine.handle_event(InputEvent::DragStart(EquipmentDescriptor::device("server-1u", 1)));
        let outcome = engine.handle_event(InputEvent::Drop { position: Point::new(-4000.0, 10.0) });
        assert_eq!(outcome, EventOutcome::Drag(DragOutcome::Rejected(PlacementError::NoTargetRack)));
        assert_eq!(engine.model().device_count(), 0);
        assert!(!engine.drag().is_dragging());
    }

    #[test]
    fn test_drag_leave_and_escape_cancel() {
        let mut engine = Engine::headless(EngineConfig::default());
        engine.handle_event(InputEvent::DragStart(EquipmentDescriptor::device("server-1u", 1)));
        assert_eq!(engine.handle_event(InputEvent::DragLeave), EventOutcome::Drag(DragOutcome::Cancelled));
        assert_eq!(engine.handle_event(InputEvent::DragEnd), EventOutcome::Ignored);
        assert_eq!(engine.handle_event(InputEvent::Drop { position: Point::ZERO }), EventOutcome::Ignored);

        engine.handle_event(InputEvent::DragStart(EquipmentDescriptor::device("server-1u", 1)));
        assert_eq!(
            engine.handle_event(InputEvent::Key { key: Key::Escape }),
            EventOutcome::Drag(DragOutcome::Cancelled)
        );
    }

    #[test]
    fn test_screen_coordinates_are_converted() {
        let mut engine = Engine::headless(EngineConfig::default());
        let rack = only_rack(&engine);
        engine.pan(Vec2::new(-150.0, 80.0));
        assert!(engine.zoom(1.5));

        let world = Point::new(rack.center_x(), rack.unit_top(10) + 2.0);
        let screen = engine.view().world_to_screen(world);
        engine.handle_event(InputEvent::DragStart(EquipmentDescriptor::device("server-1u", 1)));
        let outcome = engine.handle_event(InputEvent::Drop { position: screen });
        let EventOutcome::Drag(DragOutcome::Dropped(entity)) = outcome else {
            panic!("expected a drop, got {outcome:?}");
        };
        assert_eq!(engine.model().device(entity.id()).unwrap().start_unit, 10);
    }

    #[test]
    fn test_click_selects_and_empty_click_pans() {
        let mut engine = Engine::headless(EngineConfig::default());
        let rack = only_rack(&engine);
        let on_rack = engine.view().world_to_screen(rack.anchor());
        engine.handle_event(InputEvent::PointerDown { position: on_rack, button: MouseButton::Left });
        engine.handle_event(InputEvent::PointerUp { position: on_rack, button: MouseButton::Left });
        assert_eq!(engine.selection(), Selection::Infrastructure(EntityRef::Rack(rack.id)));

        let empty = Point::new(-2000.0, -2000.0);
        let outcome = engine.handle_event(InputEvent::PointerDown { position: empty, button: MouseButton::Left });
        assert_eq!(outcome, EventOutcome::Changed);
        assert!(engine.selection().is_empty());

        let moved = engine.handle_event(InputEvent::PointerMove { position: Point::new(-1990.0, -1995.0) });
        assert_eq!(moved, EventOutcome::Changed);
        assert_eq!(engine.view().offset, Vec2::new(10.0, 5.0));

        engine.handle_event(InputEvent::PointerUp { position: Point::ZERO, button: MouseButton::Left });
        let after = engine.handle_event(InputEvent::PointerMove { position: Point::new(50.0, 50.0) });
        assert_eq!(after, EventOutcome::Ignored);
    }

    #[test]
    fn test_wheel_zoom_keeps_cursor_fixed() {
        let mut engine = Engine::headless(EngineConfig::default());
        let cursor = Point::new(320.0, 240.0);
        let before = engine.view().screen_to_world(cursor);
        let outcome = engine.handle_event(InputEvent::Wheel { position: cursor, delta: Vec2::new(0.0, -1.0) });
        assert_eq!(outcome, EventOutcome::Changed);
        assert!(engine.view().zoom > 1.0);
        let after = engine.view().screen_to_world(cursor);
        assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_delete_key_and_undo_key() {
        let mut engine = Engine::headless(EngineConfig::default());
        let rack = only_rack(&engine);
        let device = engine
            .place_device(&EquipmentDescriptor::device("server-1u", 1), rack.anchor())
            .unwrap();
        engine.select(device.id(), EntityKind::Device);

        assert_eq!(engine.handle_event(InputEvent::Key { key: Key::Delete }), EventOutcome::Changed);
        assert!(!engine.model().contains(device));
        assert_eq!(engine.handle_event(InputEvent::Key { key: Key::Undo }), EventOutcome::Changed);
        assert!(engine.model().contains(device));
        assert_eq!(engine.handle_event(InputEvent::Key { key: Key::Delete }), EventOutcome::Ignored);
    }

    #[test]
    fn test_render_sink_sees_changes() {
        let frames = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&frames);
        let mut engine = Engine::new(
            EngineConfig::default(),
            |_: &str| true,
            move |snapshot: &RenderSnapshot| sink.borrow_mut().push(snapshot.devices.len()),
        );
        let rack = only_rack(&engine);
        engine
            .place_device(&EquipmentDescriptor::device("server-1u", 1), rack.anchor())
            .unwrap();
        engine.undo();
        assert_eq!(*frames.borrow(), vec![1, 0]);

        engine.place_device(&EquipmentDescriptor::device("x", 1), Point::new(-9000.0, 0.0)).ok();
        assert_eq!(frames.borrow().len(), 2);
    }

    #[test]
    fn test_wall_policy_keeps_drop_height() {
        let mut engine = Engine::headless(EngineConfig {
            mounting_policy: crate::config::MountingPolicy::Wall,
            ..EngineConfig::default()
        });
        let rack = only_rack(&engine);
        let drop = Point::new(rack.bounds().x1 + 200.0, 300.0);
        let entity = engine.place_infrastructure("rack-9u-open", drop).unwrap();
        let placed = engine.model().rack(entity.id()).unwrap();
        assert_eq!(placed.mounting, Mounting::Wall);
        assert!((placed.anchor().y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_document_replaces_layout() {
        let mut engine = Engine::headless(EngineConfig::default());
        let mut other = empty_engine();
        other.place_infrastructure("rack-24u-enclosed", Point::new(600.0, 600.0)).unwrap();
        let document = other.document();

        engine.load_document(document.clone()).unwrap();
        assert_eq!(engine.document(), document);
        assert!(engine.undo());
        assert_eq!(engine.model().rack_count(), 1);
        assert_eq!(only_rack(&engine).height, RackHeight::U42);
    }

    #[test]
    fn test_rack_dropped_on_orphaned_manager() {
        let mut engine = Engine::headless(EngineConfig::default());
        let seed = only_rack(&engine);
        let manager = engine
            .place_infrastructure("manager-10in", Point::new(seed.bounds().x1 + 20.0, 600.0))
            .unwrap();
        engine.delete_rack(seed.id).unwrap();
        let manager = engine.model().manager(manager.id()).unwrap().bounds();

        let entity = engine.place_infrastructure("rack-12u-open", manager.center()).unwrap();
        let rack = engine.model().rack(entity.id()).unwrap();
        assert!(!collides(rack.bounds(), manager, engine.config().row_tolerance));
        assert!(rack.is_floor_anchored());
    }

    #[test]
    fn test_place_device_rejects_infrastructure() {
        let mut engine = Engine::headless(EngineConfig::default());
        let rack = only_rack(&engine);
        let descriptor = EquipmentDescriptor::infrastructure(InfrastructureKind::Manager(ManagerWidth::Narrow));

        let result = engine.place_device(&descriptor, Point::new(rack.bounds().x1 + 5.0, 600.0));
        assert_eq!(result, Err(PlacementError::NotADevice("manager-6in".to_string())));
        assert_eq!(engine.model().manager_count(), 0);
        assert!(!engine.history().can_undo());

        let entity = engine
            .place_descriptor(&descriptor, Point::new(rack.bounds().x1 + 5.0, 600.0))
            .unwrap();
        assert_eq!(entity.kind(), EntityKind::Manager);
    }

    const LAYOUT_TAGS: [&str; 6] = [
        "rack-9u-open",
        "rack-12u-open",
        "rack-24u-enclosed",
        "rack-42u-open",
        "manager-6in",
        "manager-10in",
    ];

    fn assert_managers_clear(engine: &Engine) -> Result<(), TestCaseError> {
        let tolerance = engine.config().row_tolerance;
        let managers: Vec<_> = engine.model().managers().map(Manager::bounds).collect();
        for (i, manager) in managers.iter().enumerate() {
            for rack in engine.model().racks() {
                prop_assert!(!collides(*manager, rack.bounds(), tolerance), "manager overlaps rack {}", rack.id);
            }
            for other in &managers[i + 1..] {
                prop_assert!(!collides(*manager, *other, tolerance), "managers overlap");
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn managers_never_overlap_racks_or_managers(
            steps in prop::collection::vec((0usize..8, -400.0f64..1600.0, 0.0f64..1300.0), 1..30)
        ) {
            let mut engine = Engine::headless(EngineConfig::default());
            for (op, x, y) in steps {
                if op < LAYOUT_TAGS.len() {
                    engine.place_infrastructure(LAYOUT_TAGS[op], Point::new(x, y)).ok();
                } else {
                    let racks: Vec<RackId> = engine.model().racks().map(|r| r.id).collect();
                    if !racks.is_empty() {
                        let index = (x.abs() as usize) % racks.len();
                        engine.delete_rack(racks[index]).unwrap();
                    }
                }
                assert_managers_clear(&engine)?;
            }
        }
    }

    #[test]
    fn test_open_document_starts_fresh_history() {
        let mut other = empty_engine();
        other.place_infrastructure("rack-12u-open", Point::new(600.0, 600.0)).unwrap();
        let document = other.document();

        let mut engine = Engine::headless(EngineConfig::default());
        let rack = only_rack(&engine);
        engine
            .place_device(&EquipmentDescriptor::device("server-1u", 1), rack.anchor())
            .unwrap();
        engine.open_document(document.clone()).unwrap();
        assert_eq!(engine.document(), document);
        assert!(!engine.history().can_undo());
        assert!(!engine.undo());
    }

    #[test]
    fn test_resize_moves_keyboard_zoom_center() {
        let mut engine = Engine::headless(EngineConfig::default());
        let outcome = engine.handle_event(InputEvent::Resize { size: Size::new(600.0, 400.0) });
        assert_eq!(outcome, EventOutcome::Changed);
        assert_eq!(engine.view().viewport, Size::new(600.0, 400.0));

        let center = Point::new(300.0, 200.0);
        let before = engine.view().screen_to_world(center);
        engine.handle_event(InputEvent::Key { key: Key::ZoomIn });
        let after = engine.view().screen_to_world(center);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }
}
