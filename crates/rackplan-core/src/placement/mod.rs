//! Placement resolution for racks, cable managers and devices.
//!
//! Resolution is pure: a [`PlacementEngine`] reads the model and returns the
//! record that *would* be committed. Drag previews and drops call the same
//! functions, so a placed item always lands where its preview showed it.

mod device;
mod manager;
mod rack;

pub use device::DeviceTarget;

use crate::catalog::{EquipmentDescriptor, InfrastructureKind};
use crate::config::EngineConfig;
use crate::geometry::{Device, EntityRef, GeometryModel, Manager, Rack, RackId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overlaps thinner than this are treated as touching.
const OVERLAP_EPSILON: f64 = 1e-6;

/// Why a placement produced no change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("unknown equipment type: {0}")]
    UnknownType(String),
    #[error("{0} is not a device")]
    NotADevice(String),
    #[error("no rack under the drop point")]
    NoTargetRack,
    #[error("rack {0} is enclosed; managers mount only to open frames")]
    EnclosedRack(RackId),
    #[error("no free unit range for a {0}U device")]
    NoValidZone(u32),
    #[error("no collision-free position found")]
    NoFreeSlot,
}

/// A resolved, not yet committed, placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Placement {
    Rack(Rack),
    Manager(Manager),
    Device(Device),
}

impl Placement {
    /// Reference to the element this placement creates.
    pub fn entity(&self) -> EntityRef {
        match self {
            Placement::Rack(rack) => EntityRef::Rack(rack.id),
            Placement::Manager(manager) => EntityRef::Manager(manager.id),
            Placement::Device(device) => EntityRef::Device(device.id),
        }
    }

    /// Insert the placed record into `model`.
    pub fn commit(self, model: &mut GeometryModel) -> EntityRef {
        match self {
            Placement::Rack(rack) => EntityRef::Rack(model.add_rack(rack)),
            Placement::Manager(manager) => EntityRef::Manager(model.add_manager(manager)),
            Placement::Device(device) => EntityRef::Device(model.add_device(device)),
        }
    }
}

/// Resolves where new equipment goes, given the current layout.
#[derive(Debug, Clone, Copy)]
pub struct PlacementEngine<'a> {
    model: &'a GeometryModel,
    config: &'a EngineConfig,
}

impl<'a> PlacementEngine<'a> {
    pub fn new(model: &'a GeometryModel, config: &'a EngineConfig) -> Self {
        Self { model, config }
    }

    /// Resolve a palette descriptor dropped at `point` (world coordinates).
    pub fn resolve(&self, descriptor: &EquipmentDescriptor, point: Point) -> Result<Placement, PlacementError> {
        if !descriptor.is_infrastructure {
            return self
                .resolve_device(&descriptor.type_tag, descriptor.height_u, point)
                .map(Placement::Device);
        }
        self.resolve_infrastructure(&descriptor.type_tag, point)
    }

    /// Resolve a rack or manager from its type tag.
    pub fn resolve_infrastructure(&self, type_tag: &str, point: Point) -> Result<Placement, PlacementError> {
        let kind: InfrastructureKind = type_tag
            .parse()
            .map_err(|_| PlacementError::UnknownType(type_tag.to_string()))?;
        match kind {
            InfrastructureKind::Rack { height, enclosure } => {
                self.resolve_rack(height, enclosure, point).map(Placement::Rack)
            }
            InfrastructureKind::Manager(width) => self.resolve_manager(width, point).map(Placement::Manager),
        }
    }

    /// Bounds of every rack and manager.
    fn obstacles(&self) -> impl Iterator<Item = Rect> + '_ {
        self.model
            .racks()
            .map(Rack::bounds)
            .chain(self.model.managers().map(Manager::bounds))
    }

    /// First rack or manager that collides with `candidate` in the same row.
    fn first_obstacle(&self, candidate: Rect) -> Option<Rect> {
        let tolerance = self.config.row_tolerance;
        self.obstacles().find(|&other| collides(candidate, other, tolerance))
    }
}

/// Whether two boxes share a row: their vertical overlap exceeds `tolerance`.
pub fn same_row(a: Rect, b: Rect, tolerance: f64) -> bool {
    a.y1.min(b.y1) - a.y0.max(b.y0) > tolerance
}

/// Whether two boxes in the same row overlap horizontally.
pub fn collides(a: Rect, b: Rect, row_tolerance: f64) -> bool {
    let horizontal = a.x1.min(b.x1) - a.x0.max(b.x0);
    horizontal > OVERLAP_EPSILON && same_row(a, b, row_tolerance)
}

/// Gap between two boxes (zero when they touch or overlap).
pub fn rect_distance(a: Rect, b: Rect) -> f64 {
    let dx = (a.x0 - b.x1).max(b.x0 - a.x1).max(0.0);
    let dy = (a.y0 - b.y1).max(b.y0 - a.y1).max(0.0);
    dx.hypot(dy)
}

/// Distance from a point to a box (zero inside).
pub fn point_rect_distance(point: Point, rect: Rect) -> f64 {
    rect_distance(Rect::from_points(point, point), rect)
}
