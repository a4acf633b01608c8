//! Single-element selection and hit testing.

use crate::geometry::{EntityRef, GeometryModel};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// What is currently selected. At most one element; a device and a piece
/// of infrastructure can never be selected together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "kebab-case")]
pub enum Selection {
    #[default]
    None,
    Device(EntityRef),
    Infrastructure(EntityRef),
}

impl Selection {
    /// The selected element, if any.
    pub fn entity(self) -> Option<EntityRef> {
        match self {
            Selection::None => None,
            Selection::Device(entity) | Selection::Infrastructure(entity) => Some(entity),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Selection::None
    }
}

/// Tracks the selected element.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selection: Selection,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Select an element, replacing any previous selection of either kind.
    pub fn select(&mut self, entity: EntityRef) {
        self.selection = if entity.is_infrastructure() {
            Selection::Infrastructure(entity)
        } else {
            Selection::Device(entity)
        };
    }

    pub fn clear(&mut self) {
        self.selection = Selection::None;
    }

    pub fn is_selected(&self, entity: EntityRef) -> bool {
        self.selection.entity() == Some(entity)
    }

    /// Drop the selection if its element no longer exists.
    /// Returns true if the selection changed.
    pub fn retain_existing(&mut self, model: &GeometryModel) -> bool {
        match self.selection.entity() {
            Some(entity) if !model.contains(entity) => {
                self.clear();
                true
            }
            _ => false,
        }
    }
}

/// Topmost element under `point` (world coordinates).
///
/// Devices paint above managers, which paint above racks; within a kind the
/// most recently created element is on top.
pub fn hit_test(model: &GeometryModel, point: Point) -> Option<EntityRef> {
    let device = model.devices().rev().find(|device| {
        model
            .rack(device.rack_id)
            .is_some_and(|rack| device.bounds_in(rack).contains(point))
    });
    if let Some(device) = device {
        return Some(EntityRef::Device(device.id));
    }

    if let Some(manager) = model.managers().rev().find(|m| m.bounds().contains(point)) {
        return Some(EntityRef::Manager(manager.id));
    }

    model
        .racks()
        .rev()
        .find(|rack| rack.bounds().contains(point))
        .map(|rack| EntityRef::Rack(rack.id))
}
