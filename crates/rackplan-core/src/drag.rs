//! Drag-and-drop session state machine.
//!
//! `Idle -> Dragging -> {Dropped | Cancelled} -> Idle`. The session only
//! tracks the gesture; the engine commits the placement when a drop ends it.

use crate::catalog::EquipmentDescriptor;
use crate::geometry::{EntityRef, RackId};
use crate::placement::{DeviceTarget, Placement, PlacementEngine, PlacementError};
use kurbo::Point;

/// Valid starting units of the rack under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropZones {
    pub rack_id: RackId,
    pub units: Vec<u32>,
}

/// What the dragged item would do if dropped at the current position.
#[derive(Debug, Clone, PartialEq)]
pub struct DragPreview {
    /// Same resolution the drop will perform.
    pub placement: Result<Placement, PlacementError>,
    /// Device drags over a rack also expose that rack's drop zones.
    pub device_target: Option<DeviceTarget>,
}

impl DragPreview {
    pub fn drop_zones(&self) -> Option<DropZones> {
        self.device_target.as_ref().map(|target| DropZones {
            rack_id: target.rack_id,
            units: target.valid_zones.clone(),
        })
    }
}

/// Transient state of an active drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragContext {
    pub descriptor: EquipmentDescriptor,
    /// Last pointer position in world coordinates.
    pub position: Option<Point>,
    pub preview: Option<DragPreview>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragContext),
}

/// How a drag gesture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    Dropped(EntityRef),
    Rejected(PlacementError),
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    fn context(&self) -> Option<&DragContext> {
        match &self.state {
            DragState::Dragging(context) => Some(context),
            DragState::Idle => None,
        }
    }

    pub fn descriptor(&self) -> Option<&EquipmentDescriptor> {
        self.context().map(|c| &c.descriptor)
    }

    pub fn preview(&self) -> Option<&DragPreview> {
        self.context().and_then(|c| c.preview.as_ref())
    }

    /// Drop zones of the rack under a dragged device.
    pub fn valid_zones(&self) -> Option<DropZones> {
        self.preview().and_then(DragPreview::drop_zones)
    }

    /// Enter `Dragging` with the palette item's descriptor.
    /// A drag that was still in progress is discarded.
    pub fn begin(&mut self, descriptor: EquipmentDescriptor) {
        if let DragState::Dragging(previous) = &self.state {
            log::warn!("Drag of {} replaced before it ended", previous.descriptor.type_tag);
        }
        log::debug!("Drag started: {}", descriptor.type_tag);
        self.state = DragState::Dragging(DragContext {
            descriptor,
            position: None,
            preview: None,
        });
    }

    /// Track the pointer and recompute the preview. Returns false when idle.
    pub fn update(&mut self, position: Point, engine: &PlacementEngine<'_>) -> bool {
        let DragState::Dragging(context) = &mut self.state else {
            return false;
        };
        let descriptor = &context.descriptor;
        let device_target = if descriptor.is_infrastructure {
            None
        } else {
            engine.device_target(descriptor.height_u, position)
        };
        context.position = Some(position);
        context.preview = Some(DragPreview {
            placement: engine.resolve(descriptor, position),
            device_target,
        });
        true
    }

    /// Leave `Dragging` for a drop, handing back the descriptor to place.
    pub fn finish(&mut self) -> Option<EquipmentDescriptor> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(context) => Some(context.descriptor),
            DragState::Idle => None,
        }
    }

    /// Abandon the drag. Returns true if one was active.
    pub fn cancel(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(context) => {
                log::debug!("Drag of {} cancelled", context.descriptor.type_tag);
                true
            }
            DragState::Idle => false,
        }
    }
}
