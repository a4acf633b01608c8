//! Input events from the host and pointer state tracking.
//!
//! Every position carried by an [`InputEvent`] is in screen coordinates.
//! The engine converts them to world coordinates on ingestion.

use crate::catalog::EquipmentDescriptor;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keyboard commands understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Key {
    Delete,
    Escape,
    ZoomIn,
    ZoomOut,
    Undo,
    Redo,
}

/// An event delivered by the input collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InputEvent {
    PointerDown { position: Point, button: MouseButton },
    PointerMove { position: Point },
    PointerUp { position: Point, button: MouseButton },
    /// Negative `delta.y` scrolls up (zoom in).
    Wheel { position: Point, delta: Vec2 },
    DragStart(EquipmentDescriptor),
    DragOver { position: Point },
    Drop { position: Point },
    DragLeave,
    DragEnd,
    Key { key: Key },
    /// The host viewport changed size.
    Resize { size: Size },
}

/// Tracks held buttons and the active pan gesture.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Last pointer position in screen coordinates.
    pub pointer_position: Point,
    pressed_buttons: HashSet<MouseButton>,
    /// Screen position the pan continues from, while panning.
    pan_anchor: Option<Point>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, position: Point, button: MouseButton) {
        self.pointer_position = position;
        self.pressed_buttons.insert(button);
    }

    /// Release a button. Any pan ends with it.
    pub fn release(&mut self, position: Point, button: MouseButton) {
        self.pointer_position = position;
        self.pressed_buttons.remove(&button);
        self.pan_anchor = None;
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    pub fn begin_pan(&mut self, position: Point) {
        self.pan_anchor = Some(position);
    }

    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    /// Move the pointer. Returns the screen delta to pan by, if panning.
    pub fn move_to(&mut self, position: Point) -> Option<Vec2> {
        self.pointer_position = position;
        let anchor = self.pan_anchor.as_mut()?;
        let delta = position - *anchor;
        *anchor = position;
        Some(delta)
    }
}
