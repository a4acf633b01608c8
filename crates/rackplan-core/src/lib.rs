//! RackPlan Core Library
//!
//! Platform-agnostic layout engine for planning equipment in data-center
//! racks: the spatial model, placement heuristics, drop-zone computation,
//! drag sessions and undo history. Rendering and input devices are external
//! collaborators.

pub mod catalog;
pub mod config;
pub mod drag;
pub mod drop_zone;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod input;
pub mod placement;
pub mod selection;
pub mod snap;
pub mod storage;
pub mod view;

pub use catalog::{EquipmentDescriptor, InfrastructureKind, builtin_catalog};
pub use config::{ConfigError, EngineConfig, MountingPolicy};
pub use drag::{DragOutcome, DragSession, DragState, DropZones};
pub use drop_zone::valid_zones;
pub use engine::{Confirm, DeleteError, Engine, EventOutcome, RenderSink, RenderSnapshot};
pub use geometry::{
    Device, Enclosure, EntityKind, EntityRef, GeometryModel, LayoutDocument, Manager, ManagerWidth, ModelError,
    Mounting, Rack, RackHeight, FLOOR_Y, UNIT_HEIGHT,
};
pub use history::HistoryManager;
pub use input::{InputEvent, Key, MouseButton};
pub use placement::{Placement, PlacementEngine, PlacementError};
pub use selection::{Selection, SelectionController};
pub use snap::{GRID_SIZE, SnapMode, snap_point, snap_to_grid};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use view::ViewTransform;
