//! Spatial data model: racks, cable managers and rack-mounted devices.
//!
//! All records live in id-keyed maps. Back-references (`Device::rack_id`,
//! `Manager::mounted_rack_id`) are plain ids resolved by lookup, so the
//! model never holds structural pointers between records.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Height of one rack unit in world units (1U = 1.75").
pub const UNIT_HEIGHT: f64 = 24.0;
/// World units per inch, derived from the rack unit.
pub const PX_PER_INCH: f64 = UNIT_HEIGHT / 1.75;
/// Width of the 19" mounting zone.
pub const MOUNT_WIDTH: f64 = 19.0 * PX_PER_INCH;
/// World Y of the floor line that full-height racks stand on.
pub const FLOOR_Y: f64 = 1200.0;
/// Maximum cumulative height of a stacked lane, in rack units.
pub const MAX_STACK_U: u32 = 42;

/// Identifier of a rack.
pub type RackId = Uuid;
/// Identifier of a vertical cable manager.
pub type ManagerId = Uuid;
/// Identifier of a rack-mounted device.
pub type DeviceId = Uuid;

/// Supported rack heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum RackHeight {
    U9,
    U12,
    U24,
    U42,
}

impl RackHeight {
    /// All heights, smallest first.
    pub const ALL: [RackHeight; 4] = [RackHeight::U9, RackHeight::U12, RackHeight::U24, RackHeight::U42];

    /// Height in rack units.
    pub fn units(self) -> u32 {
        match self {
            RackHeight::U9 => 9,
            RackHeight::U12 => 12,
            RackHeight::U24 => 24,
            RackHeight::U42 => 42,
        }
    }

    /// Whether this is a full-height rack that always stands on the floor.
    pub fn is_full_height(self) -> bool {
        self == RackHeight::U42
    }
}

/// Error for rack heights outside the supported set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported rack height: {0}U")]
pub struct InvalidRackHeight(pub u32);

impl TryFrom<u32> for RackHeight {
    type Error = InvalidRackHeight;

    fn try_from(units: u32) -> Result<Self, Self::Error> {
        match units {
            9 => Ok(RackHeight::U9),
            12 => Ok(RackHeight::U12),
            24 => Ok(RackHeight::U24),
            42 => Ok(RackHeight::U42),
            other => Err(InvalidRackHeight(other)),
        }
    }
}

impl From<RackHeight> for u32 {
    fn from(height: RackHeight) -> Self {
        height.units()
    }
}

/// Whether a rack is an open frame or a closed cabinet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Enclosure {
    Open,
    Enclosed,
}

impl Enclosure {
    /// Horizontal margin between the mounting zone and the outer edge
    /// (post thickness for open frames, cabinet wall for enclosures).
    pub fn side_margin(self) -> f64 {
        match self {
            Enclosure::Open => 1.5 * PX_PER_INCH,
            Enclosure::Enclosed => 2.5 * PX_PER_INCH,
        }
    }

    /// Vertical margin above and below the mounting zone.
    pub fn frame_margin(self) -> f64 {
        match self {
            Enclosure::Open => 12.0,
            Enclosure::Enclosed => 24.0,
        }
    }
}

/// How a rack's vertical position was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mounting {
    Floor,
    Wall,
    StackAbove,
    StackBelow,
}

impl Mounting {
    /// Whether the rack sits on top of or under another rack.
    pub fn is_stacked(self) -> bool {
        matches!(self, Mounting::StackAbove | Mounting::StackBelow)
    }
}

/// A rack. `origin` is the top-left corner of the 19" mounting zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rack {
    pub id: RackId,
    pub origin: Point,
    pub height: RackHeight,
    pub enclosure: Enclosure,
    pub mounting: Mounting,
}

impl Rack {
    /// Create a rack with a fresh id.
    pub fn new(origin: Point, height: RackHeight, enclosure: Enclosure, mounting: Mounting) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            height,
            enclosure,
            mounting,
        }
    }

    /// Height in rack units.
    pub fn height_u(&self) -> u32 {
        self.height.units()
    }

    /// Height of the mounting zone in world units.
    pub fn mount_height(&self) -> f64 {
        mount_height(self.height_u())
    }

    /// The 19" mounting zone.
    pub fn mount_rect(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            self.origin.x + MOUNT_WIDTH,
            self.origin.y + self.mount_height(),
        )
    }

    /// Outer bounds including posts or cabinet walls.
    pub fn bounds(&self) -> Rect {
        outer_bounds(self.origin, self.height_u(), self.enclosure)
    }

    /// Reference anchor used for nearest-rack queries (mounting zone center).
    pub fn anchor(&self) -> Point {
        self.mount_rect().center()
    }

    /// Horizontal center of the rack.
    pub fn center_x(&self) -> f64 {
        self.origin.x + MOUNT_WIDTH / 2.0
    }

    /// World Y of the top of the given 1-based unit.
    pub fn unit_top(&self, unit: u32) -> f64 {
        self.origin.y + f64::from(unit.saturating_sub(1)) * UNIT_HEIGHT
    }

    /// Whether the bottom of the mounting zone rests on the floor line.
    pub fn is_floor_anchored(&self) -> bool {
        (self.origin.y + self.mount_height() - FLOOR_Y).abs() < 1e-6
    }
}

/// Height of a mounting zone of `units` rack units.
pub fn mount_height(units: u32) -> f64 {
    f64::from(units) * UNIT_HEIGHT
}

/// Origin Y that places a rack of `units` on the floor line.
pub fn floor_origin_y(units: u32) -> f64 {
    FLOOR_Y - mount_height(units)
}

/// Outer bounds of a rack with the given mounting zone origin.
pub fn outer_bounds(origin: Point, units: u32, enclosure: Enclosure) -> Rect {
    let side = enclosure.side_margin();
    let frame = enclosure.frame_margin();
    Rect::new(
        origin.x - side,
        origin.y - frame,
        origin.x + MOUNT_WIDTH + side,
        origin.y + mount_height(units) + frame,
    )
}

/// Vertical cable manager widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManagerWidth {
    /// 6" manager.
    Narrow,
    /// 10" manager.
    Wide,
}

impl ManagerWidth {
    /// Width in inches.
    pub fn inches(self) -> f64 {
        match self {
            ManagerWidth::Narrow => 6.0,
            ManagerWidth::Wide => 10.0,
        }
    }

    /// Width in world units.
    pub fn world_width(self) -> f64 {
        self.inches() * PX_PER_INCH
    }
}

/// A vertical cable manager standing beside a rack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manager {
    pub id: ManagerId,
    /// Top-left corner of the manager's outer box.
    pub position: Point,
    pub width: ManagerWidth,
    /// Mirrors the height of the rack it stands beside.
    pub height_u: u32,
    /// Rack this manager was mounted against (lookup only).
    pub mounted_rack_id: RackId,
}

impl Manager {
    /// Create a manager with a fresh id.
    pub fn new(position: Point, width: ManagerWidth, height_u: u32, mounted_rack_id: RackId) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height_u,
            mounted_rack_id,
        }
    }

    /// Outer bounds. The vertical extent matches an open rack of the same height.
    pub fn bounds(&self) -> Rect {
        manager_bounds(self.position, self.width, self.height_u)
    }
}

/// Bounds of a manager with the given top-left corner.
pub fn manager_bounds(position: Point, width: ManagerWidth, height_u: u32) -> Rect {
    let height = mount_height(height_u) + 2.0 * Enclosure::Open.frame_margin();
    Rect::new(
        position.x,
        position.y,
        position.x + width.world_width(),
        position.y + height,
    )
}

/// A rack-mounted device. Its position is always derived from its rack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub type_tag: String,
    pub height_u: u32,
    pub rack_id: RackId,
    /// First occupied unit (1-based, counted from the top).
    pub start_unit: u32,
}

impl Device {
    /// Create a device with a fresh id.
    pub fn new(type_tag: impl Into<String>, height_u: u32, rack_id: RackId, start_unit: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            type_tag: type_tag.into(),
            height_u,
            rack_id,
            start_unit,
        }
    }

    /// Last occupied unit (inclusive).
    pub fn end_unit(&self) -> u32 {
        self.start_unit + self.height_u.saturating_sub(1)
    }

    /// Whether this device's unit range intersects `[start, end]`.
    pub fn occupies(&self, start: u32, end: u32) -> bool {
        self.start_unit <= end && start <= self.end_unit()
    }

    /// Bounds inside the given rack.
    pub fn bounds_in(&self, rack: &Rack) -> Rect {
        device_bounds(rack, self.start_unit, self.height_u)
    }
}

/// Bounds of a device of `height_u` starting at `start_unit` in `rack`.
pub fn device_bounds(rack: &Rack, start_unit: u32, height_u: u32) -> Rect {
    let top = rack.unit_top(start_unit);
    Rect::new(
        rack.origin.x,
        top,
        rack.origin.x + MOUNT_WIDTH,
        top + mount_height(height_u),
    )
}

/// Kind of a layout element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Rack,
    Manager,
    Device,
}

/// A reference to any layout element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "kebab-case")]
pub enum EntityRef {
    Rack(RackId),
    Manager(ManagerId),
    Device(DeviceId),
}

impl EntityRef {
    /// Build a reference from an id and its kind.
    pub fn new(id: Uuid, kind: EntityKind) -> Self {
        match kind {
            EntityKind::Rack => EntityRef::Rack(id),
            EntityKind::Manager => EntityRef::Manager(id),
            EntityKind::Device => EntityRef::Device(id),
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            EntityRef::Rack(id) | EntityRef::Manager(id) | EntityRef::Device(id) => id,
        }
    }

    pub fn kind(self) -> EntityKind {
        match self {
            EntityRef::Rack(_) => EntityKind::Rack,
            EntityRef::Manager(_) => EntityKind::Manager,
            EntityRef::Device(_) => EntityKind::Device,
        }
    }

    /// Racks and managers are infrastructure; devices are not.
    pub fn is_infrastructure(self) -> bool {
        !matches!(self, EntityRef::Device(_))
    }
}

/// Plain serializable form of the layout, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(default)]
    pub racks: Vec<Rack>,
    #[serde(default)]
    pub managers: Vec<Manager>,
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl LayoutDocument {
    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Reasons a document cannot be loaded into a model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("device {0} references missing rack {1}")]
    MissingRack(DeviceId, RackId),
    #[error("device {0} does not fit its rack")]
    OutOfRange(DeviceId),
    #[error("devices {0} and {1} overlap")]
    Overlap(DeviceId, DeviceId),
    #[error("duplicate id {0}")]
    DuplicateId(Uuid),
}

/// Owns all racks, managers and devices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryModel {
    racks: HashMap<RackId, Rack>,
    managers: HashMap<ManagerId, Manager>,
    devices: HashMap<DeviceId, Device>,
    /// Creation order of racks (also paint order, back to front).
    rack_order: Vec<RackId>,
    manager_order: Vec<ManagerId>,
    device_order: Vec<DeviceId>,
}

impl GeometryModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from a document, checking device invariants.
    pub fn from_document(document: LayoutDocument) -> Result<Self, ModelError> {
        let mut model = Self::new();
        for rack in document.racks {
            if model.racks.contains_key(&rack.id) {
                return Err(ModelError::DuplicateId(rack.id));
            }
            model.add_rack(rack);
        }
        for manager in document.managers {
            if model.managers.contains_key(&manager.id) {
                return Err(ModelError::DuplicateId(manager.id));
            }
            model.add_manager(manager);
        }
        for device in document.devices {
            if model.devices.contains_key(&device.id) {
                return Err(ModelError::DuplicateId(device.id));
            }
            let rack = model
                .racks
                .get(&device.rack_id)
                .ok_or(ModelError::MissingRack(device.id, device.rack_id))?;
            if device.height_u == 0 || device.start_unit < 1 || device.end_unit() > rack.height_u() {
                return Err(ModelError::OutOfRange(device.id));
            }
            if let Some(other) = model
                .devices_in_rack(device.rack_id)
                .find(|other| other.occupies(device.start_unit, device.end_unit()))
            {
                return Err(ModelError::Overlap(other.id, device.id));
            }
            model.add_device(device);
        }
        Ok(model)
    }

    /// Deep copy of the current state as a document.
    pub fn document(&self) -> LayoutDocument {
        LayoutDocument {
            racks: self.racks().cloned().collect(),
            managers: self.managers().cloned().collect(),
            devices: self.devices().cloned().collect(),
        }
    }

    /// Replace the whole state with a previously captured document.
    ///
    /// Documents produced by [`GeometryModel::document`] always satisfy the
    /// model invariants, so no validation happens here.
    pub fn restore(&mut self, document: LayoutDocument) {
        self.clear();
        for rack in document.racks {
            self.add_rack(rack);
        }
        for manager in document.managers {
            self.add_manager(manager);
        }
        for device in document.devices {
            self.add_device(device);
        }
    }

    pub fn add_rack(&mut self, rack: Rack) -> RackId {
        let id = rack.id;
        self.rack_order.push(id);
        self.racks.insert(id, rack);
        id
    }

    pub fn add_manager(&mut self, manager: Manager) -> ManagerId {
        let id = manager.id;
        self.manager_order.push(id);
        self.managers.insert(id, manager);
        id
    }

    pub fn add_device(&mut self, device: Device) -> DeviceId {
        let id = device.id;
        self.device_order.push(id);
        self.devices.insert(id, device);
        id
    }

    /// Remove a rack together with every device it owns.
    /// Returns the rack and the removed devices.
    pub fn remove_rack(&mut self, id: RackId) -> Option<(Rack, Vec<Device>)> {
        let rack = self.racks.remove(&id)?;
        self.rack_order.retain(|&rack_id| rack_id != id);

        let owned: Vec<DeviceId> = self.devices_in_rack(id).map(|d| d.id).collect();
        let devices = owned.into_iter().filter_map(|d| self.remove_device(d)).collect();
        Some((rack, devices))
    }

    pub fn remove_manager(&mut self, id: ManagerId) -> Option<Manager> {
        self.manager_order.retain(|&manager_id| manager_id != id);
        self.managers.remove(&id)
    }

    pub fn remove_device(&mut self, id: DeviceId) -> Option<Device> {
        self.device_order.retain(|&device_id| device_id != id);
        self.devices.remove(&id)
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.racks.clear();
        self.managers.clear();
        self.devices.clear();
        self.rack_order.clear();
        self.manager_order.clear();
        self.device_order.clear();
    }

    pub fn rack(&self, id: RackId) -> Option<&Rack> {
        self.racks.get(&id)
    }

    pub fn manager(&self, id: ManagerId) -> Option<&Manager> {
        self.managers.get(&id)
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    /// Whether the referenced element exists.
    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Rack(id) => self.racks.contains_key(&id),
            EntityRef::Manager(id) => self.managers.contains_key(&id),
            EntityRef::Device(id) => self.devices.contains_key(&id),
        }
    }

    /// Racks in creation order.
    pub fn racks(&self) -> impl DoubleEndedIterator<Item = &Rack> {
        self.rack_order.iter().filter_map(|id| self.racks.get(id))
    }

    /// Managers in creation order.
    pub fn managers(&self) -> impl DoubleEndedIterator<Item = &Manager> {
        self.manager_order.iter().filter_map(|id| self.managers.get(id))
    }

    /// Devices in creation order.
    pub fn devices(&self) -> impl DoubleEndedIterator<Item = &Device> {
        self.device_order.iter().filter_map(|id| self.devices.get(id))
    }

    /// Devices mounted in the given rack.
    pub fn devices_in_rack(&self, rack_id: RackId) -> impl Iterator<Item = &Device> {
        self.devices().filter(move |d| d.rack_id == rack_id)
    }

    /// Managers mounted against the given rack.
    pub fn managers_of(&self, rack_id: RackId) -> impl Iterator<Item = &Manager> {
        self.managers().filter(move |m| m.mounted_rack_id == rack_id)
    }

    /// The rack a manager was mounted against, if it still exists.
    pub fn mounted_rack(&self, manager: &Manager) -> Option<&Rack> {
        self.racks.get(&manager.mounted_rack_id)
    }

    pub fn rack_count(&self) -> usize {
        self.racks.len()
    }

    pub fn manager_count(&self) -> usize {
        self.managers.len()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Check if the model holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.racks.is_empty() && self.managers.is_empty() && self.devices.is_empty()
    }

    /// Nearest rack to `point` by anchor distance; ties go to the earliest created.
    pub fn nearest_rack(&self, point: Point) -> Option<&Rack> {
        let mut best: Option<(&Rack, f64)> = None;
        for rack in self.racks() {
            let dist = rack.anchor().distance(point);
            if best.is_none_or(|(_, best_dist)| dist < best_dist) {
                best = Some((rack, dist));
            }
        }
        best.map(|(rack, _)| rack)
    }

    /// Racks sharing the horizontal lane of `rack` (including `rack` itself).
    pub fn lane<'a>(&'a self, rack: &'a Rack, tolerance: f64) -> impl Iterator<Item = &'a Rack> + 'a {
        self.racks()
            .filter(move |other| (other.origin.x - rack.origin.x).abs() <= tolerance)
    }

    /// Cumulative height of the lane `rack` stands in, in rack units.
    pub fn lane_height_u(&self, rack: &Rack, tolerance: f64) -> u32 {
        self.lane(rack, tolerance).map(Rack::height_u).sum()
    }

    /// Bounding box of everything in the layout.
    pub fn bounds(&self) -> Option<Rect> {
        let rects = self
            .racks()
            .map(Rack::bounds)
            .chain(self.managers().map(Manager::bounds));
        rects.fold(None, |acc, r| Some(acc.map_or(r, |a: Rect| a.union(r))))
    }
}
