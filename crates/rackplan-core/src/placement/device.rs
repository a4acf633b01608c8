//! Device placement: target rack lookup and unit snapping.

use super::{PlacementEngine, PlacementError};
use crate::drop_zone::valid_zones;
use crate::geometry::{Device, Rack, RackId, UNIT_HEIGHT};
use crate::snap::snap_unit;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Where a device under the pointer would land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTarget {
    pub rack_id: RackId,
    /// Unit directly under the pointer, clamped into the rack.
    pub ideal_unit: u32,
    /// Every collision-free starting unit, ascending.
    pub valid_zones: Vec<u32>,
    /// The valid unit closest to `ideal_unit`.
    pub unit: Option<u32>,
}

/// Unit under `point` for a device of `height_u`, clamped so it fits the rack.
pub fn ideal_unit(rack: &Rack, height_u: u32, point: Point) -> u32 {
    let last_start = rack.height_u().saturating_sub(height_u) + 1;
    let raw = ((point.y - rack.origin.y) / UNIT_HEIGHT).floor() + 1.0;
    raw.clamp(1.0, f64::from(last_start)) as u32
}

impl PlacementEngine<'_> {
    /// Topmost rack whose outer bounds contain `point`.
    pub fn target_rack(&self, point: Point) -> Option<&Rack> {
        self.model.racks().rev().find(|rack| rack.bounds().contains(point))
    }

    /// Drop target for a device of `height_u` under `point`.
    pub fn device_target(&self, height_u: u32, point: Point) -> Option<DeviceTarget> {
        let rack = self.target_rack(point)?;
        let ideal = ideal_unit(rack, height_u, point);
        let zones = valid_zones(self.model, rack, height_u);
        let unit = snap_unit(ideal, &zones);
        Some(DeviceTarget {
            rack_id: rack.id,
            ideal_unit: ideal,
            valid_zones: zones,
            unit,
        })
    }

    /// Resolve a device dropped at `point` into the nearest free unit.
    pub fn resolve_device(&self, type_tag: &str, height_u: u32, point: Point) -> Result<Device, PlacementError> {
        let target = self.device_target(height_u, point).ok_or(PlacementError::NoTargetRack)?;
        let unit = target.unit.ok_or(PlacementError::NoValidZone(height_u))?;
        if unit != target.ideal_unit {
            log::debug!("Device {} snapped from U{} to U{}", type_tag, target.ideal_unit, unit);
        }
        Ok(Device::new(type_tag, height_u, target.rack_id, unit))
    }
}
