//! Vertical cable manager placement.

use super::{PlacementEngine, PlacementError};
use crate::geometry::{Enclosure, Manager, ManagerWidth, manager_bounds};
use crate::snap::{Side, flush_against};
use kurbo::Point;

impl PlacementEngine<'_> {
    /// Resolve a manager dropped at `drop` beside the nearest open rack.
    ///
    /// Starts flush against the rack edge on the drop side and walks outward
    /// in fixed steps until the manager no longer collides with anything.
    pub fn resolve_manager(&self, width: ManagerWidth, drop: Point) -> Result<Manager, PlacementError> {
        let rack = self.model.nearest_rack(drop).ok_or(PlacementError::NoTargetRack)?;
        if rack.enclosure == Enclosure::Enclosed {
            log::warn!("Manager rejected: rack {} is enclosed", rack.id);
            return Err(PlacementError::EnclosedRack(rack.id));
        }

        let side = Side::of(drop.x, rack.center_x());
        let bounds = rack.bounds();
        let edge = match side {
            Side::Right => bounds.x1,
            Side::Left => bounds.x0,
        };
        let start_x = flush_against(edge, width.world_width(), side);

        for step in 0..=self.config.max_search_steps {
            let x = start_x + side.direction() * step as f64 * self.config.manager_step;
            let position = Point::new(x, bounds.y0);
            let candidate = manager_bounds(position, width, rack.height_u());
            if self.first_obstacle(candidate).is_none() {
                log::debug!("Manager placed {:?} of rack {} after {} steps", side, rack.id, step);
                return Ok(Manager::new(position, width, rack.height_u(), rack.id));
            }
        }

        log::warn!("Manager placement beside rack {} abandoned", rack.id);
        Err(PlacementError::NoFreeSlot)
    }
}
