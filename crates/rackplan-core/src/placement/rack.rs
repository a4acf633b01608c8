//! Rack placement: adjacency, manager flanking and stacking.

use super::{PlacementEngine, PlacementError, point_rect_distance, rect_distance};
use crate::config::MountingPolicy;
use crate::geometry::{
    Enclosure, FLOOR_Y, MAX_STACK_U, MOUNT_WIDTH, Mounting, Rack, RackHeight, floor_origin_y, mount_height,
    outer_bounds,
};
use crate::snap::{Side, flush_against, snap_point};
use kurbo::Point;

/// Racks whose mounting zones start within this distance share a lane.
const LANE_EPSILON: f64 = 1.0;

impl PlacementEngine<'_> {
    /// Resolve the position and mounting of a new rack dropped at `drop`.
    pub fn resolve_rack(&self, height: RackHeight, enclosure: Enclosure, drop: Point) -> Result<Rack, PlacementError> {
        let Some(nearest) = self.model.nearest_rack(drop) else {
            return self.first_rack(height, enclosure, drop);
        };

        if !height.is_full_height() {
            if let Some(rack) = self.stack_rack(height, enclosure, drop) {
                return Ok(rack);
            }
        }

        let side = Side::of(drop.x, nearest.center_x());
        let edge = self.facing_edge(nearest, side, drop);
        let (y, mounting) = self.resting_y(height, drop);
        let x = self.chain_flush(edge, side, height, enclosure, y)?;

        log::debug!(
            "Rack {}U placed {:?} of rack {} at ({:.1}, {:.1}), {:?}",
            height.units(),
            side,
            nearest.id,
            x,
            y,
            mounting
        );
        Ok(Rack::new(Point::new(x, y), height, enclosure, mounting))
    }

    /// Placement when the layout has no racks yet.
    ///
    /// Managers can outlive every rack, so the candidate still moves flush
    /// past any manager it would overlap.
    fn first_rack(&self, height: RackHeight, enclosure: Enclosure, drop: Point) -> Result<Rack, PlacementError> {
        let (origin, mounting) = if height.is_full_height() {
            let origin = Point::new(self.config.default_anchor_x, floor_origin_y(height.units()));
            (origin, Mounting::Floor)
        } else {
            let centered = Point::new(drop.x - MOUNT_WIDTH / 2.0, drop.y);
            let snapped = snap_point(centered, self.config.snap_mode, self.config.grid_size);
            let (y, mounting) = self.resting_y(height, snapped);
            (Point::new(snapped.x, y), mounting)
        };

        let candidate = outer_bounds(origin, height.units(), enclosure);
        let Some(obstacle) = self.first_obstacle(candidate) else {
            return Ok(Rack::new(origin, height, enclosure, mounting));
        };

        let side = Side::of(candidate.center().x, obstacle.center().x);
        let edge = match side {
            Side::Right => obstacle.x1,
            Side::Left => obstacle.x0,
        };
        let x = self.chain_flush(edge, side, height, enclosure, origin.y)?;
        log::debug!("First rack moved {:?} of an existing manager to x {:.1}", side, x);
        Ok(Rack::new(Point::new(x, origin.y), height, enclosure, mounting))
    }

    /// Vertical position of a rack that does not stack.
    ///
    /// Full-height racks always stand on the floor; shorter ones follow the
    /// mounting policy and never sink below the floor line.
    fn resting_y(&self, height: RackHeight, drop: Point) -> (f64, Mounting) {
        let units = height.units();
        let floor = floor_origin_y(units);
        if height.is_full_height() || self.config.mounting_policy == MountingPolicy::Floor {
            return (floor, Mounting::Floor);
        }
        let y = (drop.y - mount_height(units) / 2.0).min(floor);
        let mounting = if (y - floor).abs() < 1e-6 { Mounting::Floor } else { Mounting::Wall };
        (y, mounting)
    }

    /// Outer edge the new rack should sit flush against on `side` of `nearest`.
    ///
    /// Managers captured near the rack or the drop point win over the rack's
    /// own edge; the outermost one on that side is used.
    fn facing_edge(&self, nearest: &Rack, side: Side, drop: Point) -> f64 {
        let rack_bounds = nearest.bounds();
        let radius = self.config.capture_radius;
        let captured = self
            .model
            .managers()
            .map(|m| m.bounds())
            .filter(|b| rect_distance(*b, rack_bounds) <= radius || point_rect_distance(drop, *b) <= radius)
            .filter(|b| Side::of(b.center().x, nearest.center_x()) == side);

        let extreme = match side {
            Side::Right => captured.map(|b| b.x1).reduce(f64::max),
            Side::Left => captured.map(|b| b.x0).reduce(f64::min),
        };

        match (extreme, side) {
            (Some(edge), _) => {
                log::debug!("Rack flush against manager edge at {:.1}", edge);
                edge
            }
            (None, Side::Right) => rack_bounds.x1,
            (None, Side::Left) => rack_bounds.x0,
        }
    }

    /// Mounting zone X for a rack flush against `edge`, chained past any
    /// obstacle already occupying that slot.
    fn chain_flush(
        &self,
        mut edge: f64,
        side: Side,
        height: RackHeight,
        enclosure: Enclosure,
        y: f64,
    ) -> Result<f64, PlacementError> {
        let margin = enclosure.side_margin();
        let outer_width = MOUNT_WIDTH + 2.0 * margin;

        for _ in 0..=self.config.max_search_steps {
            let x = flush_against(edge, outer_width, side) + margin;
            let candidate = outer_bounds(Point::new(x, y), height.units(), enclosure);
            match self.first_obstacle(candidate) {
                None => return Ok(x),
                Some(obstacle) => {
                    edge = match side {
                        Side::Right => obstacle.x1,
                        Side::Left => obstacle.x0,
                    };
                }
            }
        }
        log::warn!("Rack placement gave up after {} steps", self.config.max_search_steps);
        Err(PlacementError::NoFreeSlot)
    }

    /// Try to stack a sub-42U rack onto a lane near the drop point.
    fn stack_rack(&self, height: RackHeight, enclosure: Enclosure, drop: Point) -> Option<Rack> {
        let units = height.units();
        let window = MOUNT_WIDTH / 2.0 + self.config.stack_tolerance;

        let mut target: Option<(&Rack, f64)> = None;
        for rack in self.model.racks() {
            if (drop.x - rack.center_x()).abs() > window {
                continue;
            }
            if self.model.lane_height_u(rack, LANE_EPSILON) + units > MAX_STACK_U {
                continue;
            }
            let dist = rack.anchor().distance(drop);
            if target.is_none_or(|(_, best)| dist < best) {
                target = Some((rack, dist));
            }
        }
        let (target, _) = target?;

        let lane: Vec<&Rack> = self.model.lane(target, LANE_EPSILON).collect();
        let top = lane.iter().map(|r| r.bounds().y0).reduce(f64::min)?;
        let bottom = lane.iter().map(|r| r.bounds().y1).reduce(f64::max)?;
        let frame = enclosure.frame_margin();
        let height_px = mount_height(units);

        let above = (top - frame - height_px, Mounting::StackAbove);
        let (y, mounting) = if drop.y < target.anchor().y {
            above
        } else {
            let below_y = bottom + frame;
            if below_y + height_px > FLOOR_Y + 1e-6 {
                above
            } else {
                (below_y, Mounting::StackBelow)
            }
        };

        let origin = Point::new(target.origin.x, y);
        if self.first_obstacle(outer_bounds(origin, units, enclosure)).is_some() {
            log::debug!("Stack slot on lane of rack {} is blocked", target.id);
            return None;
        }
        log::debug!("Rack {}U stacked {:?} on lane of rack {}", units, mounting, target.id);
        Some(Rack::new(origin, height, enclosure, mounting))
    }
}
