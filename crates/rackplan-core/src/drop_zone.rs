//! Collision-free starting units for devices.

use crate::geometry::{GeometryModel, Rack};

/// Every starting unit at which a device of `device_height_u` fits in a rack
/// of `rack_height_u` without touching an occupied range.
///
/// `occupied` yields inclusive `(start, end)` unit ranges. The result is ascending.
pub fn free_units(
    rack_height_u: u32,
    device_height_u: u32,
    occupied: impl IntoIterator<Item = (u32, u32)>,
) -> Vec<u32> {
    if device_height_u == 0 || device_height_u > rack_height_u {
        return Vec::new();
    }

    // Bitmap of taken units; index 0 is unused so units stay 1-based.
    let mut taken = vec![false; rack_height_u as usize + 1];
    for (start, end) in occupied {
        for unit in start.max(1)..=end.min(rack_height_u) {
            taken[unit as usize] = true;
        }
    }

    let last_start = rack_height_u - device_height_u + 1;
    (1..=last_start)
        .filter(|&unit| {
            let end = unit + device_height_u - 1;
            (unit..=end).all(|u| !taken[u as usize])
        })
        .collect()
}

/// Valid starting units for a device of `device_height_u` in `rack`.
pub fn valid_zones(model: &GeometryModel, rack: &Rack, device_height_u: u32) -> Vec<u32> {
    let occupied = model
        .devices_in_rack(rack.id)
        .map(|device| (device.start_unit, device.end_unit()));
    free_units(rack.height_u(), device_height_u, occupied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Device, Enclosure, Mounting, RackHeight, floor_origin_y};
    use kurbo::Point;
    use proptest::prelude::*;

    fn rack(height: RackHeight) -> Rack {
        Rack::new(
            Point::new(0.0, floor_origin_y(height.units())),
            height,
            Enclosure::Open,
            Mounting::Floor,
        )
    }

    #[test]
    fn test_empty_rack() {
        let zones = free_units(9, 2, []);
        assert_eq!(zones, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_device_taller_than_rack() {
        assert!(free_units(9, 10, []).is_empty());
        assert!(free_units(9, 0, []).is_empty());
    }

    #[test]
    fn test_full_height_device() {
        assert_eq!(free_units(12, 12, []), vec![1]);
        assert!(free_units(12, 12, [(6, 6)]).is_empty());
    }

    #[test]
    fn test_gap_between_devices() {
        // Units 3-4 and 8 taken in a 9U rack; a 2U device fits at 1, 5, 6.
        assert_eq!(free_units(9, 2, [(3, 4), (8, 8)]), vec![1, 5, 6]);
    }

    #[test]
    fn test_valid_zones_uses_rack_devices_only() {
        let mut model = GeometryModel::new();
        let a = model.add_rack(rack(RackHeight::U9));
        let b = model.add_rack(rack(RackHeight::U9));
        model.add_device(Device::new("ups-3u", 3, a, 1));
        model.add_device(Device::new("ups-3u", 3, b, 4));

        let rack_a = model.rack(a).unwrap();
        assert_eq!(valid_zones(&model, rack_a, 3), vec![4, 5, 6, 7]);
        let rack_b = model.rack(b).unwrap();
        assert_eq!(valid_zones(&model, rack_b, 3), vec![1, 7]);
    }

    proptest! {
        #[test]
        fn zones_are_in_range_and_exactly_the_free_starts(
            rack_height in prop::sample::select(vec![9u32, 12, 24, 42]),
            height in 1u32..8,
            ranges in prop::collection::vec((1u32..42, 0u32..4), 0..8),
        ) {
            let occupied: Vec<(u32, u32)> = ranges
                .into_iter()
                .map(|(start, len)| (start, start + len))
                .collect();
            let zones = free_units(rack_height, height, occupied.iter().copied());

            for unit in 1..=rack_height {
                let end = unit + height - 1;
                let fits = end <= rack_height;
                let clashes = occupied.iter().any(|&(s, e)| s <= end && unit <= e.min(rack_height) && s <= rack_height);
                prop_assert_eq!(zones.contains(&unit), fits && !clashes);
            }
            prop_assert!(zones.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
