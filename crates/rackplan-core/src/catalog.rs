//! Equipment descriptors and type tag parsing.
//!
//! The palette collaborator hands the engine an [`EquipmentDescriptor`]
//! when a drag starts. Infrastructure tags encode their geometry:
//! `rack-<height>u-<open|enclosed>` and `manager-<6|10>in`.

use crate::geometry::{Enclosure, ManagerWidth, RackHeight};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// What is being dragged from the palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentDescriptor {
    pub type_tag: String,
    pub height_u: u32,
    pub is_infrastructure: bool,
}

impl EquipmentDescriptor {
    /// Descriptor for a rack-mounted device.
    pub fn device(type_tag: impl Into<String>, height_u: u32) -> Self {
        Self {
            type_tag: type_tag.into(),
            height_u,
            is_infrastructure: false,
        }
    }

    /// Descriptor for a rack or manager, with the height taken from the tag.
    pub fn infrastructure(kind: InfrastructureKind) -> Self {
        let height_u = match kind {
            InfrastructureKind::Rack { height, .. } => height.units(),
            InfrastructureKind::Manager(_) => 0,
        };
        Self {
            type_tag: kind.tag(),
            height_u,
            is_infrastructure: true,
        }
    }
}

/// Infrastructure a tag can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfrastructureKind {
    Rack { height: RackHeight, enclosure: Enclosure },
    Manager(ManagerWidth),
}

/// Unrecognised infrastructure tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown infrastructure type: {0}")]
pub struct UnknownType(pub String);

impl InfrastructureKind {
    /// Canonical tag for this kind.
    pub fn tag(self) -> String {
        match self {
            InfrastructureKind::Rack { height, enclosure } => {
                let enclosure = match enclosure {
                    Enclosure::Open => "open",
                    Enclosure::Enclosed => "enclosed",
                };
                format!("rack-{}u-{}", height.units(), enclosure)
            }
            InfrastructureKind::Manager(width) => format!("manager-{}in", width.inches() as u32),
        }
    }
}

impl FromStr for InfrastructureKind {
    type Err = UnknownType;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownType(tag.to_string());
        let lower = tag.trim().to_ascii_lowercase();

        if let Some(rest) = lower.strip_prefix("rack-") {
            let (height, enclosure) = rest.split_once("u-").ok_or_else(unknown)?;
            let height: u32 = height.parse().map_err(|_| unknown())?;
            let height = RackHeight::try_from(height).map_err(|_| unknown())?;
            let enclosure = match enclosure {
                "open" => Enclosure::Open,
                "enclosed" => Enclosure::Enclosed,
                _ => return Err(unknown()),
            };
            return Ok(InfrastructureKind::Rack { height, enclosure });
        }

        match lower.as_str() {
            "manager-6in" => Ok(InfrastructureKind::Manager(ManagerWidth::Narrow)),
            "manager-10in" => Ok(InfrastructureKind::Manager(ManagerWidth::Wide)),
            _ => Err(unknown()),
        }
    }
}

/// A palette entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub label: &'static str,
    pub descriptor: EquipmentDescriptor,
}

/// Racks offered by the built-in palette.
const RACKS: &[(RackHeight, Enclosure, &str)] = &[
    (RackHeight::U9, Enclosure::Open, "9U Open Rack"),
    (RackHeight::U9, Enclosure::Enclosed, "9U Enclosed Rack"),
    (RackHeight::U12, Enclosure::Open, "12U Open Rack"),
    (RackHeight::U12, Enclosure::Enclosed, "12U Enclosed Rack"),
    (RackHeight::U24, Enclosure::Open, "24U Open Rack"),
    (RackHeight::U24, Enclosure::Enclosed, "24U Enclosed Rack"),
    (RackHeight::U42, Enclosure::Open, "42U Open Rack"),
    (RackHeight::U42, Enclosure::Enclosed, "42U Enclosed Rack"),
];

/// Devices offered by the built-in palette.
const DEVICES: &[(&str, &str, u32)] = &[
    ("server-1u", "1U Server", 1),
    ("switch-1u", "1U Switch", 1),
    ("patch-panel-1u", "1U Patch Panel", 1),
    ("blank-1u", "1U Blanking Panel", 1),
    ("server-2u", "2U Server", 2),
    ("storage-2u", "2U Storage", 2),
    ("ups-3u", "3U UPS", 3),
    ("storage-4u", "4U Storage Chassis", 4),
];

/// The built-in palette: every rack variant, both managers, then devices.
pub fn builtin_catalog() -> Vec<CatalogEntry> {
    let mut entries: Vec<CatalogEntry> = RACKS
        .iter()
        .map(|&(height, enclosure, label)| CatalogEntry {
            label,
            descriptor: EquipmentDescriptor::infrastructure(InfrastructureKind::Rack { height, enclosure }),
        })
        .collect();
    entries.push(CatalogEntry {
        label: "6\" Vertical Manager",
        descriptor: EquipmentDescriptor::infrastructure(InfrastructureKind::Manager(ManagerWidth::Narrow)),
    });
    entries.push(CatalogEntry {
        label: "10\" Vertical Manager",
        descriptor: EquipmentDescriptor::infrastructure(InfrastructureKind::Manager(ManagerWidth::Wide)),
    });
    for &(tag, label, height_u) in DEVICES {
        entries.push(CatalogEntry {
            label,
            descriptor: EquipmentDescriptor::device(tag, height_u),
        });
    }
    entries
}

/// Look up a built-in descriptor by tag.
pub fn lookup(tag: &str) -> Option<EquipmentDescriptor> {
    builtin_catalog()
        .into_iter()
        .map(|entry| entry.descriptor)
        .find(|descriptor| descriptor.type_tag == tag)
}
