//! Engine configuration.

use crate::snap::SnapMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// How sub-42U racks are positioned vertically when they do not stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MountingPolicy {
    /// Stand on the floor line like full-height racks.
    #[default]
    Floor,
    /// Keep the drop height (wall mount).
    Wall,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunable policies and tolerances of the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Vertical policy for sub-42U racks.
    pub mounting_policy: MountingPolicy,
    /// Snapping applied to a rack dropped with no neighbours.
    pub snap_mode: SnapMode,
    /// Grid cell size for grid snapping.
    pub grid_size: f64,
    /// World X of the mounting zone of the first full-height rack.
    pub default_anchor_x: f64,
    /// Minimum allowed zoom level.
    pub min_zoom: f64,
    /// Maximum allowed zoom level.
    pub max_zoom: f64,
    /// Zoom factor of one wheel notch or +/- press.
    pub zoom_step: f64,
    /// Managers closer than this to the target rack or drop point steer rack placement.
    pub capture_radius: f64,
    /// Horizontal window in which a drop can stack onto an existing rack.
    pub stack_tolerance: f64,
    /// Vertical overlap below which two boxes are not in the same row.
    pub row_tolerance: f64,
    /// Distance moved per step while searching for a free manager slot.
    pub manager_step: f64,
    /// Maximum number of search steps for managers and rack chaining.
    pub max_search_steps: usize,
    /// Number of undo snapshots kept.
    pub history_capacity: usize,
    /// Seed one full-height rack when the engine starts.
    pub seed_default_rack: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mounting_policy: MountingPolicy::Floor,
            snap_mode: SnapMode::Grid,
            grid_size: crate::snap::GRID_SIZE,
            default_anchor_x: 200.0,
            min_zoom: 0.28,
            max_zoom: 2.8,
            zoom_step: 1.1,
            capture_radius: 60.0,
            stack_tolerance: 40.0,
            row_tolerance: 1.0,
            manager_step: 10.0,
            max_search_steps: 40,
            history_capacity: 10,
            seed_default_rack: true,
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(ConfigError::Invalid {
                field: "min_zoom",
                reason: format!("must be positive and not exceed max_zoom ({})", self.max_zoom),
            });
        }
        if self.zoom_step <= 1.0 {
            return Err(ConfigError::Invalid {
                field: "zoom_step",
                reason: "must be greater than 1".to_string(),
            });
        }
        if self.grid_size <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "grid_size",
                reason: "must be positive".to_string(),
            });
        }
        if self.manager_step <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "manager_step",
                reason: "must be positive".to_string(),
            });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "history_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
