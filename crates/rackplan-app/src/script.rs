//! Replay script format.
//!
//! A script is a JSON object:
//!
//! ```json
//! {
//!   "confirm": false,
//!   "steps": [
//!     { "place": "rack-24u-open", "at": { "x": 700.0, "y": 900.0 } },
//!     { "type": "drag-start", "type_tag": "server-1u", "height_u": 1, "is_infrastructure": false },
//!     { "type": "drop", "position": { "x": 330.0, "y": 330.0 } },
//!     { "shortcut": "Ctrl+Z" }
//!   ]
//! }
//! ```

use kurbo::Point;
use rackplan_core::InputEvent;
use serde::{Deserialize, Serialize};

fn default_confirm() -> bool {
    true
}

/// A scripted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Answer given to every deletion confirmation.
    #[serde(default = "default_confirm")]
    pub confirm: bool,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One step of a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    /// A key by its shortcut name, e.g. `"Ctrl+Z"`.
    Shortcut { shortcut: String },
    /// Place a catalog item directly at a world point.
    Place { place: String, at: Point },
    /// A raw input event in screen coordinates.
    Event(InputEvent),
}
