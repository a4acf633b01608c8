//! RackPlan Application
//!
//! Headless shell around the layout engine: loads configuration, replays a
//! scripted input session and writes the resulting layout, optionally
//! reading and storing named layouts.

mod app;
mod cli;
mod script;
mod shortcuts;

pub use app::{App, AppConfig, AppError, ReplaySummary, load_engine_config, open_storage};
pub use cli::{Cli, run};
pub use script::{Script, ScriptStep};
pub use shortcuts::{Shortcut, ShortcutRegistry};
