//! Headless application: drives the engine from a script.

use crate::script::{Script, ScriptStep};
use crate::shortcuts::ShortcutRegistry;
use kurbo::Point;
use rackplan_core::catalog::{self, InfrastructureKind};
use rackplan_core::{
    ConfigError, DragOutcome, Engine, EngineConfig, EntityRef, EventOutcome, FileStorage, InputEvent, LayoutDocument,
    ModelError, PlacementError, RenderSnapshot, Storage, StorageError,
};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid script: {0}")]
    Script(serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Unknown shortcut: {0}")]
    UnknownShortcut(String),
    #[error("Failed to write layout: {0}")]
    Output(serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Invalid stored layout: {0}")]
    Layout(#[from] ModelError),
}

/// Where the app reads its inputs and writes its result.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub script: PathBuf,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// Layout store directory. The platform data directory when unset.
    pub store_dir: Option<PathBuf>,
    /// Stored layout to start from.
    pub load: Option<String>,
    /// Name to store the resulting layout under.
    pub save: Option<String>,
}

/// Counters describing a finished replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: usize,
    pub placed: usize,
    pub rejected: usize,
    pub cancelled: usize,
    /// Render snapshots emitted by the engine.
    pub frames: usize,
}

/// Main application struct.
pub struct App {
    engine: Engine,
    frames: Rc<Cell<usize>>,
}

impl App {
    /// Create an app whose confirmations are all answered with `confirm`.
    pub fn new(config: EngineConfig, confirm: bool) -> Self {
        let frames = Rc::new(Cell::new(0));
        let counter = Rc::clone(&frames);
        let engine = Engine::new(
            config,
            move |message: &str| {
                log::info!("Confirm \"{}\" -> {}", message, confirm);
                confirm
            },
            move |_: &RenderSnapshot| counter.set(counter.get() + 1),
        );
        Self { engine, frames }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn document(&self) -> LayoutDocument {
        self.engine.document()
    }

    /// Start from a stored layout. The load itself is not undoable.
    pub fn open(&mut self, storage: &dyn Storage, name: &str) -> Result<(), AppError> {
        let document = storage.load(name)?;
        self.engine.open_document(document)?;
        log::info!("Opened layout {}", name);
        Ok(())
    }

    /// Store the current layout under `name`.
    pub fn save(&self, storage: &dyn Storage, name: &str) -> Result<(), AppError> {
        storage.save(name, &self.document())?;
        log::info!("Saved layout {}", name);
        Ok(())
    }

    /// Replay every step of `script`.
    pub fn replay(&mut self, script: &Script) -> Result<ReplaySummary, AppError> {
        let mut summary = ReplaySummary::default();
        for step in &script.steps {
            summary.steps += 1;
            match step {
                ScriptStep::Shortcut { shortcut } => {
                    let key = ShortcutRegistry::resolve(shortcut)
                        .ok_or_else(|| AppError::UnknownShortcut(shortcut.clone()))?;
                    self.engine.handle_event(InputEvent::Key { key });
                }
                ScriptStep::Place { place, at } => match self.place(place, *at) {
                    Ok(_) => summary.placed += 1,
                    Err(_) => summary.rejected += 1,
                },
                ScriptStep::Event(event) => match self.engine.handle_event(event.clone()) {
                    EventOutcome::Drag(DragOutcome::Dropped(_)) => summary.placed += 1,
                    EventOutcome::Drag(DragOutcome::Rejected(_)) => summary.rejected += 1,
                    EventOutcome::Drag(DragOutcome::Cancelled) => summary.cancelled += 1,
                    EventOutcome::Changed | EventOutcome::Ignored => {}
                },
            }
        }
        summary.frames = self.frames.get();
        Ok(summary)
    }

    /// Place a catalog item by tag at a world point.
    fn place(&mut self, tag: &str, at: Point) -> Result<EntityRef, PlacementError> {
        if tag.parse::<InfrastructureKind>().is_ok() {
            return self.engine.place_infrastructure(tag, at);
        }
        let descriptor = catalog::lookup(tag).ok_or_else(|| PlacementError::UnknownType(tag.to_string()))?;
        self.engine.place_device(&descriptor, at)
    }

    /// Load the config, replay the script and write the resulting layout.
    /// Returns the layout JSON.
    pub fn run(config: &AppConfig) -> Result<String, AppError> {
        let engine_config = load_engine_config(config.config.as_deref())?;
        let script_json = std::fs::read_to_string(&config.script)?;
        let script = Script::from_json(&script_json).map_err(AppError::Script)?;

        let storage = if config.load.is_some() || config.save.is_some() {
            Some(open_storage(config.store_dir.as_deref())?)
        } else {
            None
        };

        let mut app = App::new(engine_config, script.confirm);
        if let (Some(storage), Some(name)) = (&storage, &config.load) {
            app.open(storage, name)?;
        }
        let summary = app.replay(&script)?;
        log::info!(
            "Replayed {} steps: {} placed, {} rejected, {} cancelled, {} frames",
            summary.steps,
            summary.placed,
            summary.rejected,
            summary.cancelled,
            summary.frames
        );

        if let (Some(storage), Some(name)) = (&storage, &config.save) {
            app.save(storage, name)?;
        }

        let json = app.document().to_json().map_err(AppError::Output)?;
        if let Some(out) = &config.output {
            std::fs::write(out, &json)?;
            log::info!("Layout written to {}", out.display());
        }
        Ok(json)
    }
}

/// Open the layout store in `dir`, or in the platform data directory.
pub fn open_storage(dir: Option<&Path>) -> Result<FileStorage, AppError> {
    let storage = match dir {
        Some(dir) => FileStorage::new(dir.to_path_buf())?,
        None => FileStorage::default_location()?,
    };
    log::debug!("Layout store at {}", storage.base_path().display());
    Ok(storage)
}

/// Load an engine config, falling back to defaults when the file is missing.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig, AppError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    match EngineConfig::load(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("Config {} not found, using defaults", path.display());
            Ok(EngineConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}
