//! Live layout state and its persisted snapshot.
//!
//! The engine owns one `LayoutState` value; persistence goes through the
//! `LayoutStore` collaborator as an opaque JSON snapshot keyed by document
//! identity. Rehydration is tolerant: every malformed or missing snapshot
//! field is defaulted individually instead of rejecting the whole file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::geometry::{Point, snap_point};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewDef {
    pub id: String,
    pub name: String,
    pub tables: Vec<String>,
}

/// Runtime layout state. Collapse flags are runtime-only; the snapshot
/// format does not carry them.
#[derive(Debug, Clone)]
pub struct LayoutState {
    pub positions: BTreeMap<String, Point>,
    pub viewport: ViewBox,
    pub views: Vec<ViewDef>,
    pub active_view: Option<String>,
    pub show_grid: bool,
    pub collapsed: BTreeSet<String>,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl LayoutState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            positions: BTreeMap::new(),
            viewport: ViewBox {
                x: 0.0,
                y: 0.0,
                width: config.viewport.width,
                height: config.viewport.height,
            },
            views: Vec::new(),
            active_view: None,
            show_grid: true,
            collapsed: BTreeSet::new(),
        }
    }

    pub fn from_snapshot(snapshot: Snapshot, config: &EngineConfig) -> Self {
        let mut state = Self::new(config);
        state.positions = snapshot.positions;
        state.viewport = snapshot.view_box;
        state.views = snapshot.views;
        state.active_view = snapshot.active_view_id;
        state
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            positions: self.positions.clone(),
            view_box: self.viewport,
            views: self.views.clone(),
            active_view_id: self.active_view.clone(),
        }
    }
}

/// The persisted layout snapshot, shaped exactly like the stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub positions: BTreeMap<String, Point>,
    #[serde(rename = "viewBox")]
    pub view_box: ViewBox,
    pub views: Vec<ViewDef>,
    #[serde(rename = "activeViewId", skip_serializing_if = "Option::is_none")]
    pub active_view_id: Option<String>,
}

impl Snapshot {
    pub fn empty(config: &EngineConfig) -> Self {
        Self {
            positions: BTreeMap::new(),
            view_box: ViewBox {
                x: 0.0,
                y: 0.0,
                width: config.viewport.width,
                height: config.viewport.height,
            },
            views: Vec::new(),
            active_view_id: None,
        }
    }

    /// Tolerant rehydrate: each field of the stored value is validated on
    /// its own and falls back to the default when malformed.
    pub fn from_value(value: &Value, config: &EngineConfig) -> Self {
        let mut snapshot = Self::empty(config);

        if let Some(positions) = value.get("positions").and_then(Value::as_object) {
            for (id, entry) in positions {
                let (Some(x), Some(y)) = (
                    entry.get("x").and_then(Value::as_f64),
                    entry.get("y").and_then(Value::as_f64),
                ) else {
                    continue;
                };
                // Committed positions are grid-aligned; a hand-edited or
                // older snapshot may not be.
                snapshot.positions.insert(
                    id.clone(),
                    snap_point(
                        Point::new(x as f32, y as f32),
                        config.layout.grid_size,
                    ),
                );
            }
        }

        if let Some(view_box) = value.get("viewBox") {
            if let Some(x) = view_box.get("x").and_then(Value::as_f64) {
                snapshot.view_box.x = x as f32;
            }
            if let Some(y) = view_box.get("y").and_then(Value::as_f64) {
                snapshot.view_box.y = y as f32;
            }
            if let Some(width) = view_box.get("width").and_then(Value::as_f64)
                && width > 0.0
            {
                snapshot.view_box.width = width as f32;
            }
            if let Some(height) = view_box.get("height").and_then(Value::as_f64)
                && height > 0.0
            {
                snapshot.view_box.height = height as f32;
            }
        }

        if let Some(views) = value.get("views").and_then(Value::as_array) {
            for entry in views {
                let Some(id) = entry.get("id").and_then(Value::as_str) else {
                    continue;
                };
                let name = entry
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(id)
                    .to_string();
                let tables = entry
                    .get("tables")
                    .and_then(Value::as_array)
                    .map(|tables| {
                        tables
                            .iter()
                            .filter_map(Value::as_str)
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default();
                snapshot.views.push(ViewDef {
                    id: id.to_string(),
                    name,
                    tables,
                });
            }
        }

        snapshot.active_view_id = value
            .get("activeViewId")
            .and_then(Value::as_str)
            .map(String::from);

        snapshot
    }
}

/// Persistence collaborator. The engine never touches the filesystem
/// directly; it hands snapshots to a store keyed by document identity.
pub trait LayoutStore {
    fn load(&mut self, doc_id: &str) -> Result<Option<String>, EngineError>;
    fn save(&mut self, doc_id: &str, snapshot: &Snapshot) -> Result<(), EngineError>;
}

/// Snapshots as `<doc_id>.layout.json` files under one directory.
#[derive(Debug, Clone)]
pub struct FileLayoutStore {
    dir: PathBuf,
}

impl FileLayoutStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, doc_id: &str) -> PathBuf {
        self.dir.join(format!("{doc_id}.layout.json"))
    }
}

impl LayoutStore for FileLayoutStore {
    fn load(&mut self, doc_id: &str) -> Result<Option<String>, EngineError> {
        match std::fs::read_to_string(self.path(doc_id)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, doc_id: &str, snapshot: &Snapshot) -> Result<(), EngineError> {
        std::fs::create_dir_all(&self.dir)?;
        let contents = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(self.path(doc_id), contents)?;
        Ok(())
    }
}

/// In-memory store, used by the CLI (single-shot runs) and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryLayoutStore {
    pub entries: BTreeMap<String, String>,
}

impl LayoutStore for MemoryLayoutStore {
    fn load(&mut self, doc_id: &str) -> Result<Option<String>, EngineError> {
        Ok(self.entries.get(doc_id).cloned())
    }

    fn save(&mut self, doc_id: &str, snapshot: &Snapshot) -> Result<(), EngineError> {
        self.entries
            .insert(doc_id.to_string(), serde_json::to_string_pretty(snapshot)?);
        Ok(())
    }
}

/// Debounced save schedule: every mutation pushes the deadline out by the
/// quiet period, so a burst of drags coalesces into a single write that
/// reflects the latest committed state.
#[derive(Debug)]
pub struct SaveDebouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl SaveDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn note_mutation(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once when the quiet period has elapsed; clears the
    /// pending deadline.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }
}
