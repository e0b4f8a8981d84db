//! Synchronous command dispatcher.
//!
//! Every user gesture arrives as a `Command` and runs to completion inside
//! `apply`; there is no background computation. The only asynchronous
//! behavior is the debounced save, driven by the caller polling with a
//! timestamp, so the engine stays single-threaded and fully testable
//! without a UI toolkit.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::geometry::{Point, Rect, snap_point};
use crate::layout::{CandidateRect, Scene, Strategy, arrange, compute_scene, node_rects, resolve_collisions};
use crate::schema::SchemaModel;
use crate::state::{LayoutState, LayoutStore, SaveDebouncer, Snapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    DragNode { id: String, dx: f32, dy: f32 },
    /// Translate every member of a group by the same delta; the only
    /// operation that moves multiple nodes atomically.
    DragGroup { name: String, dx: f32, dy: f32 },
    Pan { dx: f32, dy: f32 },
    /// Scale the viewport about a focus point in canvas coordinates.
    Zoom { factor: f32, cx: f32, cy: f32 },
    Arrange { strategy: Strategy },
    ToggleGroup { name: String },
    SetView { id: Option<String> },
    CreateView { id: String, name: String, tables: Vec<String> },
    EditView { id: String, tables: Vec<String> },
    DeleteView { id: String },
    SetGridVisible { on: bool },
}

pub struct Engine<S: LayoutStore> {
    doc_id: String,
    config: EngineConfig,
    schema: SchemaModel,
    state: LayoutState,
    store: S,
    debouncer: SaveDebouncer,
    scene: Scene,
}

impl<S: LayoutStore> Engine<S> {
    /// Load the persisted snapshot for a document (missing or unreadable
    /// snapshots fall back to empty), place any entities without a stored
    /// position, and build the first scene.
    pub fn open(
        doc_id: impl Into<String>,
        schema: SchemaModel,
        mut store: S,
        config: EngineConfig,
        now: Instant,
    ) -> Self {
        let doc_id = doc_id.into();
        let snapshot = match store.load(&doc_id) {
            Ok(Some(contents)) => match serde_json::from_str::<serde_json::Value>(&contents) {
                Ok(value) => Snapshot::from_value(&value, &config),
                Err(err) => {
                    warn!(%doc_id, %err, "layout snapshot unreadable, starting empty");
                    Snapshot::empty(&config)
                }
            },
            Ok(None) => Snapshot::empty(&config),
            Err(err) => {
                warn!(%doc_id, %err, "layout load failed, starting empty");
                Snapshot::empty(&config)
            }
        };
        let mut state = LayoutState::from_snapshot(snapshot, &config);
        let placed = place_missing(&schema, &mut state, &config);
        let scene = compute_scene(&schema, &state, &config.layout);
        let mut debouncer = SaveDebouncer::new(Duration::from_millis(config.save_quiet_ms));
        if placed {
            debouncer.note_mutation(now);
        }
        Self {
            doc_id,
            config,
            schema,
            state,
            store,
            debouncer,
            scene,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn state(&self) -> &LayoutState {
        &self.state
    }

    pub fn schema(&self) -> &SchemaModel {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the schema model on a document change. Positions of removed
    /// entities are retained so re-introducing an entity restores its
    /// place; new entities are placed below the occupied canvas.
    pub fn set_schema(&mut self, schema: SchemaModel, now: Instant) {
        self.schema = schema;
        place_missing(&self.schema, &mut self.state, &self.config);
        self.touch(now);
    }

    pub fn apply(&mut self, command: Command, now: Instant) {
        match command {
            Command::DragNode { id, dx, dy } => {
                let grid = self.config.layout.grid_size;
                match self.state.positions.get_mut(&id) {
                    Some(position) => {
                        *position =
                            snap_point(Point::new(position.x + dx, position.y + dy), grid);
                    }
                    None => {
                        warn!(node = %id, "drag on unknown node ignored");
                        return;
                    }
                }
            }
            Command::DragGroup { name, dx, dy } => {
                let Some(group) = self.schema.groups.iter().find(|g| g.name == name) else {
                    warn!(group = %name, "drag on unknown group ignored");
                    return;
                };
                let grid = self.config.layout.grid_size;
                for member in group.members.clone() {
                    if let Some(position) = self.state.positions.get_mut(&member) {
                        *position =
                            snap_point(Point::new(position.x + dx, position.y + dy), grid);
                    }
                }
            }
            Command::Pan { dx, dy } => {
                self.state.viewport.x += dx;
                self.state.viewport.y += dy;
            }
            Command::Zoom { factor, cx, cy } => {
                if !(factor.is_finite() && factor > 0.0) {
                    warn!(factor, "non-positive zoom factor ignored");
                    return;
                }
                let viewport = &mut self.state.viewport;
                let scale = self.config.viewport.width / viewport.width;
                let clamped = (scale * factor)
                    .clamp(self.config.viewport.zoom_min, self.config.viewport.zoom_max);
                let effective = clamped / scale;
                // Keep the focus point fixed in canvas space.
                viewport.x = cx - (cx - viewport.x) / effective;
                viewport.y = cy - (cy - viewport.y) / effective;
                viewport.width /= effective;
                viewport.height /= effective;
            }
            Command::Arrange { strategy } => {
                debug!(strategy = strategy.token(), "auto-arrange");
                let positions = arrange(&self.schema, strategy, &self.config.layout);
                self.state.positions.extend(positions);
            }
            Command::ToggleGroup { name } => {
                if !self.schema.groups.iter().any(|g| g.name == name) {
                    warn!(group = %name, "toggle on unknown group ignored");
                    return;
                }
                if !self.state.collapsed.remove(&name) {
                    self.state.collapsed.insert(name);
                }
            }
            Command::SetView { id } => match id {
                None => self.state.active_view = None,
                Some(id) => {
                    if self.state.views.iter().any(|view| view.id == id) {
                        self.state.active_view = Some(id);
                    } else {
                        warn!(view = %id, "unknown view, showing all");
                        self.state.active_view = None;
                    }
                }
            },
            Command::CreateView { id, name, tables } => {
                if self.state.views.iter().any(|view| view.id == id) {
                    warn!(view = %id, "duplicate view id ignored");
                    return;
                }
                self.state.views.push(crate::state::ViewDef { id, name, tables });
            }
            Command::EditView { id, tables } => {
                match self.state.views.iter_mut().find(|view| view.id == id) {
                    Some(view) => view.tables = tables,
                    None => {
                        warn!(view = %id, "edit on unknown view ignored");
                        return;
                    }
                }
            }
            Command::DeleteView { id } => {
                self.state.views.retain(|view| view.id != id);
                if self.state.active_view.as_deref() == Some(id.as_str()) {
                    self.state.active_view = None;
                }
            }
            Command::SetGridVisible { on } => {
                self.state.show_grid = on;
            }
        }
        self.touch(now);
    }

    /// Fire the pending save once its quiet period has elapsed. Returns
    /// true when a save was written.
    pub fn poll_save(&mut self, now: Instant) -> bool {
        if !self.debouncer.take_due(now) {
            return false;
        }
        self.do_save();
        true
    }

    /// Force-save regardless of the debounce schedule (document close).
    pub fn flush(&mut self) {
        self.debouncer.clear();
        self.do_save();
    }

    pub fn save_pending(&self) -> bool {
        self.debouncer.pending()
    }

    fn do_save(&mut self) {
        let snapshot = self.state.snapshot();
        if let Err(err) = self.store.save(&self.doc_id, &snapshot) {
            // Persistence failures never block interaction.
            warn!(doc_id = %self.doc_id, %err, "layout save failed");
        } else {
            debug!(doc_id = %self.doc_id, "layout saved");
        }
    }

    fn touch(&mut self, now: Instant) {
        self.debouncer.note_mutation(now);
        self.scene = compute_scene(&self.schema, &self.state, &self.config.layout);
    }
}

/// Give every entity without a stored position one. An entirely unplaced
/// document gets a full layered arrange; otherwise the newcomers are laid
/// out in compact rows below the occupied canvas and the whole set is run
/// through the collision resolver.
fn place_missing(schema: &SchemaModel, state: &mut LayoutState, config: &EngineConfig) -> bool {
    let layout = &config.layout;
    let missing: Vec<&crate::schema::Entity> = schema
        .entities
        .iter()
        .filter(|entity| !state.positions.contains_key(&entity.name))
        .collect();
    if missing.is_empty() {
        return false;
    }

    let placed = node_rects(schema, state, layout);
    if placed.is_empty() {
        state
            .positions
            .extend(arrange(schema, Strategy::Layered, layout));
        return true;
    }

    let bounds = placed
        .values()
        .copied()
        .reduce(|acc, rect| acc.union(&rect))
        .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));

    let mut candidates: Vec<CandidateRect> = placed
        .iter()
        .map(|(id, rect)| CandidateRect {
            id: id.clone(),
            rect: *rect,
        })
        .collect();

    let columns = (missing.len() as f32).sqrt().ceil().max(1.0) as usize;
    let mut y = bounds.bottom() + layout.node_spacing;
    let mut row_height: f32 = 0.0;
    for (idx, entity) in missing.iter().enumerate() {
        let column = idx % columns;
        if column == 0 && idx > 0 {
            y += row_height + layout.node_spacing;
            row_height = 0.0;
        }
        let x = bounds.x + column as f32 * (layout.node_width + layout.node_spacing);
        let rect = crate::geometry::node_rect(
            Point::new(x, y),
            entity.fields.len(),
            layout,
        );
        row_height = row_height.max(rect.height);
        candidates.push(CandidateRect {
            id: entity.name.clone(),
            rect,
        });
    }

    resolve_collisions(&mut candidates, layout);
    for candidate in candidates {
        state.positions.insert(
            candidate.id,
            snap_point(
                Point::new(candidate.rect.x, candidate.rect.y),
                layout.grid_size,
            ),
        );
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryLayoutStore;
    use std::time::Duration;

    fn schema() -> SchemaModel {
        SchemaModel::from_json(
            r#"{
            "entities": [
                { "name": "users", "fields": [{ "name": "id", "type": "int" }] },
                { "name": "posts", "fields": [{ "name": "id", "type": "int" }] }
            ],
            "relationships": [
                { "from": { "entity": "posts", "cardinality": "many" },
                  "to": { "entity": "users", "cardinality": "one" } }
            ],
            "groups": [
                { "name": "all", "members": ["users", "posts"] }
            ]
        }"#,
        )
        .unwrap()
    }

    fn engine() -> Engine<MemoryLayoutStore> {
        Engine::open(
            "doc",
            schema(),
            MemoryLayoutStore::default(),
            EngineConfig::default(),
            Instant::now(),
        )
    }

    #[test]
    fn open_arranges_unplaced_document() {
        let engine = engine();
        assert_eq!(engine.state().positions.len(), 2);
        let grid = engine.config.layout.grid_size;
        for position in engine.state().positions.values() {
            assert_eq!(position.x % grid, 0.0);
            assert_eq!(position.y % grid, 0.0);
        }
        assert_eq!(engine.scene().nodes.len(), 2);
        assert_eq!(engine.scene().edges.len(), 1);
    }

    #[test]
    fn drag_commits_snapped_positions() {
        let mut engine = engine();
        let now = Instant::now();
        let before = engine.state().positions["users"];
        engine.apply(
            Command::DragNode {
                id: "users".into(),
                dx: 33.0,
                dy: -7.0,
            },
            now,
        );
        let after = engine.state().positions["users"];
        assert_eq!(after.x, before.x + 40.0);
        assert_eq!(after.y, before.y);
    }

    #[test]
    fn debounced_save_coalesces_drags() {
        let mut engine = engine();
        let start = Instant::now();
        engine.poll_save(start + Duration::from_millis(300));
        let saves_after_open = engine.store().entries.len();

        engine.apply(
            Command::Pan { dx: 10.0, dy: 0.0 },
            start + Duration::from_millis(400),
        );
        engine.apply(
            Command::Pan { dx: 10.0, dy: 0.0 },
            start + Duration::from_millis(500),
        );
        // Still inside the quiet period of the second pan.
        assert!(!engine.poll_save(start + Duration::from_millis(700)));
        assert!(engine.poll_save(start + Duration::from_millis(800)));
        assert!(!engine.poll_save(start + Duration::from_millis(900)));

        let saved = &engine.store().entries["doc"];
        let value: serde_json::Value = serde_json::from_str(saved).unwrap();
        // The save reflects the latest committed state, both pans applied.
        assert_eq!(value["viewBox"]["x"].as_f64().unwrap(), 20.0);
        assert!(engine.store().entries.len() >= saves_after_open);
    }

    #[test]
    fn group_drag_moves_members_together() {
        let mut engine = engine();
        let now = Instant::now();
        let users = engine.state().positions["users"];
        let posts = engine.state().positions["posts"];
        engine.apply(
            Command::DragGroup {
                name: "all".into(),
                dx: 100.0,
                dy: 60.0,
            },
            now,
        );
        assert_eq!(engine.state().positions["users"].x, users.x + 100.0);
        assert_eq!(engine.state().positions["posts"].x, posts.x + 100.0);
        assert_eq!(engine.state().positions["users"].y, users.y + 60.0);
        assert_eq!(engine.state().positions["posts"].y, posts.y + 60.0);
    }

    #[test]
    fn zoom_keeps_focus_point_fixed() {
        let mut engine = engine();
        let now = Instant::now();
        let before = engine.state().viewport;
        let (cx, cy) = (300.0, 200.0);
        engine.apply(
            Command::Zoom {
                factor: 2.0,
                cx,
                cy,
            },
            now,
        );
        let after = engine.state().viewport;
        assert_eq!(after.width, before.width / 2.0);
        // Focus point keeps its relative offset inside the viewport.
        let rel_before = (cx - before.x) / before.width;
        let rel_after = (cx - after.x) / after.width;
        assert!((rel_before - rel_after).abs() < 1e-4);
        assert!(((cy - after.y) / after.height - (cy - before.y) / before.height).abs() < 1e-4);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut engine = engine();
        let now = Instant::now();
        engine.apply(
            Command::Zoom {
                factor: 1000.0,
                cx: 0.0,
                cy: 0.0,
            },
            now,
        );
        let max = engine.config.viewport.zoom_max;
        let width = engine.state().viewport.width;
        assert_eq!(width, engine.config.viewport.width / max);
    }

    #[test]
    fn toggle_group_collapses_and_expands() {
        let mut engine = engine();
        let now = Instant::now();
        engine.apply(Command::ToggleGroup { name: "all".into() }, now);
        assert!(engine.state().collapsed.contains("all"));
        assert!(engine.scene().nodes.is_empty());
        engine.apply(Command::ToggleGroup { name: "all".into() }, now);
        assert!(!engine.state().collapsed.contains("all"));
        assert_eq!(engine.scene().nodes.len(), 2);
    }

    #[test]
    fn view_lifecycle() {
        let mut engine = engine();
        let now = Instant::now();
        engine.apply(
            Command::CreateView {
                id: "v".into(),
                name: "Users only".into(),
                tables: vec!["users".into()],
            },
            now,
        );
        engine.apply(Command::SetView { id: Some("v".into()) }, now);
        assert_eq!(engine.scene().nodes.len(), 1);
        assert!(engine.scene().edges.is_empty());

        engine.apply(
            Command::EditView {
                id: "v".into(),
                tables: vec!["users".into(), "posts".into()],
            },
            now,
        );
        assert_eq!(engine.scene().nodes.len(), 2);

        engine.apply(Command::DeleteView { id: "v".into() }, now);
        assert!(engine.state().active_view.is_none());
        assert_eq!(engine.scene().nodes.len(), 2);
    }

    #[test]
    fn set_schema_retains_stale_positions_and_places_newcomers() {
        let mut engine = engine();
        let now = Instant::now();
        let users_before = engine.state().positions["users"];

        let next = SchemaModel::from_json(
            r#"{
            "entities": [
                { "name": "users", "fields": [{ "name": "id", "type": "int" }] },
                { "name": "comments", "fields": [{ "name": "id", "type": "int" }] }
            ]
        }"#,
        )
        .unwrap();
        engine.set_schema(next, now);

        // users kept its spot, posts' position is retained for
        // re-introduction, comments got placed.
        assert_eq!(engine.state().positions["users"], users_before);
        assert!(engine.state().positions.contains_key("posts"));
        assert!(engine.state().positions.contains_key("comments"));
        // Only current entities appear in the scene.
        assert_eq!(engine.scene().nodes.len(), 2);
    }

    #[test]
    fn arrange_command_is_idempotent_without_moves() {
        let mut engine = engine();
        let now = Instant::now();
        engine.apply(
            Command::Arrange {
                strategy: Strategy::Compact,
            },
            now,
        );
        let first = engine.state().positions.clone();
        engine.apply(
            Command::Arrange {
                strategy: Strategy::Compact,
            },
            now,
        );
        assert_eq!(engine.state().positions, first);
    }
}
