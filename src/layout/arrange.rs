//! Auto-arrange strategies. Each produces a full candidate position set
//! from the schema alone (never from current positions, which keeps
//! re-running a strategy idempotent), passes it through the collision
//! resolver and snaps the result to the grid.

use std::collections::{BTreeMap, VecDeque};

use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect, node_height, snap_point};
use crate::schema::SchemaModel;

use super::collide::{CandidateRect, resolve_collisions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Layered,
    Snowflake,
    Compact,
}

impl Strategy {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "layered" => Some(Self::Layered),
            "snowflake" => Some(Self::Snowflake),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::Layered => "layered",
            Self::Snowflake => "snowflake",
            Self::Compact => "compact",
        }
    }
}

/// Run one strategy over the whole schema and return grid-aligned
/// positions for every entity.
pub fn arrange(
    schema: &SchemaModel,
    strategy: Strategy,
    config: &LayoutConfig,
) -> BTreeMap<String, Point> {
    let mut candidates = match strategy {
        Strategy::Layered => layered_candidates(schema, config),
        Strategy::Snowflake => snowflake_candidates(schema, config),
        Strategy::Compact => compact_candidates(schema, config),
    };
    resolve_collisions(&mut candidates, config);
    candidates
        .into_iter()
        .map(|candidate| {
            let snapped = snap_point(
                Point::new(candidate.rect.x, candidate.rect.y),
                config.grid_size,
            );
            (candidate.id, snapped)
        })
        .collect()
}

fn entity_rect(schema: &SchemaModel, index: usize, x: f32, y: f32, config: &LayoutConfig) -> Rect {
    let entity = &schema.entities[index];
    Rect::new(x, y, config.node_width, node_height(entity.fields.len(), config))
}

/// Kahn-style dependency layering over the relationship graph. Nodes on
/// cycles never reach in-degree zero; they are appended as one trailing
/// layer in schema order so every entity gets placed.
fn layered_candidates(schema: &SchemaModel, config: &LayoutConfig) -> Vec<CandidateRect> {
    let count = schema.entities.len();
    let mut index_of: BTreeMap<&str, usize> = BTreeMap::new();
    for (idx, entity) in schema.entities.iter().enumerate() {
        index_of.insert(entity.name.as_str(), idx);
    }

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut in_degree: Vec<usize> = vec![0; count];
    for rel in &schema.relationships {
        let (Some(&from), Some(&to)) = (
            index_of.get(rel.from.entity.as_str()),
            index_of.get(rel.to.entity.as_str()),
        ) else {
            continue;
        };
        if from == to {
            continue;
        }
        successors[from].push(to);
        in_degree[to] += 1;
    }

    let mut layers: Vec<Vec<usize>> = Vec::new();
    let mut placed = vec![false; count];
    let mut frontier: VecDeque<usize> = (0..count).filter(|&idx| in_degree[idx] == 0).collect();
    while !frontier.is_empty() {
        let layer: Vec<usize> = frontier.drain(..).collect();
        let mut next: Vec<usize> = Vec::new();
        for &idx in &layer {
            placed[idx] = true;
            for &succ in &successors[idx] {
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    next.push(succ);
                }
            }
        }
        layers.push(layer);
        next.sort_unstable();
        frontier.extend(next);
    }

    let leftover: Vec<usize> = (0..count).filter(|&idx| !placed[idx]).collect();
    if !leftover.is_empty() {
        layers.push(leftover);
    }

    let mut candidates = Vec::with_capacity(count);
    for (layer_idx, layer) in layers.iter().enumerate() {
        let x = layer_idx as f32 * (config.node_width + config.node_spacing);
        let mut y = 0.0;
        for &idx in layer {
            let rect = entity_rect(schema, idx, x, y, config);
            y += rect.height + config.node_spacing;
            candidates.push(CandidateRect {
                id: schema.entities[idx].name.clone(),
                rect,
            });
        }
    }
    candidates
}

/// Radial placement: the highest-degree entity sits at the fixed canvas
/// center, everything else on a circle around it in rank order.
fn snowflake_candidates(schema: &SchemaModel, config: &LayoutConfig) -> Vec<CandidateRect> {
    let count = schema.entities.len();
    let degrees = schema.degrees();
    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by(|&a, &b| {
        let da = degrees.get(&schema.entities[a].name).copied().unwrap_or(0);
        let db = degrees.get(&schema.entities[b].name).copied().unwrap_or(0);
        db.cmp(&da).then(a.cmp(&b))
    });

    let center = Point::new(config.arrange_center_x, config.arrange_center_y);
    let mut candidates = Vec::with_capacity(count);
    for (rank, &idx) in order.iter().enumerate() {
        let entity = &schema.entities[idx];
        let height = node_height(entity.fields.len(), config);
        let node_center = if rank == 0 {
            center
        } else {
            let step = std::f32::consts::TAU / (count - 1) as f32;
            let angle = (rank - 1) as f32 * step;
            Point::new(
                center.x + config.snowflake_radius * angle.cos(),
                center.y + config.snowflake_radius * angle.sin(),
            )
        };
        candidates.push(CandidateRect {
            id: entity.name.clone(),
            rect: Rect::new(
                node_center.x - config.node_width / 2.0,
                node_center.y - height / 2.0,
                config.node_width,
                height,
            ),
        });
    }
    candidates
}

/// Row-major grid: `ceil(sqrt(n))` columns, each row as tall as its
/// tallest node plus spacing.
fn compact_candidates(schema: &SchemaModel, config: &LayoutConfig) -> Vec<CandidateRect> {
    let count = schema.entities.len();
    let columns = (count as f32).sqrt().ceil().max(1.0) as usize;
    let mut candidates = Vec::with_capacity(count);
    let mut y = 0.0;
    let mut row_height: f32 = 0.0;
    for (idx, entity) in schema.entities.iter().enumerate() {
        let column = idx % columns;
        if column == 0 && idx > 0 {
            y += row_height + config.node_spacing;
            row_height = 0.0;
        }
        let x = column as f32 * (config.node_width + config.node_spacing);
        let rect = entity_rect(schema, idx, x, y, config);
        row_height = row_height.max(rect.height);
        candidates.push(CandidateRect {
            id: entity.name.clone(),
            rect,
        });
    }
    candidates
}
