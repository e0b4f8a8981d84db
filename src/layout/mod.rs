//! Scene assembly: turns the schema model plus the live layout state into
//! the geometry handed to the rendering collaborator.

mod arrange;
mod collide;
mod groups;
mod routing;
mod sides;
mod views;

pub use arrange::{Strategy, arrange};
pub use collide::{CandidateRect, Resolution, resolve_collisions};
pub use groups::{group_anchor_y, group_rect};
pub use routing::{PathCommand, RoutedPath, route_edge};
pub use sides::Side;
pub use views::{is_visible, visible_tables};

use std::collections::BTreeMap;

use tracing::warn;

use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect, field_anchor_y, node_rect};
use crate::schema::{Cardinality, SchemaModel};
use crate::state::{LayoutState, ViewBox};
use crate::theme;

#[derive(Debug, Clone)]
pub struct NodeBox {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub group: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EdgePath {
    pub from: String,
    pub to: String,
    pub from_field: usize,
    pub to_field: usize,
    pub from_side: Side,
    pub to_side: Side,
    pub from_cardinality: Cardinality,
    pub to_cardinality: Cardinality,
    pub points: Vec<Point>,
    pub commands: Vec<PathCommand>,
    pub label_anchor: Point,
}

#[derive(Debug, Clone)]
pub struct GroupBox {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
    pub note: Option<String>,
    pub collapsed: bool,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub nodes: Vec<NodeBox>,
    pub edges: Vec<EdgePath>,
    pub groups: Vec<GroupBox>,
    pub viewport: ViewBox,
    pub show_grid: bool,
}

/// Bounding rectangles for every entity that has a committed position.
pub fn node_rects(
    schema: &SchemaModel,
    state: &LayoutState,
    config: &LayoutConfig,
) -> BTreeMap<String, Rect> {
    let mut rects = BTreeMap::new();
    for entity in &schema.entities {
        let Some(&position) = state.positions.get(&entity.name) else {
            continue;
        };
        rects.insert(
            entity.name.clone(),
            node_rect(position, entity.fields.len(), config),
        );
    }
    rects
}

/// Group membership lookup: an entity belongs to at most one group; the
/// first declaration wins.
fn member_groups(schema: &SchemaModel) -> BTreeMap<&str, &str> {
    let mut map: BTreeMap<&str, &str> = BTreeMap::new();
    for group in &schema.groups {
        for member in &group.members {
            map.entry(member.as_str()).or_insert(group.name.as_str());
        }
    }
    map
}

struct EndpointGeom {
    rect: Rect,
    anchor_y: f32,
    collapsed_group: Option<String>,
}

pub fn compute_scene(schema: &SchemaModel, state: &LayoutState, config: &LayoutConfig) -> Scene {
    let visible = visible_tables(schema, state);
    let rects = node_rects(schema, state, config);
    let membership = member_groups(schema);

    let mut group_boxes: BTreeMap<&str, Rect> = BTreeMap::new();
    let mut groups = Vec::new();
    for (idx, group) in schema.groups.iter().enumerate() {
        let member_rects: Vec<Rect> = group
            .members
            .iter()
            .filter_map(|member| rects.get(member.as_str()).copied())
            .collect();
        let Some(rect) = group_rect(&member_rects, config) else {
            // No resolvable members: hidden, not a degenerate box.
            continue;
        };
        group_boxes.insert(group.name.as_str(), rect);
        groups.push(GroupBox {
            name: group.name.clone(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            color: group
                .color
                .clone()
                .unwrap_or_else(|| theme::group_color(idx).to_string()),
            note: group.note.clone(),
            collapsed: state.collapsed.contains(&group.name),
        });
    }

    let collapsed_group_of = |entity: &str| -> Option<&str> {
        let group = membership.get(entity)?;
        state.collapsed.contains(*group).then_some(*group)
    };

    let mut nodes = Vec::new();
    for entity in &schema.entities {
        let Some(&rect) = rects.get(&entity.name) else {
            warn!(entity = %entity.name, "entity has no committed position; skipping node");
            continue;
        };
        if !is_visible(&visible, &entity.name) || collapsed_group_of(&entity.name).is_some() {
            continue;
        }
        nodes.push(NodeBox {
            id: entity.name.clone(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            group: membership.get(entity.name.as_str()).map(|s| s.to_string()),
        });
    }

    let mut edges = Vec::new();
    for rel in &schema.relationships {
        let (Some(from_entity), Some(to_entity)) = (
            schema.entity(&rel.from.entity),
            schema.entity(&rel.to.entity),
        ) else {
            // Transient dangling references are expected mid-edit.
            warn!(
                from = %rel.from.entity,
                to = %rel.to.entity,
                "relationship endpoint missing from schema; edge dropped"
            );
            continue;
        };
        if !is_visible(&visible, &from_entity.name) || !is_visible(&visible, &to_entity.name) {
            continue;
        }

        let from_field = rel
            .from
            .fields
            .first()
            .map(|name| from_entity.field_index(name))
            .unwrap_or(0);
        let to_field = rel
            .to
            .fields
            .first()
            .map(|name| to_entity.field_index(name))
            .unwrap_or(0);

        let Some(from_geom) = endpoint_geom(
            &from_entity.name,
            from_field,
            &rects,
            &group_boxes,
            &membership,
            state,
            config,
        ) else {
            continue;
        };
        let Some(to_geom) = endpoint_geom(
            &to_entity.name,
            to_field,
            &rects,
            &group_boxes,
            &membership,
            state,
            config,
        ) else {
            continue;
        };
        if let (Some(a), Some(b)) = (&from_geom.collapsed_group, &to_geom.collapsed_group)
            && a == b
        {
            // Both ends inside the same collapsed group: nothing to draw.
            continue;
        }

        let (from_side, to_side) = sides::select_sides(
            &from_geom.rect,
            &to_geom.rect,
            from_geom.anchor_y,
            to_geom.anchor_y,
            config,
        );
        let Some(routed) = route_edge(
            &from_geom.rect,
            &to_geom.rect,
            from_side,
            to_side,
            from_geom.anchor_y,
            to_geom.anchor_y,
            config,
        ) else {
            continue;
        };

        edges.push(EdgePath {
            from: from_entity.name.clone(),
            to: to_entity.name.clone(),
            from_field,
            to_field,
            from_side,
            to_side,
            from_cardinality: rel.from.cardinality,
            to_cardinality: rel.to.cardinality,
            points: routed.points,
            commands: routed.commands,
            label_anchor: routed.label_anchor,
        });
    }

    Scene {
        nodes,
        edges,
        groups,
        viewport: state.viewport,
        show_grid: state.show_grid,
    }
}

#[allow(clippy::too_many_arguments)]
fn endpoint_geom(
    entity: &str,
    field_index: usize,
    rects: &BTreeMap<String, Rect>,
    group_boxes: &BTreeMap<&str, Rect>,
    membership: &BTreeMap<&str, &str>,
    state: &LayoutState,
    config: &LayoutConfig,
) -> Option<EndpointGeom> {
    if let Some(&group) = membership.get(entity)
        && state.collapsed.contains(group)
    {
        let rect = *group_boxes.get(group)?;
        return Some(EndpointGeom {
            rect,
            anchor_y: group_anchor_y(&rect, config),
            collapsed_group: Some(group.to_string()),
        });
    }
    let rect = *rects.get(entity)?;
    Some(EndpointGeom {
        rect,
        anchor_y: field_anchor_y(&rect, field_index, config),
        collapsed_group: None,
    })
}
