//! JSON dump of a computed scene, for the CLI and for diffing layouts in
//! tests without a renderer.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::layout::{PathCommand, Scene};

#[derive(Debug, Serialize)]
pub struct SceneDump {
    pub view_box: [f32; 4],
    pub show_grid: bool,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub groups: Vec<GroupDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub group: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub from_field: usize,
    pub to_field: usize,
    pub from_side: String,
    pub to_side: String,
    pub from_cardinality: String,
    pub to_cardinality: String,
    pub points: Vec<[f32; 2]>,
    pub commands: Vec<PathCommand>,
    pub label_anchor: [f32; 2],
}

#[derive(Debug, Serialize)]
pub struct GroupDump {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
    pub note: Option<String>,
    pub collapsed: bool,
}

impl SceneDump {
    pub fn from_scene(scene: &Scene) -> Self {
        let nodes = scene
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                group: node.group.clone(),
            })
            .collect();

        let edges = scene
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                from_field: edge.from_field,
                to_field: edge.to_field,
                from_side: edge.from_side.token().to_string(),
                to_side: edge.to_side.token().to_string(),
                from_cardinality: edge.from_cardinality.token().to_string(),
                to_cardinality: edge.to_cardinality.token().to_string(),
                points: edge.points.iter().map(|p| [p.x, p.y]).collect(),
                commands: edge.commands.clone(),
                label_anchor: [edge.label_anchor.x, edge.label_anchor.y],
            })
            .collect();

        let groups = scene
            .groups
            .iter()
            .map(|group| GroupDump {
                name: group.name.clone(),
                x: group.x,
                y: group.y,
                width: group.width,
                height: group.height,
                color: group.color.clone(),
                note: group.note.clone(),
                collapsed: group.collapsed,
            })
            .collect();

        SceneDump {
            view_box: [
                scene.viewport.x,
                scene.viewport.y,
                scene.viewport.width,
                scene.viewport.height,
            ],
            show_grid: scene.show_grid,
            nodes,
            edges,
            groups,
        }
    }
}

pub fn scene_dump_string(scene: &Scene) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&SceneDump::from_scene(scene))?)
}

pub fn write_scene_dump(path: &Path, scene: &Scene) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &SceneDump::from_scene(scene))?;
    Ok(())
}
