use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use erd_canvas::config::{EngineConfig, LayoutConfig};
use erd_canvas::layout::{Strategy, arrange, compute_scene};
use erd_canvas::schema::SchemaModel;
use erd_canvas::state::LayoutState;

/// Synthetic star-of-chains schema: one hub, `chains` chains of `depth`
/// entities each, every entity referencing its predecessor, plus a group
/// per chain.
fn synthetic_schema(chains: usize, depth: usize) -> SchemaModel {
    let mut entities = vec![serde_json::json!({
        "name": "hub",
        "fields": [{ "name": "id", "type": "int", "pk": true }]
    })];
    let mut relationships = Vec::new();
    let mut groups = Vec::new();
    for chain in 0..chains {
        let mut members = Vec::new();
        let mut prev = "hub".to_string();
        for step in 0..depth {
            let name = format!("t{chain}_{step}");
            entities.push(serde_json::json!({
                "name": name,
                "fields": [
                    { "name": "id", "type": "int", "pk": true },
                    { "name": "parent_id", "type": "int", "notNull": true },
                    { "name": "payload", "type": "text" }
                ]
            }));
            relationships.push(serde_json::json!({
                "from": { "entity": name, "fields": ["parent_id"], "cardinality": "many" },
                "to": { "entity": prev, "fields": ["id"], "cardinality": "one" }
            }));
            members.push(name.clone());
            prev = name;
        }
        groups.push(serde_json::json!({
            "name": format!("chain{chain}"),
            "members": members
        }));
    }
    SchemaModel::from_value(serde_json::json!({
        "entities": entities,
        "relationships": relationships,
        "groups": groups
    }))
    .expect("synthetic schema must parse")
}

fn bench_arrange(c: &mut Criterion) {
    let mut group = c.benchmark_group("arrange");
    let config = LayoutConfig::default();
    for (chains, depth) in [(4usize, 5usize), (8, 10), (16, 15)] {
        let schema = synthetic_schema(chains, depth);
        let name = format!("{}_entities", schema.entities.len());
        for strategy in [Strategy::Layered, Strategy::Snowflake, Strategy::Compact] {
            group.bench_with_input(
                BenchmarkId::new(strategy.token(), &name),
                &schema,
                |b, schema| {
                    b.iter(|| {
                        let positions = arrange(black_box(schema), strategy, &config);
                        black_box(positions.len());
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_scene(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_scene");
    let engine_config = EngineConfig::default();
    let config = LayoutConfig::default();
    for (chains, depth) in [(4usize, 5usize), (8, 10), (16, 15)] {
        let schema = synthetic_schema(chains, depth);
        let mut state = LayoutState::new(&engine_config);
        state.positions = arrange(&schema, Strategy::Layered, &config);
        let name = format!("{}_entities", schema.entities.len());
        group.bench_with_input(
            BenchmarkId::from_parameter(&name),
            &(schema, state),
            |b, (schema, state)| {
                b.iter(|| {
                    let scene = compute_scene(black_box(schema), state, &config);
                    black_box(scene.edges.len());
                });
            },
        );
    }
    group.finish();
}

fn bench_scene_collapsed(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_scene_collapsed");
    let engine_config = EngineConfig::default();
    let config = LayoutConfig::default();
    let schema = synthetic_schema(8, 10);
    let mut state = LayoutState::new(&engine_config);
    state.positions = arrange(&schema, Strategy::Layered, &config);
    for group_def in &schema.groups {
        state.collapsed.insert(group_def.name.clone());
    }
    group.bench_function("all_groups_collapsed", |b| {
        b.iter(|| {
            let scene = compute_scene(black_box(&schema), &state, &config);
            black_box(scene.groups.len());
        });
    });
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_arrange, bench_scene, bench_scene_collapsed
);
criterion_main!(benches);
