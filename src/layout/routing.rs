use serde::Serialize;

use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect, snap};

use super::sides::Side;

/// Two anchor points closer than this are treated as coincident and the
/// edge is skipped rather than routed.
const COINCIDENT_EPS: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PathCommand {
    MoveTo { to: Point },
    LineTo { to: Point },
    QuadTo { ctrl: Point, to: Point },
}

#[derive(Debug, Clone)]
pub struct RoutedPath {
    /// Right-angled polyline through all turns, endpoints first and last.
    pub points: Vec<Point>,
    /// Render commands with rounded corners.
    pub commands: Vec<PathCommand>,
    /// Anchor for the cardinality label: polyline midpoint by arc length.
    pub label_anchor: Point,
}

/// Route one edge orthogonally between two attachment points.
///
/// A straight stub leaves each face, a grid-snapped horizontal waist line
/// connects the stubs, and if the waist or either vertical run would pass
/// through one of the two endpoint boxes the waist is moved just past the
/// obstructing box. Only the two endpoint nodes are considered as
/// obstacles; rerouting around unrelated nodes is out of scope.
pub fn route_edge(
    from_rect: &Rect,
    to_rect: &Rect,
    from_side: Side,
    to_side: Side,
    from_y: f32,
    to_y: f32,
    config: &LayoutConfig,
) -> Option<RoutedPath> {
    let start = Point::new(from_side.attach_x(from_rect), from_y);
    let end = Point::new(to_side.attach_x(to_rect), to_y);
    if (start.x - end.x).abs() < COINCIDENT_EPS && (start.y - end.y).abs() < COINCIDENT_EPS {
        return None;
    }

    let stub_start = Point::new(start.x + from_side.out_dir() * config.stub_len, start.y);
    let stub_end = Point::new(end.x + to_side.out_dir() * config.stub_len, end.y);
    let obstacles = [*from_rect, *to_rect];

    // Equal stub heights collapse to a straight run; otherwise the waist
    // sits on the grid between the two stubs.
    let preferred = if (stub_start.y - stub_end.y).abs() < COINCIDENT_EPS {
        stub_start.y
    } else {
        snap((stub_start.y + stub_end.y) / 2.0, config.grid_size)
    };
    let mut waist = preferred;
    if waist_obstructed(&obstacles, &stub_start, &stub_end, waist) {
        let below = detour_below(&obstacles, config);
        let above = detour_above(&obstacles, config);
        waist = if !waist_obstructed(&obstacles, &stub_start, &stub_end, below) {
            below
        } else if !waist_obstructed(&obstacles, &stub_start, &stub_end, above) {
            above
        } else {
            // Both detours blocked by the endpoint boxes themselves; keep
            // the lower one, the accepted heuristic limit.
            below
        };
    }

    let raw = [
        start,
        stub_start,
        Point::new(stub_start.x, waist),
        Point::new(stub_end.x, waist),
        stub_end,
        end,
    ];
    let points = simplify(&raw);
    if points.len() < 2 {
        return None;
    }

    let label_anchor = midpoint_by_arc_length(&points);
    let commands = rounded_commands(&points, config.corner_radius);
    Some(RoutedPath {
        points,
        commands,
        label_anchor,
    })
}

fn waist_obstructed(obstacles: &[Rect], stub_start: &Point, stub_end: &Point, waist: f32) -> bool {
    for rect in obstacles {
        if v_run_crosses(rect, stub_start.x, stub_start.y, waist)
            || v_run_crosses(rect, stub_end.x, stub_end.y, waist)
            || h_run_crosses(rect, waist, stub_start.x, stub_end.x)
        {
            return true;
        }
    }
    false
}

fn v_run_crosses(rect: &Rect, x: f32, y1: f32, y2: f32) -> bool {
    if x <= rect.x || x >= rect.right() {
        return false;
    }
    let lo = y1.min(y2);
    let hi = y1.max(y2);
    lo < rect.bottom() && hi > rect.y
}

fn h_run_crosses(rect: &Rect, y: f32, x1: f32, x2: f32) -> bool {
    if y <= rect.y || y >= rect.bottom() {
        return false;
    }
    let lo = x1.min(x2);
    let hi = x1.max(x2);
    lo < rect.right() && hi > rect.x
}

/// Waist candidate one grid step below the lowest obstructing box.
fn detour_below(obstacles: &[Rect], config: &LayoutConfig) -> f32 {
    let bottom = obstacles.iter().map(Rect::bottom).fold(f32::MIN, f32::max);
    snap(bottom, config.grid_size) + config.grid_size
}

/// Waist candidate one grid step above the highest obstructing box.
fn detour_above(obstacles: &[Rect], config: &LayoutConfig) -> f32 {
    let top = obstacles.iter().map(|rect| rect.y).fold(f32::MAX, f32::min);
    snap(top, config.grid_size) - config.grid_size
}

/// Drop zero-length segments and collinear interior points.
fn simplify(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &point in points {
        if let Some(last) = out.last()
            && (last.x - point.x).abs() < COINCIDENT_EPS
            && (last.y - point.y).abs() < COINCIDENT_EPS
        {
            continue;
        }
        out.push(point);
    }
    let mut idx = 1;
    while idx + 1 < out.len() {
        let a = out[idx - 1];
        let b = out[idx];
        let c = out[idx + 1];
        let collinear = ((a.x - b.x).abs() < COINCIDENT_EPS && (b.x - c.x).abs() < COINCIDENT_EPS)
            || ((a.y - b.y).abs() < COINCIDENT_EPS && (b.y - c.y).abs() < COINCIDENT_EPS);
        if collinear {
            out.remove(idx);
        } else {
            idx += 1;
        }
    }
    out
}

fn midpoint_by_arc_length(points: &[Point]) -> Point {
    let mut total = 0.0;
    for pair in points.windows(2) {
        total += (pair[1].x - pair[0].x).abs() + (pair[1].y - pair[0].y).abs();
    }
    let mut remaining = total / 2.0;
    for pair in points.windows(2) {
        let seg = (pair[1].x - pair[0].x).abs() + (pair[1].y - pair[0].y).abs();
        if seg >= remaining && seg > 0.0 {
            let t = remaining / seg;
            return Point::new(
                pair[0].x + (pair[1].x - pair[0].x) * t,
                pair[0].y + (pair[1].y - pair[0].y) * t,
            );
        }
        remaining -= seg;
    }
    points[points.len() / 2]
}

/// Emit line/curve commands for a polyline, rounding every interior turn
/// with a quadratic corner of at most `radius`.
fn rounded_commands(points: &[Point], radius: f32) -> Vec<PathCommand> {
    let mut commands = Vec::with_capacity(points.len() + 2);
    commands.push(PathCommand::MoveTo { to: points[0] });
    for idx in 1..points.len().saturating_sub(1) {
        let prev = points[idx - 1];
        let turn = points[idx];
        let next = points[idx + 1];
        let len_in = (turn.x - prev.x).abs() + (turn.y - prev.y).abs();
        let len_out = (next.x - turn.x).abs() + (next.y - turn.y).abs();
        let r = radius.min(len_in / 2.0).min(len_out / 2.0);
        if r < COINCIDENT_EPS {
            commands.push(PathCommand::LineTo { to: turn });
            continue;
        }
        let entry = offset_towards(turn, prev, r);
        let exit = offset_towards(turn, next, r);
        commands.push(PathCommand::LineTo { to: entry });
        commands.push(PathCommand::QuadTo {
            ctrl: turn,
            to: exit,
        });
    }
    commands.push(PathCommand::LineTo {
        to: points[points.len() - 1],
    });
    commands
}

fn offset_towards(from: Point, towards: Point, distance: f32) -> Point {
    let dx = towards.x - from.x;
    let dy = towards.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < COINCIDENT_EPS {
        return from;
    }
    Point::new(from.x + dx / len * distance, from.y + dy / len * distance)
}
