use crate::config::LayoutConfig;
use crate::geometry::Rect;

/// Which face of a node an edge attaches to. Connectors always leave and
/// enter horizontally, so top/bottom faces are never candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn attach_x(&self, rect: &Rect) -> f32 {
        match self {
            Self::Left => rect.x,
            Self::Right => rect.right(),
        }
    }

    /// Outward direction of the stub leaving this face.
    pub fn out_dir(&self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Evaluation order doubles as the tie-break order.
const COMBINATIONS: [(Side, Side); 4] = [
    (Side::Right, Side::Left),
    (Side::Right, Side::Right),
    (Side::Left, Side::Left),
    (Side::Left, Side::Right),
];

/// Manhattan distance between the two attachment points, plus a fixed
/// penalty for each endpoint whose stub would have to travel backward to
/// reach the other attachment point.
fn combination_score(
    from_side: Side,
    to_side: Side,
    from_rect: &Rect,
    to_rect: &Rect,
    from_y: f32,
    to_y: f32,
    config: &LayoutConfig,
) -> f32 {
    let ax = from_side.attach_x(from_rect);
    let bx = to_side.attach_x(to_rect);
    let mut score = (ax - bx).abs() + (from_y - to_y).abs();
    if (bx - ax) * from_side.out_dir() < 0.0 {
        score += config.side_penalty;
    }
    if (ax - bx) * to_side.out_dir() < 0.0 {
        score += config.side_penalty;
    }
    score
}

/// Pick the side pair with the lowest score. Deterministic: ties keep the
/// first combination in evaluation order, and nothing is cached between
/// calls.
pub fn select_sides(
    from_rect: &Rect,
    to_rect: &Rect,
    from_y: f32,
    to_y: f32,
    config: &LayoutConfig,
) -> (Side, Side) {
    let mut best = COMBINATIONS[0];
    let mut best_score = f32::MAX;
    for (from_side, to_side) in COMBINATIONS {
        let score =
            combination_score(from_side, to_side, from_rect, to_rect, from_y, to_y, config);
        if score < best_score {
            best = (from_side, to_side);
            best_score = score;
        }
    }
    best
}
