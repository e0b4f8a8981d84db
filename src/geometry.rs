use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict overlap: touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// Round to the nearest multiple of the grid size.
pub fn snap(value: f32, grid: f32) -> f32 {
    if grid <= 0.0 {
        return value;
    }
    (value / grid).round() * grid
}

pub fn snap_point(point: Point, grid: f32) -> Point {
    Point::new(snap(point.x, grid), snap(point.y, grid))
}

/// Node height from field count: header band plus one row per field.
/// A zero-field entity still gets the header band.
pub fn node_height(field_count: usize, config: &LayoutConfig) -> f32 {
    config.header_height + field_count as f32 * config.field_row_height
}

pub fn node_rect(position: Point, field_count: usize, config: &LayoutConfig) -> Rect {
    Rect::new(
        position.x,
        position.y,
        config.node_width,
        node_height(field_count, config),
    )
}

/// Y coordinate where an edge attaches for a given field row, clamped to
/// the node box so out-of-range indices still anchor somewhere sensible.
pub fn field_anchor_y(rect: &Rect, field_index: usize, config: &LayoutConfig) -> f32 {
    let y = rect.y + config.header_height + (field_index as f32 + 0.5) * config.field_row_height;
    let lo = rect.y + config.header_height / 2.0;
    let hi = (rect.bottom() - config.field_row_height / 2.0).max(lo);
    y.clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_counts_header_and_rows() {
        let config = LayoutConfig::default();
        assert_eq!(node_height(0, &config), 40.0);
        assert_eq!(node_height(3, &config), 40.0 + 3.0 * 30.0);
    }

    #[test]
    fn snap_rounds_to_grid() {
        assert_eq!(snap(27.0, 20.0), 20.0);
        assert_eq!(snap(31.0, 20.0), 40.0);
        assert_eq!(snap(-9.0, 20.0), 0.0);
        assert_eq!(snap(-11.0, 20.0), -20.0);
        assert_eq!(snap(13.0, 0.0), 13.0);
    }

    #[test]
    fn intersects_is_strict() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let c = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(c.intersects(&a));
    }

    #[test]
    fn field_anchor_clamps_out_of_range() {
        let config = LayoutConfig::default();
        let rect = node_rect(Point::new(0.0, 0.0), 2, &config);
        let inside = field_anchor_y(&rect, 1, &config);
        assert_eq!(inside, 40.0 + 1.5 * 30.0);
        let clamped = field_anchor_y(&rect, 99, &config);
        assert!(clamped <= rect.bottom());
    }
}
