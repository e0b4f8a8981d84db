use crate::config::LayoutConfig;
use crate::geometry::Rect;

/// Derive a group's bounding box from its resolvable member rectangles:
/// min/max over the members, fixed padding on all sides, and a header band
/// prepended above. A group with no resolvable members yields `None` and
/// renders nothing rather than a degenerate empty box.
pub fn group_rect(members: &[Rect], config: &LayoutConfig) -> Option<Rect> {
    let mut iter = members.iter();
    let first = iter.next()?;
    let mut bounds = *first;
    for rect in iter {
        bounds = bounds.union(rect);
    }
    Some(Rect::new(
        bounds.x - config.group_padding,
        bounds.y - config.group_padding - config.group_header_height,
        bounds.width + 2.0 * config.group_padding,
        bounds.height + 2.0 * config.group_padding + config.group_header_height,
    ))
}

/// Where edges attach when a collapsed group stands in for a hidden
/// member: the middle of the header band.
pub fn group_anchor_y(rect: &Rect, config: &LayoutConfig) -> f32 {
    rect.y + config.group_header_height / 2.0
}
