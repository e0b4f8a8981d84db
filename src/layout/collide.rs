use crate::config::LayoutConfig;
use crate::geometry::Rect;

#[derive(Debug, Clone)]
pub struct CandidateRect {
    pub id: String,
    pub rect: Rect,
}

/// Outcome of a resolver run. `passes` counts the passes that pushed at
/// least one rectangle; `converged` is false only when the iteration cap
/// was reached with overlaps still present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub passes: usize,
    pub converged: bool,
}

/// Iteratively separate overlapping rectangles.
///
/// Each pass walks every unordered pair; on overlap the second rectangle
/// is pushed away from the first along the vector between their centers
/// by the fixed spacing. A pass with no pushes terminates the loop; the
/// hard cap guarantees termination on dense clusters at the cost of a
/// possibly unresolved result. Output is not grid-snapped here; callers
/// snap when committing positions.
pub fn resolve_collisions(rects: &mut [CandidateRect], config: &LayoutConfig) -> Resolution {
    let spacing = config.collision_spacing;
    for pass in 0..config.collision_max_passes {
        let mut pushed = false;
        for a in 0..rects.len() {
            for b in (a + 1)..rects.len() {
                if !rects[a].rect.intersects(&rects[b].rect) {
                    continue;
                }
                let ca = rects[a].rect.center();
                let cb = rects[b].rect.center();
                let dx = cb.x - ca.x;
                let dy = cb.y - ca.y;
                let len = (dx * dx + dy * dy).sqrt();
                let (px, py) = if len > 0.0 {
                    (dx / len * spacing, dy / len * spacing)
                } else {
                    // Coincident centers have no direction; push diagonally.
                    (spacing, spacing)
                };
                rects[b].rect.x += px;
                rects[b].rect.y += py;
                pushed = true;
            }
        }
        if !pushed {
            return Resolution {
                passes: pass,
                converged: true,
            };
        }
    }
    Resolution {
        passes: config.collision_max_passes,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, x: f32, y: f32) -> CandidateRect {
        CandidateRect {
            id: id.to_string(),
            rect: Rect::new(x, y, 200.0, 100.0),
        }
    }

    #[test]
    fn non_overlapping_input_converges_without_pushes() {
        let config = LayoutConfig::default();
        let mut rects = vec![candidate("a", 0.0, 0.0), candidate("b", 300.0, 300.0)];
        let resolution = resolve_collisions(&mut rects, &config);
        assert_eq!(
            resolution,
            Resolution {
                passes: 0,
                converged: true
            }
        );
        assert_eq!(rects[0].rect.x, 0.0);
        assert_eq!(rects[1].rect.x, 300.0);
    }

    #[test]
    fn overlap_pushes_second_rect_only() {
        let config = LayoutConfig::default();
        let mut rects = vec![candidate("a", 0.0, 0.0), candidate("b", 190.0, 0.0)];
        let resolution = resolve_collisions(&mut rects, &config);
        assert!(resolution.converged);
        assert_eq!(resolution.passes, 1);
        // First rect never moves.
        assert_eq!(rects[0].rect.x, 0.0);
        assert_eq!(rects[0].rect.y, 0.0);
        assert!(rects[1].rect.x >= rects[0].rect.right());
        assert!(!rects[0].rect.intersects(&rects[1].rect));
    }

    #[test]
    fn identical_size_overlap_scenario_separates() {
        let config = LayoutConfig::default();
        let mut rects = vec![candidate("a", 0.0, 0.0), candidate("b", 10.0, 10.0)];
        let resolution = resolve_collisions(&mut rects, &config);
        assert!(resolution.converged);
        assert!(!rects[0].rect.intersects(&rects[1].rect));
    }

    #[test]
    fn coincident_centers_still_separate() {
        let config = LayoutConfig::default();
        let mut rects = vec![candidate("a", 0.0, 0.0), candidate("b", 0.0, 0.0)];
        let resolution = resolve_collisions(&mut rects, &config);
        assert!(resolution.converged);
        assert!(!rects[0].rect.intersects(&rects[1].rect));
    }

    #[test]
    fn iteration_cap_is_reported_not_fatal() {
        let config = LayoutConfig {
            collision_spacing: 0.01,
            collision_max_passes: 5,
            ..LayoutConfig::default()
        };
        let mut rects = vec![candidate("a", 0.0, 0.0), candidate("b", 10.0, 10.0)];
        let resolution = resolve_collisions(&mut rects, &config);
        assert_eq!(
            resolution,
            Resolution {
                passes: 5,
                converged: false
            }
        );
        // Overlap may remain; that is the accepted heuristic limit.
        assert!(rects[0].rect.intersects(&rects[1].rect));
    }

    #[test]
    fn dense_cluster_converges_within_cap() {
        let config = LayoutConfig::default();
        let mut rects: Vec<CandidateRect> = (0..12)
            .map(|idx| candidate(&format!("n{idx}"), (idx % 3) as f32 * 15.0, (idx / 3) as f32 * 12.0))
            .collect();
        let resolution = resolve_collisions(&mut rects, &config);
        assert!(resolution.converged, "cap hit on a small cluster");
        for a in 0..rects.len() {
            for b in (a + 1)..rects.len() {
                assert!(
                    !rects[a].rect.intersects(&rects[b].rect),
                    "{} overlaps {}",
                    rects[a].id,
                    rects[b].id
                );
            }
        }
    }
}
