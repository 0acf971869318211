//! Two-pass hit testing contract for drawable components.
//!
//! The cheap bounding-box pass gates the precise pass so dense scenes
//! stay bounded. Precise testing resolves against the posed geometry:
//! a shape's placement includes the component's current x/y offsets.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Authored hit geometry, positioned relative to the component origin.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HitShape {
    Rect { x: f32, y: f32, w: f32, h: f32 },
    Ellipse { cx: f32, cy: f32, rx: f32, ry: f32 },
}

/// Two-pass hit-test capability exposed by drawable components.
pub trait Hittable {
    /// Cheap bounding-box containment. Bounds are inflated by `radius`
    /// so the gate stays a superset of the precise pass.
    fn hit_test_aabb(&self, point: Vec2, radius: f32) -> bool;
    /// Precise containment; `radius` expresses pointer tolerance.
    fn hit_test_hifi(&self, point: Vec2, radius: f32) -> bool;
}

/// A hit shape placed at its posed offset.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlacedShape {
    pub shape: HitShape,
    pub offset: Vec2,
}

impl PlacedShape {
    fn bounds(&self) -> (f32, f32, f32, f32) {
        match self.shape {
            HitShape::Rect { x, y, w, h } => {
                (x + self.offset.x, y + self.offset.y, w, h)
            }
            HitShape::Ellipse { cx, cy, rx, ry } => (
                cx - rx + self.offset.x,
                cy - ry + self.offset.y,
                rx * 2.0,
                ry * 2.0,
            ),
        }
    }
}

impl Hittable for PlacedShape {
    fn hit_test_aabb(&self, point: Vec2, radius: f32) -> bool {
        let (x, y, w, h) = self.bounds();
        point.x >= x - radius
            && point.x <= x + w + radius
            && point.y >= y - radius
            && point.y <= y + h + radius
    }

    fn hit_test_hifi(&self, point: Vec2, radius: f32) -> bool {
        match self.shape {
            HitShape::Rect { x, y, w, h } => {
                let x = x + self.offset.x;
                let y = y + self.offset.y;
                point.x >= x - radius
                    && point.x <= x + w + radius
                    && point.y >= y - radius
                    && point.y <= y + h + radius
            }
            HitShape::Ellipse { cx, cy, rx, ry } => {
                let dx = point.x - (cx + self.offset.x);
                let dy = point.y - (cy + self.offset.y);
                let rx = rx + radius;
                let ry = ry + radius;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let nx = dx / rx;
                let ny = dy / ry;
                nx * nx + ny * ny <= 1.0
            }
        }
    }
}

/// AABB pass first; the precise pass runs only when it succeeds.
pub fn hit_test(target: &dyn Hittable, point: Vec2, radius: f32) -> bool {
    target.hit_test_aabb(point, radius) && target.hit_test_hifi(point, radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_hits_inside_only() {
        let s = PlacedShape {
            shape: HitShape::Rect {
                x: 0.0,
                y: 0.0,
                w: 10.0,
                h: 10.0,
            },
            offset: Vec2::new(5.0, 0.0),
        };
        assert!(hit_test(&s, Vec2::new(10.0, 5.0), 0.0));
        assert!(!hit_test(&s, Vec2::new(2.0, 5.0), 0.0));
    }

    #[test]
    fn ellipse_precise_pass_rejects_corners() {
        let s = PlacedShape {
            shape: HitShape::Ellipse {
                cx: 5.0,
                cy: 5.0,
                rx: 5.0,
                ry: 5.0,
            },
            offset: Vec2::default(),
        };
        // Corner of the AABB but outside the ellipse.
        assert!(s.hit_test_aabb(Vec2::new(0.5, 0.5), 0.0));
        assert!(!hit_test(&s, Vec2::new(0.5, 0.5), 0.0));
        assert!(hit_test(&s, Vec2::new(5.0, 1.0), 0.0));
    }

    #[test]
    fn tolerance_reaches_past_exact_bounds() {
        let s = PlacedShape {
            shape: HitShape::Rect {
                x: 0.0,
                y: 0.0,
                w: 10.0,
                h: 10.0,
            },
            offset: Vec2::default(),
        };
        // 1.5 units right of the rect: inside a 2.0 tolerance, outside 0.
        assert!(hit_test(&s, Vec2::new(11.5, 5.0), 2.0));
        assert!(!hit_test(&s, Vec2::new(11.5, 5.0), 0.0));

        let e = PlacedShape {
            shape: HitShape::Ellipse {
                cx: 5.0,
                cy: 5.0,
                rx: 5.0,
                ry: 5.0,
            },
            offset: Vec2::default(),
        };
        assert!(hit_test(&e, Vec2::new(11.5, 5.0), 2.0));
    }
}
