//! Clip-space clipping against the homogeneous clip cube.
//!
//! Clipping occurs after projection (in homogeneous clip space), before the
//! perspective divide. The clip volume is defined by:
//!
//! ```text
//! -w <= x <= w
//! -w <= y <= w
//! -w <= z <= w   (OpenGL-style [-1, 1] depth range)
//! ```

use crate::math::{Vec2, Vec4};

/// A vertex in homogeneous clip space with its texture coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipSpaceVertex {
    /// Position in clip space (x, y, z, w) - before perspective divide
    pub position: Vec4,
    pub texcoord: Vec2,
}

impl ClipSpaceVertex {
    pub fn new(position: Vec4, texcoord: Vec2) -> Self {
        Self { position, texcoord }
    }

    /// Linearly interpolate position and UV between two vertices.
    /// Used when a polygon edge crosses a clipping plane.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            texcoord: self.texcoord.lerp(other.texcoord, t),
        }
    }
}

/// The 6 planes of the canonical clip-space cube.
///
/// The signed distance is positive when inside the clip volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipPlane {
    /// x <= w
    Right,
    /// -x <= w
    Left,
    /// y <= w
    Top,
    /// -y <= w
    Bottom,
    /// z <= w
    Far,
    /// -z <= w
    Near,
}

impl ClipPlane {
    /// Order in which polygons are clipped.
    pub const ALL: [ClipPlane; 6] = [
        Self::Right,
        Self::Left,
        Self::Top,
        Self::Bottom,
        Self::Far,
        Self::Near,
    ];

    /// Returns the signed distance from a clip-space position to this plane.
    /// Positive = inside the clip volume, Negative = outside.
    #[inline]
    pub fn signed_distance(&self, p: Vec4) -> f64 {
        match self {
            Self::Right => p.w - p.x,
            Self::Left => p.w + p.x,
            Self::Top => p.w - p.y,
            Self::Bottom => p.w + p.y,
            Self::Far => p.w - p.z,
            Self::Near => p.w + p.z,
        }
    }
}

/// A polygon in clip space, represented as a list of vertices.
#[derive(Clone, Debug, Default)]
pub struct ClipSpacePolygon {
    pub vertices: Vec<ClipSpaceVertex>,
}

impl ClipSpacePolygon {
    pub fn from_triangle(vertices: [ClipSpaceVertex; 3]) -> Self {
        Self {
            vertices: vertices.to_vec(),
        }
    }

    /// Returns true if the polygon has been completely clipped away.
    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }

    /// Clip this polygon against a single plane using the Sutherland-Hodgman algorithm.
    pub fn clip_against_plane(&self, plane: ClipPlane) -> Self {
        if self.is_empty() {
            return Self::default();
        }

        let count = self.vertices.len();
        let mut output = Vec::with_capacity(count + 1);

        for (i, current) in self.vertices.iter().enumerate() {
            let next = &self.vertices[(i + 1) % count];

            let d1 = plane.signed_distance(current.position);
            let d2 = plane.signed_distance(next.position);
            if !d1.is_finite() || !d2.is_finite() {
                return Self::default();
            }

            let current_inside = d1 >= 0.0;
            let next_inside = d2 >= 0.0;

            if current_inside {
                output.push(*current);
            }
            // Edge crosses the plane: emit the intersection.
            if current_inside != next_inside {
                let t = d1 / (d1 - d2);
                output.push(current.lerp(next, t));
            }
        }

        Self { vertices: output }
    }

    /// Clip against all 6 planes of the clip cube. The result may be empty.
    pub fn clip(self) -> Self {
        let mut result = self;
        for plane in ClipPlane::ALL {
            if result.is_empty() {
                break;
            }
            result = result.clip_against_plane(plane);
        }
        result
    }
}

/// True when every position is outside the same clip plane, so the
/// primitive cannot be visible.
pub fn trivially_outside(positions: &[Vec4]) -> bool {
    ClipPlane::ALL
        .iter()
        .any(|plane| positions.iter().all(|p| plane.signed_distance(*p) < 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vertex(x: f64, y: f64, u: f64) -> ClipSpaceVertex {
        ClipSpaceVertex::new(Vec4::new(x, y, 0.0, 1.0), Vec2::new(u, 0.0))
    }

    #[test]
    fn inside_polygon_is_untouched() {
        let poly = ClipSpacePolygon::from_triangle([
            vertex(-0.5, -0.5, 0.0),
            vertex(0.5, -0.5, 1.0),
            vertex(0.0, 0.5, 0.5),
        ]);
        let clipped = poly.clone().clip();
        assert_eq!(clipped.vertices, poly.vertices);
    }

    #[test]
    fn crossing_edge_interpolates_uv() {
        let poly = ClipSpacePolygon::from_triangle([
            vertex(0.0, 0.0, 0.0),
            vertex(3.0, 0.0, 1.0),
            vertex(0.0, 0.5, 0.0),
        ]);
        let clipped = poly.clip_against_plane(ClipPlane::Right);
        assert_eq!(clipped.vertices.len(), 4);
        // the edge (0,0)->(3,0) meets x = 1 a third of the way along
        let hit = clipped.vertices[1];
        assert_relative_eq!(hit.position.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(hit.texcoord.x, 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn outside_polygon_vanishes() {
        let poly = ClipSpacePolygon::from_triangle([
            vertex(2.0, 0.0, 0.0),
            vertex(3.0, 0.0, 0.0),
            vertex(2.0, 0.5, 0.0),
        ]);
        assert!(poly.clip().is_empty());
        assert!(trivially_outside(&[
            Vec4::new(2.0, 0.0, 0.0, 1.0),
            Vec4::new(3.0, 0.0, 0.0, 1.0),
        ]));
    }
}
