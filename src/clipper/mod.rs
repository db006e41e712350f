//! Homogeneous clipping, projection to the screen and re-triangulation.
//!
//! A world-space triangle goes through the MVP matrix, is clipped against
//! the six planes of the clip cube (see [`clip_space`]), divided by `w`,
//! mapped to pixel coordinates and split back into triangles with
//! [`triangulate`].

pub mod clip_space;
pub mod triangulate;

pub use clip_space::{trivially_outside, ClipPlane, ClipSpacePolygon, ClipSpaceVertex};
pub use triangulate::triangulate;

use crate::math::{Mat4, Vec2, Vec3, Vec4};

/// One screen-space triangle produced by clipping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClippedTriangle {
    /// Pixel coordinates, origin top-left.
    pub points: [Vec2; 3],
    /// NDC depth in [-1, 1]; smaller is nearer.
    pub depths: [f64; 3],
    pub tex_coords: Option<[Vec2; 3]>,
}

/// Maps NDC x/y to pixel coordinates with Y pointing down.
#[inline]
pub fn ndc_to_screen(ndc: Vec3, width: f64, height: f64) -> Vec2 {
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * width,
        (1.0 - (ndc.y + 1.0) * 0.5) * height,
    )
}

/// Clips a world-space triangle to the view volume of `mvp` and projects
/// it onto a `width` x `height` screen.
///
/// Returns no triangles for geometry that is outside, degenerate, or
/// contains non-finite coordinates.
pub fn clip_and_project(
    mvp: &Mat4,
    vertices: &[Vec3; 3],
    tex_coords: Option<[Vec2; 3]>,
    width: f64,
    height: f64,
) -> Vec<ClippedTriangle> {
    let positions = vertices.map(|v| *mvp * Vec4::point(v));
    if positions
        .iter()
        .any(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite() && p.w.is_finite()))
    {
        return Vec::new();
    }

    let uvs = tex_coords.unwrap_or([Vec2::ZERO; 3]);
    let polygon = ClipSpacePolygon::from_triangle([
        ClipSpaceVertex::new(positions[0], uvs[0]),
        ClipSpaceVertex::new(positions[1], uvs[1]),
        ClipSpaceVertex::new(positions[2], uvs[2]),
    ])
    .clip();

    let mut screen = Vec::with_capacity(polygon.vertices.len());
    let mut depths = Vec::with_capacity(polygon.vertices.len());
    let mut texels = Vec::with_capacity(polygon.vertices.len());
    for vertex in &polygon.vertices {
        let Some(ndc) = vertex.position.perspective_divide() else {
            continue;
        };
        screen.push(ndc_to_screen(ndc, width, height));
        depths.push(ndc.z);
        texels.push(vertex.texcoord);
    }

    triangulate(&screen)
        .into_iter()
        .map(|[a, b, c]| ClippedTriangle {
            points: [screen[a], screen[b], screen[c]],
            depths: [depths[a], depths[b], depths[c]],
            tex_coords: tex_coords.map(|_| [texels[a], texels[b], texels[c]]),
        })
        .collect()
}
