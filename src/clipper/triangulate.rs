//! Ear-clipping triangulation of simple polygons in screen space.

use crate::math::Vec2;

/// Areas below this are treated as zero.
const AREA_EPSILON: f64 = 1e-9;

fn signed_area(points: &[Vec2]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].cross(points[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}

/// Point-in-triangle for a triangle of the given winding (`sign` = ±1).
/// Points on an edge count as inside.
fn in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2, sign: f64) -> bool {
    let d1 = (b - a).cross(p - a) * sign;
    let d2 = (c - b).cross(p - b) * sign;
    let d3 = (a - c).cross(p - c) * sign;
    d1 >= 0.0 && d2 >= 0.0 && d3 >= 0.0
}

/// Splits a simple polygon into triangles, returned as index triples into
/// `points`. Works for either winding. Zero-area polygons and collinear
/// vertices produce no triangles.
pub fn triangulate(points: &[Vec2]) -> Vec<[usize; 3]> {
    if points.len() < 3 || points.iter().any(|p| !p.is_finite()) {
        return Vec::new();
    }
    let area = signed_area(points);
    if area.abs() <= AREA_EPSILON {
        return Vec::new();
    }
    let sign = area.signum();

    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len() - 2);

    while remaining.len() > 3 {
        let n = remaining.len();
        let mut clipped = false;

        for i in 0..n {
            let (ip, ic, inx) = (remaining[(i + n - 1) % n], remaining[i], remaining[(i + 1) % n]);
            let (a, b, c) = (points[ip], points[ic], points[inx]);
            let turn = (b - a).cross(c - b) * sign;

            if turn.abs() <= AREA_EPSILON {
                // collinear or duplicate vertex, drop it
                remaining.remove(i);
                clipped = true;
                break;
            }
            if turn < 0.0 {
                continue;
            }
            let blocked = remaining
                .iter()
                .filter(|&&j| j != ip && j != ic && j != inx)
                .any(|&j| in_triangle(points[j], a, b, c, sign));
            if !blocked {
                triangles.push([ip, ic, inx]);
                remaining.remove(i);
                clipped = true;
                break;
            }
        }

        if !clipped {
            // Numerically awkward input (e.g. self-touching); fan the rest.
            for k in 1..remaining.len() - 1 {
                triangles.push([remaining[0], remaining[k], remaining[k + 1]]);
            }
            return triangles;
        }
    }

    let [a, b, c] = [remaining[0], remaining[1], remaining[2]];
    if (points[b] - points[a]).cross(points[c] - points[a]).abs() > AREA_EPSILON {
        triangles.push([a, b, c]);
    }
    triangles
}
