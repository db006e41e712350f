//! 4x4 transformation matrix using column-major convention.
//!
//! # Convention
//! - Vectors are **column vectors** on the right: `Mat4 * Vec`
//! - Translation is stored in the **last column**
//! - Transforms chain **right-to-left**: `A * B * v` applies B first, then A
//! - Projection follows the OpenGL clip-space convention: right-handed view
//!   space looking down −Z, NDC depth in `[-1, 1]`
//!
//! # Example
//! ```ignore
//! let model = Mat4::translation(pos) * Mat4::from_quat(rot); // rotate, then move
//! let clip = mvp * Vec4::point(vertex);
//! ```

use std::ops::Mul;

use super::quat::Quat;
use super::vec3::Vec3;
use super::vec4::Vec4;

/// 4x4 matrix stored as `data[row][col]` with column-major convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    data: [[f64; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub const fn new(data: [[f64; 4]; 4]) -> Self {
        Mat4 { data }
    }

    pub const fn identity() -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a translation matrix.
    ///
    /// Translation is stored in the last column (column-major convention).
    pub fn translation(offset: Vec3) -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, offset.x],
            [0.0, 1.0, 0.0, offset.y],
            [0.0, 0.0, 1.0, offset.z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a scale matrix.
    pub fn scaling(x: f64, y: f64, z: f64) -> Self {
        Mat4::new([
            [x, 0.0, 0.0, 0.0],
            [0.0, y, 0.0, 0.0],
            [0.0, 0.0, z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation matrix equivalent to rotating by the (unit) quaternion `q`.
    pub fn from_quat(q: Quat) -> Self {
        let Quat { w, x, y, z } = q.normalize();
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);
        Mat4::new([
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy), 0.0],
            [2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx), 0.0],
            [2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy), 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a right-handed perspective matrix mapping view depth
    /// `[-near, -far]` to NDC `[-1, 1]`.
    ///
    /// `fov_y` is the vertical field of view in radians.
    pub fn perspective(fov_y: f64, aspect_ratio: f64, near: f64, far: f64) -> Self {
        let f = 1.0 / (fov_y / 2.0).tan();
        let a = (far + near) / (near - far);
        let b = 2.0 * far * near / (near - far);
        Mat4::new([
            [f / aspect_ratio, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, a, b],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    /// Returns the transpose. For a pure rotation this is also its inverse.
    pub fn transpose(&self) -> Self {
        let mut data = [[0.0; 4]; 4];
        for (row, values) in data.iter_mut().enumerate() {
            for (col, value) in values.iter_mut().enumerate() {
                *value = self.data[col][row];
            }
        }
        Mat4 { data }
    }

    /// Computes the inverse of the matrix, if it exists.
    /// Returns `None` if the matrix is singular (determinant is zero).
    pub fn inverse(&self) -> Option<Mat4> {
        let m = &self.data;

        // 2x2 sub-determinants of the bottom two rows, shared by the first
        // two cofactor rows.
        let s0 = m[2][2] * m[3][3] - m[2][3] * m[3][2];
        let s1 = m[2][1] * m[3][3] - m[2][3] * m[3][1];
        let s2 = m[2][1] * m[3][2] - m[2][2] * m[3][1];
        let s3 = m[2][0] * m[3][3] - m[2][3] * m[3][0];
        let s4 = m[2][0] * m[3][2] - m[2][2] * m[3][0];
        let s5 = m[2][0] * m[3][1] - m[2][1] * m[3][0];

        // and of the top two rows, for the last two cofactor rows.
        let t0 = m[0][2] * m[1][3] - m[0][3] * m[1][2];
        let t1 = m[0][1] * m[1][3] - m[0][3] * m[1][1];
        let t2 = m[0][1] * m[1][2] - m[0][2] * m[1][1];
        let t3 = m[0][0] * m[1][3] - m[0][3] * m[1][0];
        let t4 = m[0][0] * m[1][2] - m[0][2] * m[1][0];
        let t5 = m[0][0] * m[1][1] - m[0][1] * m[1][0];

        let c00 = m[1][1] * s0 - m[1][2] * s1 + m[1][3] * s2;
        let c01 = -(m[1][0] * s0 - m[1][2] * s3 + m[1][3] * s4);
        let c02 = m[1][0] * s1 - m[1][1] * s3 + m[1][3] * s5;
        let c03 = -(m[1][0] * s2 - m[1][1] * s4 + m[1][2] * s5);

        // Determinant using first row expansion
        let det = m[0][0] * c00 + m[0][1] * c01 + m[0][2] * c02 + m[0][3] * c03;
        if det.abs() < f64::EPSILON * f64::EPSILON || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;

        let c10 = -(m[0][1] * s0 - m[0][2] * s1 + m[0][3] * s2);
        let c11 = m[0][0] * s0 - m[0][2] * s3 + m[0][3] * s4;
        let c12 = -(m[0][0] * s1 - m[0][1] * s3 + m[0][3] * s5);
        let c13 = m[0][0] * s2 - m[0][1] * s4 + m[0][2] * s5;

        let c20 = m[3][1] * t0 - m[3][2] * t1 + m[3][3] * t2;
        let c21 = -(m[3][0] * t0 - m[3][2] * t3 + m[3][3] * t4);
        let c22 = m[3][0] * t1 - m[3][1] * t3 + m[3][3] * t5;
        let c23 = -(m[3][0] * t2 - m[3][1] * t4 + m[3][2] * t5);

        let c30 = -(m[2][1] * t0 - m[2][2] * t1 + m[2][3] * t2);
        let c31 = m[2][0] * t0 - m[2][2] * t3 + m[2][3] * t4;
        let c32 = -(m[2][0] * t1 - m[2][1] * t3 + m[2][3] * t5);
        let c33 = m[2][0] * t2 - m[2][1] * t4 + m[2][2] * t5;

        // The inverse is the transpose of the cofactor matrix divided by determinant
        Some(Mat4::new([
            [c00 * inv_det, c10 * inv_det, c20 * inv_det, c30 * inv_det],
            [c01 * inv_det, c11 * inv_det, c21 * inv_det, c31 * inv_det],
            [c02 * inv_det, c12 * inv_det, c22 * inv_det, c32 * inv_det],
            [c03 * inv_det, c13 * inv_det, c23 * inv_det, c33 * inv_det],
        ]))
    }

    /// Row `index` as a vector; used for frustum plane extraction.
    #[inline]
    pub fn row(&self, index: usize) -> Vec4 {
        let r = self.data[index];
        Vec4::new(r[0], r[1], r[2], r[3])
    }

    /// Access element at [row][col].
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row][col]
    }

    /// Transform a direction (w=0), ignoring translation.
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        (*self * Vec4::new(v.x, v.y, v.z, 0.0)).xyz()
    }
}

/// Matrix multiplication: Mat4 * Mat4.
///
/// For column-major convention, `A * B * v` applies B first, then A.
impl Mul<Mat4> for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Self::Output {
        let mut result = [[0.0f64; 4]; 4];

        for (row, values) in result.iter_mut().enumerate() {
            for (col, value) in values.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.data[row][k] * rhs.data[k][col]).sum();
            }
        }

        Mat4::new(result)
    }
}

/// Transform a Vec4 by a matrix: Mat4 * Vec4 (column vector).
impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, v: Vec4) -> Self::Output {
        let r = |i: usize| {
            self.data[i][0] * v.x + self.data[i][1] * v.y + self.data[i][2] * v.z + self.data[i][3] * v.w
        };
        Vec4::new(r(0), r(1), r(2), r(3))
    }
}

/// Transform a point: Mat4 * Vec3 (treats Vec3 as column vector with w=1).
///
/// Applies perspective division if w is neither 0 nor 1.
impl Mul<Vec3> for Mat4 {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Self::Output {
        let p = self * Vec4::point(v);
        if p.w != 0.0 && p.w != 1.0 {
            Vec3::new(p.x / p.w, p.y / p.w, p.z / p.w)
        } else {
            p.xyz()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn inverse_undoes_transform() {
        let m = Mat4::translation(Vec3::new(1.0, -2.0, 3.0))
            * Mat4::from_quat(Quat::from_axis_angle(Vec3::Y, 0.7))
            * Mat4::scaling(2.0, 2.0, 2.0);
        let inv = m.inverse().expect("invertible");
        let p = Vec3::new(0.3, 0.4, -5.0);
        let back = inv * (m * p);
        assert_relative_eq!(back.x, p.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-9);
        assert_relative_eq!(back.z, p.z, epsilon = 1e-9);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(Mat4::scaling(1.0, 0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn perspective_maps_near_and_far_to_ndc_bounds() {
        let p = Mat4::perspective(FRAC_PI_2, 1.0, 0.1, 100.0);
        let near = (p * Vec4::new(0.0, 0.0, -0.1, 1.0)).perspective_divide().unwrap();
        let far = (p * Vec4::new(0.0, 0.0, -100.0, 1.0)).perspective_divide().unwrap();
        assert_relative_eq!(near.z, -1.0, epsilon = 1e-9);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn quat_matrix_matches_quat_rotation() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 1.1);
        let v = Vec3::new(0.2, -0.5, 0.9);
        let a = q * v;
        let b = Mat4::from_quat(q).transform_vector(v);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-12);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-12);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-12);
    }
}
