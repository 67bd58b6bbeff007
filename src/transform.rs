// transform.rs — 4x4 homogeneous transforms, row-vector convention.
//
// Points are row vectors and are transformed as `p' = p * M`. With that
// convention the translation lives in row 3, and composing "first A, then B"
// is the product `A * B`. Every rotation below right-multiplies the current
// transform, so the rotation applied last acts last on the point.
//
//   rotate_x(a); rotate_y(b);   =>   M = I * Rx(a) * Ry(b)
//                                    p' = p * Rx(a) * Ry(b)
//
// Angles are integer degrees, converted with `ONE_DEGREE = 0.017453`. That is
// a truncated π/180 (error ≈ 3e-7 per degree), kept as-is so the animation
// matches the reference frames exactly.
//
// NEW RUST CONCEPTS:
// - `matrix_multiply(out: &mut Mat4, a: &Mat4, b: &Mat4)` cannot be called
//   with `out` aliasing `a` or `b`: the borrow checker rejects a `&mut` and a
//   `&` to the same value. The C-style "write into a temporary, copy back"
//   dance becomes a type-system guarantee.

use crate::point::Point;

/// Degrees → radians factor.
pub const ONE_DEGREE: f32 = 0.017453;

// ---------------------------------------------------------------------------
// Mat4
// ---------------------------------------------------------------------------

/// Row-major 4x4 matrix: `m.0[row][col]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Mat4(pub [[f32; 4]; 4]);

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    /// Elementary rotation about X by `deg` degrees.
    pub fn rotation_x(deg: i32) -> Self {
        let (s, c) = sin_cos_deg(deg);
        let mut m = Mat4::IDENTITY;
        m.0[1][1] = c;
        m.0[2][2] = c;
        m.0[1][2] = -s;
        m.0[2][1] = s;
        m
    }

    /// Elementary rotation about Y by `deg` degrees.
    pub fn rotation_y(deg: i32) -> Self {
        let (s, c) = sin_cos_deg(deg);
        let mut m = Mat4::IDENTITY;
        m.0[0][0] = c;
        m.0[2][2] = c;
        m.0[0][2] = s;
        m.0[2][0] = -s;
        m
    }

    /// Elementary rotation about Z by `deg` degrees.
    pub fn rotation_z(deg: i32) -> Self {
        let (s, c) = sin_cos_deg(deg);
        let mut m = Mat4::IDENTITY;
        m.0[0][0] = c;
        m.0[1][1] = c;
        m.0[0][1] = -s;
        m.0[1][0] = s;
        m
    }

    /// Row-major flattening: element `[r][c]` lands at index `r * 4 + c`.
    pub fn to_flat(&self) -> [f32; 16] {
        bytemuck::cast(self.0)
    }

    pub fn from_flat(flat: [f32; 16]) -> Self {
        Mat4(bytemuck::cast(flat))
    }

    /// Largest absolute element-wise difference. Handy for tolerance checks.
    pub fn max_abs_diff(&self, other: &Mat4) -> f32 {
        self.to_flat()
            .iter()
            .zip(other.to_flat().iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

#[inline]
fn sin_cos_deg(deg: i32) -> (f32, f32) {
    let angle = deg as f32 * ONE_DEGREE;
    angle.sin_cos()
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// `out = a * b`.
pub fn matrix_multiply(out: &mut Mat4, a: &Mat4, b: &Mat4) {
    for r in 0..4 {
        for c in 0..4 {
            let mut sum = 0.0;
            for k in 0..4 {
                sum += a.0[r][k] * b.0[k][c];
            }
            out.0[r][c] = sum;
        }
    }
}

/// `out = v * m` (row vector times matrix).
pub fn vector_multiply(out: &mut [f32; 4], v: &[f32; 4], m: &Mat4) {
    for c in 0..4 {
        let mut sum = 0.0;
        for k in 0..4 {
            sum += v[k] * m.0[k][c];
        }
        out[c] = sum;
    }
}

/// Convenience wrapper over [`vector_multiply`] for a single point.
#[inline]
pub fn transform_point(p: Point, m: &Mat4) -> Point {
    let mut out = [0.0; 4];
    vector_multiply(&mut out, &p.to_array(), m);
    Point::from_array(out)
}

// ---------------------------------------------------------------------------
// Transform composer
// ---------------------------------------------------------------------------

/// The current transform, built up from identity by elementary operations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    matrix: Mat4,
}

impl Transform {
    pub fn identity() -> Self {
        Transform { matrix: Mat4::IDENTITY }
    }

    /// Reset the current matrix to identity.
    pub fn reset(&mut self) {
        self.matrix = Mat4::IDENTITY;
    }

    #[inline]
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    pub fn rotate_x(&mut self, deg: i32) {
        self.compose(&Mat4::rotation_x(deg));
    }

    pub fn rotate_y(&mut self, deg: i32) {
        self.compose(&Mat4::rotation_y(deg));
    }

    pub fn rotate_z(&mut self, deg: i32) {
        self.compose(&Mat4::rotation_z(deg));
    }

    /// Overwrite the translation row. Not multiplicative: any translation
    /// previously in row 3 is replaced, the rotation block is untouched.
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.matrix.0[3][0] = x;
        self.matrix.0[3][1] = y;
        self.matrix.0[3][2] = z;
    }

    /// `matrix = matrix * rhs`.
    fn compose(&mut self, rhs: &Mat4) {
        let mut result = Mat4::IDENTITY;
        matrix_multiply(&mut result, &self.matrix, rhs);
        self.matrix = result;
    }

    /// The per-frame animation transform: identity, then X and Y rotation by
    /// the same `counter` degrees.
    pub fn for_frame(counter: i32) -> Self {
        let mut t = Transform::identity();
        t.rotate_x(counter);
        t.rotate_y(counter);
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Mat4 {
        Mat4([
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ])
    }

    #[test]
    fn test_matrix_multiply_known_product() {
        let a = sample();
        let mut out = Mat4::IDENTITY;
        matrix_multiply(&mut out, &a, &a);
        // Row 0 of A*A: [1,2,3,4] · columns of A.
        assert_eq!(out.0[0], [90.0, 100.0, 110.0, 120.0]);
        assert_eq!(out.0[3], [426.0, 484.0, 542.0, 600.0]);
    }

    #[test]
    fn test_vector_multiply_uses_rows_as_basis() {
        let m = sample();
        let mut out = [0.0; 4];
        vector_multiply(&mut out, &[0.0, 1.0, 0.0, 0.0], &m);
        assert_eq!(out, m.0[1]);
        vector_multiply(&mut out, &[1.0, 1.0, 0.0, 0.0], &m);
        assert_eq!(out, [6.0, 8.0, 10.0, 12.0]);
    }

    #[test]
    fn test_flat_is_row_major() {
        let flat = sample().to_flat();
        assert_eq!(flat[1], 2.0);
        assert_eq!(flat[4], 5.0);
        assert_eq!(flat[15], 16.0);
        assert_eq!(Mat4::from_flat(flat), sample());
    }

    #[test]
    fn test_rotation_x_90_maps_y_to_z() {
        // Row-vector convention: (0,1,0) * Rx(90) = row 1 = (0, cos, -sin).
        // 90 * ONE_DEGREE falls just short of π/2, so cos(90°) ≈ 2.6e-5 here.
        let p = transform_point(Point::new(0.0, 1.0, 0.0), &Mat4::rotation_x(90));
        let (s, c) = (90.0 * ONE_DEGREE).sin_cos();
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, c);
        assert_eq!(p.z, -s);
        assert!(p.y.abs() < 1e-4);
        assert!((p.z + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotation_z_only_touches_xy() {
        let m = Mat4::rotation_z(30);
        assert_eq!(m.0[2], [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(m.0[3], [0.0, 0.0, 0.0, 1.0]);
        assert!((m.0[0][1] + m.0[1][0]).abs() < 1e-7);
    }

    #[test]
    fn test_one_degree_is_truncated() {
        let exact = std::f32::consts::PI / 180.0;
        assert!((ONE_DEGREE - exact).abs() < 1e-6);
        assert_ne!(ONE_DEGREE, exact);
    }

    #[test]
    fn test_translate_overwrites_row_three() {
        let mut t = Transform::identity();
        t.rotate_y(30);
        let before = *t.matrix();
        t.translate(1.0, 2.0, 3.0);
        t.translate(4.0, 5.0, 6.0);
        let m = t.matrix();
        assert_eq!(m.0[3], [4.0, 5.0, 6.0, before.0[3][3]]);
        assert_eq!(m.0[0..3], before.0[0..3]);
    }

    #[test]
    fn test_for_frame_matches_manual_composition() {
        let mut manual = Mat4::IDENTITY;
        let mut tmp = Mat4::IDENTITY;
        matrix_multiply(&mut tmp, &Mat4::IDENTITY, &Mat4::rotation_x(5));
        matrix_multiply(&mut manual, &tmp, &Mat4::rotation_y(5));
        assert_eq!(*Transform::for_frame(5).matrix(), manual);
    }
}
