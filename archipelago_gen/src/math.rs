// Small 3D math kit for the turtle interpreters.
//
// `Vec3` is a plain `f32` triple; `Mat4` is a column-major 4x4 matrix laid
// out exactly like the renderer expects (element `[col * 4 + row]`, so the
// translation lives in elements 12..15 and the local axes in columns 0..2).
//
// Composition follows the "post-multiply" convention: `m.rotate(angle, axis)`
// returns `m * R(axis, angle)`, i.e. the rotation is applied in the turtle's
// local frame before the existing orientation. Every turtle symbol that
// reorients builds on that, so changing the convention would change every
// generated layout.
//
// Plain arrays and hand-written operators; no external linear-algebra crate.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Lengths below this are treated as zero when normalizing.
const EPSILON: f32 = 1e-6;

// ---------------------------------------------------------------------------
// Vec3
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const X: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const Y: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or zero for a (near) zero vector.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > EPSILON { self * (1.0 / len) } else { Self::ZERO }
    }

    /// Component-wise product.
    pub fn scale(self, s: Vec3) -> Self {
        Self::new(self.x * s.x, self.y * s.y, self.z * s.z)
    }

    /// Same vector with its vertical component dropped.
    pub fn flatten(self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, o: Vec3) {
        *self = *self + o;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

// ---------------------------------------------------------------------------
// Mat4
// ---------------------------------------------------------------------------

/// Column-major 4x4 transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mat4(pub [f32; 16]);

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    /// Rotation of `angle` radians about `axis`. A zero axis yields identity.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let a = axis.normalize();
        if a == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        Mat4([
            a.x * a.x * t + c,
            a.y * a.x * t + a.z * s,
            a.z * a.x * t - a.y * s,
            0.0,
            a.x * a.y * t - a.z * s,
            a.y * a.y * t + c,
            a.z * a.y * t + a.x * s,
            0.0,
            a.x * a.z * t + a.y * s,
            a.y * a.z * t - a.x * s,
            a.z * a.z * t + c,
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        ])
    }

    pub fn from_translation(v: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.0[12] = v.x;
        m.0[13] = v.y;
        m.0[14] = v.z;
        m
    }

    #[inline]
    fn at(&self, col: usize, row: usize) -> f32 {
        self.0[col * 4 + row]
    }

    /// `self * other`.
    pub fn mul_mat(&self, other: &Mat4) -> Mat4 {
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4).map(|k| self.at(k, row) * other.at(col, k)).sum();
            }
        }
        Mat4(out)
    }

    /// `self * R(axis, angle)`: rotate in the local frame.
    pub fn rotate(&self, angle: f32, axis: Vec3) -> Mat4 {
        self.mul_mat(&Mat4::from_axis_angle(axis, angle))
    }

    pub fn rotate_y(&self, angle: f32) -> Mat4 {
        self.rotate(angle, Vec3::Y)
    }

    /// `self * T(v)`: move the origin along the local axes.
    pub fn translate(&self, v: Vec3) -> Mat4 {
        let mut out = *self;
        for row in 0..4 {
            out.0[12 + row] =
                self.at(0, row) * v.x + self.at(1, row) * v.y + self.at(2, row) * v.z + self.at(3, row);
        }
        out
    }

    /// Transform a homogeneous point `(p, w)`, returning the xyz part.
    pub fn transform(&self, p: Vec3, w: f32) -> Vec3 {
        Vec3::new(
            self.at(0, 0) * p.x + self.at(1, 0) * p.y + self.at(2, 0) * p.z + self.at(3, 0) * w,
            self.at(0, 1) * p.x + self.at(1, 1) * p.y + self.at(2, 1) * p.z + self.at(3, 1) * w,
            self.at(0, 2) * p.x + self.at(1, 2) * p.y + self.at(2, 2) * p.z + self.at(3, 2) * w,
        )
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.transform(p, 1.0)
    }

    /// Direction transform (`w = 0`): ignores translation.
    pub fn transform_dir(&self, d: Vec3) -> Vec3 {
        self.transform(d, 0.0)
    }

    /// Local X axis (column 0).
    pub fn right(&self) -> Vec3 {
        Vec3::new(self.0[0], self.0[1], self.0[2])
    }

    /// Local Y axis (column 1). Turtles treat this as "up / forward".
    pub fn up(&self) -> Vec3 {
        Vec3::new(self.0[4], self.0[5], self.0[6])
    }

    /// Local Z axis (column 2).
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.0[8], self.0[9], self.0[10])
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.0[12], self.0[13], self.0[14])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn rotate_y_quarter_turn_maps_z_to_x() {
        let m = Mat4::IDENTITY.rotate_y(FRAC_PI_2);
        assert!(close(m.transform_dir(Vec3::Z), Vec3::X));
        assert!(close(m.transform_dir(Vec3::Y), Vec3::Y));
    }

    #[test]
    fn rotation_is_applied_in_local_frame() {
        // Tip the frame over so local Y points along world X, then spin about
        // local Y: the spin axis stays world X.
        let tipped = Mat4::IDENTITY.rotate(-FRAC_PI_2, Vec3::Z);
        assert!(close(tipped.up(), Vec3::X));
        let spun = tipped.rotate(PI, Vec3::Y);
        assert!(close(spun.up(), Vec3::X));
        assert!(close(spun.forward(), -Vec3::Z));
    }

    #[test]
    fn translate_moves_along_local_axes() {
        let m = Mat4::IDENTITY.rotate_y(FRAC_PI_2).translate(Vec3::new(0.0, 0.0, 2.0));
        assert!(close(m.translation(), Vec3::new(2.0, 0.0, 0.0)));
        // Directions ignore the translation, points do not.
        assert!(close(m.transform_dir(Vec3::Z), Vec3::X));
        assert!(close(m.transform_point(Vec3::ZERO), Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn zero_axis_rotation_is_identity() {
        let m = Mat4::IDENTITY.rotate_y(0.3);
        assert_eq!(m.rotate(1.0, Vec3::ZERO), m);
    }

    #[test]
    fn normalize_handles_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
        assert!((Vec3::new(3.0, 0.0, 4.0).normalize().length() - 1.0).abs() < 1e-6);
    }
}
