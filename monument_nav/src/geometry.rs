// Small float vector types for level geometry.
//
// `Vec3` is a world-space point or direction, `Vec2` a screen-space point,
// and `Basis` a node's local frame (right/up/forward unit axes). The
// coordinate convention is left-handed, Y up:
// - X: right (positive) / left (negative)
// - Y: up    (positive) / down (negative)
// - Z: forward (positive) / back (negative)
//
// Only the handful of operations the graph builder and walkers need are
// implemented; this is not a general math library.
//
// See also: `perspective.rs` which projects `Vec3` to `Vec2`, `scene.rs`
// which raycasts against axis-aligned boxes, `nav.rs` for walk points.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const RIGHT: Self = Self::new(1.0, 0.0, 0.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Linear interpolation; `t` is clamped to [0, 1].
    pub fn lerp(self, to: Self, t: f32) -> Self {
        if t >= 1.0 {
            return to;
        }
        self + (to - self) * t.max(0.0)
    }

    /// Component by axis index (0 = x, 1 = y, 2 = z).
    pub fn axis(self, axis: usize) -> f32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// A point in screen space (pixels, origin bottom-left).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A node's local frame. Axes are expected to be orthonormal; nothing here
/// enforces it, authoring data is trusted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Basis {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl Basis {
    pub const IDENTITY: Self = Self {
        right: Vec3::RIGHT,
        up: Vec3::UP,
        forward: Vec3::FORWARD,
    };

    pub const fn new(right: Vec3, up: Vec3, forward: Vec3) -> Self {
        Self { right, up, forward }
    }

    /// Map a local-space vector into world space.
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.right * local.x + self.up * local.y + self.forward * local.z
    }

    /// The four horizontal cardinals in declaration order:
    /// forward, back, left, right.
    pub fn cardinals(&self) -> [Vec3; 4] {
        [self.forward, -self.forward, -self.right, self.right]
    }

    /// The two slope directions of a stair tile: up the steps
    /// (`forward + up`) and down the steps (`-(forward + up)`).
    pub fn stair_diagonals(&self) -> [Vec3; 2] {
        let ascend = (self.forward + self.up).normalized();
        [ascend, -ascend]
    }
}

impl Default for Basis {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_basis_maps_axes() {
        let b = Basis::IDENTITY;
        assert_eq!(b.to_world(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            b.cardinals(),
            [
                Vec3::FORWARD,
                -Vec3::FORWARD,
                -Vec3::RIGHT,
                Vec3::RIGHT,
            ]
        );
    }

    #[test]
    fn rotated_basis_maps_offset() {
        // Tile lying on a wall: local up points along world -X.
        let b = Basis::new(Vec3::UP, -Vec3::RIGHT, Vec3::FORWARD);
        assert_eq!(b.to_world(Vec3::new(0.0, 0.5, 0.0)), Vec3::new(-0.5, 0.0, 0.0));
    }

    #[test]
    fn stair_diagonals_are_opposite_units() {
        let [up, down] = Basis::IDENTITY.stair_diagonals();
        assert!((up.length() - 1.0).abs() < 1e-6);
        assert_eq!(up, -down);
        assert!(up.y > 0.0 && up.z > 0.0);
    }

    #[test]
    fn normalized_zero_stays_zero() {
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
    }

    #[test]
    fn lerp_clamps() {
        let a = Vec3::ZERO;
        let b = Vec3::new(2.0, 0.0, 0.0);
        assert_eq!(a.lerp(b, 0.5), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(a.lerp(b, 3.0), b);
    }

    #[test]
    fn screen_distance() {
        assert_eq!(Vec2::new(0.0, 0.0).distance(Vec2::new(3.0, 4.0)), 5.0);
    }
}
