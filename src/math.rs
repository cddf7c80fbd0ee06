//! Deterministic fixed-point mathematics for map-space coordinates.
//!
//! Mesh generation runs once per map load on every client of a lockstep
//! session, and downstream AI decisions read leaf centres and edge distances
//! straight out of the mesh. Fixed-point arithmetic keeps those values
//! bit-identical across platforms and architectures.

use bevy::prelude::*;
use fixed::types::I48F16;
use serde::{Deserialize, Serialize};

/// Fixed-point number type used throughout the mesh.
///
/// Uses I48F16 format: 48 bits for the integer part, 16 bits for the
/// fractional part, giving ~0.000015 precision over any plausible map extent.
pub type FixedNum = I48F16;

/// A point or displacement on the ground plane. `x` runs east, `z` runs south,
/// matching heightmap raster order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedVec2 {
    pub x: FixedNum,
    pub z: FixedNum,
}

impl FixedVec2 {
    pub const ZERO: Self = Self { x: FixedNum::ZERO, z: FixedNum::ZERO };

    pub fn new(x: FixedNum, z: FixedNum) -> Self {
        Self { x, z }
    }

    pub fn from_f32(x: f32, z: f32) -> Self {
        Self {
            x: FixedNum::from_num(x),
            z: FixedNum::from_num(z),
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x.to_num(), self.z.to_num())
    }

    pub fn length(self) -> FixedNum {
        let len_sq = self.length_squared();
        if len_sq == FixedNum::ZERO {
            return FixedNum::ZERO;
        }
        len_sq.sqrt()
    }

    pub fn length_squared(self) -> FixedNum {
        self.x * self.x + self.z * self.z
    }
}

impl std::ops::Add for FixedVec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self { x: self.x + rhs.x, z: self.z + rhs.z }
    }
}

impl std::ops::Sub for FixedVec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self { x: self.x - rhs.x, z: self.z - rhs.z }
    }
}

impl std::ops::Mul<FixedNum> for FixedVec2 {
    type Output = Self;
    fn mul(self, rhs: FixedNum) -> Self::Output {
        Self { x: self.x * rhs, z: self.z * rhs }
    }
}

impl std::ops::Neg for FixedVec2 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self { x: -self.x, z: -self.z }
    }
}

/// A full world-space position. `y` is elevation; the mesh only ever cares
/// about the ground-plane projection, see [`FixedVec3::xz`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedVec3 {
    pub x: FixedNum,
    pub y: FixedNum,
    pub z: FixedNum,
}

impl FixedVec3 {
    pub const ZERO: Self = Self {
        x: FixedNum::ZERO,
        y: FixedNum::ZERO,
        z: FixedNum::ZERO,
    };

    pub fn new(x: FixedNum, y: FixedNum, z: FixedNum) -> Self {
        Self { x, y, z }
    }

    pub fn from_f32(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: FixedNum::from_num(x),
            y: FixedNum::from_num(y),
            z: FixedNum::from_num(z),
        }
    }

    pub fn xz(self) -> FixedVec2 {
        FixedVec2 { x: self.x, z: self.z }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x.to_num(), self.y.to_num(), self.z.to_num())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_of_3_4_triangle() {
        let v = FixedVec2::from_f32(3.0, 4.0);
        let len = v.length();
        let diff = (len - FixedNum::from_num(5.0)).abs();
        assert!(diff < FixedNum::from_num(0.001), "Length should be ~5.0, got {}", len);
    }

    #[test]
    fn test_length_zero() {
        assert_eq!(FixedVec2::ZERO.length(), FixedNum::ZERO);
    }

    #[test]
    fn test_sub_and_neg_are_antisymmetric() {
        let a = FixedVec2::from_f32(2.0, 7.0);
        let b = FixedVec2::from_f32(5.0, 3.0);
        assert_eq!(a - b, -(b - a));
    }

    #[test]
    fn test_vec3_ground_projection() {
        let p = FixedVec3::from_f32(12.5, 80.0, 3.25);
        let flat = p.xz();
        assert_eq!(flat.x, FixedNum::from_num(12.5));
        assert_eq!(flat.z, FixedNum::from_num(3.25));
    }

    #[test]
    fn test_bevy_conversion() {
        let v = FixedVec2::from_f32(1.5, -2.0);
        let bevy = v.to_vec2();
        assert_eq!(bevy.x, 1.5);
        assert_eq!(bevy.y, -2.0);
    }
}
