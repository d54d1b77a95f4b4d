//! Fixed-point world coordinates.
//!
//! Structure positions are stored in fixed-point so that the set of
//! neighbors found by a radius query is identical on every platform.
//! Economy quantities (rates, pools) stay `f32`; only the geometry is
//! fixed-point.

use fixed::types::{I32F32, I64F64};
use serde::{Deserialize, Serialize};

/// Fixed-point number type for world coordinates.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Wide fixed-point type for squared distances.
///
/// Squares of any [`Fixed`] radius fit without saturating.
pub type WideFixed = I64F64;

/// Fixed-point 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec3Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
    /// Z coordinate.
    #[serde(with = "fixed_serde")]
    pub z: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec3Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Create a vector from integer world units.
    #[must_use]
    pub fn from_units(x: i32, y: i32, z: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y), Fixed::from_num(z))
    }

    /// Create a vector from float world units, saturating at the fixed range.
    ///
    /// NaN coordinates map to zero.
    #[must_use]
    pub fn from_f32(x: f32, y: f32, z: f32) -> Self {
        Self::new(saturating_coord(x), saturating_coord(y), saturating_coord(z))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Computed in [`WideFixed`]; saturates only for points billions of
    /// units apart.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> WideFixed {
        let dx = wide_delta(self.x, other.x);
        let dy = wide_delta(self.y, other.y);
        let dz = wide_delta(self.z, other.z);
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .saturating_add(dz.saturating_mul(dz))
    }

    /// Euclidean distance in world units.
    ///
    /// IEEE square root is correctly rounded, so this stays reproducible.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        self.distance_squared(other).to_num::<f64>().sqrt() as f32
    }

    /// Check whether `other` lies within `radius` of this point (inclusive).
    #[must_use]
    pub fn within_radius(self, other: Self, radius: Fixed) -> bool {
        let radius = WideFixed::from_num(radius);
        self.distance_squared(other) <= radius.saturating_mul(radius)
    }
}

fn wide_delta(a: Fixed, b: Fixed) -> WideFixed {
    WideFixed::from_num(a) - WideFixed::from_num(b)
}

/// Convert a float to [`Fixed`], saturating at the range limits.
#[must_use]
pub fn saturating_coord(value: f32) -> Fixed {
    if value.is_nan() {
        Fixed::ZERO
    } else {
        Fixed::saturating_from_num(value)
    }
}

impl std::ops::Add for Vec3Fixed {
    type Output = Self;

    /// Component-wise, saturating at the fixed range.
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
            z: self.z.saturating_add(rhs.z),
        }
    }
}

impl std::ops::Sub for Vec3Fixed {
    type Output = Self;

    /// Component-wise, saturating at the fixed range.
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
            z: self.z.saturating_sub(rhs.z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_distance_squared() {
        let a = Vec3Fixed::from_units(3, 0, 0);
        let b = Vec3Fixed::from_units(0, 4, 12);
        // 3² + 4² + 12² = 169
        assert_eq!(a.distance_squared(b), WideFixed::from_num(169));
        assert!((a.distance(b) - 13.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_within_radius_is_inclusive() {
        let a = Vec3Fixed::ZERO;
        let b = Vec3Fixed::from_units(2000, 0, 0);
        assert!(a.within_radius(b, Fixed::from_num(2000)));
        assert!(!a.within_radius(b, Fixed::from_num(1999)));
    }

    #[test]
    fn test_distance_squared_saturates() {
        let a = Vec3Fixed::from_units(-2_000_000_000, 0, 0);
        let b = Vec3Fixed::from_units(2_000_000_000, 0, 0);
        assert_eq!(a.distance_squared(b), WideFixed::MAX);
    }

    #[test]
    fn test_far_points_keep_exact_distance() {
        let a = Vec3Fixed::ZERO;
        let b = Vec3Fixed::from_units(1_000_000, 0, 0);
        assert!((a.distance(b) - 1_000_000.0).abs() < f32::EPSILON);
        // A radius whose square exceeds the narrow range
        assert!(!a.within_radius(b, Fixed::from_num(60_000)));
        assert!(a.within_radius(b, Fixed::from_num(1_000_000)));
    }

    #[test]
    fn test_from_f32_matches_units() {
        assert_eq!(
            Vec3Fixed::from_f32(10.0, -20.0, 0.5),
            Vec3Fixed::new(
                Fixed::from_num(10),
                Fixed::from_num(-20),
                Fixed::from_num(0.5)
            )
        );
    }

    #[test]
    fn test_vec3_add_sub() {
        let a = Vec3Fixed::from_units(1, 2, 3);
        let b = Vec3Fixed::from_units(4, 5, 6);
        assert_eq!(a + b, Vec3Fixed::from_units(5, 7, 9));
        assert_eq!(b - a, Vec3Fixed::from_units(3, 3, 3));
    }

    #[test]
    fn test_vec3_add_saturates() {
        let a = Vec3Fixed::new(Fixed::MAX, Fixed::ZERO, Fixed::MIN);
        let b = Vec3Fixed::from_units(1, 0, 1);
        assert_eq!((a + b).x, Fixed::MAX);
        assert_eq!((a - b).z, Fixed::MIN);
    }
}
