//! Small value types shared by the mesh queries.
//!
//! Positions and offsets are stored as plain `[f64; 3]` arrays on the data model so
//! they serialize unchanged; these types only exist while computing.

use std::ops::{Add, Mul, Sub};

/// Offset or direction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Location.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

macro_rules! impl_xyz {
    ($ty:ident) => {
        impl $ty {
            #[must_use]
            pub const fn new(x: f64, y: f64, z: f64) -> Self {
                Self { x, y, z }
            }

            #[must_use]
            pub const fn from_array([x, y, z]: [f64; 3]) -> Self {
                Self { x, y, z }
            }

            #[must_use]
            pub const fn to_array(self) -> [f64; 3] {
                [self.x, self.y, self.z]
            }

            #[must_use]
            pub fn is_finite(self) -> bool {
                self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
            }
        }

        impl From<[f64; 3]> for $ty {
            fn from(arr: [f64; 3]) -> Self {
                Self::from_array(arr)
            }
        }

        impl From<$ty> for [f64; 3] {
            fn from(v: $ty) -> Self {
                v.to_array()
            }
        }
    };
}

impl_xyz!(Vec3);
impl_xyz!(Point3);

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[must_use]
    pub const fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    #[must_use]
    pub const fn length_squared(self) -> f64 {
        self.dot(self)
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
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

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Point3 {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub fn distance_squared_to(self, other: Self) -> f64 {
        (self - other).length_squared()
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Mean of `points`, `None` when there are none.
    #[must_use]
    pub fn centroid(points: impl IntoIterator<Item = Self>) -> Option<Self> {
        let (sum, count) = points
            .into_iter()
            .fold((Vec3::ZERO, 0usize), |(sum, n), p| (sum + (p - Self::ORIGIN), n + 1));
        (count > 0).then(|| Self::ORIGIN + sum * (1.0 / count as f64))
    }
}

impl Add<Vec3> for Point3 {
    type Output = Self;
    fn add(self, v: Vec3) -> Self {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl Sub for Point3 {
    type Output = Vec3;
    fn sub(self, rhs: Self) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Point3,
    pub max: Point3,
}

impl BBox {
    #[must_use]
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Degenerate box holding a single point.
    #[must_use]
    pub const fn around(p: Point3) -> Self {
        Self::new(p, p)
    }

    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::around(*first), |bbox, &p| bbox.union(Self::around(p))))
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::new(
            Point3::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y), self.min.z.min(other.min.z)),
            Point3::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y), self.max.z.max(other.max.z)),
        )
    }

    #[must_use]
    pub fn center(self) -> Point3 {
        self.min + (self.max - self.min) * 0.5
    }

    /// Coordinate of the center along axis 0, 1 or 2.
    #[must_use]
    pub fn center_on(self, axis: usize) -> f64 {
        self.center().to_array()[axis.min(2)]
    }

    /// Index of the longest side.
    #[must_use]
    pub fn longest_axis(self) -> usize {
        let extent = (self.max - self.min).to_array();
        (0..3).fold(0, |best, axis| if extent[axis] > extent[best] { axis } else { best })
    }

    /// Squared distance to `point`, zero inside.
    #[must_use]
    pub fn distance_squared_to_point(self, point: Point3) -> f64 {
        let below = self.min - point;
        let above = point - self.max;
        Vec3::new(below.x.max(above.x).max(0.0), below.y.max(above.y).max(0.0), below.z.max(above.z).max(0.0)).length_squared()
    }
}

/// Absolute comparison tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    pub const DEFAULT: Self = Self { eps: 1e-9 };
    /// Degenerate triangles and zero-length edges.
    pub const ZERO_LENGTH: Self = Self { eps: 1e-12 };
    /// Sums of barycentric or influence weights.
    pub const WEIGHTS: Self = Self { eps: 1e-5 };

    #[must_use]
    pub fn approx_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.eps
    }

    #[must_use]
    pub fn is_zero_length(self, len: f64) -> bool {
        len.abs() <= self.eps
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
