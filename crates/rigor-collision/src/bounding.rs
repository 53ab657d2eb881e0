//! Bounding volumes for the broad phase.

use std::f64::consts::PI;

use rigor_body::Body;
use rigor_math::Vec3;

/// Relative slack allowed by containment checks.
const CONTAINMENT_TOLERANCE: f64 = 1e-9;

/// Capabilities a [`crate::Bvh`] needs from its node volumes.
pub trait BoundingVolume: Clone + std::fmt::Debug {
    /// Smallest volume of this kind enclosing both inputs.
    fn merge(a: &Self, b: &Self) -> Self;

    /// Whether the two volumes intersect. Symmetric.
    fn overlaps(&self, other: &Self) -> bool;

    /// How much this volume would have to grow to also enclose `other`.
    fn growth(&self, other: &Self) -> f64;

    /// Size metric used to order descent; larger volumes are split first.
    fn size(&self) -> f64;

    /// Whether `other` lies entirely inside this volume.
    fn contains(&self, other: &Self) -> bool;
}

/// Sphere bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f64,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Sphere centred on `body` enclosing its shape.
    pub fn around(body: &Body) -> Self {
        Self::new(body.position(), body.bounding_radius())
    }
}

impl BoundingVolume for BoundingSphere {
    fn merge(a: &Self, b: &Self) -> Self {
        let offset = b.center - a.center;
        let distance = offset.norm();

        // One sphere already encloses the other.
        if a.radius >= distance + b.radius {
            return *a;
        }
        if b.radius >= distance + a.radius {
            return *b;
        }

        let radius = (distance + a.radius + b.radius) * 0.5;
        let center = a.center + offset * ((radius - a.radius) / distance);
        Self { center, radius }
    }

    fn overlaps(&self, other: &Self) -> bool {
        let reach = self.radius + other.radius;
        (self.center - other.center).norm_squared() < reach * reach
    }

    /// Increase in diameter.
    fn growth(&self, other: &Self) -> f64 {
        let merged = Self::merge(self, other);
        merged.radius * 2.0 - self.radius * 2.0
    }

    fn size(&self) -> f64 {
        4.0 / 3.0 * PI * self.radius.powi(3)
    }

    fn contains(&self, other: &Self) -> bool {
        let distance = (other.center - self.center).norm();
        distance + other.radius <= self.radius + CONTAINMENT_TOLERANCE * (1.0 + self.radius)
    }
}

/// Axis-aligned box bound, stored as centre and half-extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl BoundingBox {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }
}

impl BoundingVolume for BoundingBox {
    fn merge(a: &Self, b: &Self) -> Self {
        Self::from_min_max(a.min().inf(&b.min()), a.max().sup(&b.max()))
    }

    fn overlaps(&self, other: &Self) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        d.x <= reach.x && d.y <= reach.y && d.z <= reach.z
    }

    /// Increase in summed edge lengths per axis.
    fn growth(&self, other: &Self) -> f64 {
        let merged = Self::merge(self, other);
        2.0 * (merged.half_extents.sum() - self.half_extents.sum())
    }

    fn size(&self) -> f64 {
        8.0 * self.half_extents.x * self.half_extents.y * self.half_extents.z
    }

    fn contains(&self, other: &Self) -> bool {
        let tol = CONTAINMENT_TOLERANCE * (1.0 + self.half_extents.amax());
        let (lo, hi) = (self.min(), self.max());
        let (olo, ohi) = (other.min(), other.max());
        (0..3).all(|i| olo[i] >= lo[i] - tol && ohi[i] <= hi[i] + tol)
    }
}
