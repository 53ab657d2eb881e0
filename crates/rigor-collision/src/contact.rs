//! Contact records and the capacity-bounded contact buffer.

use rigor_body::BodyHandle;
use rigor_math::{Mat3, Vec3};

/// One touching pair, produced fresh each step by the narrow phase.
///
/// `normal` points from `other` (or the static geometry) toward `body`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body: BodyHandle,
    /// Second body; `None` for contact with static geometry.
    pub other: Option<BodyHandle>,
    /// World-space contact point.
    pub point: Vec3,
    /// Unit contact normal.
    pub normal: Vec3,
    /// Overlap depth; positive means interpenetrating.
    pub penetration: f64,
    /// Coefficient of restitution in [0, 1].
    pub restitution: f64,
}

impl Contact {
    /// Body on side `i` (0 or 1).
    #[inline]
    pub fn body_at(&self, i: usize) -> Option<BodyHandle> {
        match i {
            0 => Some(self.body),
            1 => self.other,
            _ => None,
        }
    }

    /// Whether either side is `handle`.
    pub fn involves(&self, handle: BodyHandle) -> bool {
        self.body == handle || self.other == Some(handle)
    }

    /// Orthonormal contact basis; see [`contact_basis`].
    pub fn basis(&self) -> Mat3 {
        contact_basis(&self.normal)
    }
}

/// Orthonormal basis whose first column is `normal`.
///
/// The first tangent is built against whichever of world x or y is further
/// from the normal, so the cross product never degenerates.
pub fn contact_basis(normal: &Vec3) -> Mat3 {
    let n = normal;
    let (t0, t1) = if n.x.abs() > n.y.abs() {
        let s = 1.0 / (n.z * n.z + n.x * n.x).sqrt();
        let t0 = Vec3::new(n.z * s, 0.0, -n.x * s);
        let t1 = Vec3::new(n.y * t0.x, n.z * t0.x - n.x * t0.z, -n.y * t0.x);
        (t0, t1)
    } else {
        let s = 1.0 / (n.z * n.z + n.y * n.y).sqrt();
        let t0 = Vec3::new(0.0, -n.z * s, n.y * s);
        let t1 = Vec3::new(n.y * t0.z - n.z * t0.y, -n.x * t0.z, n.x * t0.y);
        (t0, t1)
    };
    Mat3::from_columns(&[*n, t0, t1])
}

/// Fixed-capacity contact buffer.
///
/// Allocated once; [`ContactGenerator::clear`] resets the live count
/// without releasing storage. Contacts offered past capacity are dropped.
#[derive(Debug, Clone)]
pub struct ContactGenerator {
    contacts: Vec<Contact>,
    capacity: usize,
    /// Restitution stamped on every generated contact.
    pub restitution: f64,
}

impl ContactGenerator {
    pub fn new(capacity: usize) -> Self {
        Self {
            contacts: Vec::with_capacity(capacity),
            capacity,
            restitution: 0.0,
        }
    }

    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution.clamp(0.0, 1.0);
        self
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.contacts.len() >= self.capacity
    }

    /// Free slots left this step.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.contacts.len())
    }

    /// Store a contact; returns `false` and drops it when full.
    pub fn push(&mut self, contact: Contact) -> bool {
        if self.is_full() {
            return false;
        }
        self.contacts.push(contact);
        true
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn contacts_mut(&mut self) -> &mut [Contact] {
        &mut self.contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rigor_body::{BodySet, Particle};

    fn assert_orthonormal(m: &Mat3) {
        assert_relative_eq!(m.transpose() * m, Mat3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_basis_is_orthonormal() {
        for n in [
            Vec3::x(),
            Vec3::y(),
            Vec3::z(),
            -Vec3::y(),
            Vec3::new(1.0, 2.0, 3.0).normalize(),
            Vec3::new(-3.0, 0.5, 0.1).normalize(),
        ] {
            let b = contact_basis(&n);
            assert_orthonormal(&b);
            assert_relative_eq!(b.column(0).into_owned(), n);
        }
    }

    #[test]
    fn test_sides_and_membership() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(Vec3::zeros(), 1.0));
        let b = bodies.insert(Particle::new(Vec3::x(), 1.0));
        let c = bodies.insert(Particle::new(Vec3::y(), 1.0));
        let pair = Contact {
            body: a,
            other: Some(b),
            point: Vec3::zeros(),
            normal: -Vec3::x(),
            penetration: 0.1,
            restitution: 0.0,
        };
        assert_eq!(pair.body_at(0), Some(a));
        assert_eq!(pair.body_at(1), Some(b));
        assert_eq!(pair.body_at(2), None);
        assert!(pair.involves(a) && pair.involves(b));
        assert!(!pair.involves(c));

        let against_ground = Contact { other: None, ..pair };
        assert_eq!(against_ground.body_at(1), None);
        assert!(!against_ground.involves(b));
    }

    #[test]
    fn test_generator_capacity() {
        let mut bodies = BodySet::new();
        let h = bodies.insert(Particle::new(Vec3::zeros(), 1.0));
        let contact = Contact {
            body: h,
            other: None,
            point: Vec3::zeros(),
            normal: Vec3::y(),
            penetration: 0.1,
            restitution: 0.0,
        };
        let mut g = ContactGenerator::new(2);
        assert!(g.push(contact));
        assert_eq!(g.remaining(), 1);
        assert!(g.push(contact));
        assert!(g.is_full());
        assert!(!g.push(contact));
        assert_eq!(g.len(), 2);
        g.clear();
        assert!(g.is_empty());
        assert_eq!(g.capacity(), 2);
    }
}
