//! Closed-form contact generation for sphere, box and half-space pairs.
//!
//! Every detector returns at most one [`Contact`]. Coincident sphere centres
//! yield no contact rather than a NaN normal.

use rigor_body::BodySet;
use rigor_math::{Vec3, axis, transform_direction, transform_inverse_point, transform_point};

use crate::contact::{Contact, ContactGenerator};
use crate::primitive::{HalfSpace, Placed, Primitive, WorldBox, WorldSphere};

/// Distances below this are treated as coincident.
const DEGENERATE_DISTANCE: f64 = 1e-12;

/// Cheap overlap test for two spheres.
pub fn intersects_sphere_sphere(a: &WorldSphere, b: &WorldSphere) -> bool {
    let reach = a.radius + b.radius;
    (a.center - b.center).norm_squared() < reach * reach
}

/// Cheap overlap test for a sphere and a half-space.
pub fn intersects_sphere_half_space(sphere: &WorldSphere, plane: &HalfSpace) -> bool {
    plane.signed_distance(&sphere.center) < sphere.radius
}

/// Cheap overlap test for a box and a half-space, using the box's extent
/// projected onto the plane normal.
pub fn intersects_box_half_space(b: &WorldBox, plane: &HalfSpace) -> bool {
    let projected_radius = (0..3)
        .map(|i| b.half_extents[i] * axis(&b.transform, i).dot(&plane.normal).abs())
        .sum::<f64>();
    let center = axis(&b.transform, 3);
    plane.signed_distance(&center) <= projected_radius
}

/// Sphere against sphere; `a` is the first body and the normal points from
/// `b` to `a`.
pub fn sphere_sphere(a: &WorldSphere, b: &WorldSphere, restitution: f64) -> Option<Contact> {
    if a.body == b.body || !intersects_sphere_sphere(a, b) {
        return None;
    }
    let midline = a.center - b.center;
    let distance = midline.norm();
    if distance <= DEGENERATE_DISTANCE {
        return None;
    }
    Some(Contact {
        body: a.body,
        other: Some(b.body),
        point: b.center + midline * 0.5,
        normal: midline / distance,
        penetration: a.radius + b.radius - distance,
        restitution,
    })
}

/// Sphere against static half-space; normal is the plane normal.
pub fn sphere_half_space(sphere: &WorldSphere, plane: &HalfSpace, restitution: f64) -> Option<Contact> {
    let distance = plane.signed_distance(&sphere.center);
    if distance >= sphere.radius {
        return None;
    }
    Some(Contact {
        body: sphere.body,
        other: None,
        point: sphere.center - plane.normal * distance,
        normal: plane.normal,
        penetration: sphere.radius - distance,
        restitution,
    })
}

/// Box against sphere; the box is the first body and the normal points from
/// the sphere toward the box.
pub fn box_sphere(b: &WorldBox, sphere: &WorldSphere, restitution: f64) -> Option<Contact> {
    if b.body == sphere.body {
        return None;
    }
    let h = b.half_extents;
    let r = sphere.radius;
    let local = transform_inverse_point(&b.transform, &sphere.center);

    // Separating axis along any box face.
    if local.x.abs() - r > h.x || local.y.abs() - r > h.y || local.z.abs() - r > h.z {
        return None;
    }

    let closest = Vec3::new(
        local.x.clamp(-h.x, h.x),
        local.y.clamp(-h.y, h.y),
        local.z.clamp(-h.z, h.z),
    );
    let dist_sq = (closest - local).norm_squared();
    if dist_sq > r * r {
        return None;
    }
    let distance = dist_sq.sqrt();
    if distance <= DEGENERATE_DISTANCE {
        return Some(sphere_centre_in_box(b, sphere, &local, restitution));
    }

    let closest_world = transform_point(&b.transform, &closest);
    Some(Contact {
        body: b.body,
        other: Some(sphere.body),
        point: closest_world,
        normal: (closest_world - sphere.center) / distance,
        penetration: r - distance,
        restitution,
    })
}

/// The sphere's centre lies inside the box: push it out through the nearest
/// face.
fn sphere_centre_in_box(b: &WorldBox, sphere: &WorldSphere, local: &Vec3, restitution: f64) -> Contact {
    let h = b.half_extents;
    let (face, depth) = (0..3)
        .map(|i| (i, h[i] - local[i].abs()))
        .fold((0, f64::INFINITY), |best, candidate| {
            if candidate.1 < best.1 { candidate } else { best }
        });
    let side = if local[face] < 0.0 { -1.0 } else { 1.0 };

    let mut outward = Vec3::zeros();
    outward[face] = side;
    let mut on_face = *local;
    on_face[face] = side * h[face];

    Contact {
        body: b.body,
        other: Some(sphere.body),
        point: transform_point(&b.transform, &on_face),
        normal: -transform_direction(&b.transform, &outward),
        penetration: sphere.radius + depth,
        restitution,
    }
}

/// Box against static half-space: the single deepest vertex.
pub fn box_half_space(b: &WorldBox, plane: &HalfSpace, restitution: f64) -> Option<Contact> {
    if !intersects_box_half_space(b, plane) {
        return None;
    }
    let (vertex, distance) = b
        .vertices()
        .into_iter()
        .map(|v| (v, plane.signed_distance(&v)))
        .min_by(|x, y| x.1.total_cmp(&y.1))?;
    if distance >= 0.0 {
        return None;
    }
    Some(Contact {
        body: b.body,
        other: None,
        point: vertex,
        normal: plane.normal,
        penetration: -distance,
        restitution,
    })
}

/// Contact between two placed primitives, in either order.
pub fn detect(a: &Placed, b: &Placed, restitution: f64) -> Option<Contact> {
    match (a, b) {
        (Placed::Sphere(a), Placed::Sphere(b)) => sphere_sphere(a, b, restitution),
        (Placed::Sphere(s), Placed::HalfSpace(p)) | (Placed::HalfSpace(p), Placed::Sphere(s)) => {
            sphere_half_space(s, p, restitution)
        }
        (Placed::Cuboid(c), Placed::Sphere(s)) | (Placed::Sphere(s), Placed::Cuboid(c)) => {
            box_sphere(c, s, restitution)
        }
        (Placed::Cuboid(c), Placed::HalfSpace(p)) | (Placed::HalfSpace(p), Placed::Cuboid(c)) => {
            box_half_space(c, p, restitution)
        }
        (Placed::Cuboid(_), Placed::Cuboid(_)) | (Placed::HalfSpace(_), Placed::HalfSpace(_)) => None,
    }
}

impl ContactGenerator {
    /// Run the matching detector for `a` and `b` and store the result.
    /// Returns the number of contacts written (0 or 1); nothing is written
    /// once the buffer is full.
    pub fn generate(&mut self, a: &Primitive, b: &Primitive, bodies: &BodySet) -> usize {
        if self.is_full() {
            return 0;
        }
        let (Some(pa), Some(pb)) = (a.placed(bodies), b.placed(bodies)) else {
            return 0;
        };
        match detect(&pa, &pb, self.restitution) {
            Some(contact) => usize::from(self.push(contact)),
            None => 0,
        }
    }
}
