//! Collision primitives attached to bodies.

use rigor_body::{Body, BodyHandle, BodySet};
use rigor_math::{Mat4, Vec3};

/// Collision geometry.
///
/// Spheres and cuboids ride on a body and are centred on its position;
/// half-spaces are static world geometry and belong to no body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Sphere { body: BodyHandle, radius: f64 },
    Cuboid { body: BodyHandle, half_extents: Vec3 },
    /// Solid region `normal · p <= offset`. `normal` must be unit length.
    HalfSpace { normal: Vec3, offset: f64 },
}

impl Primitive {
    /// Horizontal ground plane at height `y`.
    pub fn ground(y: f64) -> Self {
        Primitive::HalfSpace {
            normal: Vec3::y(),
            offset: y,
        }
    }

    /// Bounding sphere of the body's shape, if it has any extent.
    pub fn for_body(handle: BodyHandle, body: &Body) -> Option<Self> {
        let radius = body.bounding_radius();
        (radius > 0.0).then_some(Primitive::Sphere {
            body: handle,
            radius,
        })
    }

    pub fn body(&self) -> Option<BodyHandle> {
        match self {
            Primitive::Sphere { body, .. } | Primitive::Cuboid { body, .. } => Some(*body),
            Primitive::HalfSpace { .. } => None,
        }
    }

    /// Radius of a body-centred sphere enclosing the primitive. Infinite
    /// for half-spaces.
    pub fn bounding_radius(&self) -> f64 {
        match self {
            Primitive::Sphere { radius, .. } => *radius,
            Primitive::Cuboid { half_extents, .. } => half_extents.norm(),
            Primitive::HalfSpace { .. } => f64::INFINITY,
        }
    }

    /// World-space geometry at the owning body's current pose. `None` if the
    /// body is gone.
    pub fn placed(&self, bodies: &BodySet) -> Option<Placed> {
        match *self {
            Primitive::Sphere { body, radius } => {
                let b = bodies.get(body)?;
                Some(Placed::Sphere(WorldSphere {
                    body,
                    center: b.position(),
                    radius,
                }))
            }
            Primitive::Cuboid { body, half_extents } => {
                let b = bodies.get(body)?;
                Some(Placed::Cuboid(WorldBox {
                    body,
                    transform: b.transform(),
                    half_extents,
                }))
            }
            Primitive::HalfSpace { normal, offset } => Some(Placed::HalfSpace(HalfSpace { normal, offset })),
        }
    }
}

/// Sphere at a world position.
#[derive(Debug, Clone, Copy)]
pub struct WorldSphere {
    pub body: BodyHandle,
    pub center: Vec3,
    pub radius: f64,
}

/// Oriented box with its body's world transform.
#[derive(Debug, Clone, Copy)]
pub struct WorldBox {
    pub body: BodyHandle,
    pub transform: Mat4,
    pub half_extents: Vec3,
}

impl WorldBox {
    /// The eight corners in world space.
    pub fn vertices(&self) -> [Vec3; 8] {
        let h = self.half_extents;
        let mut out = [Vec3::zeros(); 8];
        for (i, v) in out.iter_mut().enumerate() {
            let local = Vec3::new(
                if i & 1 == 0 { -h.x } else { h.x },
                if i & 2 == 0 { -h.y } else { h.y },
                if i & 4 == 0 { -h.z } else { h.z },
            );
            *v = rigor_math::transform_point(&self.transform, &local);
        }
        out
    }
}

/// Static half-space.
#[derive(Debug, Clone, Copy)]
pub struct HalfSpace {
    pub normal: Vec3,
    pub offset: f64,
}

impl HalfSpace {
    /// Signed distance of `p` above the boundary plane.
    #[inline]
    pub fn signed_distance(&self, p: &Vec3) -> f64 {
        self.normal.dot(p) - self.offset
    }
}

/// A primitive resolved against the body set.
#[derive(Debug, Clone, Copy)]
pub enum Placed {
    Sphere(WorldSphere),
    Cuboid(WorldBox),
    HalfSpace(HalfSpace),
}

/// Stable reference to a primitive in a [`PrimitiveSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveHandle {
    index: u32,
    generation: u32,
}

impl PrimitiveHandle {
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    primitive: Option<Primitive>,
}

/// Owner of all collision primitives in a world.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveSet {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    len: usize,
}

impl PrimitiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, primitive: Primitive) -> PrimitiveHandle {
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.primitive = Some(primitive);
            return PrimitiveHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            primitive: Some(primitive),
        });
        PrimitiveHandle { index, generation: 0 }
    }

    pub fn remove(&mut self, handle: PrimitiveHandle) -> Option<Primitive> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let primitive = slot.primitive.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        self.len -= 1;
        Some(primitive)
    }

    pub fn get(&self, handle: PrimitiveHandle) -> Option<&Primitive> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.primitive.as_ref())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveHandle, &Primitive)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.primitive.as_ref().map(|p| {
                (
                    PrimitiveHandle {
                        index: i as u32,
                        generation: s.generation,
                    },
                    p,
                )
            })
        })
    }

    /// Handles of every primitive attached to `body`.
    pub fn attached_to(&self, body: BodyHandle) -> Vec<PrimitiveHandle> {
        self.iter()
            .filter(|(_, p)| p.body() == Some(body))
            .map(|(h, _)| h)
            .collect()
    }
}
