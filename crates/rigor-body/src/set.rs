//! Generational arena owning every body in a world.

use crate::body::Body;

/// Stable reference to a body in a [`BodySet`].
///
/// A handle stays valid until its body is removed; the slot may then be
/// reused, but with a new generation, so stale handles resolve to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    /// Slot index inside the owning set.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Owner of all bodies, addressed by [`BodyHandle`].
///
/// Iteration visits live bodies in slot order, which is the order
/// [`crate::State`] snapshots use.
#[derive(Debug, Clone, Default)]
pub struct BodySet {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    len: usize,
}

impl BodySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a body and return its handle.
    pub fn insert(&mut self, body: impl Into<Body>) -> BodyHandle {
        let body = body.into();
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            return BodyHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            body: Some(body),
        });
        BodyHandle {
            index,
            generation: 0,
        }
    }

    /// Remove a body. Unknown or stale handles are a no-op returning `None`.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<Body> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let body = slot.body.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        self.len -= 1;
        Some(body)
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.body.as_ref())
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.body.as_mut())
    }

    /// Borrow two distinct bodies mutably. `None` if either handle is stale
    /// or both refer to the same body.
    pub fn get2_mut(&mut self, a: BodyHandle, b: BodyHandle) -> Option<(&mut Body, &mut Body)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let (lo, hi, swapped) = if a.index < b.index {
            (a.index(), b.index(), false)
        } else {
            (b.index(), a.index(), true)
        };
        let (head, tail) = self.slots.split_at_mut(hi);
        let first = head[lo].body.as_mut()?;
        let second = tail[0].body.as_mut()?;
        if swapped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live bodies.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live bodies in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.body.as_ref().map(|b| {
                (
                    BodyHandle {
                        index: i as u32,
                        generation: s.generation,
                    },
                    b,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut Body)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            let generation = s.generation;
            s.body.as_mut().map(|b| {
                (
                    BodyHandle {
                        index: i as u32,
                        generation,
                    },
                    b,
                )
            })
        })
    }

    pub fn handles(&self) -> Vec<BodyHandle> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Zero every body's force and torque accumulators.
    pub fn clear_accumulators(&mut self) {
        for (_, body) in self.iter_mut() {
            body.clear_accumulators();
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Particle;
    use rigor_math::Vec3;

    fn particle(x: f64) -> Particle {
        Particle::new(Vec3::new(x, 0.0, 0.0), 1.0)
    }

    #[test]
    fn test_insert_and_get() {
        let mut set = BodySet::new();
        let a = set.insert(particle(1.0));
        let b = set.insert(particle(2.0));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(a).map(|b| b.position().x), Some(1.0));
        assert_eq!(set.get(b).map(|b| b.position().x), Some(2.0));
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut set = BodySet::new();
        let a = set.insert(particle(1.0));
        assert!(set.remove(a).is_some());
        let c = set.insert(particle(3.0));
        assert_eq!(a.index(), c.index());
        assert!(set.get(a).is_none());
        assert!(set.remove(a).is_none());
        assert_eq!(set.get(c).map(|b| b.position().x), Some(3.0));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_get2_mut_order_and_aliasing() {
        let mut set = BodySet::new();
        let a = set.insert(particle(1.0));
        let b = set.insert(particle(2.0));
        {
            let (bb, ba) = set.get2_mut(b, a).expect("distinct bodies");
            assert_eq!(bb.position().x, 2.0);
            assert_eq!(ba.position().x, 1.0);
        }
        assert!(set.get2_mut(a, a).is_none());
    }

    #[test]
    fn test_iter_skips_removed() {
        let mut set = BodySet::new();
        let a = set.insert(particle(1.0));
        let _b = set.insert(particle(2.0));
        set.remove(a);
        let xs: Vec<f64> = set.iter().map(|(_, b)| b.position().x).collect();
        assert_eq!(xs, vec![2.0]);
    }

    #[test]
    fn test_clear_accumulators() {
        let mut set = BodySet::new();
        let a = set.insert(particle(0.0));
        if let Some(b) = set.get_mut(a) {
            b.add_force(Vec3::new(1.0, 0.0, 0.0));
        }
        set.clear_accumulators();
        assert_eq!(set.get(a).map(|b| b.accumulated_force()), Some(Vec3::zeros()));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::particle::Particle;
    use proptest::prelude::*;
    use rigor_math::Vec3;

    proptest! {
        #[test]
        fn stale_handles_never_resolve(ops in prop::collection::vec(any::<bool>(), 1..64)) {
            let mut set = BodySet::new();
            let mut live = Vec::new();
            let mut dead = Vec::new();
            for (i, insert) in ops.into_iter().enumerate() {
                if insert || live.is_empty() {
                    live.push(set.insert(Particle::new(Vec3::new(i as f64, 0.0, 0.0), 1.0)));
                } else {
                    let h = live.swap_remove(i % live.len());
                    prop_assert!(set.remove(h).is_some());
                    dead.push(h);
                }
            }
            prop_assert_eq!(set.len(), live.len());
            for h in &live {
                prop_assert!(set.contains(*h));
            }
            for h in &dead {
                prop_assert!(set.get(*h).is_none());
            }
        }
    }
}
