//! Circle colliders and overlap queries
//!
//! Colliders live in screen space and carry no velocity: entities own their
//! motion and push positions in every tick. A body id is released at most
//! once; releasing it again reports `false` instead of touching another body.

use glam::Vec2;

use crate::coords::ScreenPos;

/// Handle to a collider in the [`PhysicsWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u32);

/// A circular collision body
#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub pos: ScreenPos,
    pub radius: f32,
}

/// Check if two circles overlap (touching counts)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}

/// Collider store (sorted by id for deterministic iteration)
#[derive(Debug, Default)]
pub struct PhysicsWorld {
    bodies: Vec<Body>,
    next_id: u32,
    released: u64,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a circular collider
    pub fn spawn_circle(&mut self, pos: ScreenPos, radius: f32) -> BodyId {
        self.next_id += 1;
        let id = BodyId(self.next_id);
        self.bodies.push(Body { id, pos, radius });
        id
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.binary_search_by_key(&id, |b| b.id).ok()
    }

    /// Release a collider. Returns false if it was already gone.
    pub fn remove(&mut self, id: BodyId) -> bool {
        match self.index_of(id) {
            Some(i) => {
                self.bodies.remove(i);
                self.released += 1;
                true
            }
            None => false,
        }
    }

    /// Move a collider. Returns false for an unknown id.
    pub fn set_position(&mut self, id: BodyId, pos: ScreenPos) -> bool {
        match self.index_of(id) {
            Some(i) => {
                self.bodies[i].pos = pos;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.index_of(id).map(|i| &self.bodies[i])
    }

    /// Does the collider overlap a circle at `pos`?
    pub fn overlaps_circle(&self, id: BodyId, pos: ScreenPos, radius: f32) -> bool {
        self.get(id)
            .map(|b| circles_overlap(b.pos.0, b.radius, pos.0, radius))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Total colliders released over the world's lifetime
    pub fn released_count(&self) -> u64 {
        self.released
    }

    /// Drop every collider (scene teardown)
    pub fn clear(&mut self) {
        self.released += self.bodies.len() as u64;
        self.bodies.clear();
    }
}
