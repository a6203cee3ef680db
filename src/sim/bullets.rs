//! Bullet groups
//!
//! Each faction owns one group. Bullets move vertically in screen space and
//! are removed either by leaving the visible band or by a hit; whichever
//! happens first wins and the second removal is a no-op.

use serde::{Deserialize, Serialize};

use crate::consts::BULLET_RADIUS;
use crate::coords::ScreenPos;

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
}

/// A projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub pos: ScreenPos,
    /// Vertical velocity in pixels per second (negative = up)
    pub vel_y: f32,
    pub radius: f32,
}

/// Container for one faction's bullets (sorted by id)
#[derive(Debug, Clone)]
pub struct BulletGroup {
    pub faction: Faction,
    bullets: Vec<Bullet>,
    next_id: u32,
    destroyed: u64,
}

impl BulletGroup {
    pub fn new(faction: Faction) -> Self {
        Self {
            faction,
            bullets: Vec::new(),
            next_id: 0,
            destroyed: 0,
        }
    }

    /// Fire a bullet from `pos`
    pub fn spawn(&mut self, pos: ScreenPos, vel_y: f32) -> u32 {
        self.next_id += 1;
        let id = self.next_id;
        self.bullets.push(Bullet {
            id,
            pos,
            vel_y,
            radius: BULLET_RADIUS,
        });
        id
    }

    /// Integrate movement
    pub fn advance(&mut self, dt: f32) {
        for bullet in &mut self.bullets {
            bullet.pos.0.y += bullet.vel_y * dt;
        }
    }

    /// Remove bullets whose y left `[min_y, max_y]`. Returns how many went.
    pub fn cull_outside(&mut self, min_y: f32, max_y: f32) -> usize {
        let before = self.bullets.len();
        self.bullets
            .retain(|b| b.pos.0.y >= min_y && b.pos.0.y <= max_y);
        let culled = before - self.bullets.len();
        self.destroyed += culled as u64;
        culled
    }

    /// Remove a bullet by id. Returns false if it was already gone.
    pub fn destroy(&mut self, id: u32) -> bool {
        match self.bullets.binary_search_by_key(&id, |b| b.id) {
            Ok(i) => {
                self.bullets.remove(i);
                self.destroyed += 1;
                true
            }
            Err(_) => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bullet> {
        self.bullets.iter()
    }

    pub fn len(&self) -> usize {
        self.bullets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }

    /// Bullets removed over the group's lifetime
    pub fn destroyed_count(&self) -> u64 {
        self.destroyed
    }

    pub fn clear(&mut self) {
        self.destroyed += self.bullets.len() as u64;
        self.bullets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_and_cull() {
        let mut group = BulletGroup::new(Faction::Player);
        group.spawn(ScreenPos::new(400.0, 10.0), -400.0);
        group.spawn(ScreenPos::new(400.0, 300.0), -400.0);

        // 0.2s at 400px/s: first bullet ends at y=-70, second at y=220
        group.advance(0.2);
        assert_eq!(group.cull_outside(-50.0, f32::MAX), 1);
        assert_eq!(group.len(), 1);
        assert!((group.iter().next().map(|b| b.pos.y()).unwrap_or(0.0) - 220.0).abs() < 0.01);
    }

    #[test]
    fn test_destroy_at_most_once() {
        let mut group = BulletGroup::new(Faction::Enemy);
        let id = group.spawn(ScreenPos::new(0.0, 700.0), 300.0);
        // Culled by bounds first...
        assert_eq!(group.cull_outside(f32::MIN, 650.0), 1);
        // ...then the collision path finds nothing to destroy
        assert!(!group.destroy(id));
        assert_eq!(group.destroyed_count(), 1);
    }
}
