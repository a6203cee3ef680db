//! Enemy ships
//!
//! Enemies descend at a fixed speed from the top edge and fire straight down
//! on a fixed interval. Spawning is the orchestrator's call.

use crate::consts::{ENEMY_EXIT_Y, ENEMY_MUZZLE_OFFSET, ENEMY_RADIUS, ENEMY_SPAWN_Y, MAX_FRAME_DT};
use crate::coords::{ScreenPos, VisualPos};
use crate::overlay::assets::ENEMY_MODEL;
use crate::overlay::proxy::placeholders;
use crate::overlay::{LoadTicket, VisualProxy};
use crate::tuning::Tuning;

use super::bullets::BulletGroup;
use super::entity::{EntityHandles, Stage};
use super::physics::BodyId;

/// A descending enemy ship
#[derive(Debug)]
pub struct Enemy {
    pub id: u32,
    pub spawn_x: f32,
    pos: VisualPos,
    /// Descent speed (pixels per second)
    speed: f32,
    fire_rate_ms: f64,
    bullet_speed: f32,
    last_fired: f64,
    last_tick: f64,
    handles: EntityHandles,
}

impl Enemy {
    /// Spawn at the top edge at visual x `x`
    pub fn spawn(id: u32, x: f32, stage: &mut Stage, tuning: &Tuning, now: f64) -> Self {
        let pos = VisualPos::new(x, ENEMY_SPAWN_Y);
        let handles =
            EntityHandles::create(stage, pos, ENEMY_RADIUS, placeholders::enemy(), ENEMY_MODEL);
        Self {
            id,
            spawn_x: x,
            pos,
            speed: tuning.enemy_speed,
            fire_rate_ms: tuning.enemy_fire_rate_ms,
            bullet_speed: tuning.enemy_bullet_speed,
            last_fired: now,
            last_tick: now,
            handles,
        }
    }

    /// Descend, maybe fire into `bullets`. Returns false once the ship has
    /// left through the bottom edge.
    pub fn tick(&mut self, now: f64, stage: &mut Stage, bullets: &mut BulletGroup) -> bool {
        if self.handles.is_destroyed() {
            return false;
        }
        let dt = (((now - self.last_tick) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT);
        self.last_tick = now;

        self.pos.0.y -= self.speed * dt;
        self.handles.sync(stage, self.pos);

        if now - self.last_fired >= self.fire_rate_ms {
            let muzzle = stage.viewport.to_screen(self.pos);
            bullets.spawn(
                ScreenPos::new(muzzle.x(), muzzle.y() + ENEMY_MUZZLE_OFFSET),
                self.bullet_speed,
            );
            self.last_fired = now;
        }

        self.pos.y() > ENEMY_EXIT_Y
    }

    /// Swap in the loaded model if `ticket` is this ship's load
    pub fn attach_model(
        &mut self,
        ticket: LoadTicket,
        model: VisualProxy,
        stage: &mut Stage,
    ) -> Result<(), VisualProxy> {
        self.handles.attach_model(ticket, model, stage, self.pos)
    }

    /// Release collider, proxy and pending load. Idempotent.
    pub fn destroy(&mut self, stage: &mut Stage) -> bool {
        self.handles.release(stage)
    }

    pub fn position(&self) -> VisualPos {
        self.pos
    }

    pub fn collider(&self) -> Option<BodyId> {
        self.handles.collider
    }

    pub fn pending_model(&self) -> Option<LoadTicket> {
        self.handles.pending_model
    }

    pub fn is_destroyed(&self) -> bool {
        self.handles.is_destroyed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::overlay::VisualOverlay;
    use crate::sim::bullets::Faction;
    use crate::sim::physics::PhysicsWorld;

    fn stage<'a>(physics: &'a mut PhysicsWorld, overlay: &'a mut VisualOverlay) -> Stage<'a> {
        Stage {
            physics,
            overlay,
            viewport: Viewport::default(),
        }
    }

    #[test]
    fn test_descends_and_reports_exit() {
        let mut physics = PhysicsWorld::new();
        let mut overlay = VisualOverlay::new(Viewport::default());
        let mut bullets = BulletGroup::new(Faction::Enemy);
        let tuning = Tuning {
            enemy_speed: 100.0,
            ..Tuning::default()
        };
        let mut enemy = Enemy::spawn(1, 0.0, &mut stage(&mut physics, &mut overlay), &tuning, 0.0);

        // 100px/s for 1s
        let mut now = 0.0;
        for _ in 0..10 {
            now += 100.0;
            assert!(enemy.tick(now, &mut stage(&mut physics, &mut overlay), &mut bullets));
        }
        assert!((enemy.position().y() - 200.0).abs() < 0.01);
        let body = physics.get(enemy.collider().expect("collider")).expect("body");
        assert!((body.pos.y() - 100.0).abs() < 0.01);

        // Run until it leaves at y <= -350
        let mut alive = true;
        let mut ticks = 0;
        while alive && ticks < 10_000 {
            now += 100.0;
            alive = enemy.tick(now, &mut stage(&mut physics, &mut overlay), &mut bullets);
            ticks += 1;
        }
        assert!(!alive);
        assert!(enemy.position().y() <= -350.0);
    }

    #[test]
    fn test_fires_downward_on_interval() {
        let mut physics = PhysicsWorld::new();
        let mut overlay = VisualOverlay::new(Viewport::default());
        let mut bullets = BulletGroup::new(Faction::Enemy);
        let tuning = Tuning::default();
        let mut enemy = Enemy::spawn(1, -100.0, &mut stage(&mut physics, &mut overlay), &tuning, 0.0);

        enemy.tick(tuning.enemy_fire_rate_ms - 1.0, &mut stage(&mut physics, &mut overlay), &mut bullets);
        assert!(bullets.is_empty());
        enemy.tick(tuning.enemy_fire_rate_ms, &mut stage(&mut physics, &mut overlay), &mut bullets);
        assert_eq!(bullets.len(), 1);

        let shot = bullets.iter().next().expect("bullet");
        assert!(shot.vel_y > 0.0);
        assert!((shot.pos.x() - 300.0).abs() < 0.01);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut physics = PhysicsWorld::new();
        let mut overlay = VisualOverlay::new(Viewport::default());
        let mut enemy = Enemy::spawn(7, 0.0, &mut stage(&mut physics, &mut overlay), &Tuning::default(), 0.0);
        assert!(enemy.destroy(&mut stage(&mut physics, &mut overlay)));
        assert!(!enemy.destroy(&mut stage(&mut physics, &mut overlay)));
        assert_eq!(physics.released_count(), 1);
        assert_eq!(overlay.disposed_count(), 1);

        let mut bullets = BulletGroup::new(Faction::Enemy);
        assert!(!enemy.tick(10_000.0, &mut stage(&mut physics, &mut overlay), &mut bullets));
        assert!(bullets.is_empty());
    }

    #[test]
    fn test_model_for_destroyed_enemy_is_dropped() {
        let mut physics = PhysicsWorld::new();
        let mut overlay = VisualOverlay::new(Viewport::default());
        let mut enemy = Enemy::spawn(1, 0.0, &mut stage(&mut physics, &mut overlay), &Tuning::default(), 0.0);
        let requests = overlay.loader.take_requests();
        enemy.destroy(&mut stage(&mut physics, &mut overlay));

        for req in requests {
            req.resolve(Ok(crate::overlay::ModelData {
                name: "late".into(),
                parts: vec![crate::overlay::Mesh::new(
                    crate::overlay::Shape::Box { size: 10.0 },
                    [1.0; 4],
                )],
            }));
        }
        assert!(overlay.advance(0.016, 0.0).is_empty());
        assert!(overlay.is_empty());
    }
}
