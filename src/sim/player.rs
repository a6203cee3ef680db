//! The player's ship
//!
//! Position is held in visual space; pointer targets arrive in screen space
//! and pass through the viewport conversion. Fires automatically while alive.

use crate::consts::{
    DAMAGE_FLASH_MS, MAX_FRAME_DT, PLAYER_BULLET_CULL_Y, PLAYER_RADIUS, PLAYER_START_X,
    PLAYER_START_Y,
};
use crate::coords::{ScreenPos, VisualPos};
use crate::overlay::assets::PLAYER_MODEL;
use crate::overlay::proxy::placeholders;
use crate::overlay::{LoadTicket, VisualProxy};
use crate::tuning::{PlayfieldBounds, Tuning};

use super::bullets::{BulletGroup, Faction};
use super::entity::{EntityHandles, Stage};
use super::physics::BodyId;

/// Damage flash color
pub const FLASH_TINT: [f32; 4] = [1.0, 0.15, 0.15, 1.0];

/// The player ship
#[derive(Debug)]
pub struct Player {
    pos: VisualPos,
    health: u32,
    alive: bool,
    fire_rate_ms: f64,
    bullet_speed: f32,
    bounds: Option<PlayfieldBounds>,
    last_fired: f64,
    last_tick: Option<f64>,
    flash_until: Option<f64>,
    flash_enabled: bool,
    tinted: bool,
    /// Bullets fired by this ship
    pub bullets: BulletGroup,
    handles: EntityHandles,
}

impl Player {
    /// Spawn at the start position with full health
    pub fn spawn(stage: &mut Stage, tuning: &Tuning, now: f64) -> Self {
        let pos = VisualPos::new(PLAYER_START_X, PLAYER_START_Y);
        let handles = EntityHandles::create(
            stage,
            pos,
            PLAYER_RADIUS,
            placeholders::player(),
            PLAYER_MODEL,
        );
        Self {
            pos,
            health: tuning.max_health,
            alive: tuning.max_health > 0,
            fire_rate_ms: tuning.player_fire_rate_ms,
            bullet_speed: tuning.player_bullet_speed,
            bounds: tuning.clamp_player.then_some(tuning.bounds),
            last_fired: now,
            last_tick: None,
            flash_until: None,
            flash_enabled: true,
            tinted: false,
            bullets: BulletGroup::new(Faction::Player),
            handles,
        }
    }

    pub fn set_flash_enabled(&mut self, enabled: bool) {
        self.flash_enabled = enabled;
    }

    /// Jump to a pointer target (no interpolation), clamped if bounded
    pub fn move_to(&mut self, target: ScreenPos, stage: &mut Stage) {
        if self.handles.is_destroyed() {
            log::debug!("move_to on a destroyed player ignored");
            return;
        }
        let mut pos = stage.viewport.to_visual(target);
        if let Some(b) = self.bounds {
            pos.0.x = pos.0.x.clamp(b.min_x, b.max_x);
            pos.0.y = pos.0.y.clamp(b.min_y, b.max_y);
        }
        self.pos = pos;
        self.handles.sync(stage, self.pos);
    }

    /// Fire on cadence, advance and cull own bullets, refresh visuals
    pub fn tick(&mut self, now: f64, stage: &mut Stage) {
        let dt = match self.last_tick {
            Some(prev) => (((now - prev) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT),
            None => 0.0,
        };
        self.last_tick = Some(now);

        if self.alive && !self.handles.is_destroyed() && now - self.last_fired >= self.fire_rate_ms
        {
            let muzzle = stage.viewport.to_screen(self.pos);
            self.bullets.spawn(muzzle, -self.bullet_speed);
            self.last_fired = now;
        }

        self.bullets.advance(dt);
        self.bullets.cull_outside(PLAYER_BULLET_CULL_Y, f32::INFINITY);

        self.refresh_visual(now, stage);
    }

    /// Apply damage. Returns whether the ship is still alive.
    pub fn take_damage(&mut self, amount: u32, now: f64) -> bool {
        if !self.alive {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.alive = false;
        }
        if self.flash_enabled {
            self.flash_until = Some(now + DAMAGE_FLASH_MS);
        }
        self.alive
    }

    /// Sync collider/proxy position and the damage flash tint
    pub fn refresh_visual(&mut self, now: f64, stage: &mut Stage) {
        self.handles.sync(stage, self.pos);

        let flashing = self.flash_until.is_some_and(|until| now < until);
        if !flashing {
            self.flash_until = None;
        }
        if flashing != self.tinted {
            if let Some(proxy) = self.handles.proxy {
                stage
                    .overlay
                    .set_tint(proxy, flashing.then_some(FLASH_TINT));
            }
            self.tinted = flashing;
        }
    }

    /// Swap in the loaded model if `ticket` is this ship's load
    pub fn attach_model(
        &mut self,
        ticket: LoadTicket,
        model: VisualProxy,
        stage: &mut Stage,
    ) -> Result<(), VisualProxy> {
        self.handles.attach_model(ticket, model, stage, self.pos)?;
        // A fresh proxy has no tint; re-apply on the next refresh
        self.tinted = false;
        Ok(())
    }

    /// Release collider, proxy, pending load and bullets. Idempotent.
    pub fn destroy(&mut self, stage: &mut Stage) -> bool {
        let released = self.handles.release(stage);
        if released {
            self.bullets.clear();
        }
        released
    }

    pub fn position(&self) -> VisualPos {
        self.pos
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_destroyed(&self) -> bool {
        self.handles.is_destroyed()
    }

    pub fn collider(&self) -> Option<BodyId> {
        self.handles.collider
    }

    pub fn pending_model(&self) -> Option<LoadTicket> {
        self.handles.pending_model
    }

    pub fn is_flashing(&self) -> bool {
        self.tinted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::overlay::VisualOverlay;
    use crate::sim::physics::PhysicsWorld;
    use proptest::prelude::*;

    struct Worlds {
        physics: PhysicsWorld,
        overlay: VisualOverlay,
    }

    impl Worlds {
        fn new() -> Self {
            Self {
                physics: PhysicsWorld::new(),
                overlay: VisualOverlay::new(Viewport::default()),
            }
        }

        fn stage(&mut self) -> Stage<'_> {
            Stage {
                physics: &mut self.physics,
                overlay: &mut self.overlay,
                viewport: Viewport::default(),
            }
        }
    }

    #[test]
    fn test_spawn_syncs_collider_and_proxy() {
        let mut w = Worlds::new();
        let player = Player::spawn(&mut w.stage(), &Tuning::default(), 0.0);
        let body = w.physics.get(player.collider().expect("collider")).expect("body");
        assert_eq!(body.pos, ScreenPos::new(400.0, 500.0));
        assert_eq!(w.overlay.len(), 1);
        assert!(player.pending_model().is_some());
    }

    #[test]
    fn test_move_to_clamps_and_syncs() {
        let mut w = Worlds::new();
        let mut tuning = Tuning::default();
        tuning.bounds = PlayfieldBounds {
            min_x: -300.0,
            max_x: 300.0,
            min_y: -250.0,
            max_y: 0.0,
        };
        let mut player = Player::spawn(&mut w.stage(), &tuning, 0.0);

        player.move_to(ScreenPos::new(790.0, 50.0), &mut w.stage());
        assert_eq!(player.position(), VisualPos::new(300.0, 0.0));

        let body = w.physics.get(player.collider().expect("collider")).expect("body");
        assert_eq!(body.pos, ScreenPos::new(700.0, 300.0));
    }

    #[test]
    fn test_unclamped_move() {
        let mut w = Worlds::new();
        let tuning = Tuning {
            clamp_player: false,
            ..Tuning::default()
        };
        let mut player = Player::spawn(&mut w.stage(), &tuning, 0.0);
        player.move_to(ScreenPos::new(-100.0, 700.0), &mut w.stage());
        assert_eq!(player.position(), VisualPos::new(-500.0, -400.0));
    }

    #[test]
    fn test_fires_on_cadence_and_culls() {
        let mut w = Worlds::new();
        let mut player = Player::spawn(&mut w.stage(), &Tuning::default(), 0.0);

        player.tick(100.0, &mut w.stage());
        assert_eq!(player.bullets.len(), 0);
        player.tick(200.0, &mut w.stage());
        assert_eq!(player.bullets.len(), 1);
        player.tick(300.0, &mut w.stage());
        assert_eq!(player.bullets.len(), 1);

        // Bullets at 400px/s from y=500 leave the top after ~1.4s
        let mut now = 300.0;
        while now < 5000.0 {
            now += 50.0;
            player.tick(now, &mut w.stage());
        }
        assert!(player.bullets.len() <= 8);
        assert!(player.bullets.iter().all(|b| b.pos.y() >= -50.0));
    }

    #[test]
    fn test_damage_sequence_scenario() {
        let mut w = Worlds::new();
        let mut player = Player::spawn(&mut w.stage(), &Tuning::default(), 0.0);

        for _ in 0..3 {
            assert!(player.take_damage(10, 0.0));
        }
        assert_eq!(player.health(), 70);

        for _ in 0..6 {
            assert!(player.take_damage(10, 0.0));
        }
        assert_eq!(player.health(), 10);
        assert!(!player.take_damage(10, 0.0));
        assert_eq!(player.health(), 0);
        assert!(!player.is_alive());

        // Further hits stay clamped
        assert!(!player.take_damage(10, 0.0));
        assert_eq!(player.health(), 0);
    }

    #[test]
    fn test_dead_player_stops_firing() {
        let mut w = Worlds::new();
        let mut player = Player::spawn(&mut w.stage(), &Tuning::default(), 0.0);
        player.take_damage(100, 0.0);
        player.tick(1000.0, &mut w.stage());
        assert!(player.bullets.is_empty());
    }

    #[test]
    fn test_damage_flash_comes_and_goes() {
        let mut w = Worlds::new();
        let mut player = Player::spawn(&mut w.stage(), &Tuning::default(), 0.0);
        player.take_damage(10, 1000.0);
        player.refresh_visual(1000.0, &mut w.stage());
        assert!(player.is_flashing());
        player.refresh_visual(1000.0 + DAMAGE_FLASH_MS, &mut w.stage());
        assert!(!player.is_flashing());
    }

    #[test]
    fn test_destroy_twice_releases_once() {
        let mut w = Worlds::new();
        let mut player = Player::spawn(&mut w.stage(), &Tuning::default(), 0.0);
        assert!(player.destroy(&mut w.stage()));
        assert!(!player.destroy(&mut w.stage()));
        assert_eq!(w.physics.released_count(), 1);
        assert_eq!(w.overlay.disposed_count(), 1);
        assert_eq!(w.overlay.loader.cancelled_count(), 1);
        assert!(w.overlay.is_empty());

        // Operations on a destroyed ship are harmless
        player.move_to(ScreenPos::new(10.0, 10.0), &mut w.stage());
        player.tick(5000.0, &mut w.stage());
        assert!(player.bullets.is_empty());
    }

    #[test]
    fn test_model_attach_and_stale_load() {
        let mut w = Worlds::new();
        let mut player = Player::spawn(&mut w.stage(), &Tuning::default(), 0.0);
        let ticket = player.pending_model().expect("ticket");
        let model = VisualProxy::Composite(vec![
            crate::overlay::Mesh::new(crate::overlay::Shape::Sphere { radius: 4.0 }, [1.0; 4]),
            crate::overlay::Mesh::new(crate::overlay::Shape::Box { size: 4.0 }, [1.0; 4]),
        ]);
        assert!(player.attach_model(ticket, model.clone(), &mut w.stage()).is_ok());
        assert_eq!(w.overlay.draw_list().items.len(), 2);
        // A second delivery for the same ticket is refused
        assert!(player.attach_model(ticket, model, &mut w.stage()).is_err());
    }

    proptest! {
        #[test]
        fn health_is_clamped_difference(hits in proptest::collection::vec(0u32..40, 0..30)) {
            let mut w = Worlds::new();
            let mut player = Player::spawn(&mut w.stage(), &Tuning::default(), 0.0);
            let mut was_dead = false;
            for d in hits {
                let before = player.health();
                let alive = player.take_damage(d, 0.0);
                prop_assert_eq!(player.health(), before.saturating_sub(d));
                prop_assert_eq!(alive, player.health() > 0);
                if was_dead {
                    prop_assert!(!alive);
                }
                was_dead = !alive;
            }
        }
    }
}
