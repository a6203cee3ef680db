//! Per-frame gameplay coordination
//!
//! One [`Orchestrator::tick`] per rendered frame. Within a tick, in order:
//! overlay + resolved models, player, spawning, enemies, enemy bullets,
//! collisions. A terminal transition ends the tick immediately and nothing
//! else is processed until [`Orchestrator::restart`].

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{BACKGROUND_SCROLL_SPEED, ENEMY_BULLET_CULL_Y, MAX_FRAME_DT};
use crate::coords::{ScreenPos, Viewport, VisualPos};
use crate::overlay::{ResolvedAsset, VisualOverlay};
use crate::persistence::{GatewayError, Pending, PersistenceClient};
use crate::tuning::Tuning;

use super::bullets::{Bullet, BulletGroup, Faction};
use super::enemy::Enemy;
use super::entity::Stage;
use super::physics::PhysicsWorld;
use super::player::Player;

/// Current phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Entities not created yet; the next tick starts the match
    Initializing,
    Playing,
    /// Player health reached zero
    GameOver,
    /// Score reached the victory threshold
    Victory,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }
}

/// Things that happened during a tick (drained by the driver for HUD/logs)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    MatchStarted,
    EnemySpawned { id: u32, x: f32 },
    EnemyEscaped { id: u32 },
    EnemyDestroyed { id: u32, score: u32 },
    PlayerHit { health: u32 },
    Victory { score: u32 },
    GameOver { score: u32 },
    ScoreSaved { updated: bool },
    ScoreSaveFailed(String),
}

/// Where the end-of-match score submission stands
#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    /// Submitted, waiting on the backend
    Pending,
    /// Stored; `updated` is false when it did not beat the previous best
    Saved { updated: bool },
    NotSignedIn,
    /// Signed in but no name to store the score under yet
    AwaitingName,
    /// No backend configured
    Offline,
    Failed(String),
}

/// Summary handed to the results screen
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub outcome: GamePhase,
    pub score: u32,
    pub kills: u32,
    pub save: SaveStatus,
}

fn stage<'a>(
    physics: &'a mut PhysicsWorld,
    overlay: &'a mut VisualOverlay,
    viewport: Viewport,
) -> Stage<'a> {
    Stage {
        physics,
        overlay,
        viewport,
    }
}

/// Owns every entity of a match and advances them together
pub struct Orchestrator {
    tuning: Tuning,
    viewport: Viewport,
    seed: u64,
    rng: Pcg32,
    phase: GamePhase,

    physics: PhysicsWorld,
    overlay: VisualOverlay,
    player: Option<Player>,
    enemies: Vec<Enemy>,
    enemy_bullets: BulletGroup,

    score: u32,
    kills: u32,
    last_spawn: f64,
    last_tick: Option<f64>,
    next_enemy_id: u32,

    scroll_speed: f32,
    flash_enabled: bool,
    dragging: bool,
    move_target: Option<ScreenPos>,

    events: Vec<GameEvent>,
    result: Option<MatchResult>,
    persistence: Option<PersistenceClient>,
    pilot_name: Option<String>,
    pending_save: Option<Pending<bool>>,
}

impl Orchestrator {
    pub fn new(tuning: Tuning, viewport: Viewport, seed: u64) -> Self {
        Self {
            tuning,
            viewport,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Initializing,
            physics: PhysicsWorld::new(),
            overlay: VisualOverlay::new(viewport),
            player: None,
            enemies: Vec::new(),
            enemy_bullets: BulletGroup::new(Faction::Enemy),
            score: 0,
            kills: 0,
            last_spawn: 0.0,
            last_tick: None,
            next_enemy_id: 0,
            scroll_speed: BACKGROUND_SCROLL_SPEED,
            flash_enabled: true,
            dragging: false,
            move_target: None,
            events: Vec::new(),
            result: None,
            persistence: None,
            pilot_name: None,
            pending_save: None,
        }
    }

    /// Submit end-of-match scores through `client`
    pub fn with_persistence(mut self, client: PersistenceClient) -> Self {
        self.persistence = Some(client);
        self
    }

    pub fn set_persistence(&mut self, client: Option<PersistenceClient>) {
        self.persistence = client;
    }

    pub fn persistence(&self) -> Option<&PersistenceClient> {
        self.persistence.as_ref()
    }

    /// Name stored with the score; falls back to the account display name
    pub fn set_pilot_name(&mut self, name: Option<String>) {
        self.pilot_name = name;
    }

    /// Takes effect on the next match
    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
    }

    pub fn set_scrolling(&mut self, enabled: bool) {
        self.scroll_speed = if enabled { BACKGROUND_SCROLL_SPEED } else { 0.0 };
    }

    pub fn set_flash_enabled(&mut self, enabled: bool) {
        self.flash_enabled = enabled;
        if let Some(player) = self.player.as_mut() {
            player.set_flash_enabled(enabled);
        }
    }

    // === Input ===

    pub fn pointer_down(&mut self, pos: ScreenPos) {
        self.dragging = true;
        self.move_target = Some(pos);
    }

    pub fn pointer_move(&mut self, pos: ScreenPos) {
        if self.dragging {
            self.move_target = Some(pos);
        }
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    // === Tick ===

    /// Advance the match to `now` (milliseconds)
    pub fn tick(&mut self, now: f64) {
        self.poll_persistence();

        match self.phase {
            GamePhase::Initializing => self.begin_match(now),
            GamePhase::GameOver | GamePhase::Victory => return,
            GamePhase::Playing => {}
        }

        let dt = match self.last_tick {
            Some(prev) => (((now - prev) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT),
            None => 0.0,
        };
        self.last_tick = Some(now);

        let resolved = self.overlay.advance(dt, self.scroll_speed);
        self.attach_models(resolved);

        self.tick_player(now);

        if now - self.last_spawn >= self.tuning.spawn_interval_ms {
            self.spawn_enemy(now);
        }

        self.tick_enemies(now);

        self.enemy_bullets.advance(dt);
        self.enemy_bullets
            .cull_outside(f32::NEG_INFINITY, ENEMY_BULLET_CULL_Y);

        self.resolve_player_hits();
        if self.phase.is_terminal() {
            return;
        }
        self.resolve_enemy_hits(now);
    }

    fn begin_match(&mut self, now: f64) {
        self.teardown();
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.score = 0;
        self.kills = 0;
        self.last_spawn = now;
        self.last_tick = None;
        self.next_enemy_id = 0;
        self.result = None;

        let mut player = Player::spawn(
            &mut stage(&mut self.physics, &mut self.overlay, self.viewport),
            &self.tuning,
            now,
        );
        player.set_flash_enabled(self.flash_enabled);
        self.player = Some(player);

        self.phase = GamePhase::Playing;
        self.events.push(GameEvent::MatchStarted);
        log::info!(
            "Match started ({}, seed {})",
            self.tuning.difficulty.as_str(),
            self.seed
        );
    }

    /// Route finished model loads to their owners; unclaimed ones are dropped
    fn attach_models(&mut self, resolved: Vec<ResolvedAsset>) {
        let mut stage = stage(&mut self.physics, &mut self.overlay, self.viewport);
        for ResolvedAsset { ticket, proxy } in resolved {
            let mut proxy = Some(proxy);
            if let Some(player) = self.player.as_mut() {
                if player.pending_model() == Some(ticket) {
                    if let Some(p) = proxy.take() {
                        proxy = player.attach_model(ticket, p, &mut stage).err();
                    }
                }
            }
            if let Some(enemy) = self
                .enemies
                .iter_mut()
                .find(|e| e.pending_model() == Some(ticket))
            {
                if let Some(p) = proxy.take() {
                    proxy = enemy.attach_model(ticket, p, &mut stage).err();
                }
            }
            if let Some(orphan) = proxy {
                log::debug!("Model for {ticket} has no owner; discarded");
                orphan.dispose();
            }
        }
    }

    fn tick_player(&mut self, now: f64) {
        let mut stage = stage(&mut self.physics, &mut self.overlay, self.viewport);
        let Some(player) = self.player.as_mut() else {
            if self.move_target.take().is_some() {
                log::warn!("Pointer input with no player; ignored");
            }
            return;
        };
        if let Some(target) = self.move_target.take() {
            player.move_to(target, &mut stage);
        }
        player.tick(now, &mut stage);
    }

    fn spawn_enemy(&mut self, now: f64) {
        let band = self.tuning.spawn_band;
        let x = if band.max_x > band.min_x {
            self.rng.random_range(band.min_x..=band.max_x)
        } else {
            band.min_x
        };
        self.next_enemy_id += 1;
        let id = self.next_enemy_id;
        let enemy = Enemy::spawn(
            id,
            x,
            &mut stage(&mut self.physics, &mut self.overlay, self.viewport),
            &self.tuning,
            now,
        );
        self.enemies.push(enemy);
        self.last_spawn = now;
        self.events.push(GameEvent::EnemySpawned { id, x });
    }

    fn tick_enemies(&mut self, now: f64) {
        let mut stage = stage(&mut self.physics, &mut self.overlay, self.viewport);
        let bullets = &mut self.enemy_bullets;
        let events = &mut self.events;
        self.enemies.retain_mut(|enemy| {
            if enemy.tick(now, &mut stage, bullets) {
                return true;
            }
            if enemy.destroy(&mut stage) {
                events.push(GameEvent::EnemyEscaped { id: enemy.id });
            }
            false
        });
    }

    /// Player bullets against enemies
    fn resolve_player_hits(&mut self) {
        let Some(player) = self.player.as_mut() else {
            return;
        };

        let mut hits: Vec<(u32, u32)> = Vec::new();
        for bullet in player.bullets.iter() {
            let target = self.enemies.iter().find(|enemy| {
                !hits.iter().any(|&(_, id)| id == enemy.id)
                    && enemy.collider().is_some_and(|c| {
                        self.physics.overlaps_circle(c, bullet.pos, bullet.radius)
                    })
            });
            if let Some(enemy) = target {
                hits.push((bullet.id, enemy.id));
            }
        }

        for (bullet_id, enemy_id) in hits {
            player.bullets.destroy(bullet_id);
            let Some(index) = self.enemies.iter().position(|e| e.id == enemy_id) else {
                continue;
            };
            let mut enemy = self.enemies.remove(index);
            enemy.destroy(&mut stage(&mut self.physics, &mut self.overlay, self.viewport));

            self.score += self.tuning.kill_reward;
            self.kills += 1;
            self.events.push(GameEvent::EnemyDestroyed {
                id: enemy_id,
                score: self.score,
            });

            if self.score >= self.tuning.victory_score {
                self.finish(GamePhase::Victory);
                return;
            }
        }
    }

    /// Enemy bullets against the player
    fn resolve_enemy_hits(&mut self, now: f64) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        let Some(collider) = player.collider() else {
            return;
        };
        if !player.is_alive() {
            return;
        }

        let hits: Vec<u32> = self
            .enemy_bullets
            .iter()
            .filter(|b| self.physics.overlaps_circle(collider, b.pos, b.radius))
            .map(|b| b.id)
            .collect();

        for bullet_id in hits {
            self.enemy_bullets.destroy(bullet_id);
            let alive = player.take_damage(self.tuning.hit_damage, now);
            self.events.push(GameEvent::PlayerHit {
                health: player.health(),
            });
            if !alive {
                self.finish(GamePhase::GameOver);
                return;
            }
        }
    }

    /// Enter a terminal phase and submit the score. Runs once per match.
    fn finish(&mut self, outcome: GamePhase) {
        if self.phase.is_terminal() {
            return;
        }
        self.phase = outcome;
        self.dragging = false;
        self.move_target = None;

        let score = self.score;
        self.events.push(match outcome {
            GamePhase::Victory => GameEvent::Victory { score },
            _ => GameEvent::GameOver { score },
        });
        log::info!("Match over: {outcome:?} with {score} points ({} kills)", self.kills);

        let save = self.submit_score(score);
        self.result = Some(MatchResult {
            outcome,
            score,
            kills: self.kills,
            save,
        });
    }

    fn submit_score(&mut self, score: u32) -> SaveStatus {
        let Some(client) = self.persistence.as_ref() else {
            return SaveStatus::Offline;
        };
        let Some(user) = client.current_user() else {
            log::info!("Not signed in; score not submitted");
            return SaveStatus::NotSignedIn;
        };
        let Some(name) = self.pilot_name.clone().or(user.display_name) else {
            log::info!("Score held until a name is entered");
            return SaveStatus::AwaitingName;
        };
        self.pending_save = Some(client.save_score(&user.id, score, &name));
        SaveStatus::Pending
    }

    /// Submit a result that was held for a name. Returns false when no
    /// result is waiting on one.
    pub fn submit_with_name(&mut self, name: &str) -> bool {
        let score = match self.result.as_ref() {
            Some(result) if result.save == SaveStatus::AwaitingName => result.score,
            _ => return false,
        };
        self.pilot_name = Some(name.to_string());
        let status = self.submit_score(score);
        if let Some(result) = self.result.as_mut() {
            result.save = status;
        }
        true
    }

    fn poll_persistence(&mut self) {
        let Some(pending) = self.pending_save.as_mut() else {
            return;
        };
        let Some(outcome) = pending.poll_ready() else {
            return;
        };
        self.pending_save = None;

        let status = match outcome {
            Ok(updated) => {
                self.events.push(GameEvent::ScoreSaved { updated });
                SaveStatus::Saved { updated }
            }
            Err(GatewayError::NotSignedIn) => SaveStatus::NotSignedIn,
            Err(e) => {
                log::error!("Saving score failed: {e}");
                self.events.push(GameEvent::ScoreSaveFailed(e.to_string()));
                SaveStatus::Failed(e.to_string())
            }
        };
        if let Some(result) = self.result.as_mut() {
            result.save = status;
        }
    }

    // === Lifecycle ===

    /// Tear down and start a fresh match on the next tick
    pub fn restart(&mut self) {
        self.teardown();
        self.phase = GamePhase::Initializing;
        self.result = None;
    }

    /// Release every entity, collider and proxy
    pub fn teardown(&mut self) {
        let mut stage = stage(&mut self.physics, &mut self.overlay, self.viewport);
        if let Some(mut player) = self.player.take() {
            player.destroy(&mut stage);
        }
        for mut enemy in self.enemies.drain(..) {
            enemy.destroy(&mut stage);
        }
        self.enemy_bullets.clear();
        self.overlay.clear();
        self.physics.clear();
        self.dragging = false;
        self.move_target = None;
        if self.pending_save.take().is_some() {
            log::debug!("Dropped an unresolved score submission");
        }
    }

    // === Queries ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn health(&self) -> u32 {
        self.player.as_ref().map_or(0, Player::health)
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemy_positions(&self) -> impl Iterator<Item = VisualPos> + '_ {
        self.enemies.iter().map(Enemy::position)
    }

    /// Every live bullet with its owner
    pub fn bullets(&self) -> impl Iterator<Item = (Faction, &Bullet)> + '_ {
        let player = self
            .player
            .iter()
            .flat_map(|p| p.bullets.iter().map(|b| (Faction::Player, b)));
        player.chain(self.enemy_bullets.iter().map(|b| (Faction::Enemy, b)))
    }

    pub fn overlay(&self) -> &VisualOverlay {
        &self.overlay
    }

    /// Driver access for handing out model requests
    pub fn overlay_mut(&mut self) -> &mut VisualOverlay {
        &mut self.overlay
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
