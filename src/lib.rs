//! Stellar Vanguard - A vertical arcade shooter
//!
//! Core modules:
//! - `coords`: Screen space <-> visual space conversion
//! - `sim`: Gameplay simulation (entities, bullets, collisions, orchestrator)
//! - `overlay`: Visual scene of 3D-styled proxies, camera, lighting, asset loading
//! - `renderer`: WebGPU rendering of the overlay draw list
//! - `persistence`: Accounts and leaderboard backend
//! - `tuning`: Data-driven game balance
//! - `ui`: Screen flow and HUD text

pub mod config;
pub mod coords;
pub mod leaderboard;
pub mod overlay;
pub mod persistence;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use coords::{ScreenPos, Viewport, VisualPos};
pub use leaderboard::LeaderboardView;
pub use settings::Settings;
pub use tuning::{Difficulty, Tuning};

/// Game configuration constants
pub mod consts {
    /// Canvas width in pixels
    pub const VIEWPORT_WIDTH: f32 = 800.0;
    /// Canvas height in pixels
    pub const VIEWPORT_HEIGHT: f32 = 600.0;

    /// Player collider radius
    pub const PLAYER_RADIUS: f32 = 15.0;
    /// Enemy collider radius
    pub const ENEMY_RADIUS: f32 = 16.0;
    /// Bullet collider radius
    pub const BULLET_RADIUS: f32 = 4.0;

    /// Player spawn point (visual space)
    pub const PLAYER_START_X: f32 = 0.0;
    pub const PLAYER_START_Y: f32 = -200.0;

    /// Enemies enter at the top edge (visual space)
    pub const ENEMY_SPAWN_Y: f32 = 300.0;
    /// Enemies past this visual y are culled
    pub const ENEMY_EXIT_Y: f32 = -350.0;

    /// Player bullets above this screen y are culled
    pub const PLAYER_BULLET_CULL_Y: f32 = -50.0;
    /// Enemy bullets below this screen y are culled
    pub const ENEMY_BULLET_CULL_Y: f32 = VIEWPORT_HEIGHT + 50.0;
    /// Enemy bullets spawn this far below the enemy (screen space)
    pub const ENEMY_MUZZLE_OFFSET: f32 = 20.0;

    /// Background scroll speed (pixels per second)
    pub const BACKGROUND_SCROLL_SPEED: f32 = 120.0;
    /// Damage flash duration (ms)
    pub const DAMAGE_FLASH_MS: f64 = 150.0;

    /// Longest frame step fed to the simulation (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}
