//! Data-driven game balance
//!
//! Every gameplay number the orchestrator and entities read comes from a
//! [`Tuning`]. Difficulty presets scale spawn cadence, enemy speed and enemy
//! fire rate; scoring and damage are fixed constants.

use serde::{Deserialize, Serialize};

/// Points awarded per enemy destroyed
pub const KILL_REWARD: u32 = 10;
/// Score that ends the match in victory
pub const VICTORY_SCORE: u32 = 100;
/// Health removed by one enemy bullet
pub const HIT_DAMAGE: u32 = 10;
/// Player health at match start
pub const MAX_HEALTH: u32 = 100;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Recruit,
    #[default]
    Veteran,
    Ace,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Recruit => "Recruit",
            Difficulty::Veteran => "Veteran",
            Difficulty::Ace => "Ace",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "recruit" | "easy" => Some(Difficulty::Recruit),
            "veteran" | "normal" => Some(Difficulty::Veteran),
            "ace" | "hard" => Some(Difficulty::Ace),
            _ => None,
        }
    }

    /// Milliseconds between enemy spawns
    pub fn spawn_interval_ms(&self) -> f64 {
        match self {
            Difficulty::Recruit => 2000.0,
            Difficulty::Veteran => 1500.0,
            Difficulty::Ace => 1000.0,
        }
    }

    /// Enemy descent speed (pixels per second)
    pub fn enemy_speed(&self) -> f32 {
        match self {
            Difficulty::Recruit => 60.0,
            Difficulty::Veteran => 90.0,
            Difficulty::Ace => 120.0,
        }
    }

    /// Milliseconds between enemy shots
    pub fn enemy_fire_rate_ms(&self) -> f64 {
        match self {
            Difficulty::Recruit => 2000.0,
            Difficulty::Veteran => 1500.0,
            Difficulty::Ace => 1000.0,
        }
    }
}

/// Horizontal band enemies spawn in (visual x)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnBand {
    pub min_x: f32,
    pub max_x: f32,
}

/// Rectangle the player is clamped to (visual space)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayfieldBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Default for PlayfieldBounds {
    fn default() -> Self {
        Self {
            min_x: -400.0,
            max_x: 400.0,
            min_y: -300.0,
            max_y: 300.0,
        }
    }
}

/// Complete gameplay tuning for one match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    pub difficulty: Difficulty,

    // === Player ===
    pub max_health: u32,
    /// Milliseconds between player shots
    pub player_fire_rate_ms: f64,
    /// Player bullet speed (pixels per second, upward)
    pub player_bullet_speed: f32,
    /// Clamp pointer-driven movement to `bounds`
    pub clamp_player: bool,
    pub bounds: PlayfieldBounds,

    // === Enemies ===
    pub spawn_interval_ms: f64,
    pub spawn_band: SpawnBand,
    pub enemy_speed: f32,
    pub enemy_fire_rate_ms: f64,
    /// Enemy bullet speed (pixels per second, downward)
    pub enemy_bullet_speed: f32,

    // === Scoring ===
    pub kill_reward: u32,
    pub victory_score: u32,
    pub hit_damage: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::default())
    }
}

impl Tuning {
    /// Build tuning from a difficulty preset
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            max_health: MAX_HEALTH,
            player_fire_rate_ms: 200.0,
            player_bullet_speed: 400.0,
            clamp_player: true,
            bounds: PlayfieldBounds::default(),
            spawn_interval_ms: difficulty.spawn_interval_ms(),
            spawn_band: SpawnBand {
                min_x: -350.0,
                max_x: 350.0,
            },
            enemy_speed: difficulty.enemy_speed(),
            enemy_fire_rate_ms: difficulty.enemy_fire_rate_ms(),
            enemy_bullet_speed: 300.0,
            kill_reward: KILL_REWARD,
            victory_score: VICTORY_SCORE,
            hit_damage: HIT_DAMAGE,
        }
    }

    /// Kills needed for victory
    pub fn kills_to_win(&self) -> u32 {
        self.victory_score.div_ceil(self.kill_reward.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_get_harder() {
        let easy = Tuning::for_difficulty(Difficulty::Recruit);
        let hard = Tuning::for_difficulty(Difficulty::Ace);
        assert!(hard.spawn_interval_ms < easy.spawn_interval_ms);
        assert!(hard.enemy_speed > easy.enemy_speed);
        assert!(hard.enemy_fire_rate_ms < easy.enemy_fire_rate_ms);
    }

    #[test]
    fn test_ten_kills_to_win() {
        assert_eq!(Tuning::default().kills_to_win(), 10);
    }

    #[test]
    fn test_parse_difficulty() {
        assert_eq!(Difficulty::parse("ACE"), Some(Difficulty::Ace));
        assert_eq!(Difficulty::parse("normal"), Some(Difficulty::Veteran));
        assert_eq!(Difficulty::parse("nightmare"), None);
    }
}
