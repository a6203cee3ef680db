//! Player preferences
//!
//! Persisted as JSON in LocalStorage, separately from leaderboard data.

use serde::{Deserialize, Serialize};

use crate::tuning::{Difficulty, Tuning};
use crate::ui::MAX_NAME_LEN;

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Difficulty preset for new matches
    pub difficulty: Difficulty,
    /// Name pre-filled in the leaderboard form
    pub display_name: Option<String>,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Visual Effects ===
    /// Scrolling starfield background
    pub scrolling_background: bool,
    /// Red flash when the ship is hit
    pub damage_flash: bool,

    // === Accessibility ===
    /// Reduced motion (no flashes, static background)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Veteran,
            display_name: None,
            show_fps: false,
            scrolling_background: true,
            damage_flash: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "stellar_vanguard_settings";

    /// Tuning for the selected difficulty
    pub fn tuning(&self) -> Tuning {
        Tuning::for_difficulty(self.difficulty)
    }

    /// Effective background scrolling (respects reduced_motion)
    pub fn effective_scrolling(&self) -> bool {
        self.scrolling_background && !self.reduced_motion
    }

    /// Effective damage flash (respects reduced_motion)
    pub fn effective_damage_flash(&self) -> bool {
        self.damage_flash && !self.reduced_motion
    }

    /// Remember the name used for the last submission
    pub fn remember_name(&mut self, name: &str) {
        let trimmed: String = name.trim().chars().take(MAX_NAME_LEN).collect();
        self.display_name = if trimmed.is_empty() { None } else { Some(trimmed) };
    }

    /// Parse stored JSON, falling back to defaults
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Stored settings unreadable ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json(&json);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = Settings::from_json(r#"{"difficulty":"Ace"}"#);
        assert_eq!(s.difficulty, Difficulty::Ace);
        assert!(s.damage_flash);
    }

    #[test]
    fn test_corrupt_json_falls_back() {
        let s = Settings::from_json("{not json");
        assert_eq!(s.difficulty, Difficulty::Veteran);
    }

    #[test]
    fn test_reduced_motion_disables_effects() {
        let s = Settings {
            reduced_motion: true,
            ..Default::default()
        };
        assert!(!s.effective_scrolling());
        assert!(!s.effective_damage_flash());
    }

    #[test]
    fn test_remember_name_trims() {
        let mut s = Settings::default();
        s.remember_name("   ");
        assert_eq!(s.display_name, None);
        s.remember_name("  Ace Pilot ");
        assert_eq!(s.display_name.as_deref(), Some("Ace Pilot"));
    }
}
