//! Leaderboard screen model
//!
//! Live rows come from the persistence gateway. When that fails the screen
//! falls back to the last successful fetch (kept in LocalStorage) and then to
//! built-in demo rows, with a status line saying so.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::persistence::{GatewayError, LeaderboardEntry};

/// Rows requested from the backend
pub const LEADERBOARD_LIMIT: usize = 10;

pub const DEMO_STATUS: &str = "Using demo data (leaderboard unavailable)";
pub const CACHED_STATUS: &str = "Showing saved scores (leaderboard unavailable)";
pub const EMPTY_MESSAGE: &str = "No scores yet. Be the first!";

/// Where the rows on screen came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardSource {
    Live,
    Cached,
    Demo,
}

/// Podium colors for the top three
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }

    /// CSS color
    pub fn color(&self) -> &'static str {
        match self {
            Self::Gold => "#FFD700",
            Self::Silver => "#C0C0C0",
            Self::Bronze => "#CD7F32",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Gold => "🥇",
            Self::Silver => "🥈",
            Self::Bronze => "🥉",
        }
    }
}

/// One formatted row
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub rank_label: String,
    pub medal: Option<Medal>,
    pub name: String,
    pub score: u32,
    pub last_played: String,
    /// Row belongs to the signed-in player
    pub is_you: bool,
}

/// Rows shown when the backend cannot be reached and nothing is cached
pub fn demo_entries() -> Vec<LeaderboardEntry> {
    [
        ("SpaceAce", 250),
        ("StarBlaster", 200),
        ("CosmicHero", 180),
        ("GalaxyDefender", 150),
        ("AsteroidCrusher", 130),
        ("NebulaPilot", 120),
        ("VoidWarrior", 110),
        ("You", 100),
        ("OrbitRanger", 90),
        ("SolarSailor", 80),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, score))| LeaderboardEntry {
        user_id: format!("demo-{}", i + 1),
        display_name: name.to_string(),
        high_score: score,
        last_played: None,
    })
    .collect()
}

/// What the leaderboard screen shows
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardView {
    pub entries: Vec<LeaderboardEntry>,
    pub source: BoardSource,
    /// Non-blocking notice shown above the rows
    pub status: Option<String>,
    pub loading: bool,
}

impl Default for LeaderboardView {
    fn default() -> Self {
        Self::loading()
    }
}

impl LeaderboardView {
    pub fn loading() -> Self {
        Self {
            entries: Vec::new(),
            source: BoardSource::Live,
            status: Some("Loading...".to_string()),
            loading: true,
        }
    }

    pub fn live(entries: Vec<LeaderboardEntry>) -> Self {
        Self {
            entries,
            source: BoardSource::Live,
            status: None,
            loading: false,
        }
    }

    /// View for a failed fetch: cached rows if any, demo rows otherwise
    pub fn fallback(error: &GatewayError, cache: &LeaderboardCache) -> Self {
        log::error!("Leaderboard fetch failed: {error}");
        if cache.entries.is_empty() {
            Self {
                entries: demo_entries(),
                source: BoardSource::Demo,
                status: Some(DEMO_STATUS.to_string()),
                loading: false,
            }
        } else {
            Self {
                entries: cache.entries.clone(),
                source: BoardSource::Cached,
                status: Some(CACHED_STATUS.to_string()),
                loading: false,
            }
        }
    }

    /// Apply a finished fetch, refreshing `cache` on success
    pub fn from_result(
        result: Result<Vec<LeaderboardEntry>, GatewayError>,
        cache: &mut LeaderboardCache,
        now: DateTime<Utc>,
    ) -> Self {
        match result {
            Ok(entries) => {
                cache.store(&entries, now);
                Self::live(entries)
            }
            Err(e) => Self::fallback(&e, cache),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.loading && self.entries.is_empty()
    }

    /// Format rows for display; `you` marks the signed-in player's row
    pub fn rows(&self, now: DateTime<Utc>, you: Option<&str>) -> Vec<LeaderboardRow> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let rank = i + 1;
                let medal = Medal::for_rank(rank);
                LeaderboardRow {
                    rank,
                    rank_label: match medal {
                        Some(m) => m.symbol().to_string(),
                        None => format!("#{rank}"),
                    },
                    medal,
                    name: entry.display_name.clone(),
                    score: entry.high_score,
                    last_played: entry
                        .last_played
                        .map_or_else(|| "-".to_string(), |t| format_relative(t, now)),
                    is_you: you.is_some_and(|id| id == entry.user_id),
                }
            })
            .collect()
    }
}

/// "Just now", "5 mins ago", "Yesterday", "3 days ago", or `M/D/YY`
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(then);
    let days = diff.num_days();
    let hours = diff.num_hours();
    let mins = diff.num_minutes();

    if days >= 1 {
        match days {
            1 => "Yesterday".to_string(),
            2..=6 => format!("{days} days ago"),
            _ => format!("{}/{}/{:02}", then.month(), then.day(), then.year() % 100),
        }
    } else if hours >= 1 {
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{hours} hours ago")
        }
    } else if mins >= 1 {
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{mins} mins ago")
        }
    } else {
        "Just now".to_string()
    }
}

/// Last successful leaderboard fetch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardCache {
    pub entries: Vec<LeaderboardEntry>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl LeaderboardCache {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "stellar_vanguard_leaderboard";

    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached rows (an empty board is not worth caching)
    pub fn store(&mut self, entries: &[LeaderboardEntry], now: DateTime<Utc>) {
        if entries.is_empty() {
            return;
        }
        self.entries = entries.to_vec();
        self.fetched_at = Some(now);
        self.save();
    }

    /// Load the cache from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str::<LeaderboardCache>(&json) {
                    Ok(cache) => {
                        log::info!("Loaded {} cached leaderboard rows", cache.entries.len());
                        return cache;
                    }
                    Err(e) => log::warn!("Discarding unreadable leaderboard cache: {e}"),
                }
            }
        }
        Self::new()
    }

    /// Save the cache to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry(id: &str, score: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            user_id: id.into(),
            display_name: id.to_uppercase(),
            high_score: score,
            last_played: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).single().expect("valid time")
    }

    #[test]
    fn test_demo_data() {
        let demo = demo_entries();
        assert_eq!(demo.len(), 10);
        assert_eq!(demo[0].display_name, "SpaceAce");
        assert!(demo.windows(2).all(|w| w[0].high_score > w[1].high_score));
    }

    #[test]
    fn test_failure_without_cache_uses_demo() {
        let mut cache = LeaderboardCache::new();
        let view = LeaderboardView::from_result(
            Err(GatewayError::Transport("offline".into())),
            &mut cache,
            now(),
        );
        assert_eq!(view.source, BoardSource::Demo);
        assert_eq!(view.status.as_deref(), Some(DEMO_STATUS));
        assert_eq!(view.entries.len(), 10);
    }

    #[test]
    fn test_failure_prefers_cache() {
        let mut cache = LeaderboardCache::new();
        LeaderboardView::from_result(Ok(vec![entry("a", 40), entry("b", 20)]), &mut cache, now());
        assert_eq!(cache.fetched_at, Some(now()));

        let view = LeaderboardView::from_result(
            Err(GatewayError::PermissionDenied("rules".into())),
            &mut cache,
            now(),
        );
        assert_eq!(view.source, BoardSource::Cached);
        assert_eq!(view.entries.len(), 2);
        assert!(view.status.is_some());
    }

    #[test]
    fn test_empty_live_board() {
        let mut cache = LeaderboardCache::new();
        let view = LeaderboardView::from_result(Ok(Vec::new()), &mut cache, now());
        assert!(view.is_empty());
        assert!(view.status.is_none());
        assert!(cache.entries.is_empty());
        assert!(!LeaderboardView::loading().is_empty());
    }

    #[test]
    fn test_rows_have_medals_and_owner() {
        let view = LeaderboardView::live(vec![
            entry("a", 50),
            entry("b", 40),
            entry("c", 30),
            entry("d", 20),
        ]);
        let rows = view.rows(now(), Some("d"));
        assert_eq!(rows[0].medal, Some(Medal::Gold));
        assert_eq!(rows[2].medal, Some(Medal::Bronze));
        assert_eq!(rows[3].medal, None);
        assert_eq!(rows[3].rank_label, "#4");
        assert!(rows[3].is_you);
        assert!(!rows[0].is_you);
        assert_eq!(rows[0].last_played, "-");
    }

    #[test]
    fn test_format_relative() {
        let now = now();
        assert_eq!(format_relative(now - Duration::seconds(20), now), "Just now");
        assert_eq!(format_relative(now - Duration::minutes(1), now), "1 min ago");
        assert_eq!(format_relative(now - Duration::minutes(42), now), "42 mins ago");
        assert_eq!(format_relative(now - Duration::hours(1), now), "1 hour ago");
        assert_eq!(format_relative(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(format_relative(now - Duration::days(1), now), "Yesterday");
        assert_eq!(format_relative(now - Duration::days(3), now), "3 days ago");
        assert_eq!(format_relative(now - Duration::days(30), now), "2/12/26");
    }
}
