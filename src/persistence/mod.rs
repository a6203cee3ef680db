//! Accounts and leaderboard backend
//!
//! Gameplay code depends on the [`PersistenceGateway`] trait only. Two
//! implementations:
//! - [`RestGateway`]: hosted identity + realtime database over REST
//! - [`MemoryGateway`]: in-process store for offline play and tests
//!
//! Calls are async and single-threaded (`?Send`): in the browser they run on
//! the JS event loop, natively on a `LocalPool`. [`tasks`] turns them into
//! per-tick pollable handles.

pub mod firebase;
pub mod memory;
pub mod tasks;

pub use firebase::RestGateway;
pub use memory::MemoryGateway;
pub use tasks::{Pending, PersistenceClient, TaskSpawner};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Opaque backend user id
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl UserRef {
    /// Name to show when the player hasn't typed one
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Anonymous")
    }
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub high_score: u32,
    pub last_played: Option<DateTime<Utc>>,
}

/// Stored per-user record: `users/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRecord {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub high_score: u32,
    pub last_played: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn to_entry(&self, user_id: &str) -> LeaderboardEntry {
        LeaderboardEntry {
            user_id: user_id.to_string(),
            display_name: self
                .display_name
                .clone()
                .or_else(|| self.email.clone())
                .unwrap_or_else(|| "Anonymous".to_string()),
            high_score: self.high_score,
            last_played: self.last_played,
        }
    }
}

/// What the current session may do (diagnostics)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessReport {
    pub authenticated: bool,
    pub can_read_users: bool,
    pub can_write_own_data: bool,
    pub error: Option<String>,
}

/// Backend failures. None of these are fatal to the game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("not signed in")]
    NotSignedIn,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("request was dropped before completing")]
    Cancelled,
}

/// Sort descending by score and keep the top `limit`
pub fn rank_entries(mut entries: Vec<LeaderboardEntry>, limit: usize) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        b.high_score
            .cmp(&a.high_score)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    entries.truncate(limit);
    entries
}

/// Port for the hosted auth + database service
#[async_trait(?Send)]
pub trait PersistenceGateway {
    /// Currently signed-in user, if any
    fn current_user(&self) -> Option<UserRef>;

    async fn sign_in_with_email(&self, email: &str, password: &str)
    -> Result<UserRef, GatewayError>;

    async fn create_account(&self, email: &str, password: &str) -> Result<UserRef, GatewayError>;

    /// Federated sign-in with an identity provider token (e.g. `google.com`)
    async fn sign_in_with_idp(
        &self,
        provider_id: &str,
        id_token: &str,
    ) -> Result<UserRef, GatewayError>;

    async fn sign_out(&self) -> Result<(), GatewayError>;

    /// Stored high score, 0 if none
    async fn high_score(&self, user_id: &str) -> Result<u32, GatewayError>;

    /// Store `score` if it beats the stored one. Always refreshes the
    /// display name and last-played time. Returns whether the score was stored.
    async fn save_high_score_if_greater(
        &self,
        user_id: &str,
        score: u32,
        display_name: &str,
    ) -> Result<bool, GatewayError>;

    async fn update_display_name(&self, user_id: &str, display_name: &str)
    -> Result<(), GatewayError>;

    /// Top `limit` entries, highest score first
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, GatewayError>;

    /// Check what the current session can read and write
    async fn probe_access(&self) -> AccessReport;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, score: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            user_id: id.into(),
            display_name: id.into(),
            high_score: score,
            last_played: None,
        }
    }

    #[test]
    fn test_rank_entries_sorts_and_limits() {
        let ranked = rank_entries(vec![entry("a", 10), entry("b", 30), entry("c", 20)], 2);
        let scores: Vec<u32> = ranked.iter().map(|e| e.high_score).collect();
        assert_eq!(scores, vec![30, 20]);
    }

    #[test]
    fn test_record_entry_name_fallbacks() {
        let rec = UserRecord {
            email: Some("pilot@example.com".into()),
            high_score: 40,
            ..Default::default()
        };
        assert_eq!(rec.to_entry("u1").display_name, "pilot@example.com");
        assert_eq!(UserRecord::default().to_entry("u2").display_name, "Anonymous");
    }

    #[test]
    fn test_record_json_field_names() {
        let rec: UserRecord =
            serde_json::from_str(r#"{"displayName":"A","highScore":50,"lastPlayed":"2026-01-02T03:04:05Z"}"#)
                .expect("record");
        assert_eq!(rec.high_score, 50);
        assert_eq!(rec.display_name.as_deref(), Some("A"));
        assert!(rec.last_played.is_some());
    }
}
