//! Screen flow and HUD text
//!
//! The DOM driver owns the elements; this module decides which screen is up,
//! which transitions are legal and what the text says.

use thiserror::Error;

use crate::persistence::UserRef;
use crate::sim::{GamePhase, MatchResult, SaveStatus};

/// Longest accepted display name (characters)
pub const MAX_NAME_LEN: usize = 16;

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Assets and backend starting up
    Boot,
    MainMenu,
    Gameplay,
    /// Game over / victory summary
    Results,
    /// Name form shown before a held score is submitted
    NameEntry,
    Leaderboard,
}

impl Screen {
    /// DOM id of the screen's container
    pub fn element_id(&self) -> &'static str {
        match self {
            Self::Boot => "boot-screen",
            Self::MainMenu => "main-menu",
            Self::Gameplay => "hud",
            Self::Results => "results",
            Self::NameEntry => "name-entry",
            Self::Leaderboard => "leaderboard",
        }
    }

    pub const ALL: [Screen; 6] = [
        Self::Boot,
        Self::MainMenu,
        Self::Gameplay,
        Self::Results,
        Self::NameEntry,
        Self::Leaderboard,
    ];
}

/// Things the player (or the game) can do to change screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    BootComplete,
    StartGame,
    MatchEnded,
    Restart,
    MainMenu,
    OpenLeaderboard,
    EnterName,
    NameSubmitted,
    Back,
}

/// Screen state machine
#[derive(Debug, Clone)]
pub struct ScreenFlow {
    current: Screen,
    /// Where the leaderboard's Back button returns to
    return_to: Screen,
}

impl Default for ScreenFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenFlow {
    pub fn new() -> Self {
        Self {
            current: Screen::Boot,
            return_to: Screen::MainMenu,
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    /// Target of `action` from the current screen, if legal
    pub fn next(&self, action: UiAction) -> Option<Screen> {
        use Screen::*;
        use UiAction as A;
        let next = match (self.current, action) {
            (Boot, A::BootComplete) => MainMenu,
            (MainMenu, A::StartGame) => Gameplay,
            (MainMenu | Results, A::OpenLeaderboard) => Leaderboard,
            (Gameplay, A::MatchEnded) => Results,
            (Gameplay | Results | Leaderboard, A::MainMenu) => MainMenu,
            (Results, A::Restart) => Gameplay,
            (Results, A::EnterName) => NameEntry,
            (NameEntry, A::NameSubmitted) => Leaderboard,
            (NameEntry, A::Back) => Results,
            (Leaderboard, A::Back) => self.return_to,
            _ => return None,
        };
        Some(next)
    }

    /// Apply `action`. Illegal transitions are logged and ignored.
    pub fn apply(&mut self, action: UiAction) -> bool {
        let Some(next) = self.next(action) else {
            log::warn!("Ignoring {action:?} on {:?}", self.current);
            return false;
        };
        if next == Screen::Leaderboard {
            self.return_to = match self.current {
                Screen::NameEntry => Screen::Results,
                other => other,
            };
        }
        log::debug!("Screen {:?} -> {:?}", self.current, next);
        self.current = next;
        true
    }
}

/// Why a typed name was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Please enter a name")]
    Empty,
    #[error("Name must be at most {} characters", MAX_NAME_LEN)]
    TooLong,
    #[error("Name cannot contain '{0}'")]
    InvalidChar(char),
}

/// Trim and check a display name
pub fn validate_name(raw: &str) -> Result<String, NameError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, ' ' | '_' | '-' | '.')))
    {
        return Err(NameError::InvalidChar(bad));
    }
    Ok(name.to_string())
}

pub fn score_text(score: u32) -> String {
    format!("Score: {score}")
}

pub fn health_text(health: u32) -> String {
    format!("Health: {health}")
}

/// Sign-in line on the main menu
pub fn account_text(user: Option<&UserRef>) -> String {
    match user {
        Some(user) => format!("Signed in as {}", user.label()),
        None => "Playing offline".to_string(),
    }
}

/// Title and body for the results screen
pub fn results_text(result: &MatchResult) -> (String, String) {
    let title = match result.outcome {
        GamePhase::Victory => "Victory!",
        _ => "Game Over",
    };
    let body = format!(
        "Final score: {} ({} enemies destroyed)",
        result.score, result.kills
    );
    (title.to_string(), body)
}

/// Status line for the score submission
pub fn save_status_text(status: &SaveStatus) -> &'static str {
    match status {
        SaveStatus::Pending => "Saving score...",
        SaveStatus::Saved { updated: true } => "New high score saved!",
        SaveStatus::Saved { updated: false } => "Score recorded. Your best still stands.",
        SaveStatus::NotSignedIn => "Sign in to save your score",
        SaveStatus::AwaitingName => "Enter a name to submit your score",
        SaveStatus::Offline => "Leaderboard offline; score not saved",
        SaveStatus::Failed(_) => "Could not save score",
    }
}
