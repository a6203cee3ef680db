//! In-process backend
//!
//! Used when no hosted backend is configured, by the native build, and as
//! the fake in tests. Failure flags make reads or writes fail on demand.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;

use super::{
    AccessReport, GatewayError, LeaderboardEntry, PersistenceGateway, UserRecord, UserRef,
    rank_entries,
};

/// Which operations should fail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureFlags {
    pub auth: bool,
    pub read: bool,
    pub write: bool,
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user_id: String,
}

/// Backend kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryGateway {
    records: RefCell<BTreeMap<String, UserRecord>>,
    accounts: RefCell<HashMap<String, Account>>,
    session: RefCell<Option<UserRef>>,
    failures: Cell<FailureFlags>,
    next_user: Cell<u32>,
    writes: Cell<u32>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway with a local guest already signed in
    pub fn with_guest(user_id: &str, display_name: &str) -> Self {
        let gateway = Self::new();
        *gateway.session.borrow_mut() = Some(UserRef {
            id: user_id.to_string(),
            email: None,
            display_name: Some(display_name.to_string()),
        });
        gateway
    }

    pub fn with_failures(self, failures: FailureFlags) -> Self {
        self.failures.set(failures);
        self
    }

    pub fn set_failures(&self, failures: FailureFlags) {
        self.failures.set(failures);
    }

    /// Seed a stored record
    pub fn insert_record(&self, user_id: &str, record: UserRecord) {
        self.records
            .borrow_mut()
            .insert(user_id.to_string(), record);
    }

    pub fn record(&self, user_id: &str) -> Option<UserRecord> {
        self.records.borrow().get(user_id).cloned()
    }

    /// Successful writes so far
    pub fn write_count(&self) -> u32 {
        self.writes.get()
    }

    fn check_read(&self) -> Result<(), GatewayError> {
        if self.failures.get().read {
            return Err(GatewayError::PermissionDenied("read rejected".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), GatewayError> {
        if self.failures.get().write {
            return Err(GatewayError::PermissionDenied("write rejected".into()));
        }
        Ok(())
    }

    fn check_auth(&self) -> Result<(), GatewayError> {
        if self.failures.get().auth {
            return Err(GatewayError::Unavailable("auth offline".into()));
        }
        Ok(())
    }

    fn start_session(&self, user_id: String, email: Option<String>) -> UserRef {
        let display_name = self
            .records
            .borrow()
            .get(&user_id)
            .and_then(|r| r.display_name.clone());
        let user = UserRef {
            id: user_id,
            email,
            display_name,
        };
        *self.session.borrow_mut() = Some(user.clone());
        user
    }

    fn mint_user_id(&self) -> String {
        let n = self.next_user.get() + 1;
        self.next_user.set(n);
        format!("local-{n:04}")
    }
}

#[async_trait(?Send)]
impl PersistenceGateway for MemoryGateway {
    fn current_user(&self) -> Option<UserRef> {
        self.session.borrow().clone()
    }

    async fn sign_in_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserRef, GatewayError> {
        self.check_auth()?;
        let account = self.accounts.borrow().get(email).cloned();
        match account {
            Some(account) if account.password == password => {
                Ok(self.start_session(account.user_id, Some(email.to_string())))
            }
            _ => Err(GatewayError::Upstream {
                status: 400,
                message: "INVALID_LOGIN_CREDENTIALS".into(),
            }),
        }
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<UserRef, GatewayError> {
        self.check_auth()?;
        if self.accounts.borrow().contains_key(email) {
            return Err(GatewayError::Upstream {
                status: 400,
                message: "EMAIL_EXISTS".into(),
            });
        }
        let user_id = self.mint_user_id();
        self.accounts.borrow_mut().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user_id: user_id.clone(),
            },
        );
        Ok(self.start_session(user_id, Some(email.to_string())))
    }

    async fn sign_in_with_idp(
        &self,
        provider_id: &str,
        id_token: &str,
    ) -> Result<UserRef, GatewayError> {
        self.check_auth()?;
        if id_token.is_empty() {
            return Err(GatewayError::Upstream {
                status: 400,
                message: "INVALID_IDP_RESPONSE".into(),
            });
        }
        Ok(self.start_session(format!("{provider_id}:{id_token}"), None))
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        self.session.borrow_mut().take();
        Ok(())
    }

    async fn high_score(&self, user_id: &str) -> Result<u32, GatewayError> {
        self.check_read()?;
        Ok(self
            .records
            .borrow()
            .get(user_id)
            .map(|r| r.high_score)
            .unwrap_or(0))
    }

    async fn save_high_score_if_greater(
        &self,
        user_id: &str,
        score: u32,
        display_name: &str,
    ) -> Result<bool, GatewayError> {
        self.check_write()?;
        let mut records = self.records.borrow_mut();
        let record = records.entry(user_id.to_string()).or_default();
        let updated = score > record.high_score;
        if updated {
            record.high_score = score;
        }
        record.display_name = Some(display_name.to_string());
        record.last_played = Some(Utc::now());
        self.writes.set(self.writes.get() + 1);
        Ok(updated)
    }

    async fn update_display_name(
        &self,
        user_id: &str,
        display_name: &str,
    ) -> Result<(), GatewayError> {
        self.check_write()?;
        let mut records = self.records.borrow_mut();
        let record = records.entry(user_id.to_string()).or_default();
        record.display_name = Some(display_name.to_string());
        record.last_updated = Some(Utc::now());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, GatewayError> {
        self.check_read()?;
        let entries = self
            .records
            .borrow()
            .iter()
            .map(|(id, record)| record.to_entry(id))
            .collect();
        Ok(rank_entries(entries, limit))
    }

    async fn probe_access(&self) -> AccessReport {
        let Some(user) = self.current_user() else {
            return AccessReport {
                error: Some("User not authenticated".into()),
                ..Default::default()
            };
        };
        let failures = self.failures.get();
        let mut report = AccessReport {
            authenticated: true,
            can_read_users: !failures.read,
            can_write_own_data: !failures.write,
            error: None,
        };
        if failures.read {
            report.error = Some("Cannot read users".into());
        } else if failures.write {
            report.error = Some(format!("Cannot write to users/{}", user.id));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_save_only_raises_score() {
        let gw = MemoryGateway::new();
        assert!(block_on(gw.save_high_score_if_greater("u", 50, "A")).expect("save"));
        assert!(!block_on(gw.save_high_score_if_greater("u", 30, "A")).expect("save"));
        assert_eq!(block_on(gw.high_score("u")).expect("read"), 50);
    }

    #[test]
    fn test_lower_score_still_refreshes_name() {
        let gw = MemoryGateway::new();
        block_on(gw.save_high_score_if_greater("u", 50, "Old")).expect("save");
        block_on(gw.save_high_score_if_greater("u", 10, "New")).expect("save");
        let rec = gw.record("u").expect("record");
        assert_eq!(rec.display_name.as_deref(), Some("New"));
        assert_eq!(rec.high_score, 50);
    }

    #[test]
    fn test_leaderboard_top_k_descending() {
        let gw = MemoryGateway::new();
        for (i, score) in [40u32, 90, 10, 70, 55].iter().enumerate() {
            block_on(gw.save_high_score_if_greater(&format!("u{i}"), *score, "P")).expect("save");
        }
        let top = block_on(gw.leaderboard(3)).expect("board");
        let scores: Vec<u32> = top.iter().map(|e| e.high_score).collect();
        assert_eq!(scores, vec![90, 70, 55]);

        let all = block_on(gw.leaderboard(50)).expect("board");
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].high_score > w[1].high_score));
    }

    #[test]
    fn test_unknown_user_scores_zero() {
        let gw = MemoryGateway::new();
        assert_eq!(block_on(gw.high_score("nobody")).expect("read"), 0);
    }

    #[test]
    fn test_accounts() {
        let gw = MemoryGateway::new();
        assert!(gw.current_user().is_none());
        let user = block_on(gw.create_account("a@b.c", "hunter2")).expect("account");
        assert_eq!(gw.current_user(), Some(user.clone()));

        block_on(gw.sign_out()).expect("sign out");
        assert!(gw.current_user().is_none());

        assert!(block_on(gw.sign_in_with_email("a@b.c", "wrong")).is_err());
        let again = block_on(gw.sign_in_with_email("a@b.c", "hunter2")).expect("sign in");
        assert_eq!(again.id, user.id);
        assert!(block_on(gw.create_account("a@b.c", "x")).is_err());
    }

    #[test]
    fn test_idp_sign_in() {
        let gw = MemoryGateway::new();
        assert!(block_on(gw.sign_in_with_idp("google.com", "")).is_err());
        assert!(gw.current_user().is_none());

        let user = block_on(gw.sign_in_with_idp("google.com", "tok")).expect("idp");
        assert_eq!(gw.current_user(), Some(user));
    }

    #[test]
    fn test_failures_surface_as_errors() {
        let gw = MemoryGateway::with_guest("g", "Guest").with_failures(FailureFlags {
            read: true,
            write: true,
            ..Default::default()
        });
        assert!(matches!(
            block_on(gw.leaderboard(10)),
            Err(GatewayError::PermissionDenied(_))
        ));
        assert!(block_on(gw.save_high_score_if_greater("g", 10, "Guest")).is_err());
        assert_eq!(gw.write_count(), 0);

        let report = block_on(gw.probe_access());
        assert!(report.authenticated);
        assert!(!report.can_read_users);
        assert!(report.error.is_some());
    }
}
