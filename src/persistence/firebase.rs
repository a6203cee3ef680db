//! Hosted backend over REST
//!
//! Identity: `accounts:signInWithPassword`, `accounts:signUp`,
//! `accounts:signInWithIdp`. Data: realtime database JSON endpoints under
//! `users/{uid}` authenticated with the session's id token, which is
//! exchanged for a new one shortly before it expires.

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    AccessReport, GatewayError, LeaderboardEntry, PersistenceGateway, UserRecord, UserRef,
    rank_entries,
};
use crate::config::BackendConfig;

/// Refresh this long before the id token runs out
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the backend omits `expiresIn`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct Session {
    user: UserRef,
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) >= self.expires_at
    }
}

/// Token lifetimes arrive as decimal strings
fn expiry(now: DateTime<Utc>, expires_in: Option<&str>) -> DateTime<Utc> {
    let secs = expires_in
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    now + Duration::seconds(secs)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

/// Secure-token endpoint reply (snake_case, unlike the identity API)
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

/// Client for the hosted auth + realtime database
pub struct RestGateway {
    http: Client,
    config: BackendConfig,
    session: RefCell<Option<Session>>,
}

/// Pull a human-readable message out of an error body.
/// Identity errors look like `{"error":{"message":"EMAIL_NOT_FOUND"}}`,
/// database errors like `{"error":"Permission denied"}`.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| {
            e.as_str()
                .map(str::to_string)
                .or_else(|| e.get("message").and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn status_error(status: StatusCode, body: &str) -> GatewayError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::PermissionDenied(message),
        _ => GatewayError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}

/// Parse `base` and append query parameters
fn with_query(base: &str, params: &[(&str, &str)]) -> Result<Url, GatewayError> {
    let mut url = Url::parse(base).map_err(|e| GatewayError::Unavailable(format!("bad url: {e}")))?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

/// Send a request and decode a JSON body
async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, GatewayError> {
    let res = req
        .send()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

impl RestGateway {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            http: Client::new(),
            config,
            session: RefCell::new(None),
        }
    }

    fn auth_url(&self, method: &str) -> String {
        format!("{}/accounts:{}", self.config.auth_url, method)
    }

    fn db_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.config.database_url, path)
    }

    /// Id token of the current session, refreshed first if it is about to expire
    async fn token(&self) -> Result<String, GatewayError> {
        let session = self
            .session
            .borrow()
            .clone()
            .ok_or(GatewayError::NotSignedIn)?;
        if !session.needs_refresh(Utc::now()) {
            return Ok(session.id_token);
        }
        self.refresh(session).await
    }

    async fn refresh(&self, session: Session) -> Result<String, GatewayError> {
        let url = with_query(&self.config.token_url, &[("key", self.config.api_key.as_str())])?;
        let body = json!({
            "grant_type": "refresh_token",
            "refresh_token": session.refresh_token,
        });
        let fresh: RefreshResponse = match send_json(self.http.post(url).json(&body)).await {
            Ok(fresh) => fresh,
            Err(e) => {
                log::error!("Refreshing session for {} failed: {e}", session.user.id);
                return Err(e);
            }
        };

        log::debug!("Refreshed id token for {}", session.user.id);
        let token = fresh.id_token.clone();
        let mut current = self.session.borrow_mut();
        // Signed out or switched user while the refresh was in flight
        if let Some(s) = current.as_mut().filter(|s| s.user.id == session.user.id) {
            s.id_token = fresh.id_token;
            s.refresh_token = fresh.refresh_token;
            s.expires_at = expiry(Utc::now(), fresh.expires_in.as_deref());
        }
        Ok(token)
    }

    async fn authenticate(&self, method: &str, body: serde_json::Value) -> Result<UserRef, GatewayError> {
        let url = with_query(&self.auth_url(method), &[("key", self.config.api_key.as_str())])?;
        let req = self.http.post(url).json(&body);
        let auth: AuthResponse = send_json(req).await?;

        let user = UserRef {
            id: auth.local_id,
            email: auth.email,
            display_name: auth.display_name.filter(|n| !n.is_empty()),
        };
        log::info!("Signed in as {}", user.id);
        *self.session.borrow_mut() = Some(Session {
            user: user.clone(),
            id_token: auth.id_token,
            refresh_token: auth.refresh_token,
            expires_at: expiry(Utc::now(), auth.expires_in.as_deref()),
        });
        Ok(user)
    }

    async fn read_record(&self, user_id: &str, token: &str) -> Result<Option<UserRecord>, GatewayError> {
        let url = with_query(&self.db_url(&format!("users/{user_id}")), &[("auth", token)])?;
        send_json(self.http.get(url)).await
    }

    async fn patch_record(
        &self,
        user_id: &str,
        token: &str,
        patch: serde_json::Value,
    ) -> Result<(), GatewayError> {
        let url = with_query(&self.db_url(&format!("users/{user_id}")), &[("auth", token)])?;
        let _: serde_json::Value = send_json(self.http.patch(url).json(&patch)).await?;
        Ok(())
    }

    async fn probe_read(&self, token: &str) -> Result<(), GatewayError> {
        let url = with_query(&self.db_url("users"), &[("auth", token), ("shallow", "true")])?;
        let _: serde_json::Value = send_json(self.http.get(url)).await?;
        Ok(())
    }

    async fn probe_write(&self, user_id: &str, token: &str) -> Result<(), GatewayError> {
        let url = with_query(&self.db_url(&format!("users/{user_id}/test")), &[("auth", token)])?;
        let body = json!({ "testField": format!("Test at {}", Utc::now().to_rfc3339()) });
        let _: serde_json::Value = send_json(self.http.put(url).json(&body)).await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl PersistenceGateway for RestGateway {
    fn current_user(&self) -> Option<UserRef> {
        self.session.borrow().as_ref().map(|s| s.user.clone())
    }

    async fn sign_in_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserRef, GatewayError> {
        let body = serde_json::to_value(PasswordRequest {
            email,
            password,
            return_secure_token: true,
        })
        .map_err(|e| GatewayError::Decode(e.to_string()))?;
        self.authenticate("signInWithPassword", body).await
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<UserRef, GatewayError> {
        let body = serde_json::to_value(PasswordRequest {
            email,
            password,
            return_secure_token: true,
        })
        .map_err(|e| GatewayError::Decode(e.to_string()))?;
        self.authenticate("signUp", body).await
    }

    async fn sign_in_with_idp(
        &self,
        provider_id: &str,
        id_token: &str,
    ) -> Result<UserRef, GatewayError> {
        let body = json!({
            "postBody": format!("id_token={id_token}&providerId={provider_id}"),
            "requestUri": "http://localhost",
            "returnIdpCredential": true,
            "returnSecureToken": true,
        });
        self.authenticate("signInWithIdp", body).await
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        if let Some(session) = self.session.borrow_mut().take() {
            log::info!("Signed out {}", session.user.id);
        }
        Ok(())
    }

    async fn high_score(&self, user_id: &str) -> Result<u32, GatewayError> {
        let token = self.token().await?;
        let url = with_query(
            &self.db_url(&format!("users/{user_id}/highScore")),
            &[("auth", token.as_str())],
        )?;
        let score: Option<u32> = send_json(self.http.get(url)).await?;
        Ok(score.unwrap_or(0))
    }

    async fn save_high_score_if_greater(
        &self,
        user_id: &str,
        score: u32,
        display_name: &str,
    ) -> Result<bool, GatewayError> {
        let token = self.token().await?;

        // Without the stored score nothing is written
        let current = match self.read_record(user_id, &token).await {
            Ok(record) => record.map(|r| r.high_score).unwrap_or(0),
            Err(e) => {
                log::error!("Reading users/{user_id} failed, score {score} not saved: {e}");
                return Err(e);
            }
        };

        let now = Utc::now();
        let updated = score > current;
        let patch = if updated {
            json!({ "highScore": score, "displayName": display_name, "lastPlayed": now })
        } else {
            json!({ "displayName": display_name, "lastPlayed": now })
        };

        if let Err(e) = self.patch_record(user_id, &token, patch).await {
            if matches!(e, GatewayError::PermissionDenied(_)) {
                log::error!("Write to users/{user_id} denied; check database rules");
            }
            return Err(e);
        }

        if updated {
            log::info!("High score updated to {score} for {display_name}");
        } else {
            log::info!("Score {score} does not beat {current}; refreshed name only");
        }
        Ok(updated)
    }

    async fn update_display_name(
        &self,
        user_id: &str,
        display_name: &str,
    ) -> Result<(), GatewayError> {
        let token = self.token().await?;
        self.patch_record(
            user_id,
            &token,
            json!({ "displayName": display_name, "lastUpdated": Utc::now() }),
        )
        .await?;
        if let Some(session) = self.session.borrow_mut().as_mut() {
            if session.user.id == user_id {
                session.user.display_name = Some(display_name.to_string());
            }
        }
        Ok(())
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, GatewayError> {
        let limit_str = limit.to_string();
        // Readable signed out; a failed refresh falls back to anonymous
        let token = self.token().await.ok();
        let mut query = vec![("orderBy", "\"highScore\""), ("limitToLast", limit_str.as_str())];
        if let Some(token) = token.as_deref() {
            query.push(("auth", token));
        }
        let req = self.http.get(with_query(&self.db_url("users"), &query)?);

        // Keyed by user id, unordered; null when empty
        let users: Option<HashMap<String, UserRecord>> = send_json(req).await?;
        let entries = users
            .unwrap_or_default()
            .iter()
            .map(|(id, record)| record.to_entry(id))
            .collect();
        Ok(rank_entries(entries, limit))
    }

    async fn probe_access(&self) -> AccessReport {
        let mut report = AccessReport::default();
        let Some(user) = self.current_user() else {
            report.error = Some("User not authenticated".into());
            return report;
        };
        let token = match self.token().await {
            Ok(token) => token,
            Err(e) => {
                report.error = Some(format!("Session expired: {e}"));
                return report;
            }
        };
        report.authenticated = true;

        match self.probe_read(&token).await {
            Ok(()) => report.can_read_users = true,
            Err(e) => report.error = Some(format!("Cannot read users: {e}")),
        }
        match self.probe_write(&user.id, &token).await {
            Ok(()) => report.can_write_own_data = true,
            Err(e) => report.error = Some(format!("Cannot write to own data: {e}")),
        }

        report
    }
}


/// Requests against a local stand-in for the hosted auth + database
#[cfg(all(test, not(target_arch = "wasm32")))]
mod backend_tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::{Query, State};
    use axum::http::{Method, StatusCode as Status, Uri};
    use serde_json::Value;

    use super::*;

    type Shared = Arc<Mutex<FakeBackend>>;

    const DENIED: &str = r#"{"error":"Permission denied"}"#;

    /// In-process auth + realtime database with just enough behavior
    #[derive(Default)]
    struct FakeBackend {
        users: HashMap<String, Value>,
        tokens: HashSet<String>,
        /// `expiresIn` handed out on sign-in
        expires_in: String,
        fail_reads: bool,
        patches: Vec<Value>,
        refreshes: u32,
    }

    impl FakeBackend {
        fn with_user(mut self, id: &str, record: Value) -> Self {
            self.users.insert(id.to_string(), record);
            self
        }

        fn high_score(&self, id: &str) -> Option<u64> {
            self.users.get(id)?.get("highScore")?.as_u64()
        }

        fn sign_in(&mut self, body: &str) -> (Status, String) {
            let body: Value = serde_json::from_str(body).unwrap_or_default();
            let Some(email) = body.get("email").and_then(Value::as_str) else {
                return (Status::BAD_REQUEST, r#"{"error":{"message":"MISSING_EMAIL"}}"#.into());
            };
            self.tokens.insert("tok1".into());
            let reply = json!({
                "localId": "uid-a",
                "idToken": "tok1",
                "refreshToken": "r1",
                "expiresIn": self.expires_in,
                "email": email,
            });
            (Status::OK, reply.to_string())
        }

        fn refresh(&mut self, body: &str) -> (Status, String) {
            let body: Value = serde_json::from_str(body).unwrap_or_default();
            if body.get("refresh_token").and_then(Value::as_str) != Some("r1") {
                return (Status::BAD_REQUEST, r#"{"error":{"message":"INVALID_REFRESH_TOKEN"}}"#.into());
            }
            self.refreshes += 1;
            self.tokens.remove("tok1");
            self.tokens.insert("tok2".into());
            let reply = json!({
                "id_token": "tok2",
                "refresh_token": "r2",
                "expires_in": "3600",
                "user_id": "uid-a",
            });
            (Status::OK, reply.to_string())
        }

        fn database(
            &mut self,
            method: &Method,
            key: &str,
            query: &HashMap<String, String>,
            body: &str,
        ) -> (Status, String) {
            let authorized = match query.get("auth") {
                Some(token) => self.tokens.contains(token),
                None => key == "users",
            };
            if !authorized {
                return (Status::UNAUTHORIZED, DENIED.into());
            }
            let parts: Vec<&str> = key.split('/').collect();
            let get = *method == Method::GET;
            if get && self.fail_reads {
                return (Status::SERVICE_UNAVAILABLE, r#"{"error":"Service unavailable"}"#.into());
            }

            match (get, parts.as_slice()) {
                (true, ["users"]) => {
                    let mut ranked: Vec<(&String, &Value)> = self.users.iter().collect();
                    ranked.sort_by_key(|(_, r)| r.get("highScore").and_then(Value::as_u64));
                    let limit = query
                        .get("limitToLast")
                        .and_then(|l| l.parse().ok())
                        .unwrap_or(ranked.len());
                    let top: serde_json::Map<String, Value> = ranked
                        .into_iter()
                        .rev()
                        .take(limit)
                        .map(|(id, r)| (id.clone(), r.clone()))
                        .collect();
                    if top.is_empty() {
                        (Status::OK, "null".into())
                    } else {
                        (Status::OK, Value::Object(top).to_string())
                    }
                }
                (true, ["users", id]) => {
                    let record = self.users.get(*id).cloned().unwrap_or(Value::Null);
                    (Status::OK, record.to_string())
                }
                (true, ["users", id, field]) => {
                    let value = self
                        .users
                        .get(*id)
                        .and_then(|r| r.get(*field))
                        .cloned()
                        .unwrap_or(Value::Null);
                    (Status::OK, value.to_string())
                }
                (false, ["users", id]) if *method == Method::PATCH => {
                    let patch: Value = serde_json::from_str(body).unwrap_or_default();
                    let record = self.users.entry(id.to_string()).or_insert_with(|| json!({}));
                    if let (Some(record), Some(fields)) = (record.as_object_mut(), patch.as_object()) {
                        for (k, v) in fields {
                            record.insert(k.clone(), v.clone());
                        }
                    }
                    self.patches.push(patch.clone());
                    (Status::OK, patch.to_string())
                }
                _ => (Status::BAD_REQUEST, r#"{"error":"Invalid path"}"#.into()),
            }
        }

        fn respond(
            &mut self,
            method: &Method,
            path: &str,
            query: &HashMap<String, String>,
            body: &str,
        ) -> (Status, String) {
            if path.starts_with("/accounts:") {
                return self.sign_in(body);
            }
            if path == "/token" {
                return self.refresh(body);
            }
            match path.strip_prefix('/').and_then(|p| p.strip_suffix(".json")) {
                Some(key) => self.database(method, key, query, body),
                None => (Status::NOT_FOUND, "null".into()),
            }
        }
    }

    async fn handle(
        State(backend): State<Shared>,
        method: Method,
        uri: Uri,
        Query(query): Query<HashMap<String, String>>,
        body: String,
    ) -> (Status, String) {
        let mut backend = backend.lock().expect("backend lock");
        backend.respond(&method, uri.path(), &query, &body)
    }

    /// Serve `backend` on an ephemeral port and point a config at it
    async fn serve(backend: FakeBackend) -> (Shared, BackendConfig) {
        let shared = Arc::new(Mutex::new(backend));
        let app = Router::new().fallback(handle).with_state(shared.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let base = format!("http://{addr}");
        let mut config = BackendConfig::new("test-key", base.as_str());
        config.auth_url = base.clone();
        config.token_url = format!("{base}/token");
        (shared, config)
    }

    fn backend() -> FakeBackend {
        FakeBackend {
            expires_in: "3600".into(),
            ..Default::default()
        }
        .with_user("uid-a", json!({ "displayName": "Ace", "highScore": 50 }))
    }

    async fn signed_in(backend: FakeBackend) -> (Shared, RestGateway) {
        let (shared, config) = serve(backend).await;
        let gw = RestGateway::new(config);
        gw.sign_in_with_email("a@b.c", "pw").await.expect("sign in");
        (shared, gw)
    }

    #[tokio::test]
    async fn test_sign_in_sets_session() {
        let (shared, gw) = signed_in(backend()).await;
        let user = gw.current_user().expect("user");
        assert_eq!(user.id, "uid-a");
        assert_eq!(user.email.as_deref(), Some("a@b.c"));

        assert_eq!(gw.high_score("uid-a").await, Ok(50));
        assert_eq!(shared.lock().expect("lock").refreshes, 0);
    }

    #[tokio::test]
    async fn test_higher_score_is_written() {
        let (shared, gw) = signed_in(backend()).await;
        assert_eq!(gw.save_high_score_if_greater("uid-a", 80, "Ace").await, Ok(true));

        let backend = shared.lock().expect("lock");
        assert_eq!(backend.high_score("uid-a"), Some(80));
        assert_eq!(backend.patches[0]["highScore"], json!(80));
        assert!(backend.patches[0].get("lastPlayed").is_some());
    }

    #[tokio::test]
    async fn test_lower_score_refreshes_name_only() {
        let (shared, gw) = signed_in(backend()).await;
        assert_eq!(gw.save_high_score_if_greater("uid-a", 30, "Nova").await, Ok(false));

        let backend = shared.lock().expect("lock");
        assert_eq!(backend.high_score("uid-a"), Some(50));
        assert_eq!(backend.patches.len(), 1);
        assert!(backend.patches[0].get("highScore").is_none());
        assert_eq!(backend.users["uid-a"]["displayName"], json!("Nova"));
    }

    #[tokio::test]
    async fn test_unreadable_record_is_not_overwritten() {
        let (shared, gw) = signed_in(backend()).await;
        shared.lock().expect("lock").fail_reads = true;

        let result = gw.save_high_score_if_greater("uid-a", 30, "Ace").await;
        assert!(matches!(result, Err(GatewayError::Upstream { status: 503, .. })));

        let backend = shared.lock().expect("lock");
        assert!(backend.patches.is_empty());
        assert_eq!(backend.high_score("uid-a"), Some(50));
    }

    #[tokio::test]
    async fn test_leaderboard_decodes_and_ranks() {
        let fake = backend()
            .with_user("uid-b", json!({ "displayName": "Bolt", "highScore": 90 }))
            .with_user("uid-c", json!({ "displayName": "Comet", "highScore": 20 }));
        let (_shared, config) = serve(fake).await;
        let gw = RestGateway::new(config);

        // Readable without signing in
        let board = gw.leaderboard(2).await.expect("board");
        let names: Vec<_> = board.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, ["Bolt", "Ace"]);
        assert_eq!(board[0].high_score, 90);
    }

    #[tokio::test]
    async fn test_empty_leaderboard_is_null() {
        let (_shared, config) = serve(FakeBackend::default()).await;
        let gw = RestGateway::new(config);
        assert_eq!(gw.leaderboard(10).await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_expiring_token_is_refreshed() {
        let mut fake = backend();
        // Inside the refresh margin from the start
        fake.expires_in = "30".into();
        let (shared, gw) = signed_in(fake).await;

        // tok1 is revoked by the refresh, so this only passes with tok2
        assert_eq!(gw.high_score("uid-a").await, Ok(50));
        assert_eq!(gw.save_high_score_if_greater("uid-a", 60, "Ace").await, Ok(true));

        let backend = shared.lock().expect("lock");
        assert_eq!(backend.refreshes, 1);
        assert_eq!(backend.high_score("uid-a"), Some(60));
    }

    #[tokio::test]
    async fn test_failed_refresh_surfaces_error() {
        let mut fake = backend();
        fake.expires_in = "0".into();
        let (_shared, gw) = signed_in(fake).await;
        if let Some(session) = gw.session.borrow_mut().as_mut() {
            session.refresh_token = "stale".into();
        }

        let result = gw.high_score("uid-a").await;
        assert!(matches!(result, Err(GatewayError::Upstream { status: 400, .. })));
    }
}
