//! Running gateway calls without blocking the frame loop
//!
//! Each call is spawned onto a [`TaskSpawner`] and its result comes back
//! through a oneshot channel as a [`Pending`] handle, which the game polls
//! once per tick.

use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::LocalBoxFuture;

use super::{GatewayError, LeaderboardEntry, PersistenceGateway, UserRef};

/// Somewhere to run `!Send` futures
pub trait TaskSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}

/// Spawner backed by a `futures` local pool (native builds and tests)
pub struct PoolSpawner {
    spawner: futures::executor::LocalSpawner,
}

impl PoolSpawner {
    pub fn new(pool: &futures::executor::LocalPool) -> Self {
        Self {
            spawner: pool.spawner(),
        }
    }
}

impl TaskSpawner for PoolSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        use futures::task::LocalSpawnExt;
        if let Err(e) = self.spawner.spawn_local(task) {
            log::error!("Failed to spawn persistence task: {e}");
        }
    }
}

/// Spawner on the browser event loop
#[cfg(target_arch = "wasm32")]
pub struct WasmSpawner;

#[cfg(target_arch = "wasm32")]
impl TaskSpawner for WasmSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Result of a call that may not have finished yet
pub struct Pending<T> {
    rx: Option<oneshot::Receiver<Result<T, GatewayError>>>,
}

impl<T> Pending<T> {
    /// Poll once. Returns `Some` exactly once, when the call completes.
    /// A task dropped before replying yields [`GatewayError::Cancelled`].
    pub fn poll_ready(&mut self) -> Option<Result<T, GatewayError>> {
        let rx = self.rx.as_mut()?;
        let out = match rx.try_recv() {
            Ok(Some(result)) => result,
            Ok(None) => return None,
            Err(oneshot::Canceled) => Err(GatewayError::Cancelled),
        };
        self.rx = None;
        Some(out)
    }

    /// Whether a result is still to come
    pub fn is_waiting(&self) -> bool {
        self.rx.is_some()
    }
}

/// Gateway plus a spawner; every call returns a [`Pending`]
#[derive(Clone)]
pub struct PersistenceClient {
    gateway: Rc<dyn PersistenceGateway>,
    spawner: Rc<dyn TaskSpawner>,
}

impl PersistenceClient {
    pub fn new(gateway: Rc<dyn PersistenceGateway>, spawner: Rc<dyn TaskSpawner>) -> Self {
        Self { gateway, spawner }
    }

    pub fn gateway(&self) -> &Rc<dyn PersistenceGateway> {
        &self.gateway
    }

    pub fn current_user(&self) -> Option<UserRef> {
        self.gateway.current_user()
    }

    /// Spawn `call` against the gateway and hand back its pending result
    fn run<T, F>(&self, call: F) -> Pending<T>
    where
        T: 'static,
        F: FnOnce(Rc<dyn PersistenceGateway>) -> LocalBoxFuture<'static, Result<T, GatewayError>>,
    {
        let (tx, rx) = oneshot::channel();
        let fut = call(Rc::clone(&self.gateway));
        self.spawner.spawn_local(Box::pin(async move {
            // Receiver gone means nobody cares about the answer
            let _ = tx.send(fut.await);
        }));
        Pending { rx: Some(rx) }
    }

    pub fn save_score(&self, user_id: &str, score: u32, display_name: &str) -> Pending<bool> {
        let (user_id, name) = (user_id.to_string(), display_name.to_string());
        self.run(move |gw| {
            Box::pin(async move { gw.save_high_score_if_greater(&user_id, score, &name).await })
        })
    }

    pub fn high_score(&self, user_id: &str) -> Pending<u32> {
        let user_id = user_id.to_string();
        self.run(move |gw| Box::pin(async move { gw.high_score(&user_id).await }))
    }

    pub fn leaderboard(&self, limit: usize) -> Pending<Vec<LeaderboardEntry>> {
        self.run(move |gw| Box::pin(async move { gw.leaderboard(limit).await }))
    }

    pub fn update_display_name(&self, user_id: &str, display_name: &str) -> Pending<()> {
        let (user_id, name) = (user_id.to_string(), display_name.to_string());
        self.run(move |gw| Box::pin(async move { gw.update_display_name(&user_id, &name).await }))
    }

    pub fn sign_in_with_email(&self, email: &str, password: &str) -> Pending<UserRef> {
        let (email, password) = (email.to_string(), password.to_string());
        self.run(move |gw| Box::pin(async move { gw.sign_in_with_email(&email, &password).await }))
    }

    pub fn create_account(&self, email: &str, password: &str) -> Pending<UserRef> {
        let (email, password) = (email.to_string(), password.to_string());
        self.run(move |gw| Box::pin(async move { gw.create_account(&email, &password).await }))
    }

    pub fn sign_in_with_idp(&self, provider_id: &str, id_token: &str) -> Pending<UserRef> {
        let (provider, token) = (provider_id.to_string(), id_token.to_string());
        self.run(move |gw| Box::pin(async move { gw.sign_in_with_idp(&provider, &token).await }))
    }

    pub fn sign_out(&self) -> Pending<()> {
        self.run(|gw| Box::pin(async move { gw.sign_out().await }))
    }
}
