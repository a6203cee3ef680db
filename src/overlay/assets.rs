//! Asynchronous model loading
//!
//! Loads are requested synchronously from gameplay code and fulfilled later
//! by whoever drains [`AssetLoader::take_requests`] (the browser driver
//! fetches over HTTP; tests reply by hand). Each load is tied to a
//! [`LoadTicket`]. Cancelling a ticket drops its receiver, so a reply that
//! arrives afterwards goes nowhere.

use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::proxy::{Mesh, VisualProxy};

/// Asset path for the player ship model
pub const PLAYER_MODEL: &str = "assets/models/player.json";
/// Asset path for the enemy ship model
pub const ENEMY_MODEL: &str = "assets/models/enemy.json";

/// Identifies one in-flight model load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u32);

impl std::fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "load#{}", self.0)
    }
}

/// Why a model could not be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("fetch failed for {path}: {message}")]
    Fetch { path: String, message: String },
    #[error("model {path} is not valid: {message}")]
    Decode { path: String, message: String },
    #[error("model {0} has no parts")]
    Empty(String),
    #[error("loader for {0} went away without replying")]
    Abandoned(String),
}

/// On-disk model description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelData {
    pub name: String,
    pub parts: Vec<Mesh>,
}

impl ModelData {
    /// Parse and validate a model file
    pub fn from_json(path: &str, json: &str) -> Result<Self, AssetError> {
        let model: ModelData = serde_json::from_str(json).map_err(|e| AssetError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        if model.parts.is_empty() {
            return Err(AssetError::Empty(path.to_string()));
        }
        Ok(model)
    }

    /// Single-part models become primitives, the rest composites
    pub fn into_proxy(mut self) -> VisualProxy {
        if self.parts.len() == 1 {
            VisualProxy::Primitive(self.parts.remove(0))
        } else {
            VisualProxy::Composite(self.parts)
        }
    }
}

pub type LoadResult = Result<ModelData, AssetError>;

/// A load waiting to be fulfilled
pub struct AssetRequest {
    pub ticket: LoadTicket,
    pub path: String,
    reply: oneshot::Sender<LoadResult>,
}

impl AssetRequest {
    /// Deliver the result. A no-op if the requester was destroyed meanwhile.
    pub fn resolve(self, result: LoadResult) {
        if self.reply.send(result).is_err() {
            log::debug!("{} ({}) resolved for a destroyed owner; discarded", self.ticket, self.path);
        }
    }
}

struct PendingLoad {
    ticket: LoadTicket,
    path: String,
    rx: oneshot::Receiver<LoadResult>,
}

/// A load that finished successfully this frame
#[derive(Debug)]
pub struct ResolvedAsset {
    pub ticket: LoadTicket,
    pub proxy: VisualProxy,
}

/// Tracks outstanding model loads
#[derive(Default)]
pub struct AssetLoader {
    next_ticket: u32,
    pending: Vec<PendingLoad>,
    outbox: Vec<AssetRequest>,
    cancelled: u64,
    failed: u64,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a model load
    pub fn request(&mut self, path: &str) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        let (tx, rx) = oneshot::channel();
        self.pending.push(PendingLoad {
            ticket,
            path: path.to_string(),
            rx,
        });
        self.outbox.push(AssetRequest {
            ticket,
            path: path.to_string(),
            reply: tx,
        });
        ticket
    }

    /// Hand queued loads to the fetcher
    pub fn take_requests(&mut self) -> Vec<AssetRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Mark a load stale. Its eventual reply is discarded.
    pub fn cancel(&mut self, ticket: LoadTicket) -> bool {
        self.outbox.retain(|r| r.ticket != ticket);
        let before = self.pending.len();
        self.pending.retain(|p| p.ticket != ticket);
        let removed = before != self.pending.len();
        if removed {
            self.cancelled += 1;
        }
        removed
    }

    /// Collect finished loads. Failures are logged and dropped; the owner
    /// keeps its placeholder.
    pub fn poll(&mut self) -> Vec<ResolvedAsset> {
        let mut resolved = Vec::new();
        let mut failed = 0;

        self.pending.retain_mut(|load| match load.rx.try_recv() {
            Ok(None) => true,
            Ok(Some(Ok(model))) => {
                log::info!("Model '{}' loaded ({})", model.name, load.path);
                resolved.push(ResolvedAsset {
                    ticket: load.ticket,
                    proxy: model.into_proxy(),
                });
                false
            }
            Ok(Some(Err(e))) => {
                log::warn!("{e}; keeping placeholder");
                failed += 1;
                false
            }
            Err(_) => {
                log::warn!("{}; keeping placeholder", AssetError::Abandoned(load.path.clone()));
                failed += 1;
                false
            }
        });

        self.failed += failed;
        resolved
    }

    pub fn is_pending(&self, ticket: LoadTicket) -> bool {
        self.pending.iter().any(|p| p.ticket == ticket)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }

    pub fn failed_count(&self) -> u64 {
        self.failed
    }

    /// Cancel everything (scene teardown)
    pub fn clear(&mut self) {
        self.cancelled += self.pending.len() as u64;
        self.pending.clear();
        self.outbox.clear();
    }
}

/// Decode one of the models compiled into the binary (headless builds)
pub fn bundled_model(path: &str) -> LoadResult {
    let json = match path {
        PLAYER_MODEL => include_str!("../../assets/models/player.json"),
        ENEMY_MODEL => include_str!("../../assets/models/enemy.json"),
        _ => {
            return Err(AssetError::Fetch {
                path: path.to_string(),
                message: "not bundled".into(),
            });
        }
    };
    ModelData::from_json(path, json)
}

/// Fetch and decode a model over HTTP
pub async fn fetch_model(client: &reqwest::Client, base_url: &str, path: &str) -> LoadResult {
    let url = format!("{}/{}", base_url.trim_end_matches('/'), path);
    let fetch_err = |message: String| AssetError::Fetch {
        path: path.to_string(),
        message,
    };

    let res = client
        .get(&url)
        .send()
        .await
        .map_err(|e| fetch_err(e.to_string()))?;
    if !res.status().is_success() {
        return Err(fetch_err(format!("HTTP {}", res.status())));
    }
    let body = res.text().await.map_err(|e| fetch_err(e.to_string()))?;
    ModelData::from_json(path, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::proxy::Shape;

    fn two_part_model() -> ModelData {
        ModelData {
            name: "test".into(),
            parts: vec![
                Mesh::new(Shape::Sphere { radius: 5.0 }, [1.0; 4]),
                Mesh::new(Shape::Panel { width: 20.0, height: 3.0 }, [1.0; 4]),
            ],
        }
    }

    #[test]
    fn test_request_then_resolve() {
        let mut loader = AssetLoader::new();
        let ticket = loader.request(PLAYER_MODEL);
        assert!(loader.poll().is_empty());

        let requests = loader.take_requests();
        assert_eq!(requests.len(), 1);
        for req in requests {
            req.resolve(Ok(two_part_model()));
        }

        let done = loader.poll();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].ticket, ticket);
        assert!(done[0].proxy.is_composite());
        assert!(!loader.is_pending(ticket));
    }

    #[test]
    fn test_cancelled_load_is_discarded() {
        let mut loader = AssetLoader::new();
        let ticket = loader.request(ENEMY_MODEL);
        let requests = loader.take_requests();

        assert!(loader.cancel(ticket));
        for req in requests {
            req.resolve(Ok(two_part_model()));
        }
        assert!(loader.poll().is_empty());
        assert_eq!(loader.cancelled_count(), 1);
        assert!(!loader.cancel(ticket));
    }

    #[test]
    fn test_cancel_before_dispatch_drops_request() {
        let mut loader = AssetLoader::new();
        let ticket = loader.request(ENEMY_MODEL);
        loader.cancel(ticket);
        assert!(loader.take_requests().is_empty());
    }

    #[test]
    fn test_failure_keeps_nothing() {
        let mut loader = AssetLoader::new();
        loader.request(PLAYER_MODEL);
        for req in loader.take_requests() {
            let path = req.path.clone();
            req.resolve(Err(AssetError::Fetch {
                path,
                message: "404".into(),
            }));
        }
        assert!(loader.poll().is_empty());
        assert_eq!(loader.failed_count(), 1);
        assert_eq!(loader.pending_count(), 0);
    }

    #[test]
    fn test_dropped_request_counts_as_failure() {
        let mut loader = AssetLoader::new();
        loader.request(PLAYER_MODEL);
        drop(loader.take_requests());
        assert!(loader.poll().is_empty());
        assert_eq!(loader.failed_count(), 1);
    }

    #[test]
    fn test_bundled_models_parse() {
        let player = bundled_model(PLAYER_MODEL).expect("player model");
        assert!(player.into_proxy().is_composite());

        let enemy = bundled_model(ENEMY_MODEL).expect("enemy model");
        assert!(!enemy.parts.is_empty());

        assert!(matches!(
            bundled_model("assets/models/boss.json"),
            Err(AssetError::Fetch { .. })
        ));
    }

    #[test]
    fn test_empty_model_rejected() {
        let err = ModelData::from_json("x.json", r#"{"name":"x","parts":[]}"#).unwrap_err();
        assert_eq!(err, AssetError::Empty("x.json".into()));
    }
}
