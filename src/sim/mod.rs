//! Gameplay simulation
//!
//! Entities, bullets and colliders plus the [`Orchestrator`] that advances
//! them once per frame. Nothing here touches the DOM or the GPU; the only
//! outside world is the overlay scene graph and the persistence client.
//! Randomness comes from a seeded PCG so a match replays identically.

pub mod bullets;
pub mod enemy;
pub mod entity;
pub mod orchestrator;
pub mod physics;
pub mod player;

pub use bullets::{Bullet, BulletGroup, Faction};
pub use enemy::Enemy;
pub use entity::{EntityHandles, Stage};
pub use orchestrator::{GameEvent, GamePhase, MatchResult, Orchestrator, SaveStatus};
pub use physics::{BodyId, PhysicsWorld};
pub use player::Player;
