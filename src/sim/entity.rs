//! Shared entity plumbing
//!
//! Every ship owns one collider and one visual proxy, plus at most one model
//! load in flight. [`EntityHandles`] keeps the three together so they are
//! synced together and released together, once.

use crate::coords::{Viewport, VisualPos};
use crate::overlay::{LoadTicket, ProxyId, VisualOverlay, VisualProxy};

use super::physics::{BodyId, PhysicsWorld};

/// Mutable access to the worlds an entity lives in
pub struct Stage<'a> {
    pub physics: &'a mut PhysicsWorld,
    pub overlay: &'a mut VisualOverlay,
    pub viewport: Viewport,
}

/// Collider + proxy + pending load, with a one-shot release
#[derive(Debug, Default)]
pub struct EntityHandles {
    pub collider: Option<BodyId>,
    pub proxy: Option<ProxyId>,
    pub pending_model: Option<LoadTicket>,
    destroyed: bool,
}

impl EntityHandles {
    /// Create collider and placeholder proxy at `pos`, and request the model
    pub fn create(
        stage: &mut Stage,
        pos: VisualPos,
        radius: f32,
        placeholder: VisualProxy,
        model_path: &str,
    ) -> Self {
        let collider = stage
            .physics
            .spawn_circle(stage.viewport.to_screen(pos), radius);
        let proxy = stage.overlay.add(placeholder, pos);
        let pending_model = stage.overlay.loader.request(model_path);
        Self {
            collider: Some(collider),
            proxy: Some(proxy),
            pending_model: Some(pending_model),
            destroyed: false,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Push `pos` to the collider (screen space) and the proxy (visual space)
    pub fn sync(&mut self, stage: &mut Stage, pos: VisualPos) {
        if self.destroyed {
            return;
        }
        if let Some(collider) = self.collider {
            stage
                .physics
                .set_position(collider, stage.viewport.to_screen(pos));
        }
        if let Some(proxy) = self.proxy {
            if !stage.overlay.update(proxy, pos) {
                log::warn!("Visual proxy {:?} vanished from the overlay; visuals paused", proxy);
                self.proxy = None;
            }
        }
    }

    /// Swap the placeholder for a loaded model if `ticket` is ours
    pub fn attach_model(
        &mut self,
        ticket: LoadTicket,
        model: VisualProxy,
        stage: &mut Stage,
        pos: VisualPos,
    ) -> Result<(), VisualProxy> {
        if self.destroyed || self.pending_model != Some(ticket) {
            return Err(model);
        }
        self.pending_model = None;
        match self.proxy {
            Some(proxy) if stage.overlay.contains(proxy) => {
                stage.overlay.replace(proxy, model);
            }
            _ => self.proxy = Some(stage.overlay.add(model, pos)),
        }
        Ok(())
    }

    /// Release collider, proxy and pending load. Returns false (and does
    /// nothing) if already released.
    pub fn release(&mut self, stage: &mut Stage) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;

        if let Some(ticket) = self.pending_model.take() {
            stage.overlay.loader.cancel(ticket);
        }
        if let Some(proxy) = self.proxy.take() {
            if !stage.overlay.remove(proxy) {
                log::warn!("Visual proxy {:?} was already disposed", proxy);
            }
        }
        if let Some(collider) = self.collider.take() {
            if !stage.physics.remove(collider) {
                log::warn!("Collider {:?} was already released", collider);
            }
        }
        true
    }
}
