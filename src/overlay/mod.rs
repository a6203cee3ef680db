//! Visual overlay: the 3D-styled layer composited over the simulation
//!
//! Owns the proxy scene, an orthographic camera fixed to the viewport, the
//! lighting rig and the model loader. Holds no gameplay state; entities push
//! positions in and the renderer pulls a [`DrawList`] out.

pub mod assets;
pub mod proxy;

pub use assets::{AssetError, AssetLoader, AssetRequest, LoadTicket, ModelData, ResolvedAsset};
pub use proxy::{Mesh, Shape, VisualProxy};

use glam::Vec2;

use crate::coords::{Viewport, VisualPos};

/// Handle to a node in the overlay scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(u32);

/// Orthographic camera covering exactly the viewport
#[derive(Debug, Clone, Copy)]
pub struct OrthoCamera {
    pub viewport: Viewport,
}

impl OrthoCamera {
    /// Visual space -> normalized device coordinates
    #[inline]
    pub fn project(&self, p: Vec2) -> Vec2 {
        p / self.viewport.half_extents()
    }
}

/// Ambient + one directional light
#[derive(Debug, Clone, Copy)]
pub struct Lighting {
    pub ambient: f32,
    pub directional: f32,
    /// Direction the light shines from (unnormalized)
    pub direction: [f32; 3],
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.5,
            directional: 0.5,
            direction: [0.0, 1.0, 5.0],
        }
    }
}

impl Lighting {
    /// Brightness of a camera-facing surface
    pub fn intensity(&self) -> f32 {
        let [x, y, z] = self.direction;
        let len = (x * x + y * y + z * z).sqrt();
        let facing = if len > 0.0 { (z / len).max(0.0) } else { 0.0 };
        (self.ambient + self.directional * facing).min(1.0)
    }

    pub fn shade(&self, color: [f32; 4]) -> [f32; 4] {
        let k = self.intensity();
        [color[0] * k, color[1] * k, color[2] * k, color[3]]
    }
}

#[derive(Debug)]
struct SceneNode {
    id: ProxyId,
    proxy: VisualProxy,
    position: VisualPos,
    tint: Option<[f32; 4]>,
}

/// One mesh ready to draw
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub shape: Shape,
    /// Mesh center in visual space
    pub center: Vec2,
    pub rotation: f32,
    pub color: [f32; 4],
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub items: Vec<DrawItem>,
    /// Background tile scroll in pixels
    pub background_offset: f32,
}

/// Owner of the visual scene
pub struct VisualOverlay {
    pub camera: OrthoCamera,
    pub lighting: Lighting,
    pub loader: AssetLoader,
    nodes: Vec<SceneNode>,
    next_id: u32,
    disposed_meshes: u64,
    frames: u64,
    background_offset: f32,
}

impl VisualOverlay {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            camera: OrthoCamera { viewport },
            lighting: Lighting::default(),
            loader: AssetLoader::new(),
            nodes: Vec::new(),
            next_id: 0,
            disposed_meshes: 0,
            frames: 0,
            background_offset: 0.0,
        }
    }

    fn index_of(&self, id: ProxyId) -> Option<usize> {
        self.nodes.binary_search_by_key(&id, |n| n.id).ok()
    }

    /// Put a proxy in the scene
    pub fn add(&mut self, proxy: VisualProxy, position: VisualPos) -> ProxyId {
        self.next_id += 1;
        let id = ProxyId(self.next_id);
        self.nodes.push(SceneNode {
            id,
            proxy,
            position,
            tint: None,
        });
        id
    }

    /// Take a proxy out of the scene and dispose it. False if already gone.
    pub fn remove(&mut self, id: ProxyId) -> bool {
        match self.index_of(id) {
            Some(i) => {
                let node = self.nodes.remove(i);
                self.disposed_meshes += node.proxy.dispose() as u64;
                true
            }
            None => false,
        }
    }

    /// Move a proxy. False for an unknown id.
    pub fn update(&mut self, id: ProxyId, position: VisualPos) -> bool {
        match self.index_of(id) {
            Some(i) => {
                self.nodes[i].position = position;
                true
            }
            None => false,
        }
    }

    /// Swap in a new proxy at the same position, disposing the old one
    pub fn replace(&mut self, id: ProxyId, proxy: VisualProxy) -> bool {
        match self.index_of(id) {
            Some(i) => {
                let old = std::mem::replace(&mut self.nodes[i].proxy, proxy);
                self.disposed_meshes += old.dispose() as u64;
                true
            }
            None => {
                self.disposed_meshes += proxy.dispose() as u64;
                false
            }
        }
    }

    /// Override the color of every part (damage flash); `None` restores it
    pub fn set_tint(&mut self, id: ProxyId, tint: Option<[f32; 4]>) -> bool {
        match self.index_of(id) {
            Some(i) => {
                self.nodes[i].tint = tint;
                true
            }
            None => false,
        }
    }

    pub fn position(&self, id: ProxyId) -> Option<VisualPos> {
        self.index_of(id).map(|i| self.nodes[i].position)
    }

    pub fn proxy(&self, id: ProxyId) -> Option<&VisualProxy> {
        self.index_of(id).map(|i| &self.nodes[i].proxy)
    }

    pub fn contains(&self, id: ProxyId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Meshes disposed over the overlay's lifetime
    pub fn disposed_count(&self) -> u64 {
        self.disposed_meshes
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Remove and dispose everything, cancelling outstanding loads
    pub fn clear(&mut self) {
        for node in self.nodes.drain(..) {
            self.disposed_meshes += node.proxy.dispose() as u64;
        }
        self.loader.clear();
    }

    /// Per-frame step: scroll the background and collect finished loads
    pub fn advance(&mut self, dt: f32, scroll_speed: f32) -> Vec<ResolvedAsset> {
        self.frames += 1;
        let tile = self.camera.viewport.height;
        self.background_offset = (self.background_offset + scroll_speed * dt) % tile;
        self.loader.poll()
    }

    pub fn background_offset(&self) -> f32 {
        self.background_offset
    }

    /// Build the frame's draw list (lit, tinted, back to front by id)
    pub fn draw_list(&self) -> DrawList {
        let mut items = Vec::new();
        for node in &self.nodes {
            for mesh in node.proxy.meshes() {
                let color = node.tint.unwrap_or(mesh.color);
                items.push(DrawItem {
                    shape: mesh.shape,
                    center: node.position.0 + mesh.offset(),
                    rotation: mesh.rotation,
                    color: self.lighting.shade(color),
                });
            }
        }
        DrawList {
            items,
            background_offset: self.background_offset,
        }
    }
}
