//! Visual proxies: what an entity looks like
//!
//! A proxy is either a single placeholder primitive or a composite model
//! made of several parts. Both release their meshes through [`VisualProxy::dispose`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Primitive solid, drawn as its silhouette facing the camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// Cone seen side-on: a triangle with its apex along +Y
    Cone { radius: f32, height: f32 },
    /// Cube of edge `size`
    Box { size: f32 },
    Sphere { radius: f32 },
    /// Flat panel (wings, fins)
    Panel { width: f32, height: f32 },
}

impl Shape {
    /// Radius of a circle enclosing the silhouette
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Shape::Cone { radius, height } => radius.max(height / 2.0),
            Shape::Box { size } => size * std::f32::consts::FRAC_1_SQRT_2,
            Shape::Sphere { radius } => radius,
            Shape::Panel { width, height } => (width * width + height * height).sqrt() / 2.0,
        }
    }
}

/// One drawable part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub shape: Shape,
    pub color: [f32; 4],
    /// Offset from the proxy origin (visual space)
    #[serde(default)]
    pub offset: [f32; 2],
    /// Rotation about the view axis (radians)
    #[serde(default)]
    pub rotation: f32,
}

impl Mesh {
    pub fn new(shape: Shape, color: [f32; 4]) -> Self {
        Self {
            shape,
            color,
            offset: [0.0, 0.0],
            rotation: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::from(self.offset)
    }
}

/// The rendered representation of an entity
#[derive(Debug, Clone, PartialEq)]
pub enum VisualProxy {
    /// Built-in stand-in used until a model loads (or forever, if it fails)
    Primitive(Mesh),
    /// Loaded multi-part model
    Composite(Vec<Mesh>),
}

impl VisualProxy {
    /// Parts to draw
    pub fn meshes(&self) -> &[Mesh] {
        match self {
            VisualProxy::Primitive(mesh) => std::slice::from_ref(mesh),
            VisualProxy::Composite(parts) => parts,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, VisualProxy::Composite(_))
    }

    /// Release mesh resources. Returns how many meshes were released.
    pub fn dispose(self) -> usize {
        match self {
            VisualProxy::Primitive(_) => 1,
            VisualProxy::Composite(parts) => parts.len(),
        }
    }
}

/// Placeholder looks
pub mod placeholders {
    use super::*;

    pub const PLAYER_GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
    pub const ENEMY_RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    /// Green cone pointing up the screen
    pub fn player() -> VisualProxy {
        VisualProxy::Primitive(Mesh::new(
            Shape::Cone {
                radius: 15.0,
                height: 30.0,
            },
            PLAYER_GREEN,
        ))
    }

    /// Red cube
    pub fn enemy() -> VisualProxy {
        VisualProxy::Primitive(Mesh::new(Shape::Box { size: 20.0 }, ENEMY_RED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispose_counts_every_part() {
        assert_eq!(placeholders::enemy().dispose(), 1);
        let composite = VisualProxy::Composite(vec![
            Mesh::new(Shape::Sphere { radius: 4.0 }, [1.0; 4]),
            Mesh::new(Shape::Panel { width: 30.0, height: 4.0 }, [1.0; 4]),
        ]);
        assert_eq!(composite.meshes().len(), 2);
        assert_eq!(composite.dispose(), 2);
    }

    #[test]
    fn test_shape_json_is_tagged() {
        let shape: Shape = serde_json::from_str(r#"{"kind":"cone","radius":15,"height":30}"#)
            .expect("cone parses");
        assert_eq!(
            shape,
            Shape::Cone {
                radius: 15.0,
                height: 30.0
            }
        );
    }
}
