//! Vertex types for the overlay pass
//!
//! Positions are in visual space (origin center, Y up); the pipeline
//! projects them through the orthographic camera before upload.

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for elements the overlay scene does not carry
pub mod colors {
    pub const BACKGROUND: [f32; 4] = [0.01, 0.01, 0.04, 1.0];
    pub const STAR: [f32; 4] = [0.8, 0.85, 1.0, 0.7];
    pub const STAR_DIM: [f32; 4] = [0.5, 0.55, 0.8, 0.4];
    pub const PLAYER_BULLET: [f32; 4] = [1.0, 0.95, 0.3, 1.0];
    pub const ENEMY_BULLET: [f32; 4] = [1.0, 0.35, 0.2, 1.0];
}
