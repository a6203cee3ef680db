//! WebGPU rendering module
//!
//! The overlay draw list, bullets and starfield are tessellated on the CPU
//! each frame and drawn as flat-colored triangles in one pass.

pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use pipeline::{RenderError, RenderState, frame_vertices, letterbox};
pub use vertex::Vertex;
