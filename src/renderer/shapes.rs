//! Tessellation of overlay shapes into triangles (visual space)

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::{Vertex, colors};
use crate::coords::Viewport;
use crate::overlay::{DrawItem, Shape};

/// Segments used for spheres and bullets
const CIRCLE_SEGMENTS: u32 = 16;

/// Stars per background tile
const STAR_COUNT: u32 = 90;

fn rotate(p: Vec2, rotation: f32) -> Vec2 {
    if rotation == 0.0 {
        return p;
    }
    Vec2::from_angle(rotation).rotate(p)
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Rectangle of `half` extents around `center`, rotated
pub fn quad(center: Vec2, half: Vec2, rotation: f32, color: [f32; 4]) -> Vec<Vertex> {
    let corners = [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
    .map(|c| center + rotate(c, rotation));

    [0, 1, 2, 0, 2, 3]
        .into_iter()
        .map(|i| Vertex::new(corners[i].x, corners[i].y, color))
        .collect()
}

/// Cone silhouette: apex at +height/2 along the rotated Y axis
pub fn cone(center: Vec2, radius: f32, height: f32, rotation: f32, color: [f32; 4]) -> Vec<Vertex> {
    let h = height / 2.0;
    [
        Vec2::new(0.0, h),
        Vec2::new(-radius, -h),
        Vec2::new(radius, -h),
    ]
    .into_iter()
    .map(|p| {
        let p = center + rotate(p, rotation);
        Vertex::new(p.x, p.y, color)
    })
    .collect()
}

/// Triangles for one overlay mesh
pub fn draw_item(item: &DrawItem) -> Vec<Vertex> {
    match item.shape {
        Shape::Cone { radius, height } => cone(item.center, radius, height, item.rotation, item.color),
        Shape::Box { size } => quad(item.center, Vec2::splat(size / 2.0), item.rotation, item.color),
        Shape::Sphere { radius } => circle(item.center, radius, item.color, CIRCLE_SEGMENTS),
        Shape::Panel { width, height } => quad(
            item.center,
            Vec2::new(width / 2.0, height / 2.0),
            item.rotation,
            item.color,
        ),
    }
}

/// Cheap integer hash for star placement
fn hash(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

fn unit(x: u32) -> f32 {
    (x & 0xffff) as f32 / 65535.0
}

/// Tiled starfield scrolled down by `offset` pixels
pub fn starfield(viewport: Viewport, offset: f32) -> Vec<Vertex> {
    let half = viewport.half_extents();
    let tile = viewport.height;
    let mut vertices = Vec::with_capacity((STAR_COUNT * 12) as usize);

    for i in 0..STAR_COUNT {
        let h = hash(i.wrapping_add(1));
        let x = (unit(h) - 0.5) * viewport.width;
        let base_y = unit(h >> 16) * tile;
        // Scroll downward and wrap within one tile
        let y = (base_y - offset).rem_euclid(tile) - half.y;
        let (size, color) = if h % 5 == 0 {
            (1.5, colors::STAR)
        } else {
            (1.0, colors::STAR_DIM)
        };
        vertices.extend(quad(Vec2::new(x, y), Vec2::splat(size), 0.0, color));
    }

    vertices
}

/// Bullet dot at a visual-space position
pub fn bullet(center: Vec2, radius: f32, color: [f32; 4]) -> Vec<Vertex> {
    circle(center, radius, color, 8)
}
