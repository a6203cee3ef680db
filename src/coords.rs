//! Coordinate bridge between screen space and visual space
//!
//! Screen space is what pointer events and colliders use: origin top-left,
//! Y down. Visual space is what the overlay camera uses: origin at the
//! viewport center, Y up.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{VIEWPORT_HEIGHT, VIEWPORT_WIDTH};

/// A point in screen space (pixels, origin top-left, Y down)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPos(pub Vec2);

/// A point in visual space (origin center, Y up)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualPos(pub Vec2);

impl ScreenPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    #[inline]
    pub fn x(self) -> f32 {
        self.0.x
    }

    #[inline]
    pub fn y(self) -> f32 {
        self.0.y
    }
}

impl VisualPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    #[inline]
    pub fn x(self) -> f32 {
        self.0.x
    }

    #[inline]
    pub fn y(self) -> f32 {
        self.0.y
    }
}

/// Fixed viewport the two spaces are defined against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Screen -> visual: `vx = x - w/2`, `vy = h/2 - y`
    #[inline]
    pub fn to_visual(&self, p: ScreenPos) -> VisualPos {
        let half = self.half_extents();
        VisualPos::new(p.0.x - half.x, half.y - p.0.y)
    }

    /// Visual -> screen: `x = vx + w/2`, `y = h/2 - vy`
    #[inline]
    pub fn to_screen(&self, p: VisualPos) -> ScreenPos {
        let half = self.half_extents();
        ScreenPos::new(p.0.x + half.x, half.y - p.0.y)
    }

    /// Whether a screen point lies inside the canvas
    pub fn contains(&self, p: ScreenPos) -> bool {
        p.0.x >= 0.0 && p.0.x <= self.width && p.0.y >= 0.0 && p.0.y <= self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_center_maps_to_origin() {
        let vp = Viewport::default();
        let v = vp.to_visual(ScreenPos::new(400.0, 300.0));
        assert_eq!(v, VisualPos::new(0.0, 0.0));
    }

    #[test]
    fn test_corners() {
        let vp = Viewport::default();
        assert_eq!(vp.to_visual(ScreenPos::new(0.0, 0.0)), VisualPos::new(-400.0, 300.0));
        assert_eq!(vp.to_visual(ScreenPos::new(800.0, 600.0)), VisualPos::new(400.0, -300.0));
        assert_eq!(vp.to_screen(VisualPos::new(0.0, -200.0)), ScreenPos::new(400.0, 500.0));
    }

    proptest! {
        #[test]
        fn round_trip_screen_visual_screen(x in 0.0f32..800.0, y in 0.0f32..600.0) {
            let vp = Viewport::default();
            let back = vp.to_screen(vp.to_visual(ScreenPos::new(x, y)));
            prop_assert!((back.x() - x).abs() < 1e-3);
            prop_assert!((back.y() - y).abs() < 1e-3);
        }

        #[test]
        fn round_trip_visual_screen_visual(x in -400.0f32..400.0, y in -300.0f32..300.0) {
            let vp = Viewport::new(800.0, 600.0);
            let back = vp.to_visual(vp.to_screen(VisualPos::new(x, y)));
            prop_assert!((back.x() - x).abs() < 1e-3);
            prop_assert!((back.y() - y).abs() < 1e-3);
        }
    }
}
