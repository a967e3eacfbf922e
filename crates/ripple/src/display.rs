//! On-screen geometry: a `2·aspect × 2` quad under an orthographic camera.
//!
//! The camera spans `[-aspect, aspect] × [-1, 1]`, so the quad always fills
//! the viewport while the simulation grid keeps its own resolution.

use glam::{Mat4, Vec2, Vec3};

const CAMERA_Z: f32 = 5.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 10.0;

/// Triangle list over the four corners returned by [`DisplayGeometry::corners`].
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

/// A quad corner: world position on the z = 0 plane and surface coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corner {
    pub position: Vec3,
    pub uv: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayGeometry {
    aspect: f32,
}

impl DisplayGeometry {
    pub fn new(aspect: f32) -> Self {
        Self { aspect }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Bottom-left, bottom-right, top-left, top-right.
    pub fn corners(&self) -> [Corner; 4] {
        let a = self.aspect;
        let corner = |x: f32, y: f32, uv: Vec2| Corner {
            position: Vec3::new(x, y, 0.0),
            uv,
        };
        [
            corner(-a, -1.0, Vec2::new(0.0, 0.0)),
            corner(a, -1.0, Vec2::new(1.0, 0.0)),
            corner(-a, 1.0, Vec2::new(0.0, 1.0)),
            corner(a, 1.0, Vec2::new(1.0, 1.0)),
        ]
    }

    pub fn view_projection(&self) -> Mat4 {
        let a = self.aspect;
        let projection = Mat4::orthographic_rh(-a, a, -1.0, 1.0, NEAR, FAR);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, CAMERA_Z), Vec3::ZERO, Vec3::Y);
        projection * view
    }
}

/// Width over height, guarding against a zero height.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    width as f32 / height.max(1) as f32
}
