//! Pointer impulse: a single pending drop on the surface.

use glam::Vec2;

/// Encodes "no impulse" for shaders. Outside the impulse disk of every cell.
pub const IMPULSE_SENTINEL: Vec2 = Vec2::new(-1.0, -1.0);

/// At most one pending impulse in normalized surface space.
///
/// A press overwrites any impulse not yet consumed; there is no queue.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Impulse {
    pending: Option<Vec2>,
}

impl Impulse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press at normalized surface coordinates.
    pub fn press(&mut self, position: Vec2) {
        self.pending = Some(position);
    }

    /// Record a press given in device pixels with the origin at the top-left.
    pub fn press_pixels(&mut self, x: f64, y: f64, width: u32, height: u32) {
        if let Some(position) = pointer_to_surface(x, y, width, height) {
            self.press(position);
        }
    }

    /// Hand the impulse to one propagation step and clear it.
    pub fn take(&mut self) -> Option<Vec2> {
        self.pending.take()
    }

    pub fn peek(&self) -> Option<Vec2> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Shader-side encoding of the current state.
    pub fn as_uniform(&self) -> Vec2 {
        self.pending.unwrap_or(IMPULSE_SENTINEL)
    }
}

/// Convert a pixel position (y down) to normalized surface space (y up).
///
/// Returns `None` for a zero-sized viewport.
pub fn pointer_to_surface(x: f64, y: f64, width: u32, height: u32) -> Option<Vec2> {
    if width == 0 || height == 0 {
        return None;
    }
    let u = x / width as f64;
    let v = 1.0 - y / height as f64;
    Some(Vec2::new(u as f32, v as f32))
}

/// Whether a point lies inside the impulse disk, with x distances scaled by `aspect`.
#[inline]
pub fn within_impulse(uv: Vec2, impulse: Vec2, aspect: f32, radius: f32) -> bool {
    let mut diff = uv - impulse;
    diff.x *= aspect;
    diff.length() < radius
}
