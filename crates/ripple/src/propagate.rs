//! Damped wave propagation over the height grid.
//!
//! Leapfrog-style update: the next height is half the sum of the four
//! neighbours minus the height two steps back, scaled by the viscosity.
//! Values are never clamped; `viscosity < 1` is what keeps the field bounded.

use crate::config::SimulationConfig;
use crate::field::{Cell, HeightField};
use crate::impulse::within_impulse;
use glam::Vec2;

/// Per-step solver constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveParams {
    pub viscosity: f32,
    pub strength: f32,
    pub impulse_radius: f32,
    pub aspect: f32,
}

impl WaveParams {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            viscosity: config.viscosity,
            strength: config.strength,
            impulse_radius: config.impulse_radius,
            aspect: config.aspect,
        }
    }
}

/// Advance one cell. Shared by the grid loop and by single-cell tests.
#[inline]
pub fn propagate_cell(
    prev: &HeightField,
    x: usize,
    y: usize,
    params: &WaveParams,
    impulse: Option<Vec2>,
) -> Cell {
    let (xi, yi) = (x as i64, y as i64);
    let here = prev.cell(x, y);

    let neighbours = prev.height_clamped(xi + 1, yi)
        + prev.height_clamped(xi - 1, yi)
        + prev.height_clamped(xi, yi + 1)
        + prev.height_clamped(xi, yi - 1);

    let mut h = neighbours * 0.5 - here.prev_height;
    h *= params.viscosity;

    if let Some(point) = impulse {
        if within_impulse(prev.cell_uv(x, y), point, params.aspect, params.impulse_radius) {
            h += params.strength;
        }
    }

    Cell {
        height: h,
        prev_height: here.height,
    }
}

/// Write the successor of `prev` into `next`.
///
/// # Panics
/// If the two fields differ in resolution.
pub fn propagate(
    prev: &HeightField,
    next: &mut HeightField,
    params: &WaveParams,
    impulse: Option<Vec2>,
) {
    assert_eq!(
        prev.resolution(),
        next.resolution(),
        "ping-pong fields must share a resolution"
    );
    let r = prev.resolution();
    for y in 0..r {
        for x in 0..r {
            next.set(x, y, propagate_cell(prev, x, y, params, impulse));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> WaveParams {
        WaveParams {
            viscosity: 0.985,
            strength: 0.5,
            impulse_radius: 0.02,
            aspect: 1.0,
        }
    }

    #[test]
    fn test_flat_field_stays_flat() {
        let prev = HeightField::new(8);
        let mut next = HeightField::new(8);
        propagate(&prev, &mut next, &params(), None);
        assert!(next.cells().iter().all(|c| c.height == 0.0 && c.prev_height == 0.0));
    }

    #[test]
    fn test_interior_cell_rule() {
        let mut prev = HeightField::new(5);
        prev.set_height(3, 2, 1.0);
        prev.set_height(1, 2, 2.0);
        prev.set_height(2, 3, 3.0);
        prev.set_height(2, 1, 4.0);
        prev.set(
            2,
            2,
            Cell {
                height: 0.25,
                prev_height: 0.5,
            },
        );

        let cell = propagate_cell(&prev, 2, 2, &params(), None);
        let expected = ((1.0 + 2.0 + 3.0 + 4.0) * 0.5 - 0.5) * 0.985;
        assert!((cell.height - expected).abs() < 1e-6);
        assert_eq!(cell.prev_height, 0.25);
    }

    #[test]
    fn test_previous_height_is_carried() {
        let mut prev = HeightField::new(4);
        prev.set_height(1, 1, 0.75);
        let mut next = HeightField::new(4);
        propagate(&prev, &mut next, &params(), None);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(next.cell(x, y).prev_height, prev.cell(x, y).height);
            }
        }
    }

    #[test]
    fn test_corner_uses_clamped_neighbours() {
        let mut prev = HeightField::new(4);
        prev.set_height(0, 0, 1.0);
        prev.set_height(1, 0, 2.0);
        prev.set_height(0, 1, 3.0);

        let cell = propagate_cell(&prev, 0, 0, &params(), None);
        // left and down neighbours clamp back onto (0,0)
        let expected = (2.0 + 1.0 + 3.0 + 1.0) * 0.5 * 0.985;
        assert!((cell.height - expected).abs() < 1e-6);
    }

    #[test]
    fn test_impulse_adds_strength_after_damping() {
        let prev = HeightField::new(64);
        let cell = propagate_cell(&prev, 32, 32, &params(), Some(Vec2::new(0.5, 0.5)));
        assert_eq!(cell.height, 0.5);
    }

    #[test]
    fn test_impulse_outside_unit_square_is_noop() {
        let prev = HeightField::new(16);
        let mut next = HeightField::new(16);
        propagate(&prev, &mut next, &params(), Some(Vec2::new(1.5, -0.5)));
        assert!(next.cells().iter().all(|c| c.height == 0.0));
    }

    #[test]
    #[should_panic(expected = "share a resolution")]
    fn test_mismatched_fields_panic() {
        let prev = HeightField::new(4);
        let mut next = HeightField::new(8);
        propagate(&prev, &mut next, &params(), None);
    }
}
