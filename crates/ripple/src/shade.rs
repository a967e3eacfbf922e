//! Height-to-color shading.
//!
//! Normals come from central differences of the height field; lighting is a
//! single directional specular lobe over a near-black base with an
//! amplitude-driven tint.

use crate::config::ShadingConfig;
use crate::field::HeightField;
use glam::{Vec2, Vec3};

/// Shading constants in the form the lighting math consumes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadeParams {
    pub depth: f32,
    pub light_dir: Vec3,
    pub shininess: f32,
    pub base_color: Vec3,
    pub ripple_color: Vec3,
    pub ripple_gain: f32,
}

impl ShadeParams {
    pub fn from_config(config: &ShadingConfig) -> Self {
        Self {
            depth: config.depth,
            light_dir: Vec3::from(config.light_dir).normalize_or_zero(),
            shininess: config.shininess,
            base_color: Vec3::from(config.base_color),
            ripple_color: Vec3::from(config.ripple_color),
            ripple_gain: config.ripple_gain,
        }
    }
}

impl Default for ShadeParams {
    fn default() -> Self {
        Self::from_config(&ShadingConfig::default())
    }
}

/// Color from the four neighbour heights around a sample point.
#[inline]
pub fn shade_sample(
    h_left: f32,
    h_right: f32,
    h_down: f32,
    h_up: f32,
    params: &ShadeParams,
) -> Vec3 {
    let normal = Vec3::new(h_left - h_right, h_down - h_up, params.depth).normalize();
    let spec = normal.dot(params.light_dir).max(0.0).powf(params.shininess);
    let ripple = params.ripple_color * (h_right * params.ripple_gain);
    params.base_color + ripple + Vec3::splat(spec)
}

/// Shade the field at a normalized coordinate, sampling one cell away on each axis.
pub fn shade_at(field: &HeightField, uv: Vec2, params: &ShadeParams) -> Vec3 {
    let texel = 1.0 / field.resolution() as f32;
    let dx = Vec2::new(texel, 0.0);
    let dy = Vec2::new(0.0, texel);
    shade_sample(
        field.sample_height(uv - dx),
        field.sample_height(uv + dx),
        field.sample_height(uv - dy),
        field.sample_height(uv + dy),
        params,
    )
}

/// One shaded image. Ephemeral: produced per frame and dropped after presentation.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayFrame {
    pub width: usize,
    pub height: usize,
    /// Linear RGB, row-major, row 0 at the top of the image.
    pub pixels: Vec<Vec3>,
}

impl DisplayFrame {
    pub fn pixel(&self, x: usize, y: usize) -> Vec3 {
        self.pixels[y * self.width + x]
    }

    /// Pack to RGBA8 with saturation, the byte layout of an `Rgba8Unorm` target.
    pub fn to_rgba8(&self) -> Vec<[u8; 4]> {
        self.pixels
            .iter()
            .map(|c| {
                let c = c.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
                [c.x.round() as u8, c.y.round() as u8, c.z.round() as u8, 255]
            })
            .collect()
    }
}

/// Shade one pixel per grid cell. Image row 0 is the top row of the grid.
pub fn shade_field(field: &HeightField, params: &ShadeParams) -> DisplayFrame {
    let r = field.resolution();
    let mut pixels = Vec::with_capacity(r * r);
    for row in 0..r {
        let y = r - 1 - row;
        for x in 0..r {
            let (xi, yi) = (x as i64, y as i64);
            pixels.push(shade_sample(
                field.height_clamped(xi - 1, yi),
                field.height_clamped(xi + 1, yi),
                field.height_clamped(xi, yi - 1),
                field.height_clamped(xi, yi + 1),
                params,
            ));
        }
    }
    DisplayFrame {
        width: r,
        height: r,
        pixels,
    }
}

/// Shade at an arbitrary output size, sampling the grid bilinearly.
pub fn shade_resampled(
    field: &HeightField,
    width: usize,
    height: usize,
    params: &ShadeParams,
) -> DisplayFrame {
    let mut pixels = Vec::with_capacity(width * height);
    for row in 0..height {
        let v = 1.0 - (row as f32 + 0.5) / height as f32;
        for col in 0..width {
            let u = (col as f32 + 0.5) / width as f32;
            pixels.push(shade_at(field, Vec2::new(u, v), params));
        }
    }
    DisplayFrame {
        width,
        height,
        pixels,
    }
}
