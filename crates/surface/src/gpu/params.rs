//! Uniform blocks for the propagation and shading programs.
//!
//! Field order and padding mirror the WGSL structs in `shaders/`.

use ripple::{
    DisplayGeometry, Impulse, ShadeParams, SimulationConfig, UniformSlot, WaveParams,
};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PropagateParams {
    /// Normalized impulse position, `(-1, -1)` when none is pending.
    pub impulse: [f32; 2],
    pub resolution: u32,
    pub aspect: f32,
    pub viscosity: f32,
    pub strength: f32,
    pub impulse_radius: f32,
    pub _pad: f32,
}

impl PropagateParams {
    /// Slots this block carries, in field order.
    pub const SLOTS: &'static [UniformSlot] = &[
        UniformSlot::Impulse,
        UniformSlot::Resolution,
        UniformSlot::Aspect,
        UniformSlot::Viscosity,
        UniformSlot::Strength,
        UniformSlot::ImpulseRadius,
    ];

    pub fn new(config: &SimulationConfig, impulse: &Impulse) -> Self {
        let wave = WaveParams::from_config(config);
        Self {
            impulse: impulse.as_uniform().to_array(),
            resolution: config.resolution,
            aspect: wave.aspect,
            viscosity: wave.viscosity,
            strength: wave.strength,
            impulse_radius: wave.impulse_radius,
            _pad: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadeUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_dir: [f32; 3],
    pub depth: f32,
    pub base_color: [f32; 3],
    pub shininess: f32,
    pub ripple_color: [f32; 3],
    pub ripple_gain: f32,
    pub resolution: u32,
    pub _pad: [u32; 3],
}

impl ShadeUniforms {
    pub const SLOTS: &'static [UniformSlot] = &[
        UniformSlot::ViewProjection,
        UniformSlot::LightDir,
        UniformSlot::Depth,
        UniformSlot::BaseColor,
        UniformSlot::Shininess,
        UniformSlot::RippleColor,
        UniformSlot::RippleGain,
        UniformSlot::Resolution,
    ];

    pub fn new(resolution: u32, geometry: &DisplayGeometry, shade: &ShadeParams) -> Self {
        Self {
            view_proj: geometry.view_projection().to_cols_array_2d(),
            light_dir: shade.light_dir.to_array(),
            depth: shade.depth,
            base_color: shade.base_color.to_array(),
            shininess: shade.shininess,
            ripple_color: shade.ripple_color.to_array(),
            ripple_gain: shade.ripple_gain,
            resolution,
            _pad: [0; 3],
        }
    }
}
