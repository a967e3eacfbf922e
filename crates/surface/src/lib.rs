//! GPU ripple surface.
//!
//! Runs the `ripple` wave model on wgpu: a compute pass propagates the height
//! field between two storage buffers and a render pass shades the result onto
//! a viewport-filling quad. [`app`] hosts it in a winit window.

pub mod app;
pub mod gpu;

pub use gpu::{GpuContext, GpuError, GpuWaterSim, InitError};
