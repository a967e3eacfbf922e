//! Ripple - height-field water surface simulation.
//!
//! A damped wave solver over a square grid with ping-pong buffers, driven by
//! single pointer impulses, plus the shading model that turns heights into a
//! lit surface.
//!
//! This crate is framework-agnostic - it holds the numeric model and a CPU
//! driver. The `surface` crate runs the same passes on the GPU.
//!
//! # Example
//!
//! ```
//! use ripple::{Simulation, SimulationConfig};
//! use glam::Vec2;
//!
//! let config = SimulationConfig::new(64, 0.985, 0.5).unwrap();
//! let mut sim = Simulation::new(config).unwrap();
//!
//! sim.press(Vec2::new(0.5, 0.5));
//! let frame = sim.step(1.0 / 60.0);
//! assert_eq!(frame.width, 64);
//! assert!(sim.impulse().peek().is_none());
//! ```

pub mod config;
pub mod display;
pub mod field;
pub mod impulse;
pub mod pipeline;
pub mod propagate;
pub mod shade;
pub mod simulation;

pub use config::{ConfigError, ShadingConfig, SimulationConfig, MAX_RESOLUTION};
pub use display::{aspect_ratio, DisplayGeometry};
pub use field::{BufferRole, Cell, FieldPair, HeightField, PingPong};
pub use impulse::{pointer_to_surface, within_impulse, Impulse, IMPULSE_SENTINEL};
pub use pipeline::{
    PassDesc, PassKind, PassOutput, UniformSlot, FRAME, PROPAGATE, PROPAGATE_TARGET, SHADE,
};
pub use propagate::{propagate, WaveParams};
pub use shade::{shade_at, shade_field, shade_resampled, DisplayFrame, ShadeParams};
pub use simulation::{FrameStats, Simulation};
