//! CPU simulation driver.
//!
//! Runs the same frame as the GPU driver (propagate, shade, swap) over
//! [`FieldPair`]. Used as the numeric reference and for headless runs.

use crate::config::{ConfigError, SimulationConfig};
use crate::display::{aspect_ratio, DisplayGeometry};
use crate::field::{FieldPair, HeightField};
use crate::impulse::{pointer_to_surface, Impulse};
use crate::pipeline::{PROPAGATE, PROPAGATE_TARGET, SHADE};
use crate::propagate::{propagate, WaveParams};
use crate::shade::{shade_field, DisplayFrame, ShadeParams};
use glam::Vec2;

/// Host-visible counters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub frames: u64,
    pub impulses: u64,
    pub elapsed: f32,
}

pub struct Simulation {
    config: SimulationConfig,
    fields: FieldPair,
    impulse: Impulse,
    geometry: DisplayGeometry,
    viewport: (u32, u32),
    shade_params: ShadeParams,
    stats: FrameStats,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let resolution = config.resolution as usize;
        let geometry = DisplayGeometry::new(config.aspect);
        let shade_params = ShadeParams::from_config(&config.shading);
        log::debug!(
            "cpu simulation: {r}x{r} grid, viscosity {}, strength {}",
            config.viscosity,
            config.strength,
            r = resolution
        );
        Ok(Self {
            fields: FieldPair::new(resolution),
            impulse: Impulse::new(),
            geometry,
            viewport: (config.resolution, config.resolution),
            shade_params,
            stats: FrameStats::default(),
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn fields(&self) -> &FieldPair {
        &self.fields
    }

    /// Mutable access for seeding initial conditions.
    pub fn fields_mut(&mut self) -> &mut FieldPair {
        &mut self.fields
    }

    pub fn front(&self) -> &HeightField {
        self.fields.front()
    }

    pub fn impulse(&self) -> &Impulse {
        &self.impulse
    }

    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn aspect(&self) -> f32 {
        self.config.aspect
    }

    /// Pointer press in normalized surface coordinates.
    pub fn press(&mut self, position: Vec2) {
        self.impulse.press(position);
    }

    /// Pointer press in viewport pixels, origin top-left.
    pub fn press_pixels(&mut self, x: f64, y: f64) {
        let (w, h) = self.viewport;
        if let Some(position) = pointer_to_surface(x, y, w, h) {
            self.impulse.press(position);
        }
    }

    /// Viewport change. Touches aspect and geometry only, never the grids.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        self.config.aspect = aspect_ratio(width, height);
        self.geometry = DisplayGeometry::new(self.config.aspect);
    }

    /// Propagation pass only: front + impulse into back. Clears the impulse.
    pub fn propagate(&mut self) {
        let impulse = self.impulse.take();
        if impulse.is_some() {
            self.stats.impulses += 1;
        }
        let params = WaveParams::from_config(&self.config);
        let (prev, next) = self.fields.split_roles(PROPAGATE.reads, PROPAGATE_TARGET);
        propagate(prev, next, &params, impulse);
    }

    /// Shading pass only: reads the buffer propagation just wrote.
    pub fn shade(&self) -> DisplayFrame {
        shade_field(self.fields.get(SHADE.reads), &self.shade_params)
    }

    /// One frame: propagate, shade, swap.
    pub fn step(&mut self, delta_time: f32) -> DisplayFrame {
        self.propagate();
        let frame = self.shade();
        self.fields.swap();
        self.stats.frames += 1;
        self.stats.elapsed += delta_time;
        frame
    }

    /// Advance without producing display frames.
    pub fn advance(&mut self, steps: usize) {
        for _ in 0..steps {
            self.propagate();
            self.fields.swap();
            self.stats.frames += 1;
        }
    }
}
