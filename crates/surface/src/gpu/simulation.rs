//! GPU simulation driver: one propagation and one shading pass per frame.

use super::buffers::{height_buffer_size, HeightBuffers};
use super::mesh::QuadMesh;
use super::params::{PropagateParams, ShadeUniforms};
use super::pipelines::{PropagateResources, ShadeResources};
use super::readback;
use super::{DeviceHealth, GpuError, InitError};
use glam::Vec2;
use ripple::{
    aspect_ratio, BufferRole, DisplayGeometry, FrameStats, HeightField, Impulse, ShadeParams,
    SimulationConfig, PROPAGATE, PROPAGATE_TARGET, SHADE,
};

/// Owns every GPU resource of the simulation.
///
/// Created with [`GpuWaterSim::new`] and released with [`GpuWaterSim::teardown`].
/// Device and queue are borrowed per call so the same simulation can drive a
/// window surface or an offscreen target. `health` must belong to that device.
pub struct GpuWaterSim {
    config: SimulationConfig,
    health: DeviceHealth,
    shade_params: ShadeParams,
    buffers: HeightBuffers,
    propagate: PropagateResources,
    shade: ShadeResources,
    mesh: QuadMesh,
    geometry: DisplayGeometry,
    impulse: Impulse,
    viewport: (u32, u32),
    stats: FrameStats,
}

impl GpuWaterSim {
    /// Allocate buffers and build pipelines for `format` render targets.
    pub fn new(
        device: &wgpu::Device,
        health: &DeviceHealth,
        config: SimulationConfig,
        format: wgpu::TextureFormat,
    ) -> Result<Self, InitError> {
        config.validate()?;

        let bytes = height_buffer_size(config.resolution);
        let limit = device.limits().max_storage_buffer_binding_size as u64;
        if bytes > limit {
            return Err(InitError::GridTooLarge { bytes, limit });
        }

        let buffers = HeightBuffers::new(device, config.resolution);
        let propagate = PropagateResources::new(device, &buffers);
        let shade = ShadeResources::new(device, format, &buffers);
        let geometry = DisplayGeometry::new(config.aspect);
        let mesh = QuadMesh::new(device, &geometry);

        log::info!(
            "GPU simulation: {r}x{r} grid ({bytes} bytes per buffer), viscosity {}, strength {}",
            config.viscosity,
            config.strength,
            r = config.resolution,
        );

        Ok(Self {
            shade_params: ShadeParams::from_config(&config.shading),
            viewport: (config.resolution, config.resolution),
            config,
            health: health.clone(),
            buffers,
            propagate,
            shade,
            mesh,
            geometry,
            impulse: Impulse::new(),
            stats: FrameStats::default(),
        })
    }

    /// Release the height buffers. Consumes the simulation.
    pub fn teardown(self) {
        log::info!("GPU simulation teardown after {} frames", self.stats.frames);
        self.buffers.destroy();
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn aspect(&self) -> f32 {
        self.config.aspect
    }

    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    pub fn impulse(&self) -> &Impulse {
        &self.impulse
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Loss state of the device this simulation was built on.
    pub fn health(&self) -> &DeviceHealth {
        &self.health
    }

    /// Pointer press in normalized surface coordinates.
    pub fn press(&mut self, position: Vec2) {
        self.impulse.press(position);
    }

    /// Pointer press in viewport pixels, origin top-left.
    pub fn press_pixels(&mut self, x: f64, y: f64) {
        let (width, height) = self.viewport;
        self.impulse.press_pixels(x, y, width, height);
    }

    /// Viewport change: aspect, uniform and mesh only. Zero sizes are ignored.
    pub fn resize(&mut self, queue: &wgpu::Queue, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        self.config.aspect = aspect_ratio(width, height);
        self.geometry = DisplayGeometry::new(self.config.aspect);
        self.mesh.update(queue, &self.geometry);
        log::debug!("resize {width}x{height}, aspect {:.3}", self.config.aspect);
    }

    /// Stage this frame's uniforms. Hands the pending impulse to propagation and clears it.
    fn write_uniforms(&mut self, queue: &wgpu::Queue) {
        let params = PropagateParams::new(&self.config, &self.impulse);
        if self.impulse.take().is_some() {
            self.stats.impulses += 1;
        }
        queue.write_buffer(&self.propagate.params_buffer, 0, bytemuck::bytes_of(&params));

        let uniforms =
            ShadeUniforms::new(self.config.resolution, &self.geometry, &self.shade_params);
        queue.write_buffer(&self.shade.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Record the propagation pass: front into back.
    pub fn encode_propagate(&self, encoder: &mut wgpu::CommandEncoder) {
        let (read, write) = self
            .buffers
            .roles()
            .pass_slots(PROPAGATE.reads, PROPAGATE_TARGET);
        let groups = PropagateResources::workgroups(self.config.resolution);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(PROPAGATE.label),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.propagate.pipeline);
        pass.set_bind_group(0, self.propagate.bind_group(read, write), &[]);
        pass.dispatch_workgroups(groups, groups, 1);
    }

    /// Record the shading pass into `view`, reading the buffer propagation just wrote.
    pub fn encode_shade(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let read = self.buffers.roles().slot(SHADE.reads);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(SHADE.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.shade.pipeline);
        pass.set_bind_group(0, &self.shade.bind_groups[read], &[]);
        pass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(self.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.mesh.num_indices, 0, 0..1);
    }

    /// One frame into `view`: propagate, shade, submit, swap.
    pub fn step(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        delta_time: f32,
    ) {
        self.write_uniforms(queue);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Ripple Frame"),
        });
        self.encode_propagate(&mut encoder);
        self.encode_shade(&mut encoder, view);
        queue.submit(Some(encoder.finish()));

        self.buffers.swap();
        self.stats.frames += 1;
        self.stats.elapsed += delta_time;
    }

    /// Propagation only, one submission per step so each sees its own impulse state.
    pub fn advance(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, steps: usize) {
        for _ in 0..steps {
            self.write_uniforms(queue);
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Ripple Advance"),
            });
            self.encode_propagate(&mut encoder);
            queue.submit(Some(encoder.finish()));
            self.buffers.swap();
            self.stats.frames += 1;
        }
    }

    /// Replace the contents of the buffer currently playing `role`.
    pub fn upload_field(
        &self,
        queue: &wgpu::Queue,
        role: BufferRole,
        field: &HeightField,
    ) -> Result<(), GpuError> {
        let expected = self.config.resolution as usize;
        if field.resolution() != expected {
            return Err(GpuError::ResolutionMismatch {
                expected,
                actual: field.resolution(),
            });
        }
        self.buffers.write(queue, role, field);
        Ok(())
    }

    /// Blocking readback of the buffer currently playing `role`.
    ///
    /// Fails with [`GpuError::DeviceLost`] once this simulation's device is lost.
    pub fn download(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        role: BufferRole,
    ) -> Result<HeightField, GpuError> {
        readback::read_field(
            device,
            queue,
            &self.health,
            self.buffers.get(role),
            self.config.resolution,
        )
    }
}
