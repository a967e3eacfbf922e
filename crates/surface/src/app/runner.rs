use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, TouchPhase, WindowEvent},
    event_loop::ActiveEventLoop,
    window::{Window, WindowId},
};

use super::AppError;
use crate::gpu::{GpuContext, GpuWaterSim};
use ripple::SimulationConfig;

/// Everything that exists once the window and device are up.
struct Running {
    window: Arc<Window>,
    ctx: GpuContext,
    sim: GpuWaterSim,
}

impl Running {
    fn new(window: Arc<Window>, config: SimulationConfig) -> Result<Self, AppError> {
        let ctx = pollster::block_on(GpuContext::new(window.clone()))?;
        let mut sim = GpuWaterSim::new(&ctx.device, &ctx.health, config, ctx.surface_format())?;
        let (width, height) = ctx.size;
        sim.resize(&ctx.queue, width, height);
        Ok(Self { window, ctx, sim })
    }

    fn frame(&mut self, dt: f32) -> Result<(), wgpu::SurfaceError> {
        let surface_texture = self.ctx.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.sim.step(&self.ctx.device, &self.ctx.queue, &view, dt);
        self.window.pre_present_notify();
        surface_texture.present();
        Ok(())
    }
}

/// What the loop does after a frame failed to acquire its surface texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameAction {
    /// Drop this frame and try again next tick.
    Skip,
    /// Reapply the surface configuration, then skip.
    Reconfigure,
    /// Stop the loop.
    Fatal,
}

fn frame_action(error: &wgpu::SurfaceError) -> FrameAction {
    match error {
        wgpu::SurfaceError::Timeout => FrameAction::Skip,
        wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost => FrameAction::Reconfigure,
        _ => FrameAction::Fatal,
    }
}

/// winit handler: window, input, and the per-frame tick.
pub struct RippleApp {
    config: SimulationConfig,
    running: Option<Running>,
    cursor: Option<PhysicalPosition<f64>>,
    last_time: Option<Instant>,
    error: Option<AppError>,
}

impl RippleApp {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            running: None,
            cursor: None,
            last_time: None,
            error: None,
        }
    }

    /// The error that stopped the loop, if any.
    pub fn take_error(&mut self) -> Option<AppError> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for RippleApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Ripple Surface")
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720)),
        ) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, AppError::Window(e)),
        };

        match Running::new(window, self.config.clone()) {
            Ok(running) => {
                self.running = Some(running);
                self.last_time = Some(Instant::now());
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        match event {
            WindowEvent::Resized(size) => {
                if running.ctx.resize(size.width, size.height) {
                    running.sim.resize(&running.ctx.queue, size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(position);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(position) = self.cursor {
                    running.sim.press_pixels(position.x, position.y);
                }
            }
            WindowEvent::Touch(touch) if touch.phase == TouchPhase::Started => {
                running.sim.press_pixels(touch.location.x, touch.location.y);
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if matches!(&self.running, Some(r) if r.ctx.health.is_lost()) {
            return self.fail(event_loop, AppError::DeviceLost);
        }
        let (Some(running), Some(last_time)) = (self.running.as_mut(), self.last_time) else {
            return;
        };

        let now = Instant::now();
        let dt = (now - last_time).as_secs_f32().min(0.1);
        self.last_time = Some(now);

        let Err(error) = running.frame(dt) else {
            return;
        };
        match frame_action(&error) {
            FrameAction::Skip => log::debug!("surface acquire timed out, skipping frame"),
            FrameAction::Reconfigure => {
                log::warn!("surface {error:?}, reconfiguring and skipping frame");
                running.ctx.reconfigure();
            }
            FrameAction::Fatal => self.fail(event_loop, AppError::Surface(error)),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = self.running.take() {
            running.sim.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_skips_frame() {
        assert_eq!(frame_action(&wgpu::SurfaceError::Timeout), FrameAction::Skip);
    }

    #[test]
    fn test_stale_surface_is_reconfigured() {
        for error in [wgpu::SurfaceError::Outdated, wgpu::SurfaceError::Lost] {
            assert_eq!(frame_action(&error), FrameAction::Reconfigure, "{error:?}");
        }
    }

    #[test]
    fn test_out_of_memory_stops_the_loop() {
        let error = wgpu::SurfaceError::OutOfMemory;
        assert_eq!(frame_action(&error), FrameAction::Fatal);
    }
}
