//! Windowed host: winit event loop driving [`GpuWaterSim`](crate::gpu::GpuWaterSim).

mod runner;

pub use runner::RippleApp;

use crate::gpu::InitError;
use ripple::SimulationConfig;
use winit::event_loop::{ControlFlow, EventLoop};

/// Fatal host failures.
#[derive(Debug)]
pub enum AppError {
    EventLoop(winit::error::EventLoopError),
    Window(winit::error::OsError),
    Init(InitError),
    Surface(wgpu::SurfaceError),
    DeviceLost,
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::EventLoop(e) => write!(f, "event loop error: {e}"),
            AppError::Window(e) => write!(f, "failed to create window: {e}"),
            AppError::Init(e) => write!(f, "GPU initialization failed: {e}"),
            AppError::Surface(e) => write!(f, "surface error: {e}"),
            AppError::DeviceLost => write!(f, "GPU device lost"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::EventLoop(e) => Some(e),
            AppError::Window(e) => Some(e),
            AppError::Init(e) => Some(e),
            AppError::Surface(e) => Some(e),
            AppError::DeviceLost => None,
        }
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(e: winit::error::EventLoopError) -> Self {
        AppError::EventLoop(e)
    }
}

impl From<InitError> for AppError {
    fn from(e: InitError) -> Self {
        AppError::Init(e)
    }
}

/// Open a window and run the simulation until it is closed.
pub fn run(config: SimulationConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = RippleApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
