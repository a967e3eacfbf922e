//! wgpu driver for the ripple simulation.
//!
//! Owns the device/surface plumbing and the error types shared by the
//! buffer, pipeline and readback modules.

pub mod buffers;
pub mod mesh;
pub mod params;
pub mod pipelines;
pub mod readback;
pub mod simulation;

pub use buffers::HeightBuffers;
pub use mesh::{QuadMesh, QuadVertex};
pub use params::{PropagateParams, ShadeUniforms};
pub use readback::OffscreenTarget;
pub use simulation::GpuWaterSim;

use ripple::ConfigError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wgpu::SurfaceTarget;
use winit::window::Window;

/// Loss state of one device, shared with that device's error callbacks.
///
/// Cloning shares the flag; separate devices never share one.
#[derive(Clone, Debug, Default)]
pub struct DeviceHealth(Arc<AtomicBool>);

impl DeviceHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_lost(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn mark_lost(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Failures of GPU operations after initialization.
#[derive(Debug)]
pub enum GpuError {
    DeviceLost,
    BufferMapFailed(wgpu::BufferAsyncError),
    ChannelDisconnected,
    ResolutionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuError::DeviceLost => write!(f, "GPU device lost"),
            GpuError::BufferMapFailed(e) => write!(f, "Buffer map failed: {:?}", e),
            GpuError::ChannelDisconnected => write!(f, "Channel disconnected"),
            GpuError::ResolutionMismatch { expected, actual } => write!(
                f,
                "height field is {actual}x{actual}, buffers are {expected}x{expected}"
            ),
        }
    }
}

impl std::error::Error for GpuError {}

/// Fatal failures while bringing up the GPU side. The simulation does not start.
#[derive(Debug)]
pub enum InitError {
    NoAdapter,
    RequestDevice(wgpu::RequestDeviceError),
    CreateSurface(wgpu::CreateSurfaceError),
    SurfaceUnsupported,
    GridTooLarge { bytes: u64, limit: u64 },
    Config(ConfigError),
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitError::NoAdapter => write!(f, "no compatible GPU adapter found"),
            InitError::RequestDevice(e) => write!(f, "failed to create device: {e}"),
            InitError::CreateSurface(e) => write!(f, "failed to create surface: {e}"),
            InitError::SurfaceUnsupported => {
                write!(f, "surface reports no formats for the selected adapter")
            }
            InitError::GridTooLarge { bytes, limit } => write!(
                f,
                "height buffer needs {bytes} bytes, device binding limit is {limit}"
            ),
            InitError::Config(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::RequestDevice(e) => Some(e),
            InitError::CreateSurface(e) => Some(e),
            InitError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self {
        InitError::Config(e)
    }
}

/// Wait for a buffer map operation to complete, returning Result instead of panicking.
pub fn await_buffer_map(
    rx: std::sync::mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>,
    health: &DeviceHealth,
) -> Result<(), GpuError> {
    if health.is_lost() {
        return Err(GpuError::DeviceLost);
    }
    match rx.recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            log::error!("Buffer map failed: {:?}", e);
            Err(GpuError::BufferMapFailed(e))
        }
        Err(_) => {
            log::error!("Buffer map channel disconnected - possible device lost");
            health.mark_lost();
            Err(GpuError::ChannelDisconnected)
        }
    }
}

fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}

async fn request_device(
    adapter: &wgpu::Adapter,
    label: &str,
) -> Result<(wgpu::Device, wgpu::Queue, DeviceHealth), InitError> {
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some(label),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        )
        .await
        .map_err(InitError::RequestDevice)?;

    let health = DeviceHealth::new();
    let on_error = health.clone();
    device.on_uncaptured_error(Box::new(move |error| {
        log::error!("GPU uncaptured error: {:?}", error);
        if matches!(error, wgpu::Error::OutOfMemory { .. }) {
            on_error.mark_lost();
        }
    }));
    let on_lost = health.clone();
    device.set_device_lost_callback(move |reason, message| {
        log::error!("GPU device lost ({reason:?}): {message}");
        on_lost.mark_lost();
    });

    Ok((device, queue, health))
}

/// Device and queue without a presentation surface, for offscreen rendering and tests.
pub async fn headless_device() -> Result<(wgpu::Device, wgpu::Queue, DeviceHealth), InitError> {
    let instance = create_instance();
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(InitError::NoAdapter)?;
    log::info!("Using GPU (headless): {:?}", adapter.get_info());
    request_device(&adapter, "Ripple Headless Device").await
}

/// Pick the presentation format. The shader writes display values directly,
/// so a linear (non-sRGB) format is preferred when the surface offers one.
pub fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first())
        .copied()
}

/// Central GPU context holding device, queue, and surface
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    pub size: (u32, u32),
    pub health: DeviceHealth,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>) -> Result<Self, InitError> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = create_instance();
        let surface = instance
            .create_surface(SurfaceTarget::from(window))
            .map_err(InitError::CreateSurface)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(InitError::NoAdapter)?;

        log::info!("Using GPU: {:?}", adapter.get_info());

        let (device, queue, health) = request_device(&adapter, "Ripple Device").await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format =
            choose_surface_format(&surface_caps.formats).ok_or(InitError::SurfaceUnsupported)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        log::info!("Surface format: {:?}", format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            surface,
            config,
            size: (width, height),
            health,
        })
    }

    /// Returns false for a zero-sized request, which leaves the surface as it was.
    pub fn resize(&mut self, new_width: u32, new_height: u32) -> bool {
        if new_width == 0 || new_height == 0 {
            return false;
        }
        self.size = (new_width, new_height);
        self.config.width = new_width;
        self.config.height = new_height;
        self.surface.configure(&self.device, &self.config);
        true
    }

    /// Re-apply the current configuration after the surface went outdated or lost.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }
}
