//! Blocking GPU to CPU readback of height buffers and shaded frames.
//!
//! Only used for verification and headless capture; the interactive loop
//! never waits on the GPU.

use super::{await_buffer_map, DeviceHealth, GpuError};
use ripple::HeightField;
use std::sync::mpsc;

/// Format of the offscreen colour target. Linear, so bytes are `round(c * 255)`.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

fn create_staging(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Staging"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Map a staging buffer that already holds the copied bytes and return them.
fn map_staging(
    device: &wgpu::Device,
    health: &DeviceHealth,
    staging: &wgpu::Buffer,
) -> Result<Vec<u8>, GpuError> {
    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    await_buffer_map(rx, health)?;

    let data = slice.get_mapped_range();
    let bytes = data.to_vec();
    drop(data);
    staging.unmap();
    Ok(bytes)
}

/// Copy the first `size` bytes of `buffer` back to the host.
pub fn read_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    health: &DeviceHealth,
    buffer: &wgpu::Buffer,
    size: u64,
) -> Result<Vec<u8>, GpuError> {
    let staging = create_staging(device, size);
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Buffer Readback"),
    });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
    queue.submit(Some(encoder.finish()));
    map_staging(device, health, &staging)
}

/// Read a height buffer into a [`HeightField`].
pub fn read_field(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    health: &DeviceHealth,
    buffer: &wgpu::Buffer,
    resolution: u32,
) -> Result<HeightField, GpuError> {
    let size = super::buffers::height_buffer_size(resolution);
    let bytes = read_buffer(device, queue, health, buffer, size)?;
    let cells: Vec<[f32; 2]> = bytes
        .chunks_exact(super::buffers::CELL_BYTES as usize)
        .map(bytemuck::pod_read_unaligned)
        .collect();
    let resolution = resolution as usize;
    HeightField::from_interleaved(resolution, &cells).ok_or(GpuError::ResolutionMismatch {
        expected: resolution,
        actual: (cells.len() as f64).sqrt() as usize,
    })
}

/// Row pitch of a texture copy, padded to the copy alignment.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Colour target that can be rendered to and copied back.
pub struct OffscreenTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// RGBA8 pixels, row 0 at the top, padding stripped.
    pub fn read(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        health: &DeviceHealth,
    ) -> Result<Vec<[u8; 4]>, GpuError> {
        let padded = padded_bytes_per_row(self.width);
        let staging = create_staging(device, padded as u64 * self.height as u64);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Readback"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(Some(encoder.finish()));

        let bytes = map_staging(device, health, &staging)?;
        let row_bytes = (self.width * 4) as usize;
        let mut pixels = Vec::with_capacity((self.width * self.height) as usize);
        for row in bytes.chunks(padded as usize).take(self.height as usize) {
            pixels.extend(
                row[..row_bytes]
                    .chunks_exact(4)
                    .map(|p| [p[0], p[1], p[2], p[3]]),
            );
        }
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_padding() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(512), 2048);
    }
}
