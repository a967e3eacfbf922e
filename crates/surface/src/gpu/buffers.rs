//! Height storage buffers and their ping-pong bookkeeping.

use ripple::{BufferRole, HeightField, PingPong};
use wgpu::util::DeviceExt;

/// Bytes per cell: interleaved `[height, prev_height]`.
pub const CELL_BYTES: u64 = std::mem::size_of::<[f32; 2]>() as u64;

/// Create a storage buffer holding `field` in the shader layout.
pub fn create_height_buffer(
    device: &wgpu::Device,
    label: &str,
    field: &HeightField,
) -> wgpu::Buffer {
    let data = field.to_interleaved();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&data),
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC,
    })
}

/// Byte size of one height buffer at `resolution`.
pub fn height_buffer_size(resolution: u32) -> u64 {
    resolution as u64 * resolution as u64 * CELL_BYTES
}

/// The two height buffers. Slot indices are fixed; only the roles move.
pub struct HeightBuffers {
    buffers: [wgpu::Buffer; 2],
    roles: PingPong,
}

impl HeightBuffers {
    /// Both buffers start flat and at rest.
    pub fn new(device: &wgpu::Device, resolution: u32) -> Self {
        let flat = HeightField::new(resolution as usize);
        Self {
            buffers: [
                create_height_buffer(device, "Height Buffer A", &flat),
                create_height_buffer(device, "Height Buffer B", &flat),
            ],
            roles: PingPong::new(),
        }
    }

    /// Buffer by fixed slot index, for building per-slot bind groups.
    pub fn slot(&self, index: usize) -> &wgpu::Buffer {
        &self.buffers[index]
    }

    pub fn get(&self, role: BufferRole) -> &wgpu::Buffer {
        &self.buffers[self.roles.slot(role)]
    }

    pub fn roles(&self) -> PingPong {
        self.roles
    }

    pub fn swap(&mut self) {
        self.roles.swap();
    }

    /// Overwrite the buffer currently playing `role`.
    pub fn write(&self, queue: &wgpu::Queue, role: BufferRole, field: &HeightField) {
        let data = field.to_interleaved();
        queue.write_buffer(self.get(role), 0, bytemuck::cast_slice(&data));
    }

    pub fn destroy(&self) {
        for buffer in &self.buffers {
            buffer.destroy();
        }
    }
}
