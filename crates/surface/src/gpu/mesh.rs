//! Display quad for the shading pass.

use ripple::display::QUAD_INDICES;
use ripple::DisplayGeometry;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl QuadVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Vertices for the current geometry, in [`DisplayGeometry::corners`] order.
pub fn quad_vertices(geometry: &DisplayGeometry) -> [QuadVertex; 4] {
    geometry.corners().map(|corner| QuadVertex {
        position: corner.position.to_array(),
        uv: corner.uv.to_array(),
    })
}

pub struct QuadMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl QuadMesh {
    pub fn new(device: &wgpu::Device, geometry: &DisplayGeometry) -> Self {
        let vertices = quad_vertices(geometry);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Display Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Display Quad Index Buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: QUAD_INDICES.len() as u32,
        }
    }

    /// Rewrite the corners after an aspect change.
    pub fn update(&self, queue: &wgpu::Queue, geometry: &DisplayGeometry) {
        let vertices = quad_vertices(geometry);
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertices_span_aspect() {
        let vertices = quad_vertices(&DisplayGeometry::new(1.5));
        assert_eq!(vertices[0].position, [-1.5, -1.0, 0.0]);
        assert_eq!(vertices[3].position, [1.5, 1.0, 0.0]);
        assert_eq!(vertices[3].uv, [1.0, 1.0]);
    }

    #[test]
    fn test_vertex_stride() {
        assert_eq!(QuadVertex::desc().array_stride, 20);
    }
}
