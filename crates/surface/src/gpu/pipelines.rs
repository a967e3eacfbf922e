//! Pipeline and bind group creation for the propagation and shading passes.
//!
//! Each pass gets one bind group per buffer slot so that picking the group
//! for the current role is the only per-frame decision.

use super::buffers::HeightBuffers;
use super::mesh::QuadVertex;
use super::params::{PropagateParams, ShadeUniforms};
use ripple::{PassKind, PROPAGATE, SHADE};

/// Compute workgroup edge; must match `@workgroup_size` in propagate.wgsl.
pub const WORKGROUP_SIZE: u32 = 16;

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Create a storage buffer bind group layout entry.
fn storage_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    read_only: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Propagation compute pass.
pub struct PropagateResources {
    pub pipeline: wgpu::ComputePipeline,
    pub params_buffer: wgpu::Buffer,
    /// `bind_groups[i]` reads slot `i` and writes the other slot.
    bind_groups: [wgpu::BindGroup; 2],
}

impl PropagateResources {
    pub fn new(device: &wgpu::Device, buffers: &HeightBuffers) -> Self {
        debug_assert_eq!(PROPAGATE.kind, PassKind::Compute);

        let params_buffer = uniform_buffer(
            device,
            "Propagate Params",
            std::mem::size_of::<PropagateParams>(),
        );

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Propagate Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::COMPUTE),
                storage_entry(1, wgpu::ShaderStages::COMPUTE, true),  // prev
                storage_entry(2, wgpu::ShaderStages::COMPUTE, false), // next
            ],
        });

        let bind_group = |read: usize, write: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Propagate Bind Group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: buffers.slot(read).as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffers.slot(write).as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [bind_group(0, 1), bind_group(1, 0)];

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Propagate Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/propagate.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Propagate Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(PROPAGATE.label),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            params_buffer,
            bind_groups,
        }
    }

    /// Bind group reading slot `read` and writing slot `write`.
    ///
    /// # Panics
    /// If the slots are equal or out of range.
    pub fn bind_group(&self, read: usize, write: usize) -> &wgpu::BindGroup {
        assert!(
            read < 2 && write == 1 - read,
            "no bind group for slots {read} -> {write}"
        );
        &self.bind_groups[read]
    }

    /// Workgroups per axis for a square grid.
    pub fn workgroups(resolution: u32) -> u32 {
        resolution.div_ceil(WORKGROUP_SIZE)
    }
}

/// Shading render pass.
pub struct ShadeResources {
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_buffer: wgpu::Buffer,
    /// `bind_groups[i]` samples slot `i`.
    pub bind_groups: [wgpu::BindGroup; 2],
}

impl ShadeResources {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        buffers: &HeightBuffers,
    ) -> Self {
        debug_assert_eq!(SHADE.kind, PassKind::Render);

        let uniform_buffer = uniform_buffer(
            device,
            "Shade Uniforms",
            std::mem::size_of::<ShadeUniforms>(),
        );

        let vf = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shade Layout"),
            entries: &[
                uniform_entry(0, vf),
                storage_entry(1, wgpu::ShaderStages::FRAGMENT, true), // heights
            ],
        });

        let bind_group = |read: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Shade Bind Group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: buffers.slot(read).as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [bind_group(0), bind_group(1)];

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shade Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shade.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shade Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(SHADE.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[QuadVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_groups,
        }
    }
}
