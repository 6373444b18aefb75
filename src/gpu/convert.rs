//! The conversion kernel: one compute invocation per display texel.

use wgpu::util::DeviceExt;

use super::create_shader;
use crate::error::FbResult;
use crate::tile::FbDims;

const SHADER: &str = include_str!("shaders/convert.wgsl");

/// Workgroup edge length; `@workgroup_size` in `convert.wgsl` must match.
pub const WORKGROUP: u32 = 16;

/// Geometry uniform as the kernel sees it.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct KernelDims {
    tiled_w: u32,
    tiled_h: u32,
    res_w: u32,
    res_h: u32,
}

const _: () = assert!(
    std::mem::size_of::<KernelDims>() == 16,
    "size of KernelDims does not match WGSL"
);

pub struct ConvertPass {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    pixel_buffer: wgpu::Buffer,
    groups: [u32; 2],
}

impl ConvertPass {
    pub fn new(device: &wgpu::Device, dims: &FbDims, output: &wgpu::TextureView) -> FbResult<Self> {
        let shader = create_shader(device, "fb_convert", SHADER)?;

        let pixel_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fb_pixel_data"),
            size: dims.source_len_bytes() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let dims_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fb_dims"),
            contents: bytemuck::bytes_of(&KernelDims {
                tiled_w: dims.tiled_w,
                tiled_h: dims.tiled_h,
                res_w: dims.res_w,
                res_h: dims.res_h,
            }),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fb_convert_layout"),
            entries: &[
                // Output image.
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::R32Uint,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                // Source pixel words.
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Geometry.
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fb_convert_bind"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(output),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: pixel_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: dims_buffer.as_entire_binding(),
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fb_convert_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("fb_convert_pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: Some("cs_main"),
            compilation_options: Default::default(),
            cache: None,
        });

        // Display dims are 32-aligned, so the division is exact.
        let groups = [dims.res_w / WORKGROUP, dims.res_h / WORKGROUP];

        Ok(Self {
            pipeline,
            bind_group,
            pixel_buffer,
            groups,
        })
    }

    /// Full-buffer overwrite of the GPU mirror with the host bytes.
    pub fn upload(&self, queue: &wgpu::Queue, src: &[u8]) {
        queue.write_buffer(&self.pixel_buffer, 0, src);
    }

    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("fb_convert_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.dispatch_workgroups(self.groups[0], self.groups[1], 1);
    }
}
