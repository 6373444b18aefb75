//! wgpu plumbing shared by the conversion kernel and the presenter.

pub mod convert;
pub mod present;

use std::sync::Arc;

use tracing::{error, info};
use winit::window::Window;

use crate::error::{FbError, FbResult};
use crate::tile::FbDims;

/// Device, queue, and the window surface. Created once in the host driver;
/// field order keeps the surface and device dropping before the instance.
pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    _adapter: wgpu::Adapter,
    _instance: wgpu::Instance,
}

impl GpuState {
    pub fn new(window: Arc<Window>, dims: &FbDims, vsync: bool) -> FbResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .map_err(|e| FbError::gpu(format!("create surface failed: {e}")))?;

        let adapter =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            }))
            .map_err(|e| match e {
                wgpu::RequestAdapterError::NotFound { .. } => {
                    FbError::gpu("no gpu adapter available")
                }
                other => FbError::gpu(format!("wgpu request_adapter failed: {other:?}")),
            })?;

        let adapter_info = adapter.get_info();
        info!(name = %adapter_info.name, backend = ?adapter_info.backend, "gpu adapter");

        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            }))
            .map_err(|e| FbError::gpu(format!("wgpu request_device failed: {e:?}")))?;

        // Prefer a non-sRGB swapchain format: the unpacked channel bytes go
        // to the screen as-is, with no transfer-function applied on top.
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: dims.res_w,
            height: dims.res_h,
            present_mode: if vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            desired_maximum_frame_latency: 2,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            _adapter: adapter,
            _instance: instance,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn acquire(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }
}

/// Create a shader module with validation trapped in an error scope, so a
/// broken shader surfaces its compile log before startup fails.
pub(crate) fn create_shader(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> FbResult<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        error!(shader = label, "shader failed validation: {err}");
        return Err(FbError::gpu(format!("shader '{label}' failed validation")));
    }
    Ok(module)
}

/// The per-frame pipeline: kernel writes the r32uint image, presenter draws
/// it to the swapchain.
pub struct FbRenderer {
    convert: convert::ConvertPass,
    present: present::PresentPass,
    _output: wgpu::Texture,
}

impl FbRenderer {
    pub fn new(gpu: &GpuState, dims: &FbDims) -> FbResult<Self> {
        let device = gpu.device();
        let output = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fb_output"),
            size: wgpu::Extent3d {
                width: dims.res_w,
                height: dims.res_h,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R32Uint,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let output_view = output.create_view(&wgpu::TextureViewDescriptor::default());

        let convert = convert::ConvertPass::new(device, dims, &output_view)?;
        let present = present::PresentPass::new(device, gpu.surface_format(), &output_view)?;

        Ok(Self {
            convert,
            present,
            _output: output,
        })
    }

    /// One frame: upload the source bytes, run the kernel, draw the result.
    /// Everything goes into a single submission; queue write ordering and
    /// pass order within the encoder give the storage→compute and
    /// compute→fragment handoffs their required ordering.
    pub fn render(&self, gpu: &GpuState, target: &wgpu::TextureView, src: &[u8]) {
        self.convert.upload(gpu.queue(), src);

        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fb_frame"),
            });
        self.convert.encode(&mut encoder);
        self.present.encode(&mut encoder, target);
        gpu.queue().submit(Some(encoder.finish()));
    }
}
