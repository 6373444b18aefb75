//! Host driver: window, event loop, and the per-frame sequence.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::error::{FbError, FbResult};
use crate::gpu::{FbRenderer, GpuState};
use crate::source::SourceBuffer;
use crate::tile::FbDims;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Framebuffer dump to display.
    pub input: PathBuf,
    pub dims: FbDims,
    /// Re-read the input before every frame.
    pub watch: bool,
    pub vsync: bool,
}

/// Open the window and run the present loop until a quit event.
pub fn run_viewer(config: ViewerConfig) -> FbResult<()> {
    let event_loop =
        EventLoop::new().map_err(|e| FbError::gpu(format!("event loop creation failed: {e}")))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = Viewer::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| FbError::gpu(format!("event loop failed: {e}")))?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Viewer {
    config: ViewerConfig,
    source: SourceBuffer,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    renderer: Option<FbRenderer>,
    failure: Option<FbError>,
}

impl Viewer {
    fn new(config: ViewerConfig) -> Self {
        let mut source = SourceBuffer::new(&config.dims);
        source.load_file(&config.input);
        Self {
            config,
            source,
            window: None,
            gpu: None,
            renderer: None,
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> FbResult<()> {
        let dims = self.config.dims;
        let attrs = WindowAttributes::default()
            .with_title("xefbview")
            .with_inner_size(PhysicalSize::new(dims.res_w, dims.res_h))
            .with_resizable(false);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| FbError::gpu(format!("window creation failed: {e}")))?,
        );

        let gpu = GpuState::new(window.clone(), &dims, self.config.vsync)?;
        let renderer = FbRenderer::new(&gpu, &dims)?;
        info!(width = dims.res_w, height = dims.res_h, "window open");

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn redraw(&mut self) -> FbResult<()> {
        let (Some(gpu), Some(renderer)) = (self.gpu.as_ref(), self.renderer.as_ref()) else {
            return Ok(());
        };

        if self.config.watch {
            self.source.load_file(&self.config.input);
        }

        let frame = match gpu.acquire() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => return Ok(()),
            Err(e) => return Err(FbError::gpu(format!("surface acquire failed: {e}"))),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        renderer.render(gpu, &view, self.source.bytes());
        frame.present();
        Ok(())
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            error!("startup failed: {err}");
            self.failure = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape)
                {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    error!("frame failed: {err}");
                    self.failure = Some(err);
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
