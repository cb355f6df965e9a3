use canvas_gpu::*;

use futures::executor::block_on;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use std::sync::Arc;

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        window: None,
        gfx_state: None,
    };

    event_loop.run_app(&mut app).unwrap();
}

struct App {
    window: Option<Arc<Window>>,
    gfx_state: Option<GfxState>,
}

/// Everything needed to drive the renderer against a window surface
struct GfxState {
    surface: wgpu::Surface<'static>,
    surface_desc: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
    renderer: Renderer,
    buffers_created: bool,
}

impl GfxState {
    fn new(window: Arc<Window>) -> Result<GfxState, RenderError> {
        let instance = wgpu::Instance::default();
        let size = window.inner_size();
        let surface = instance.create_surface(window)?;

        let (device, queue) = block_on(async {
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::LowPower,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .ok_or(RenderError::NoCompatibleAdapter)?;

            let (device, queue) = adapter
                .request_device(
                    &wgpu::DeviceDescriptor {
                        label: None,
                        required_features: wgpu::Features::empty(),
                        required_limits: wgpu::Limits::default(),
                    },
                    None,
                )
                .await?;

            Ok::<_, RenderError>((device, queue))
        })?;

        let surface_desc = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: DEFAULT_COLOR_FORMAT,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        };
        surface.configure(&device, &surface_desc);

        let renderer = Renderer::new(&device, surface_desc.format);

        Ok(GfxState {
            surface,
            surface_desc,
            device,
            queue,
            renderer,
            buffers_created: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.surface_desc.width = width.max(1);
        self.surface_desc.height = height.max(1);
        self.surface.configure(&self.device, &self.surface_desc);
    }

    fn paint(&mut self) -> Result<(), RenderError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,

            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.surface_desc);
                return Ok(());
            }

            Err(error) => {
                log::warn!("skipping frame: {}", error);
                return Ok(());
            }
        };

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut actions = vec![];
        if !self.buffers_created {
            actions.push(RenderAction::CreateVertex2DBuffer(VertexBufferId(0), vec![
                Vertex2D::with_pos(0.0, 0.5).with_color(1.0, 0.0, 0.0, 1.0),
                Vertex2D::with_pos(-0.5, -0.5).with_color(0.0, 1.0, 0.0, 1.0),
                Vertex2D::with_pos(0.5, -0.5).with_color(0.0, 0.0, 1.0, 1.0),
            ]));
            self.buffers_created = true;
        }

        actions.extend(vec![
            RenderAction::SetTransform(Matrix::identity()),
            RenderAction::Clear(Rgba8([32, 32, 48, 255])),
            RenderAction::UseShader(ShaderType::Simple { erase_texture: None, clip_texture: None }),
            RenderAction::DrawTriangles(VertexBufferId(0), 0..3),
        ]);

        self.renderer.render(&self.device, &self.queue, actions, &view)?;
        frame.present();

        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let win_attrs = Window::default_attributes().with_title("canvas_gpu triangle");
        let window = Arc::new(event_loop.create_window(win_attrs).unwrap());

        match GfxState::new(Arc::clone(&window)) {
            Ok(gfx_state) => {
                window.request_redraw();
                self.window = Some(window);
                self.gfx_state = Some(gfx_state);
            }

            Err(error) => {
                eprintln!("failed to initialise the GPU: {}", error);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::Destroyed | WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(gfx_state) = self.gfx_state.as_mut() {
                    gfx_state.resize(size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => {
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }

                if let Some(gfx_state) = self.gfx_state.as_mut() {
                    if let Err(error) = gfx_state.paint() {
                        eprintln!("render failed: {}", error);
                        event_loop.exit();
                    }
                }
            }

            _evt => {}
        }
    }
}
