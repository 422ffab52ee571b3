// app.rs
use std::sync::Arc;

use glam::{Quat, Vec3};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::error::{Result, TracerError};
use crate::renderer::PathTracer;
use crate::scene::Scene;
use crate::settings::TracerSettings;

const ORBIT_STEP_RADIANS: f32 = 5.0_f32 * std::f32::consts::PI / 180.0;

/// Surface, device and queue for one window.
pub struct HostContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
}

impl HostContext {
    pub async fn new(window: Arc<Window>, settings: &TracerSettings) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .map_err(|err| TracerError::DeviceInit(format!("surface: {err}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| TracerError::DeviceInit(format!("adapter: {err}")))?;

        log::info!("Using adapter: {:?}", adapter.get_info());

        let mut limits = wgpu::Limits::default();
        limits.max_bind_groups = limits.max_bind_groups.max(4);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|err| TracerError::DeviceInit(format!("device: {err}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| TracerError::DeviceInit("surface has no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: settings.present_mode(&surface_caps.present_modes),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Traces one frame into the swapchain image and presents it.
    fn draw(&self, tracer: &mut PathTracer, scene: &mut Scene) -> Result<()> {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let stats = tracer.render(scene, &view, self.config.width, self.config.height)?;
        frame.present();

        if !stats.skipped && stats.sample_index > 0 && stats.sample_index % 256 == 0 {
            log::info!("{} samples accumulated", stats.sample_index);
        }
        Ok(())
    }
}

struct Running {
    window: Arc<Window>,
    context: HostContext,
    tracer: PathTracer,
}

pub struct App {
    settings: TracerSettings,
    scene: Scene,
    running: Option<Running>,
}

impl App {
    pub fn new(settings: TracerSettings, scene: Scene) -> Self {
        Self {
            settings,
            scene,
            running: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let attributes = Window::default_attributes()
            .with_title("wgpu path tracer")
            .with_inner_size(PhysicalSize::new(
                self.settings.resolution.width,
                self.settings.resolution.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| TracerError::DeviceInit(format!("window: {err}")))?,
        );

        let context = pollster::block_on(HostContext::new(window.clone(), &self.settings))?;
        let tracer = PathTracer::new(
            context.device(),
            context.queue(),
            context.format(),
            self.settings.clone(),
            &self.scene,
        )?;

        Ok(Running {
            window,
            context,
            tracer,
        })
    }

    /// Rotates the camera around its target; the tracer sees the move and resets.
    fn orbit(&mut self, angle: f32) {
        let Some(mut camera) = self.scene.camera() else {
            return;
        };
        let offset = Quat::from_axis_angle(Vec3::Y, angle) * (camera.eye - camera.target);
        camera.eye = camera.target + offset;
        if let Err(err) = self.scene.set_camera(camera) {
            log::error!("{}", err);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(err) => {
                log::error!("Failed to start path tracer: {}", err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.running.as_ref().map(|r| r.window.id()) != Some(id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(running) = self.running.as_mut() {
                    running.context.resize(size);
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(running) = self.running.as_mut() {
                    let size = running.window.inner_size();
                    running.context.resize(size);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(running) = self.running.as_mut() else {
                    return;
                };

                match running.context.draw(&mut running.tracer, &mut self.scene) {
                    Ok(()) => {}
                    Err(TracerError::Surface(wgpu::SurfaceError::Lost))
                    | Err(TracerError::Surface(wgpu::SurfaceError::Outdated)) => {
                        running.context.reconfigure();
                    }
                    Err(TracerError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                        log::error!("Surface out of memory, exiting");
                        event_loop.exit();
                    }
                    Err(err) => log::error!("Frame skipped: {}", err),
                }

                running.window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match logical_key {
                Key::Named(NamedKey::Escape) => event_loop.exit(),
                Key::Named(NamedKey::ArrowLeft) => self.orbit(-ORBIT_STEP_RADIANS),
                Key::Named(NamedKey::ArrowRight) => self.orbit(ORBIT_STEP_RADIANS),
                _ => {}
            },
            _ => {}
        }
    }
}
