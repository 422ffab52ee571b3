pub mod app;
pub mod asset;
pub mod demo;
pub mod error;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use error::{Result, TracerError};
pub use renderer::{FrameStats, PathTracer};
pub use scene::Scene;
pub use settings::TracerSettings;

use app::App;
use winit::event_loop::EventLoop;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

pub fn run() -> std::result::Result<(), winit::error::EventLoopError> {
    init_logging();

    log::info!("Starting wgpu path tracer");

    let settings = TracerSettings::load();
    let scene = demo::build_scene();

    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings, scene);

    let result = event_loop.run_app(&mut app);

    if let Err(ref err) = result {
        log::error!("Application error: {}", err);
    }

    log::info!("Application shutdown complete");

    result
}
