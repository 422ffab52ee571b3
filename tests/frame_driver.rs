//! `PathTracer::render` against a real device. Every test returns early when
//! no adapter is available, so they only exercise the GPU path on machines
//! that have one (a software adapter such as llvmpipe is enough).
use glam::Vec3;
use wgpu_pathtracer::asset::primitives::cube_mesh;
use wgpu_pathtracer::asset::TextureData;
use wgpu_pathtracer::renderer::{MaterialDescriptor, ResetReasons};
use wgpu_pathtracer::scene::{Camera, Transform};
use wgpu_pathtracer::{PathTracer, Scene, TracerError, TracerSettings};

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

fn gpu() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter =
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
            .ok()?;
    if adapter.limits().max_bind_groups < 4 {
        return None;
    }
    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("TestDevice"),
        required_features: wgpu::Features::empty(),
        required_limits: adapter.limits(),
        experimental_features: wgpu::ExperimentalFeatures::disabled(),
        memory_hints: wgpu::MemoryHints::Performance,
        trace: wgpu::Trace::Off,
    }))
    .ok()
}

fn destination(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("TestDestination"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn textured_cube(scene: &mut Scene, texture_size: u32, x: f32) -> hecs::Entity {
    let mesh = scene.assets.meshes.insert(cube_mesh());
    let texture = scene.assets.textures.insert(TextureData::checker(
        texture_size,
        4,
        [255; 4],
        [0, 0, 0, 255],
    ));
    let cube = scene
        .spawn()
        .with_mesh(mesh)
        .with_transform(Transform::from_translation(Vec3::new(x, 0.0, 0.0)))
        .with_material(MaterialDescriptor::default().with_base_texture(texture))
        .spawn();
    scene.set_visible(cube, true);
    cube
}

fn scene_with_cube() -> Scene {
    let mut scene = Scene::new();
    scene.spawn_camera(Camera::default());
    scene.spawn_directional_light(Transform::default(), 1.0);
    textured_cube(&mut scene, 32, 0.0);
    let ball = scene
        .spawn()
        .with_transform(Transform::from_translation(Vec3::new(-2.0, 0.0, 0.0)))
        .as_sphere()
        .spawn();
    scene.set_visible(ball, true);
    scene
}

fn tracer(device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) -> PathTracer {
    PathTracer::new(device, queue, FORMAT, TracerSettings::default(), scene).unwrap()
}

#[test]
fn resize_at_sample_37_recreates_targets_and_resets() {
    let Some((device, queue)) = gpu() else {
        eprintln!("no adapter; skipping");
        return;
    };
    let mut scene = scene_with_cube();
    let mut tracer = tracer(&device, &queue, &scene);

    let small = destination(&device, 32, 24, FORMAT);
    for expected in 0..37 {
        let stats = tracer.render(&mut scene, &small, 32, 24).unwrap();
        assert_eq!(stats.sample_index, expected);
    }
    assert_eq!(tracer.sample_index(), 37);
    assert_eq!(tracer.target_size(), (32, 24));

    let large = destination(&device, 64, 48, FORMAT);
    let stats = tracer.render(&mut scene, &large, 64, 48).unwrap();
    assert!(stats
        .reset
        .contains(ResetReasons::RESOLUTION | ResetReasons::TARGET_RECREATED));
    assert_eq!(stats.sample_index, 0);
    assert_eq!(tracer.target_size(), (64, 48));

    let stats = tracer.render(&mut scene, &large, 64, 48).unwrap();
    assert!(stats.reset.is_empty());
    assert_eq!(stats.sample_index, 1);
}

#[test]
fn clean_frames_keep_the_bound_buffers() {
    let Some((device, queue)) = gpu() else {
        eprintln!("no adapter; skipping");
        return;
    };
    let mut scene = scene_with_cube();
    let mut tracer = tracer(&device, &queue, &scene);
    let view = destination(&device, 32, 24, FORMAT);

    let first = tracer.render(&mut scene, &view, 32, 24).unwrap();
    assert!(first.meshes_rebuilt && first.spheres_rebuilt && first.culled);
    let allocations = tracer.meshes().allocations();

    for _ in 0..3 {
        let stats = tracer.render(&mut scene, &view, 32, 24).unwrap();
        assert!(!stats.meshes_rebuilt && !stats.spheres_rebuilt && !stats.culled);
    }
    assert_eq!(tracer.meshes().allocations(), allocations);
    assert_eq!(tracer.sample_index(), 4);

    let ball = scene.spawn().as_sphere().spawn();
    scene.set_visible(ball, true);
    let stats = tracer.render(&mut scene, &view, 32, 24).unwrap();
    assert!(stats.spheres_rebuilt);
    assert!(!stats.meshes_rebuilt && !stats.culled);
    assert_eq!(stats.sample_index, 0);
    assert_eq!(tracer.meshes().allocations(), allocations);
}

#[test]
fn failed_mesh_rebuild_keeps_tracing_the_last_scene() {
    let Some((device, queue)) = gpu() else {
        eprintln!("no adapter; skipping");
        return;
    };
    let mut scene = scene_with_cube();
    let mut tracer = tracer(&device, &queue, &scene);
    let view = destination(&device, 32, 24, FORMAT);
    for _ in 0..3 {
        tracer.render(&mut scene, &view, 32, 24).unwrap();
    }

    textured_cube(&mut scene, 64, 2.0);
    let stats = tracer.render(&mut scene, &view, 32, 24).unwrap();
    assert!(stats.mesh_rebuild_failed);
    assert!(!stats.meshes_rebuilt);
    assert_eq!(stats.sample_index, 3);
    assert_eq!(tracer.meshes().object_count(), 1);

    for expected in 4..8 {
        let stats = tracer.render(&mut scene, &view, 32, 24).unwrap();
        assert!(!stats.mesh_rebuild_failed);
        assert_eq!(stats.sample_index, expected);
    }
}

#[test]
fn invalid_destination_is_a_dispatch_failure() {
    let Some((device, queue)) = gpu() else {
        eprintln!("no adapter; skipping");
        return;
    };
    let mut scene = scene_with_cube();
    let mut tracer = tracer(&device, &queue, &scene);

    let good = destination(&device, 32, 24, FORMAT);
    tracer.render(&mut scene, &good, 32, 24).unwrap();
    assert_eq!(tracer.sample_index(), 1);

    let wrong_format = destination(&device, 32, 24, wgpu::TextureFormat::Rgba8UnormSrgb);
    let result = tracer.render(&mut scene, &wrong_format, 32, 24);
    assert!(matches!(result, Err(TracerError::DeviceDispatchFailure(_))));
    assert_eq!(tracer.sample_index(), 1);

    let stats = tracer.render(&mut scene, &good, 32, 24).unwrap();
    assert_eq!(stats.sample_index, 1);

    // A cull pass lost with a failed frame runs again on the next one.
    let mut camera = scene.camera().unwrap();
    camera.eye += Vec3::X;
    scene.set_camera(camera).unwrap();
    assert!(tracer.render(&mut scene, &wrong_format, 32, 24).is_err());
    let stats = tracer.render(&mut scene, &good, 32, 24).unwrap();
    assert!(stats.culled);
    assert!(stats.reset.contains(ResetReasons::TRANSFORM_MOVED));
    assert_eq!(stats.sample_index, 0);
}
