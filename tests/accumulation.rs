//! Headless checks for the frame bookkeeping: reset triggers, dirty flags and
//! buffer reuse. No device is created; buffers go through a counting backend.
use std::cell::{Cell, RefCell};

use glam::{Mat4, Vec3};
use wgpu_pathtracer::asset::primitives::cube_mesh;
use wgpu_pathtracer::asset::AssetCache;
use wgpu_pathtracer::renderer::{
    pack_meshes, AccumulationState, BufferBackend, GpuBuffer, MaterialDescriptor, MeshInstance,
    MeshSceneBuffers, ResetReasons,
};
use wgpu_pathtracer::scene::{Camera, Transform};
use wgpu_pathtracer::{Result, Scene};

#[derive(Default)]
struct CountingBackend {
    next: Cell<u32>,
    uploads: RefCell<Vec<(u32, Vec<u8>)>>,
}

impl BufferBackend for CountingBackend {
    type Buffer = u32;

    fn allocate(&self, _label: &'static str, _count: usize, _stride: u64) -> Result<u32> {
        let id = self.next.get();
        self.next.set(id + 1);
        Ok(id)
    }

    fn upload(&self, buffer: &u32, bytes: &[u8]) {
        self.uploads.borrow_mut().push((*buffer, bytes.to_vec()));
    }
}

/// Runs `frames` undisturbed frames at 800x600.
fn accumulate(state: &mut AccumulationState, frames: u32) {
    for _ in 0..frames {
        state.check_triggers(800, 600, 1.0, false);
        state.advance();
    }
}

#[test]
fn sample_index_climbs_by_one_without_triggers() {
    let mut state = AccumulationState::new();
    let mut previous = None;
    for _ in 0..20 {
        state.check_triggers(800, 600, 1.0, false);
        let current = state.sample_index();
        if let Some(previous) = previous {
            assert_eq!(current, previous + 1);
        }
        previous = Some(current);
        state.advance();
    }
}

#[test]
fn each_trigger_alone_resets() {
    let cases = [
        ((1024, 600, 1.0, false), ResetReasons::RESOLUTION),
        ((800, 600, 0.7, false), ResetReasons::FIELD_OF_VIEW),
        ((800, 600, 1.0, true), ResetReasons::TRANSFORM_MOVED),
    ];

    for ((width, height, fov, moved), reason) in cases {
        let mut state = AccumulationState::new();
        accumulate(&mut state, 12);
        let fired = state.check_triggers(width, height, fov, moved);
        assert_eq!(fired, reason);
        assert_eq!(state.sample_index(), 0);
        assert!(fired.intersects(ResetReasons::VIEW_CHANGED));
    }
}

#[test]
fn moving_the_camera_flags_it_for_the_tracer() {
    let mut scene = Scene::new();
    let camera = scene.spawn_camera(Camera::default());
    scene.spawn_directional_light(Transform::default(), 1.0);
    let mut state = AccumulationState::new();
    state.watch(camera);

    // Spawning counts as a move; consume it.
    assert!(scene.take_moved(camera));
    accumulate(&mut state, 5);

    let mut moved_camera = Camera::default();
    moved_camera.eye += Vec3::X;
    scene.set_camera(moved_camera).unwrap();

    let moved = state
        .watched()
        .to_vec()
        .into_iter()
        .fold(false, |moved, entity| scene.take_moved(entity) || moved);
    state.check_triggers(800, 600, 1.0, moved);
    assert_eq!(state.sample_index(), 0);
}

#[test]
fn sphere_and_mesh_flags_are_independent() {
    let mut scene = Scene::new();
    let mesh = scene.assets.meshes.insert(cube_mesh());
    let cube = scene.spawn().with_mesh(mesh).spawn();
    let ball = scene.spawn().as_sphere().spawn();

    scene.set_visible(ball, true);
    assert!(scene.registry().spheres_dirty());
    assert!(!scene.registry().meshes_dirty());
    scene.registry_mut().clear_spheres_dirty();

    scene.set_visible(cube, true);
    assert!(scene.registry().meshes_dirty());
    assert!(!scene.registry().spheres_dirty());
    scene.registry_mut().clear_meshes_dirty();

    scene.set_visible(ball, false);
    assert!(!scene.registry().meshes_dirty());
    scene.set_visible(cube, false);
    assert!(!scene.registry().spheres_dirty());
}

#[test]
fn equal_shape_reuses_the_allocation() {
    let backend = CountingBackend::default();
    let mut buffer: GpuBuffer<[f32; 4], u32> = GpuBuffer::new("Test");

    buffer.ensure(&backend, &[[1.0; 4], [2.0; 4]]).unwrap();
    buffer.ensure(&backend, &[[3.0; 4], [4.0; 4]]).unwrap();

    assert_eq!(buffer.allocations(), 1);
    let uploads = backend.uploads.borrow();
    let (id, bytes) = uploads.last().unwrap();
    assert_eq!(Some(id), buffer.get());
    let expected: &[u8] = bytemuck::cast_slice(&[[3.0f32; 4], [4.0; 4]]);
    assert_eq!(bytes.as_slice(), expected);
}

#[test]
fn moved_mesh_reuses_every_scene_buffer() {
    let backend = CountingBackend::default();
    let mut buffers: MeshSceneBuffers<u32> = MeshSceneBuffers::new();
    let cube = cube_mesh();
    let at = |x: f32| MeshInstance {
        local_to_world: Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
        mesh: &cube,
        material: MaterialDescriptor::default(),
    };
    let textures = AssetCache::new();

    let packed = pack_meshes(&[at(0.0)], &textures).unwrap();
    buffers.upload(&backend, &packed).unwrap();
    assert_eq!(buffers.allocations(), 5);

    let moved = pack_meshes(&[at(2.0)], &textures).unwrap();
    buffers.upload(&backend, &moved).unwrap();
    assert_eq!(buffers.allocations(), 5);
    assert_eq!(buffers.triangle_count(), 12);

    let grown = pack_meshes(&[at(0.0), at(2.0)], &textures).unwrap();
    buffers.upload(&backend, &grown).unwrap();
    assert_eq!(buffers.allocations(), 10);
    assert_eq!(buffers.object_count(), 2);
}
