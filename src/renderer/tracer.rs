// renderer/tracer.rs
//
// Per-frame driver: checks reset triggers, repacks dirty geometry, runs the
// culling pre-pass, dispatches the trace kernel and blits the result.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use super::accumulation::{AccumulationState, ResetReasons};
use super::atlas::TextureAtlas;
use super::frame_plan::FramePlanner;
use super::frustum::{CullTargets, Frustum, FrustumCuller};
use super::gpu_buffer::WgpuBackend;
use super::mesh_packer::pack_meshes;
use super::pipeline::{trace_workgroups, BlitPipeline, Skybox, TracePipeline};
use super::records::SphereRecord;
use super::render_target::RenderTargetManager;
use super::scene_buffers::{MeshSceneBuffers, SphereSceneBuffers};
use super::sphere_packer::{pack_spheres, scatter_spheres, seeded};
use super::uniforms::TraceUniforms;
use crate::asset::{Handle, TextureData};
use crate::error::{Result, TracerError};
use crate::scene::Scene;
use crate::settings::TracerSettings;

/// What happened during one [`PathTracer::render`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Sample index the frame was traced with.
    pub sample_index: u32,
    pub reset: ResetReasons,
    pub meshes_rebuilt: bool,
    pub spheres_rebuilt: bool,
    /// A repack failed; the frame was traced with the last committed scene.
    pub mesh_rebuild_failed: bool,
    pub sphere_rebuild_failed: bool,
    pub culled: bool,
    /// Zero-sized destination; nothing was recorded.
    pub skipped: bool,
}

pub struct PathTracer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    settings: TracerSettings,
    trace: TracePipeline,
    blit: BlitPipeline,
    culler: FrustumCuller,
    skybox: Skybox,
    targets: RenderTargetManager,
    planner: FramePlanner,
    meshes: MeshSceneBuffers,
    spheres: SphereSceneBuffers,
    atlas: Option<TextureAtlas>,
    atlas_handles: Vec<Handle<TextureData>>,
    mesh_group: Option<wgpu::BindGroup>,
    sphere_group: Option<wgpu::BindGroup>,
    atlas_group: Option<wgpu::BindGroup>,
    frustum: Option<Frustum>,
    /// The last cull pass was in a frame that failed to submit.
    cull_pending: bool,
    procedural_spheres: Option<Vec<SphereRecord>>,
    rng: SmallRng,
}

impl PathTracer {
    /// Fails with `MissingDependency` when the scene has no camera or no
    /// directional light.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        settings: TracerSettings,
        scene: &Scene,
    ) -> Result<Self> {
        scene.validate()?;

        let sky = match &settings.skybox {
            Some(path) => TextureData::from_path(path).unwrap_or_else(|err| {
                log::warn!("{}; using generated sky", err);
                TextureData::sky_gradient(256, 128)
            }),
            None => TextureData::sky_gradient(256, 128),
        };
        let skybox = Skybox::upload(device, queue, &sky);

        let procedural_spheres = settings
            .procedural_spheres
            .then(|| scatter_spheres(&settings, &mut seeded(settings.sphere_seed)));

        log::info!("Path tracer ready ({:?} output)", format);

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            trace: TracePipeline::new(device, queue),
            blit: BlitPipeline::new(device, format),
            culler: FrustumCuller::new(device),
            skybox,
            targets: RenderTargetManager::new(),
            planner: FramePlanner::new(),
            meshes: MeshSceneBuffers::new(),
            spheres: SphereSceneBuffers::new(),
            atlas: None,
            atlas_handles: Vec::new(),
            mesh_group: None,
            sphere_group: None,
            atlas_group: None,
            frustum: None,
            cull_pending: false,
            procedural_spheres,
            rng: seeded(settings.sphere_seed.wrapping_add(1)),
            settings,
        })
    }

    pub fn settings(&self) -> &TracerSettings {
        &self.settings
    }

    pub fn accumulation(&self) -> &AccumulationState {
        self.planner.accumulation()
    }

    /// Sample index the next frame traces with.
    pub fn sample_index(&self) -> u32 {
        self.planner.sample_index()
    }

    /// Mesh buffers currently bound to group 1.
    pub fn meshes(&self) -> &MeshSceneBuffers {
        &self.meshes
    }

    /// Size of the accumulation targets, `(0, 0)` before the first frame.
    pub fn target_size(&self) -> (u32, u32) {
        self.targets.size()
    }

    /// Traces one frame, blits it into `destination` and submits the work.
    ///
    /// Recording, `finish` and `submit` run inside one validation scope; a
    /// captured error comes back as `DeviceDispatchFailure` and the sample
    /// counter does not advance.
    pub fn render(
        &mut self,
        scene: &mut Scene,
        destination: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> Result<FrameStats> {
        if width == 0 || height == 0 {
            return Ok(FrameStats {
                sample_index: self.planner.sample_index(),
                skipped: true,
                ..FrameStats::default()
            });
        }

        let camera = scene
            .camera()
            .ok_or(TracerError::MissingDependency("camera"))?;
        let (light_forward, light_intensity) = scene
            .directional_light()
            .ok_or(TracerError::MissingDependency("directional light"))?;
        let aspect = width as f32 / height as f32;

        // 1. reset triggers
        let plan = self.planner.begin(scene, width, height, camera.fov_y_radians);

        // 2. geometry
        let meshes = plan.rebuild_meshes.then(|| self.rebuild_meshes(scene));
        let spheres = plan.rebuild_spheres.then(|| self.rebuild_spheres(scene));
        let geometry = self.planner.finish_geometry(scene, &plan, meshes, spheres);

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("TraceEncoder"),
            });

        let mut culled = false;
        if geometry.cull || self.cull_pending {
            self.frustum = Some(Frustum::from_camera(&camera, aspect));
            culled = self.cull(&mut encoder);
        }

        // 3. render target
        if self.targets.ensure(&self.device, width, height) {
            self.planner.target_recreated();
        }

        // 4. uniforms
        let sample_index = self.planner.sample_index();
        let uniforms = TraceUniforms::new(
            camera.camera_to_world(),
            camera.inverse_projection(aspect),
        )
        .with_light(light_forward, light_intensity)
        .with_jitter(Vec2::new(self.rng.gen(), self.rng.gen()), self.rng.gen())
        .with_counts(self.spheres.sphere_count(), self.meshes.object_count())
        .with_frame(width, height, sample_index);
        self.queue
            .write_buffer(&self.trace.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        // 5. trace + blit
        self.record_trace(&mut encoder, destination, width, height);
        self.queue.submit(Some(encoder.finish()));
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            self.cull_pending |= culled;
            return Err(TracerError::DeviceDispatchFailure(err.to_string()));
        }
        self.cull_pending = false;

        // 6. advance
        let stats = FrameStats {
            sample_index,
            reset: plan.reset | self.planner.reasons(),
            meshes_rebuilt: geometry.meshes_rebuilt,
            spheres_rebuilt: geometry.spheres_rebuilt,
            mesh_rebuild_failed: geometry.mesh_rebuild_failed,
            sphere_rebuild_failed: geometry.sphere_rebuild_failed,
            culled,
            skipped: false,
        };
        self.targets.swap();
        self.planner.complete();
        Ok(stats)
    }

    fn rebuild_meshes(&mut self, scene: &Scene) -> Result<()> {
        let instances = scene.mesh_instances()?;
        let packed = pack_meshes(&instances, &scene.assets.textures)?;
        let atlas_textures = packed
            .atlas
            .iter()
            .map(|&handle| {
                scene
                    .assets
                    .textures
                    .get(handle)
                    .ok_or(TracerError::MissingDependency("atlas texture"))
            })
            .collect::<Result<Vec<_>>>()?;

        let backend = WgpuBackend::storage(&self.device, &self.queue);
        self.meshes.upload(&backend, &packed)?;

        match packed.atlas_layout {
            Some(layout) if self.atlas.is_some() && self.atlas_handles == packed.atlas => {
                log::debug!("Reusing texture atlas ({} layers)", layout.layers);
            }
            Some(layout) => {
                self.atlas = Some(TextureAtlas::upload(
                    &self.device,
                    &self.queue,
                    layout,
                    &atlas_textures,
                ));
            }
            None => self.atlas = None,
        }
        self.atlas_handles = packed.atlas.clone();

        self.mesh_group = self.trace.mesh_group(&self.device, &self.meshes);
        self.atlas_group = self
            .atlas
            .as_ref()
            .map(|atlas| self.trace.atlas_group(&self.device, atlas));

        log::info!(
            "Rebuilt mesh scene: {} objects, {} vertices, {} triangles, {} atlas layers",
            packed.objects.len(),
            packed.vertex_count(),
            packed.triangle_count(),
            packed.atlas.len()
        );
        Ok(())
    }

    fn rebuild_spheres(&mut self, scene: &Scene) -> Result<()> {
        let records = match &self.procedural_spheres {
            Some(scattered) => scattered.clone(),
            None => pack_spheres(&scene.sphere_sources(), self.settings.sphere_seed),
        };

        let backend = WgpuBackend::storage(&self.device, &self.queue);
        self.spheres.upload(&backend, &records)?;
        self.sphere_group = self.trace.sphere_group(&self.device, &self.spheres);

        log::info!("Rebuilt sphere scene: {} spheres", records.len());
        Ok(())
    }

    fn cull(&self, encoder: &mut wgpu::CommandEncoder) -> bool {
        let (Some(frustum), Some(vertices), Some(triangles), Some(mask)) = (
            self.frustum.as_ref(),
            self.meshes.vertices.get(),
            self.meshes.triangles.get(),
            self.meshes.triangle_mask.get(),
        ) else {
            return false;
        };

        self.culler.dispatch(
            &self.device,
            &self.queue,
            encoder,
            frustum,
            CullTargets {
                vertices,
                triangles,
                mask,
                triangle_count: self.meshes.triangle_count(),
            },
        );
        true
    }

    fn record_trace(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        destination: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        let (Some(history), Some(output)) = (self.targets.history(), self.targets.output()) else {
            return;
        };

        let frame_group = self
            .trace
            .frame_group(&self.device, &self.skybox, &history.view, &output.view);
        let mesh_group = self.mesh_group.as_ref().unwrap_or(self.trace.empty_meshes());
        let sphere_group = self.sphere_group.as_ref().unwrap_or(self.trace.empty_spheres());
        let atlas_group = self.atlas_group.as_ref().unwrap_or(self.trace.empty_atlas());

        {
            let (groups_x, groups_y) = trace_workgroups(width, height);
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("TracePass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.trace.pipeline);
            pass.set_bind_group(0, &frame_group, &[]);
            pass.set_bind_group(1, mesh_group, &[]);
            pass.set_bind_group(2, sphere_group, &[]);
            pass.set_bind_group(3, atlas_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        let blit_group = self.blit.source_group(&self.device, &output.view);
        self.blit.draw(encoder, &blit_group, destination);
    }
}
