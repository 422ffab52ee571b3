// renderer/frame_plan.rs
//
// Device-free half of the frame driver. The planner decides which reset
// triggers fire, which geometry lists get repacked and whether the culling
// pass runs; the tracer does the GPU work in between and reports back.

use super::accumulation::{AccumulationState, ResetReasons};
use crate::error::Result;
use crate::scene::Scene;

/// Decisions taken at the start of a frame, before any GPU work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramePlan {
    /// Triggers that fired while checking the view.
    pub reset: ResetReasons,
    pub rebuild_meshes: bool,
    pub rebuild_spheres: bool,
}

impl FramePlan {
    /// The camera sees the scene differently than last frame.
    pub fn view_changed(&self) -> bool {
        self.reset.intersects(ResetReasons::VIEW_CHANGED)
    }
}

/// What the geometry step left behind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryOutcome {
    pub meshes_rebuilt: bool,
    pub spheres_rebuilt: bool,
    pub mesh_rebuild_failed: bool,
    pub sphere_rebuild_failed: bool,
    /// The triangle mask has to be recomputed for the current camera.
    pub cull: bool,
}

#[derive(Debug, Default)]
pub struct FramePlanner {
    accumulation: AccumulationState,
    spheres_attempted: bool,
}

impl FramePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulation(&self) -> &AccumulationState {
        &self.accumulation
    }

    /// Sample index the current frame traces with.
    pub fn sample_index(&self) -> u32 {
        self.accumulation.sample_index()
    }

    /// Consumes the moved markers of the camera and light, evaluates the
    /// reset triggers and gates the rebuilds on the registry's dirty flags.
    pub fn begin(
        &mut self,
        scene: &mut Scene,
        width: u32,
        height: u32,
        field_of_view: f32,
    ) -> FramePlan {
        for entity in [scene.camera_entity(), scene.light_entity()].into_iter().flatten() {
            self.accumulation.watch(entity);
        }
        let moved = self
            .accumulation
            .watched()
            .to_vec()
            .into_iter()
            .fold(false, |moved, entity| scene.take_moved(entity) || moved);

        FramePlan {
            reset: self.accumulation.check_triggers(width, height, field_of_view, moved),
            rebuild_meshes: scene.registry().meshes_dirty(),
            rebuild_spheres: scene.registry().spheres_dirty() || !self.spheres_attempted,
        }
    }

    /// Books the rebuild results, `None` for a list that was not rebuilt.
    ///
    /// A successful rebuild resets accumulation. A failed one is logged and
    /// leaves the committed buffers bound; its dirty flag is cleared anyway,
    /// so the repack is retried only once the registry changes again.
    pub fn finish_geometry(
        &mut self,
        scene: &mut Scene,
        plan: &FramePlan,
        meshes: Option<Result<()>>,
        spheres: Option<Result<()>>,
    ) -> GeometryOutcome {
        let mut outcome = GeometryOutcome::default();

        if let Some(result) = meshes {
            scene.registry_mut().clear_meshes_dirty();
            match result {
                Ok(()) => {
                    self.accumulation.reset(ResetReasons::MESHES_REBUILT);
                    outcome.meshes_rebuilt = true;
                }
                Err(err) => {
                    log::error!("Mesh rebuild failed, keeping the last scene: {}", err);
                    outcome.mesh_rebuild_failed = true;
                }
            }
        }

        if let Some(result) = spheres {
            scene.registry_mut().clear_spheres_dirty();
            self.spheres_attempted = true;
            match result {
                Ok(()) => {
                    self.accumulation.reset(ResetReasons::SPHERES_REBUILT);
                    outcome.spheres_rebuilt = true;
                }
                Err(err) => {
                    log::error!("Sphere rebuild failed, keeping the last scene: {}", err);
                    outcome.sphere_rebuild_failed = true;
                }
            }
        }

        // The mask follows the camera, so a view change re-culls as well.
        outcome.cull = outcome.meshes_rebuilt || plan.view_changed();
        outcome
    }

    /// The ping-pong pair was recreated; its history is garbage.
    pub fn target_recreated(&mut self) {
        self.accumulation.reset(ResetReasons::TARGET_RECREATED);
    }

    /// Every reason the counter was reset since the last completed frame.
    pub fn reasons(&self) -> ResetReasons {
        self.accumulation.reasons()
    }

    /// The frame was submitted; the next one blends one more sample.
    pub fn complete(&mut self) {
        self.accumulation.advance();
    }
}
