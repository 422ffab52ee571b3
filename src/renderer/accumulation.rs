// renderer/accumulation.rs
//
// Progressive accumulation bookkeeping. The trace kernel blends each new
// sample into the history with weight 1 / (sample_index + 1), so the counter
// must drop to zero whenever the previous samples stop describing the scene.

use hecs::Entity;

bitflags::bitflags! {
    /// Why the sample counter was reset this frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResetReasons: u32 {
        const RESOLUTION = 1 << 0;
        const FIELD_OF_VIEW = 1 << 1;
        const TRANSFORM_MOVED = 1 << 2;
        const MESHES_REBUILT = 1 << 3;
        const SPHERES_REBUILT = 1 << 4;
        const TARGET_RECREATED = 1 << 5;
        /// Triggers that mean the camera sees the scene differently.
        const VIEW_CHANGED = Self::RESOLUTION.bits()
            | Self::FIELD_OF_VIEW.bits()
            | Self::TRANSFORM_MOVED.bits();
    }
}

#[derive(Debug, Default)]
pub struct AccumulationState {
    sample_index: u32,
    target_width: u32,
    target_height: u32,
    last_field_of_view: Option<f32>,
    watched: Vec<Entity>,
    reasons: ResetReasons,
}

impl AccumulationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_index(&self) -> u32 {
        self.sample_index
    }

    /// Reasons collected since the last [`AccumulationState::advance`].
    pub fn reasons(&self) -> ResetReasons {
        self.reasons
    }

    /// Entities whose motion invalidates accumulated samples.
    pub fn watch(&mut self, entity: Entity) {
        if !self.watched.contains(&entity) {
            self.watched.push(entity);
        }
    }

    pub fn unwatch(&mut self, entity: Entity) {
        self.watched.retain(|&e| e != entity);
    }

    pub fn watched(&self) -> &[Entity] {
        &self.watched
    }

    /// Evaluates the per-frame triggers. Each fires independently and any of
    /// them drops the counter to zero.
    pub fn check_triggers(
        &mut self,
        width: u32,
        height: u32,
        field_of_view: f32,
        watched_moved: bool,
    ) -> ResetReasons {
        let mut fired = ResetReasons::empty();

        if (width, height) != (self.target_width, self.target_height) {
            self.target_width = width;
            self.target_height = height;
            fired |= ResetReasons::RESOLUTION;
        }

        if self.last_field_of_view != Some(field_of_view) {
            if self.last_field_of_view.is_some() {
                fired |= ResetReasons::FIELD_OF_VIEW;
            }
            self.last_field_of_view = Some(field_of_view);
        }

        if watched_moved {
            fired |= ResetReasons::TRANSFORM_MOVED;
        }

        self.reset(fired);
        fired
    }

    /// Drops the counter to zero unless `reasons` is empty.
    pub fn reset(&mut self, reasons: ResetReasons) {
        if reasons.is_empty() {
            return;
        }
        self.sample_index = 0;
        self.reasons |= reasons;
    }

    /// Finishes a frame: the next one blends with one more sample of history.
    pub fn advance(&mut self) {
        if !self.reasons.is_empty() {
            log::debug!("Accumulation reset: {:?}", self.reasons);
        }
        self.reasons = ResetReasons::empty();
        self.sample_index = self.sample_index.saturating_add(1);
    }

    /// Weight the kernel gives the newest sample.
    pub fn blend_weight(&self) -> f32 {
        1.0 / (self.sample_index as f32 + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warmed_up(frames: u32) -> AccumulationState {
        let mut state = AccumulationState::new();
        for _ in 0..frames {
            state.check_triggers(800, 600, 1.0, false);
            state.advance();
        }
        state
    }

    #[test]
    fn counter_increments_without_triggers() {
        let mut state = warmed_up(1);
        for expected in 1..10 {
            assert!(state.check_triggers(800, 600, 1.0, false).is_empty());
            assert_eq!(state.sample_index(), expected);
            state.advance();
        }
    }

    #[test]
    fn each_trigger_resets_independently() {
        let mut state = warmed_up(5);
        let fired = state.check_triggers(1024, 600, 1.0, false);
        assert_eq!(fired, ResetReasons::RESOLUTION);
        assert_eq!(state.sample_index(), 0);

        let mut state = warmed_up(5);
        let fired = state.check_triggers(800, 600, 0.5, false);
        assert_eq!(fired, ResetReasons::FIELD_OF_VIEW);
        assert_eq!(state.sample_index(), 0);

        let mut state = warmed_up(5);
        let fired = state.check_triggers(800, 600, 1.0, true);
        assert_eq!(fired, ResetReasons::TRANSFORM_MOVED);
        assert_eq!(state.sample_index(), 0);
    }

    #[test]
    fn triggers_combine_in_one_frame() {
        let mut state = warmed_up(3);
        let fired = state.check_triggers(640, 480, 0.3, true);
        assert!(fired.contains(ResetReasons::RESOLUTION | ResetReasons::FIELD_OF_VIEW));
        assert!(fired.contains(ResetReasons::TRANSFORM_MOVED));
        assert_eq!(state.sample_index(), 0);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut state = warmed_up(4);
        state.reset(ResetReasons::MESHES_REBUILT);
        state.reset(ResetReasons::MESHES_REBUILT | ResetReasons::SPHERES_REBUILT);
        assert_eq!(state.sample_index(), 0);
        state.advance();
        assert_eq!(state.sample_index(), 1);
        assert!(state.reasons().is_empty());
    }

    #[test]
    fn blend_weight_decays() {
        let state = warmed_up(3);
        assert!((state.blend_weight() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn watch_list_is_a_set() {
        let mut world = hecs::World::new();
        let e = world.spawn(());
        let mut state = AccumulationState::new();
        state.watch(e);
        state.watch(e);
        assert_eq!(state.watched(), &[e]);
        state.unwatch(e);
        assert!(state.watched().is_empty());
    }
}
