use glam::{Mat4, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, aspect, self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.proj(aspect) * self.view()
    }

    pub fn camera_to_world(&self) -> Mat4 {
        self.view().inverse()
    }

    pub fn inverse_projection(&self, aspect: f32) -> Mat4 {
        self.proj(aspect).inverse()
    }

    /// True when eye, target or up differ; lens changes are tracked separately.
    pub fn pose_differs(&self, other: &Camera) -> bool {
        self.eye != other.eye || self.target != other.target || self.up != other.up
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 2.0, 8.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_radians: 60f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_proj_is_reasonable() {
        let cam = Camera::default();
        let vp = cam.view_proj(16.0 / 9.0);
        let id = vp * vp.inverse();
        assert!(id.abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn camera_to_world_places_origin_at_eye() {
        let cam = Camera::default();
        let eye = cam.camera_to_world().transform_point3(Vec3::ZERO);
        assert!(eye.abs_diff_eq(cam.eye, 1e-4));
    }

    #[test]
    fn fov_change_is_not_a_pose_change() {
        let cam = Camera::default();
        let zoomed = Camera {
            fov_y_radians: 30f32.to_radians(),
            ..cam
        };
        assert!(!cam.pose_differs(&zoomed));
        assert!(cam.pose_differs(&Camera {
            eye: Vec3::ONE,
            ..cam
        }));
    }
}
