// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

/// Per-frame inputs of the trace kernel (`Uniforms` in trace.wgsl).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct TraceUniforms {
    pub camera_to_world: [[f32; 4]; 4],
    pub inverse_projection: [[f32; 4]; 4],
    pub directional_light: [f32; 4], // xyz = forward, w = intensity
    pub pixel_offset: [f32; 2],
    pub seed: f32,
    pub sample_index: u32,
    pub sphere_count: u32,
    pub mesh_object_count: u32,
    pub width: u32,
    pub height: u32,
}

impl TraceUniforms {
    pub fn new(camera_to_world: Mat4, inverse_projection: Mat4) -> Self {
        Self {
            camera_to_world: camera_to_world.to_cols_array_2d(),
            inverse_projection: inverse_projection.to_cols_array_2d(),
            ..Self::zeroed()
        }
    }

    pub fn with_light(mut self, forward: Vec3, intensity: f32) -> Self {
        self.directional_light = forward.extend(intensity).to_array();
        self
    }

    pub fn with_jitter(mut self, pixel_offset: Vec2, seed: f32) -> Self {
        self.pixel_offset = pixel_offset.to_array();
        self.seed = seed;
        self
    }

    pub fn with_counts(mut self, sphere_count: u32, mesh_object_count: u32) -> Self {
        self.sphere_count = sphere_count;
        self.mesh_object_count = mesh_object_count;
        self
    }

    pub fn with_frame(mut self, width: u32, height: u32, sample_index: u32) -> Self {
        self.width = width;
        self.height = height;
        self.sample_index = sample_index;
        self
    }
}

/// Uniform block of cull.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Eq)]
pub struct CullParams {
    pub triangle_count: u32,
    pub _padding: [u32; 3],
}

impl CullParams {
    pub fn new(triangle_count: u32) -> Self {
        Self {
            triangle_count,
            _padding: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_uniforms_is_176_bytes() {
        // 2 * mat4x4<f32> = 128, vec4 light = 16, vec2 jitter = 8, 6 scalars = 24
        assert_eq!(std::mem::size_of::<TraceUniforms>(), 176);
        assert_eq!(std::mem::size_of::<CullParams>(), 16);
    }

    #[test]
    fn light_packs_intensity_in_w() {
        let u = TraceUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY).with_light(Vec3::NEG_Y, 2.5);
        assert_eq!(u.directional_light, [0.0, -1.0, 0.0, 2.5]);
    }
}
