// renderer/records.rs
//
// Host-side mirrors of the storage structs in shader/trace.wgsl and
// shader/cull.wgsl. Vectors are stored as scalar arrays so the byte layout
// stays tightly packed on both sides.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct MeshObjectRecord {
    pub local_to_world: [[f32; 4]; 4], // 64 bytes
    pub index_offset: i32,             // first triangle, not first index
    pub triangle_count: i32,
}

impl MeshObjectRecord {
    pub fn new(local_to_world: Mat4, index_offset: usize, triangle_count: usize) -> Self {
        Self {
            local_to_world: local_to_world.to_cols_array_2d(),
            index_offset: index_offset as i32,
            triangle_count: triangle_count as i32,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct MaterialRecord {
    pub albedo: [f32; 3],
    pub specular: [f32; 3],
    pub emission: [f32; 3],
    pub smoothness: f32,
    pub texture_index: i32, // -1 when untextured
}

pub const NO_TEXTURE: i32 = -1;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct VertexRecord {
    pub position: [f32; 3], // world space
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl VertexRecord {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Eq)]
pub struct TriangleRecord {
    pub i0: u32,
    pub i1: u32,
    pub i2: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct SphereRecord {
    pub center: [f32; 3],
    pub radius: f32,
    pub albedo: [f32; 3],
    pub specular: [f32; 3],
    pub smoothness: f32,
    pub emission: [f32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct FrustumPlaneRecord {
    pub normal: [f32; 3],
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn record_sizes_match_kernel_strides() {
        assert_eq!(size_of::<MeshObjectRecord>(), 72);
        assert_eq!(size_of::<MaterialRecord>(), 44);
        assert_eq!(size_of::<VertexRecord>(), 32);
        assert_eq!(size_of::<TriangleRecord>(), 12);
        assert_eq!(size_of::<SphereRecord>(), 56);
        assert_eq!(size_of::<FrustumPlaneRecord>(), 16);
    }

    #[test]
    fn mesh_object_record_is_column_major() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let record = MeshObjectRecord::new(m, 4, 2);
        assert_eq!(record.local_to_world[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!((record.index_offset, record.triangle_count), (4, 2));
    }
}
