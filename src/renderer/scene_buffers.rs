// renderer/scene_buffers.rs
//
// GPU-resident copies of the packed mesh and sphere scenes. A rebuild stages
// every buffer first and commits only when all of them succeeded, so the
// previously bound set survives any allocation failure untouched.

use super::gpu_buffer::{BufferBackend, GpuBuffer};
use super::mesh_packer::PackedMeshes;
use super::records::{MaterialRecord, MeshObjectRecord, SphereRecord, TriangleRecord, VertexRecord};
use crate::error::Result;

pub struct MeshSceneBuffers<B = wgpu::Buffer> {
    pub objects: GpuBuffer<MeshObjectRecord, B>,
    pub materials: GpuBuffer<MaterialRecord, B>,
    pub vertices: GpuBuffer<VertexRecord, B>,
    pub triangles: GpuBuffer<TriangleRecord, B>,
    /// One u32 per triangle, written by the culling pass.
    pub triangle_mask: GpuBuffer<u32, B>,
}

impl<B> MeshSceneBuffers<B> {
    pub fn new() -> Self {
        Self {
            objects: GpuBuffer::new("MeshObjects"),
            materials: GpuBuffer::new("MeshMaterials"),
            vertices: GpuBuffer::new("Vertices"),
            triangles: GpuBuffer::new("Triangles"),
            triangle_mask: GpuBuffer::new("TriangleMask"),
        }
    }

    pub fn object_count(&self) -> u32 {
        self.objects.len() as u32
    }

    pub fn triangle_count(&self) -> u32 {
        self.triangles.len() as u32
    }

    /// Uploads a packed scene, all-or-nothing.
    pub fn upload<K>(&mut self, backend: &K, packed: &PackedMeshes) -> Result<()>
    where
        K: BufferBackend<Buffer = B>,
    {
        let mask = vec![1u32; packed.triangles.len()];

        let objects = self.objects.stage(backend, &packed.objects, stride_of::<MeshObjectRecord>())?;
        let materials = self.materials.stage(backend, &packed.materials, stride_of::<MaterialRecord>())?;
        let vertices = self.vertices.stage(backend, &packed.vertices, stride_of::<VertexRecord>())?;
        let triangles = self.triangles.stage(backend, &packed.triangles, stride_of::<TriangleRecord>())?;
        let triangle_mask = self.triangle_mask.stage(backend, &mask, stride_of::<u32>())?;

        self.objects.commit(backend, objects);
        self.materials.commit(backend, materials);
        self.vertices.commit(backend, vertices);
        self.triangles.commit(backend, triangles);
        self.triangle_mask.commit(backend, triangle_mask);
        Ok(())
    }

    /// Total allocations across the set.
    pub fn allocations(&self) -> u64 {
        self.objects.allocations()
            + self.materials.allocations()
            + self.vertices.allocations()
            + self.triangles.allocations()
            + self.triangle_mask.allocations()
    }
}

impl<B> Default for MeshSceneBuffers<B> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SphereSceneBuffers<B = wgpu::Buffer> {
    pub spheres: GpuBuffer<SphereRecord, B>,
}

impl<B> SphereSceneBuffers<B> {
    pub fn new() -> Self {
        Self {
            spheres: GpuBuffer::new("Spheres"),
        }
    }

    pub fn sphere_count(&self) -> u32 {
        self.spheres.len() as u32
    }

    pub fn upload<K>(&mut self, backend: &K, spheres: &[SphereRecord]) -> Result<()>
    where
        K: BufferBackend<Buffer = B>,
    {
        self.spheres.ensure(backend, spheres)
    }
}

impl<B> Default for SphereSceneBuffers<B> {
    fn default() -> Self {
        Self::new()
    }
}

fn stride_of<T>() -> u64 {
    std::mem::size_of::<T>() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::primitives::{cube_mesh, plane_mesh};
    use crate::asset::AssetCache;
    use crate::renderer::gpu_buffer::tests::RecordingBackend;
    use crate::renderer::material::MaterialDescriptor;
    use crate::renderer::mesh_packer::{pack_meshes, MeshInstance};
    use glam::{Mat4, Vec3};

    fn packed(translation: Vec3) -> PackedMeshes {
        let cube = cube_mesh();
        let plane = plane_mesh();
        let instances = [
            MeshInstance {
                local_to_world: Mat4::from_translation(translation),
                mesh: &cube,
                material: MaterialDescriptor::default(),
            },
            MeshInstance {
                local_to_world: Mat4::IDENTITY,
                mesh: &plane,
                material: MaterialDescriptor::default(),
            },
        ];
        pack_meshes(&instances, &AssetCache::new()).unwrap()
    }

    #[test]
    fn moving_an_object_reuploads_without_reallocating() {
        let backend = RecordingBackend::default();
        let mut buffers: MeshSceneBuffers<u32> = MeshSceneBuffers::new();

        buffers.upload(&backend, &packed(Vec3::ZERO)).unwrap();
        assert_eq!(buffers.allocations(), 5);
        let uploads = backend.uploads.borrow().len();

        buffers.upload(&backend, &packed(Vec3::X)).unwrap();
        assert_eq!(buffers.allocations(), 5);
        assert_eq!(backend.uploads.borrow().len(), uploads + 5);
        assert_eq!(buffers.triangle_count(), 14);
        assert_eq!(buffers.object_count(), 2);
    }

    #[test]
    fn failed_upload_keeps_last_good_set() {
        let mut backend = RecordingBackend::default();
        let mut buffers: MeshSceneBuffers<u32> = MeshSceneBuffers::new();
        buffers.upload(&backend, &packed(Vec3::ZERO)).unwrap();
        let before = buffers.vertices.get().copied();

        backend.fail = true;
        let cube = cube_mesh();
        let single = pack_meshes(
            &[MeshInstance {
                local_to_world: Mat4::IDENTITY,
                mesh: &cube,
                material: MaterialDescriptor::default(),
            }],
            &AssetCache::new(),
        )
        .unwrap();
        assert!(buffers.upload(&backend, &single).is_err());

        assert_eq!(buffers.vertices.get().copied(), before);
        assert_eq!(buffers.object_count(), 2);
        assert_eq!(buffers.triangle_count(), 14);
    }

    #[test]
    fn empty_scene_leaves_every_buffer_absent() {
        let backend = RecordingBackend::default();
        let mut buffers: MeshSceneBuffers<u32> = MeshSceneBuffers::new();
        buffers.upload(&backend, &packed(Vec3::ZERO)).unwrap();
        buffers.upload(&backend, &PackedMeshes::default()).unwrap();

        assert!(buffers.objects.get().is_none());
        assert!(buffers.triangle_mask.get().is_none());
        assert_eq!(buffers.triangle_count(), 0);
    }
}
