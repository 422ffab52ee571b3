// renderer/mesh_packer.rs
//
// Flattens registered mesh objects into the global arrays the trace kernel
// indexes: world-space vertices, remapped indices, triangle triples, and one
// object/material record per mesh.

use glam::{Mat3, Mat4};

use super::atlas::AtlasLayout;
use super::material::MaterialDescriptor;
use super::records::{MaterialRecord, MeshObjectRecord, TriangleRecord, VertexRecord, NO_TEXTURE};
use crate::asset::{AssetCache, Handle, MeshData, TextureData};
use crate::error::{Result, TracerError};

/// One registered mesh object as seen by the packer.
#[derive(Debug, Clone, Copy)]
pub struct MeshInstance<'a> {
    pub local_to_world: Mat4,
    pub mesh: &'a MeshData,
    pub material: MaterialDescriptor,
}

/// CPU output of a mesh rebuild, in packing order.
#[derive(Debug, Default, Clone)]
pub struct PackedMeshes {
    pub vertices: Vec<VertexRecord>,
    pub indices: Vec<u32>,
    pub triangles: Vec<TriangleRecord>,
    pub objects: Vec<MeshObjectRecord>,
    pub materials: Vec<MaterialRecord>,
    /// Atlas slot `i` holds `atlas[i]`.
    pub atlas: Vec<Handle<TextureData>>,
    pub atlas_layout: Option<AtlasLayout>,
}

impl PackedMeshes {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// Packs every instance, then validates the collected atlas textures.
///
/// The whole set is packed or nothing is: any invalid mesh or mismatched
/// texture fails the call before a single record escapes.
pub fn pack_meshes(
    instances: &[MeshInstance<'_>],
    textures: &AssetCache<TextureData>,
) -> Result<PackedMeshes> {
    let mut packed = PackedMeshes::default();

    for (slot, instance) in instances.iter().enumerate() {
        instance
            .mesh
            .validate()
            .map_err(|reason| TracerError::InvalidMesh { mesh: slot, reason })?;
        append_instance(&mut packed, instance);
    }

    packed.triangles = packed
        .indices
        .chunks_exact(3)
        .map(|t| TriangleRecord {
            i0: t[0],
            i1: t[1],
            i2: t[2],
        })
        .collect();

    if !packed.atlas.is_empty() {
        let resolved = packed
            .atlas
            .iter()
            .map(|&handle| {
                textures
                    .get(handle)
                    .ok_or(TracerError::MissingDependency("atlas texture"))
            })
            .collect::<Result<Vec<_>>>()?;
        packed.atlas_layout = Some(AtlasLayout::from_textures(&resolved)?);
    }

    log::debug!(
        "Packed {} mesh objects: {} vertices, {} triangles, {} atlas slots",
        packed.objects.len(),
        packed.vertices.len(),
        packed.triangles.len(),
        packed.atlas.len()
    );

    Ok(packed)
}

fn append_instance(packed: &mut PackedMeshes, instance: &MeshInstance<'_>) {
    let mesh = instance.mesh;
    let first_vertex = packed.vertices.len() as u32;
    let first_index = packed.indices.len();

    let normal_matrix = Mat3::from_mat4(instance.local_to_world).inverse().transpose();
    packed
        .vertices
        .extend((0..mesh.vertex_count()).map(|v| {
            let position = instance.local_to_world.transform_point3(mesh.positions[v]);
            let normal = (normal_matrix * mesh.normal(v)).normalize_or_zero();
            VertexRecord::new(position, normal, mesh.uv(v))
        }));

    packed
        .indices
        .extend(mesh.indices.iter().map(|&i| i + first_vertex));

    packed.objects.push(MeshObjectRecord::new(
        instance.local_to_world,
        first_index / 3,
        mesh.indices.len() / 3,
    ));

    let material = &instance.material;
    let texture_index = match material.base_texture {
        Some(handle) => {
            packed.atlas.push(handle);
            (packed.atlas.len() - 1) as i32
        }
        None => NO_TEXTURE,
    };
    packed.materials.push(MaterialRecord {
        albedo: material.albedo.to_array(),
        specular: material.specular.to_array(),
        emission: material.emission.to_array(),
        smoothness: material.smoothness,
        texture_index,
    });
}
