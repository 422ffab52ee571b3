pub mod accumulation;
pub mod atlas;
pub mod frame_plan;
pub mod frustum;
pub mod gpu_buffer;
pub mod material;
pub mod mesh_packer;
pub mod pipeline;
pub mod records;
pub mod render_target;
pub mod scene_buffers;
pub mod sphere_packer;
pub mod tracer;
pub mod uniforms;

pub use accumulation::{AccumulationState, ResetReasons};
pub use atlas::{AtlasLayout, TextureAtlas};
pub use frame_plan::{FramePlan, FramePlanner, GeometryOutcome};
pub use frustum::{Frustum, FrustumCuller};
pub use gpu_buffer::{BufferBackend, GpuBuffer, WgpuBackend};
pub use material::MaterialDescriptor;
pub use mesh_packer::{pack_meshes, MeshInstance, PackedMeshes};
pub use records::{
    FrustumPlaneRecord, MaterialRecord, MeshObjectRecord, SphereRecord, TriangleRecord,
    VertexRecord,
};
pub use render_target::RenderTargetManager;
pub use scene_buffers::{MeshSceneBuffers, SphereSceneBuffers};
pub use sphere_packer::{pack_spheres, scatter_spheres, SphereSource};
pub use tracer::{FrameStats, PathTracer};
pub use uniforms::TraceUniforms;
