// renderer/frustum.rs
//
// Frustum planes for the triangle culling pre-pass, and the compute pass
// itself. The pass writes one u32 per triangle (1 = inside or straddling)
// that the trace kernel reads to skip culled triangles.

use std::borrow::Cow;

use glam::{Mat4, Vec3, Vec4};

use super::records::FrustumPlaneRecord;
use super::uniforms::CullParams;
use crate::scene::Camera;

pub const CULL_WORKGROUP_SIZE: u32 = 32;

/// Six inward-facing, normalised planes: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [FrustumPlaneRecord; 6],
}

impl Frustum {
    /// Extracts planes from a clip matrix with wgpu's 0..1 depth range.
    pub fn from_view_proj(view_proj: Mat4) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);
        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2].map(normalize_plane);
        Self { planes }
    }

    pub fn from_camera(camera: &Camera, aspect: f32) -> Self {
        Self::from_view_proj(camera.view_proj(aspect))
    }

    /// Signed distance is non-negative on the inside of every plane.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| {
            Vec3::from_array(p.normal).dot(point) + p.distance >= 0.0
        })
    }

    /// A triangle is culled only when all three corners lie outside one plane.
    pub fn intersects_triangle(&self, corners: [Vec3; 3]) -> bool {
        self.planes.iter().all(|p| {
            let n = Vec3::from_array(p.normal);
            corners.iter().any(|&c| n.dot(c) + p.distance >= 0.0)
        })
    }
}

fn normalize_plane(plane: Vec4) -> FrustumPlaneRecord {
    let length = plane.truncate().length();
    let plane = if length > 0.0 { plane / length } else { plane };
    FrustumPlaneRecord {
        normal: plane.truncate().to_array(),
        distance: plane.w,
    }
}

pub fn cull_workgroups(triangle_count: u32) -> u32 {
    triangle_count.div_ceil(CULL_WORKGROUP_SIZE)
}

/// Buffers of the packed mesh scene the culling pass reads and writes.
pub struct CullTargets<'a> {
    pub vertices: &'a wgpu::Buffer,
    pub triangles: &'a wgpu::Buffer,
    pub mask: &'a wgpu::Buffer,
    pub triangle_count: u32,
}

pub struct FrustumCuller {
    pipeline: wgpu::ComputePipeline,
    bind_layout: wgpu::BindGroupLayout,
    planes_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,
}

impl FrustumCuller {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("FrustumCull"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shader/cull.wgsl"))),
        });

        let storage = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("FrustumCullBindLayout"),
            entries: &[
                storage(0, true),
                storage(1, true),
                storage(2, true),
                storage(3, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("FrustumCullPipelineLayout"),
            bind_group_layouts: &[&bind_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("FrustumCullPipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("cull_main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let planes_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("FrustumPlanes"),
            size: std::mem::size_of::<[FrustumPlaneRecord; 6]>() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("FrustumCullParams"),
            size: std::mem::size_of::<CullParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            bind_layout,
            planes_buffer,
            params_buffer,
        }
    }

    /// Records the culling pass into `encoder`.
    pub fn dispatch(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        frustum: &Frustum,
        targets: CullTargets<'_>,
    ) {
        if targets.triangle_count == 0 {
            return;
        }

        queue.write_buffer(&self.planes_buffer, 0, bytemuck::cast_slice(&frustum.planes));
        let params = CullParams::new(targets.triangle_count);
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("FrustumCullBindGroup"),
            layout: &self.bind_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.planes_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: targets.vertices.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: targets.triangles.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: targets.mask.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: self.params_buffer.as_entire_binding(),
                },
            ],
        });

        let workgroups = cull_workgroups(targets.triangle_count);
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("FrustumCullPass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(workgroups, 1, 1);
        log::debug!(
            "Frustum cull: {} triangles in {} workgroups",
            targets.triangle_count,
            workgroups
        );
    }
}
