// renderer/pipeline.rs
//
// Pipelines and bind group layouts of the trace and blit passes. Group
// layout of trace.wgsl:
//   0: uniforms, skybox + sampler, history, output
//   1: mesh objects, materials, vertices, triangles, triangle mask
//   2: spheres
//   3: atlas texture array + sampler
// Groups 1..3 fall back to one-element placeholders when their resources are
// absent; the uniforms then report a count of zero so nothing reads them.

use std::borrow::Cow;

use super::atlas::TextureAtlas;
use super::records::{MaterialRecord, MeshObjectRecord, SphereRecord, TriangleRecord, VertexRecord};
use super::render_target::ACCUMULATION_FORMAT;
use super::scene_buffers::{MeshSceneBuffers, SphereSceneBuffers};
use super::uniforms::TraceUniforms;

pub const TRACE_WORKGROUP_SIZE: u32 = 8;

pub fn trace_workgroups(width: u32, height: u32) -> (u32, u32) {
    (
        width.div_ceil(TRACE_WORKGROUP_SIZE),
        height.div_ceil(TRACE_WORKGROUP_SIZE),
    )
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    filterable: bool,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Sky texture sampled by rays that escape the scene.
pub struct Skybox {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Skybox {
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, data: &crate::asset::TextureData) -> Self {
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Skybox"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: data.format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.mips[0],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(data.bytes_per_row(0)),
                rows_per_image: Some(data.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("SkyboxSampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self { view, sampler }
    }
}

pub struct TracePipeline {
    pub pipeline: wgpu::ComputePipeline,
    frame_layout: wgpu::BindGroupLayout,
    mesh_layout: wgpu::BindGroupLayout,
    sphere_layout: wgpu::BindGroupLayout,
    atlas_layout: wgpu::BindGroupLayout,
    pub uniform_buffer: wgpu::Buffer,
    empty_meshes: wgpu::BindGroup,
    empty_spheres: wgpu::BindGroup,
    empty_atlas: wgpu::BindGroup,
    // Placeholder resources stay alive as long as their bind groups.
    _placeholders: Vec<wgpu::Buffer>,
    _placeholder_atlas: TextureAtlas,
}

impl TracePipeline {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("PathTrace"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shader/trace.wgsl"))),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("TraceFrameBindLayout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<TraceUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
                texture_entry(1, wgpu::ShaderStages::COMPUTE, true, wgpu::TextureViewDimension::D2),
                sampler_entry(2),
                texture_entry(3, wgpu::ShaderStages::COMPUTE, false, wgpu::TextureViewDimension::D2),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: ACCUMULATION_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let mesh_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("TraceMeshBindLayout"),
            entries: &[
                storage_entry(0),
                storage_entry(1),
                storage_entry(2),
                storage_entry(3),
                storage_entry(4),
            ],
        });

        let sphere_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("TraceSphereBindLayout"),
            entries: &[storage_entry(0)],
        });

        let atlas_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("TraceAtlasBindLayout"),
            entries: &[
                texture_entry(0, wgpu::ShaderStages::COMPUTE, true, wgpu::TextureViewDimension::D2Array),
                sampler_entry(1),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("TracePipelineLayout"),
            bind_group_layouts: &[&frame_layout, &mesh_layout, &sphere_layout, &atlas_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("TracePipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("trace_main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("TraceUniforms"),
            size: std::mem::size_of::<TraceUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let placeholder = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::STORAGE,
                mapped_at_creation: false,
            })
        };
        let placeholders = vec![
            placeholder("EmptyMeshObjects", std::mem::size_of::<MeshObjectRecord>()),
            placeholder("EmptyMaterials", std::mem::size_of::<MaterialRecord>()),
            placeholder("EmptyVertices", std::mem::size_of::<VertexRecord>()),
            placeholder("EmptyTriangles", std::mem::size_of::<TriangleRecord>()),
            placeholder("EmptyTriangleMask", std::mem::size_of::<u32>()),
            placeholder("EmptySpheres", std::mem::size_of::<SphereRecord>()),
        ];
        let empty_meshes = Self::buffers_group(
            device,
            "EmptyMeshBindGroup",
            &mesh_layout,
            &placeholders[..5].iter().collect::<Vec<_>>(),
        );
        let empty_spheres =
            Self::buffers_group(device, "EmptySphereBindGroup", &sphere_layout, &[&placeholders[5]]);
        let placeholder_atlas = TextureAtlas::placeholder(device, queue);
        let empty_atlas = Self::atlas_group_for(device, &atlas_layout, &placeholder_atlas);

        Self {
            pipeline,
            frame_layout,
            mesh_layout,
            sphere_layout,
            atlas_layout,
            uniform_buffer,
            empty_meshes,
            empty_spheres,
            empty_atlas,
            _placeholders: placeholders,
            _placeholder_atlas: placeholder_atlas,
        }
    }

    fn buffers_group(
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        buffers: &[&wgpu::Buffer],
    ) -> wgpu::BindGroup {
        let entries: Vec<wgpu::BindGroupEntry> = buffers
            .iter()
            .enumerate()
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &entries,
        })
    }

    fn atlas_group_for(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        atlas: &TextureAtlas,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("TraceAtlasBindGroup"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&atlas.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&atlas.sampler),
                },
            ],
        })
    }

    pub fn frame_group(
        &self,
        device: &wgpu::Device,
        skybox: &Skybox,
        history: &wgpu::TextureView,
        output: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("TraceFrameBindGroup"),
            layout: &self.frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&skybox.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&skybox.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(history),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(output),
                },
            ],
        })
    }

    /// Mesh group, or `None` when any mesh buffer is absent.
    pub fn mesh_group(&self, device: &wgpu::Device, meshes: &MeshSceneBuffers) -> Option<wgpu::BindGroup> {
        let buffers = [
            meshes.objects.get()?,
            meshes.materials.get()?,
            meshes.vertices.get()?,
            meshes.triangles.get()?,
            meshes.triangle_mask.get()?,
        ];
        Some(Self::buffers_group(device, "TraceMeshBindGroup", &self.mesh_layout, &buffers))
    }

    pub fn sphere_group(
        &self,
        device: &wgpu::Device,
        spheres: &SphereSceneBuffers,
    ) -> Option<wgpu::BindGroup> {
        let buffer = spheres.spheres.get()?;
        Some(Self::buffers_group(device, "TraceSphereBindGroup", &self.sphere_layout, &[buffer]))
    }

    pub fn atlas_group(&self, device: &wgpu::Device, atlas: &TextureAtlas) -> wgpu::BindGroup {
        Self::atlas_group_for(device, &self.atlas_layout, atlas)
    }

    pub fn empty_meshes(&self) -> &wgpu::BindGroup {
        &self.empty_meshes
    }

    pub fn empty_spheres(&self) -> &wgpu::BindGroup {
        &self.empty_spheres
    }

    pub fn empty_atlas(&self) -> &wgpu::BindGroup {
        &self.empty_atlas
    }
}

/// Fullscreen pass copying the accumulation target into the host's view.
pub struct BlitPipeline {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
}

impl BlitPipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shader/blit.wgsl"))),
        });
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("BlitBindLayout"),
            entries: &[texture_entry(
                0,
                wgpu::ShaderStages::FRAGMENT,
                false,
                wgpu::TextureViewDimension::D2,
            )],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("BlitPipelineLayout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("BlitPipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        Self { pipeline, layout }
    }

    pub fn source_group(&self, device: &wgpu::Device, source: &wgpu::TextureView) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("BlitBindGroup"),
            layout: &self.layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(source),
            }],
        })
    }

    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        source: &wgpu::BindGroup,
        destination: &wgpu::TextureView,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("BlitPass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: destination,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, source, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_workgroups_cover_the_target() {
        assert_eq!(trace_workgroups(800, 600), (100, 75));
        assert_eq!(trace_workgroups(1920, 1080), (240, 135));
        assert_eq!(trace_workgroups(1, 1), (1, 1));
        assert_eq!(trace_workgroups(9, 17), (2, 3));
    }
}
