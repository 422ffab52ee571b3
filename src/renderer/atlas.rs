// renderer/atlas.rs
//
// Base-colour textures of all packed mesh objects live in one layered
// texture; a material's texture_index is its layer.

use crate::asset::TextureData;
use crate::error::{Result, TracerError};

/// Shared shape of every atlas layer, fixed by the first texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    pub width: u32,
    pub height: u32,
    pub mip_count: u32,
    pub format: wgpu::TextureFormat,
    pub layers: u32,
}

impl AtlasLayout {
    /// Checks that every texture matches the first in size, mip count and
    /// format.
    pub fn from_textures(textures: &[&TextureData]) -> Result<Self> {
        let first = textures
            .first()
            .ok_or(TracerError::MissingDependency("atlas texture"))?;

        for (slot, texture) in textures.iter().enumerate().skip(1) {
            let matches = texture.width == first.width
                && texture.height == first.height
                && texture.mip_count() == first.mip_count()
                && texture.format == first.format;
            if !matches {
                return Err(TracerError::TextureAtlasMismatch {
                    slot,
                    expected: first.describe(),
                    found: texture.describe(),
                });
            }
        }

        Ok(Self {
            width: first.width,
            height: first.height,
            mip_count: first.mip_count(),
            format: first.format,
            layers: textures.len() as u32,
        })
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: self.layers,
        }
    }
}

/// GPU side of the atlas: a `texture_2d_array` plus its sampler.
pub struct TextureAtlas {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub layout: AtlasLayout,
}

impl TextureAtlas {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: AtlasLayout,
        textures: &[&TextureData],
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("TextureAtlas"),
            size: layout.extent(),
            mip_level_count: layout.mip_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: layout.format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, source) in textures.iter().enumerate() {
            for (level, data) in source.mips.iter().enumerate() {
                let level = level as u32;
                let (width, height) = source.mip_size(level);
                queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture: &texture,
                        mip_level: level,
                        origin: wgpu::Origin3d {
                            x: 0,
                            y: 0,
                            z: layer as u32,
                        },
                        aspect: wgpu::TextureAspect::All,
                    },
                    data,
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(source.bytes_per_row(level)),
                        rows_per_image: Some(height),
                    },
                    wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                );
            }
        }

        log::info!(
            "Uploaded texture atlas: {} layers of {}x{} ({} mips)",
            layout.layers,
            layout.width,
            layout.height,
            layout.mip_count
        );
        Self::with_texture(device, texture, layout)
    }

    /// One white texel, bound when no mesh object is textured.
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let white = TextureData {
            width: 1,
            height: 1,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            mips: vec![vec![255; 4]],
        };
        let layout = AtlasLayout {
            width: 1,
            height: 1,
            mip_count: 1,
            format: white.format,
            layers: 1,
        };
        Self::upload(device, queue, layout, &[&white])
    }

    fn with_texture(device: &wgpu::Device, texture: wgpu::Texture, layout: AtlasLayout) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("TextureAtlasView"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("TextureAtlasSampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            texture,
            view,
            sampler,
            layout,
        }
    }
}
