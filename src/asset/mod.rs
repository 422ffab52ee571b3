pub mod cache;
pub mod handle;
pub mod mesh;
pub mod primitives;
pub mod texture;

pub use cache::AssetCache;
pub use handle::Handle;
pub use mesh::MeshData;
pub use texture::TextureData;

/// CPU-side asset storage shared by the scene and the packers.
pub struct Assets {
    pub meshes: AssetCache<MeshData>,
    pub textures: AssetCache<TextureData>,
}

impl Assets {
    pub fn new() -> Self {
        Self {
            meshes: AssetCache::new(),
            textures: AssetCache::new(),
        }
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::new()
    }
}
