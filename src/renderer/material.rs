// renderer/material.rs

use glam::Vec3;

use crate::asset::{Handle, TextureData};

/// Typed surface description attached to a mesh object when it is spawned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialDescriptor {
    pub albedo: Vec3,
    pub specular: Vec3,
    pub emission: Vec3,
    pub smoothness: f32,
    pub base_texture: Option<Handle<TextureData>>,
}

impl MaterialDescriptor {
    pub fn diffuse(albedo: Vec3) -> Self {
        Self {
            albedo,
            ..Self::default()
        }
    }

    pub fn metal(specular: Vec3, smoothness: f32) -> Self {
        Self {
            albedo: Vec3::ZERO,
            specular,
            smoothness: smoothness.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    pub fn emissive(emission: Vec3) -> Self {
        Self {
            emission,
            ..Self::default()
        }
    }

    pub fn with_specular(mut self, specular: Vec3) -> Self {
        self.specular = specular;
        self
    }

    pub fn with_smoothness(mut self, smoothness: f32) -> Self {
        self.smoothness = smoothness.clamp(0.0, 1.0);
        self
    }

    pub fn with_base_texture(mut self, texture: Handle<TextureData>) -> Self {
        self.base_texture = Some(texture);
        self
    }
}

impl Default for MaterialDescriptor {
    fn default() -> Self {
        Self {
            albedo: Vec3::splat(0.8),
            specular: Vec3::splat(0.04),
            emission: Vec3::ZERO,
            smoothness: 0.0,
            base_texture: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_clamp_smoothness() {
        let m = MaterialDescriptor::metal(Vec3::ONE, 3.0);
        assert_eq!(m.smoothness, 1.0);
        assert_eq!(m.albedo, Vec3::ZERO);

        let d = MaterialDescriptor::diffuse(Vec3::X).with_smoothness(-1.0);
        assert_eq!(d.smoothness, 0.0);
        assert!(d.base_texture.is_none());
    }
}
