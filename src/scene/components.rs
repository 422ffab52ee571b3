// scene/components.rs

use crate::asset::{Handle, MeshData};
use crate::renderer::MaterialDescriptor;
use crate::scene::{Camera, Transform};

/// World-space transform of an object
#[derive(Debug, Clone, Copy)]
pub struct TransformComponent(pub Transform);

/// Triangle mesh traced by the mesh packer
#[derive(Debug, Clone, Copy)]
pub struct MeshComponent(pub Handle<MeshData>);

#[derive(Debug, Clone, Copy)]
pub struct MaterialComponent(pub MaterialDescriptor);

/// Marks an object traced as an analytic sphere
#[derive(Debug, Clone, Copy, Default)]
pub struct SphereComponent;

/// Objects start hidden until something reports them visible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visible(pub bool);

#[derive(Debug, Clone, Copy)]
pub struct CameraComponent(pub Camera);

/// Sun-style light; direction comes from the entity's transform
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub intensity: f32,
}

/// Set when the entity's pose changed since the renderer last looked
#[derive(Debug, Clone, Copy, Default)]
pub struct Moved;

#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
