// scene/builder.rs

use hecs::World;

use super::components::*;
use crate::asset::{Handle, MeshData};
use crate::renderer::MaterialDescriptor;
use crate::scene::Transform;

/// Fluent helper for spawning traced objects.
///
/// Spawned objects start hidden; the scene registers them once something
/// reports them visible (see [`Scene::set_visible`](super::Scene::set_visible)).
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    builder: hecs::EntityBuilder,
}

impl<'w> EntityBuilder<'w> {
    pub fn new(world: &'w mut World) -> Self {
        let mut builder = hecs::EntityBuilder::new();
        builder.add(Visible::default());
        Self { world, builder }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.builder.add(Name::new(name));
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.builder.add(TransformComponent(transform));
        self
    }

    pub fn with_mesh(mut self, mesh: Handle<MeshData>) -> Self {
        self.builder.add(MeshComponent(mesh));
        self
    }

    /// The descriptor is resolved here once, not on every repack.
    pub fn with_material(mut self, material: MaterialDescriptor) -> Self {
        self.builder.add(MaterialComponent(material));
        self
    }

    pub fn as_sphere(mut self) -> Self {
        self.builder.add(SphereComponent);
        self
    }

    pub fn spawn(&mut self) -> hecs::Entity {
        if !self.builder.has::<TransformComponent>() {
            self.builder.add(TransformComponent(Transform::default()));
        }
        self.world.spawn(self.builder.build())
    }
}
