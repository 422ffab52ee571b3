use glam::Vec3;
use hecs::{Entity, World};

use super::builder::EntityBuilder;
use super::components::*;
use super::registry::{MeshObject, SceneRegistry, SphereObject, VisibilityListener};
use crate::asset::Assets;
use crate::error::{Result, TracerError};
use crate::renderer::{MeshInstance, SphereSource};
use crate::scene::{Camera, Transform};

/// Scene context owned by the host and handed to the tracer each frame.
///
/// Holds the ECS world, CPU-side assets and the registry of traced objects.
pub struct Scene {
    pub world: World,
    pub assets: Assets,
    registry: SceneRegistry,
    camera: Option<Entity>,
    light: Option<Entity>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            assets: Assets::default(),
            registry: SceneRegistry::new(),
            camera: None,
            light: None,
        }
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SceneRegistry {
        &mut self.registry
    }

    pub fn spawn(&mut self) -> EntityBuilder<'_> {
        EntityBuilder::new(&mut self.world)
    }

    /// Spawns a camera and makes it the active one.
    pub fn spawn_camera(&mut self, camera: Camera) -> Entity {
        let entity = self
            .world
            .spawn((Name::new("Camera"), CameraComponent(camera), Moved));
        self.camera = Some(entity);
        entity
    }

    pub fn camera_entity(&self) -> Option<Entity> {
        self.camera
    }

    pub fn camera(&self) -> Option<Camera> {
        let entity = self.camera?;
        self.world
            .get::<&CameraComponent>(entity)
            .ok()
            .map(|c| c.0)
    }

    /// Replaces the active camera; a pose change flags it as moved.
    pub fn set_camera(&mut self, camera: Camera) -> Result<()> {
        let entity = self
            .camera
            .ok_or(TracerError::MissingDependency("camera"))?;
        let moved = {
            let mut current = self
                .world
                .get::<&mut CameraComponent>(entity)
                .map_err(|_| TracerError::MissingDependency("camera"))?;
            let moved = current.0.pose_differs(&camera);
            current.0 = camera;
            moved
        };
        if moved {
            let _ = self.world.insert_one(entity, Moved);
        }
        Ok(())
    }

    pub fn spawn_directional_light(&mut self, transform: Transform, intensity: f32) -> Entity {
        let entity = self.world.spawn((
            Name::new("Sun"),
            TransformComponent(transform),
            DirectionalLight { intensity },
            Moved,
        ));
        self.light = Some(entity);
        entity
    }

    pub fn light_entity(&self) -> Option<Entity> {
        self.light
    }

    /// Forward direction and intensity of the primary directional light.
    pub fn directional_light(&self) -> Option<(Vec3, f32)> {
        let entity = self.light?;
        let transform = self.world.get::<&TransformComponent>(entity).ok()?;
        let light = self.world.get::<&DirectionalLight>(entity).ok()?;
        Some((transform.0.forward(), light.intensity))
    }

    /// Fails fast when the tracer's collaborators are missing.
    pub fn validate(&self) -> Result<()> {
        if self.camera().is_none() {
            return Err(TracerError::MissingDependency("camera"));
        }
        if self.directional_light().is_none() {
            return Err(TracerError::MissingDependency("directional light"));
        }
        Ok(())
    }

    /// Visibility callback: forwards the event to the entity's listeners.
    pub fn set_visible(&mut self, entity: Entity, visible: bool) {
        match self.world.get::<&mut Visible>(entity) {
            Ok(mut flag) => flag.0 = visible,
            Err(_) => {
                log::warn!("set_visible on unknown entity {:?}", entity);
                return;
            }
        }

        for listener in self.listeners(entity) {
            if visible {
                listener.on_visible(&mut self.registry);
            } else {
                listener.on_invisible(&mut self.registry);
            }
        }
    }

    fn listeners(&self, entity: Entity) -> Vec<Box<dyn VisibilityListener>> {
        let mut listeners: Vec<Box<dyn VisibilityListener>> = Vec::new();
        if self.world.satisfies::<&MeshComponent>(entity).unwrap_or(false) {
            listeners.push(Box::new(MeshObject(entity)));
        }
        if self.world.satisfies::<&SphereComponent>(entity).unwrap_or(false) {
            listeners.push(Box::new(SphereObject(entity)));
        }
        listeners
    }

    /// Moves an object. Registered geometry is packed in world space, so
    /// moving it marks the matching list dirty.
    pub fn set_transform(&mut self, entity: Entity, transform: Transform) {
        if self
            .world
            .insert(entity, (TransformComponent(transform), Moved))
            .is_err()
        {
            log::warn!("set_transform on unknown entity {:?}", entity);
            return;
        }
        if self.registry.contains_mesh(entity) {
            self.registry.mark_meshes_dirty();
        }
        if self.registry.contains_sphere(entity) {
            self.registry.mark_spheres_dirty();
        }
    }

    /// Reports and clears the moved marker of `entity`.
    pub fn take_moved(&mut self, entity: Entity) -> bool {
        self.world.remove_one::<Moved>(entity).is_ok()
    }

    pub fn despawn(&mut self, entity: Entity) {
        self.registry.unregister_mesh(entity);
        self.registry.unregister_sphere(entity);
        if self.camera == Some(entity) {
            self.camera = None;
        }
        if self.light == Some(entity) {
            self.light = None;
        }
        let _ = self.world.despawn(entity);
    }

    /// Registered mesh objects in packing order.
    pub fn mesh_instances(&self) -> Result<Vec<MeshInstance<'_>>> {
        self.registry
            .meshes()
            .iter()
            .enumerate()
            .map(|(slot, &entity)| {
                let invalid = |reason: &str| TracerError::InvalidMesh {
                    mesh: slot,
                    reason: reason.to_string(),
                };
                let transform = self
                    .world
                    .get::<&TransformComponent>(entity)
                    .map_err(|_| invalid("no transform"))?
                    .0;
                let handle = self
                    .world
                    .get::<&MeshComponent>(entity)
                    .map_err(|_| invalid("no mesh component"))?
                    .0;
                let mesh = self
                    .assets
                    .meshes
                    .get(handle)
                    .ok_or_else(|| invalid("mesh asset missing"))?;
                let material = self
                    .world
                    .get::<&MaterialComponent>(entity)
                    .map(|m| m.0)
                    .unwrap_or_default();
                Ok(MeshInstance {
                    local_to_world: transform.matrix(),
                    mesh,
                    material,
                })
            })
            .collect()
    }

    /// Registered sphere objects in packing order; despawned ones are skipped.
    pub fn sphere_sources(&self) -> Vec<SphereSource> {
        self.registry
            .spheres()
            .iter()
            .filter_map(|&entity| {
                let transform = self.world.get::<&TransformComponent>(entity).ok()?;
                Some(SphereSource {
                    key: entity.to_bits().get(),
                    local_to_world: transform.0.matrix(),
                })
            })
            .collect()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
