//! Live set of traced objects and the dirty flags that gate repacking.

use hecs::Entity;

/// Registered mesh and sphere objects in FIFO registration order.
///
/// Registration order is the packing order. Each list carries its own dirty
/// flag; touching one never marks the other.
#[derive(Debug, Default)]
pub struct SceneRegistry {
    meshes: Vec<Entity>,
    spheres: Vec<Entity>,
    meshes_dirty: bool,
    spheres_dirty: bool,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_mesh(&mut self, entity: Entity) {
        if insert_unique(&mut self.meshes, entity) {
            self.meshes_dirty = true;
        }
    }

    pub fn unregister_mesh(&mut self, entity: Entity) {
        if remove_present(&mut self.meshes, entity) {
            self.meshes_dirty = true;
        }
    }

    pub fn register_sphere(&mut self, entity: Entity) {
        if insert_unique(&mut self.spheres, entity) {
            self.spheres_dirty = true;
        }
    }

    pub fn unregister_sphere(&mut self, entity: Entity) {
        if remove_present(&mut self.spheres, entity) {
            self.spheres_dirty = true;
        }
    }

    pub fn meshes(&self) -> &[Entity] {
        &self.meshes
    }

    pub fn spheres(&self) -> &[Entity] {
        &self.spheres
    }

    pub fn contains_mesh(&self, entity: Entity) -> bool {
        self.meshes.contains(&entity)
    }

    pub fn contains_sphere(&self, entity: Entity) -> bool {
        self.spheres.contains(&entity)
    }

    pub fn meshes_dirty(&self) -> bool {
        self.meshes_dirty
    }

    pub fn spheres_dirty(&self) -> bool {
        self.spheres_dirty
    }

    /// Forces a mesh repack, e.g. after a registered mesh moved.
    pub fn mark_meshes_dirty(&mut self) {
        self.meshes_dirty = true;
    }

    pub fn mark_spheres_dirty(&mut self) {
        self.spheres_dirty = true;
    }

    pub fn clear_meshes_dirty(&mut self) {
        self.meshes_dirty = false;
    }

    pub fn clear_spheres_dirty(&mut self) {
        self.spheres_dirty = false;
    }
}

fn insert_unique(list: &mut Vec<Entity>, entity: Entity) -> bool {
    if list.contains(&entity) {
        return false;
    }
    list.push(entity);
    true
}

fn remove_present(list: &mut Vec<Entity>, entity: Entity) -> bool {
    match list.iter().position(|&e| e == entity) {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}

/// Capability a scene object exposes to whatever decides visibility.
pub trait VisibilityListener {
    fn on_visible(&self, registry: &mut SceneRegistry);
    fn on_invisible(&self, registry: &mut SceneRegistry);
}

/// Adapter registering an entity as a traced mesh.
#[derive(Debug, Clone, Copy)]
pub struct MeshObject(pub Entity);

impl VisibilityListener for MeshObject {
    fn on_visible(&self, registry: &mut SceneRegistry) {
        registry.register_mesh(self.0);
    }

    fn on_invisible(&self, registry: &mut SceneRegistry) {
        registry.unregister_mesh(self.0);
    }
}

/// Adapter registering an entity as a traced sphere.
#[derive(Debug, Clone, Copy)]
pub struct SphereObject(pub Entity);

impl VisibilityListener for SphereObject {
    fn on_visible(&self, registry: &mut SceneRegistry) {
        registry.register_sphere(self.0);
    }

    fn on_invisible(&self, registry: &mut SceneRegistry) {
        registry.unregister_sphere(self.0);
    }
}
