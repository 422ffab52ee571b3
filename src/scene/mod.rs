// scene/mod.rs

pub mod builder;
pub mod camera;
pub mod components;
pub mod registry;
pub mod scene;
pub mod transform;

pub use builder::EntityBuilder;
pub use camera::Camera;
pub use registry::{MeshObject, SceneRegistry, SphereObject, VisibilityListener};
pub use scene::Scene;
pub use transform::Transform;

pub use components::{
    CameraComponent, DirectionalLight, MaterialComponent, MeshComponent, Moved, Name,
    SphereComponent, TransformComponent, Visible,
};
