// demo.rs
//
// Sample scene shown by the binary: a textured cube and panel sharing one
// atlas layout, an untextured mirror quad, a row of sphere objects and a sun.

use glam::{Quat, Vec3};

use crate::asset::primitives::{cube_mesh, plane_mesh};
use crate::asset::TextureData;
use crate::renderer::MaterialDescriptor;
use crate::scene::{Camera, Scene, Transform};

pub fn build_scene() -> Scene {
    let mut scene = Scene::new();

    scene.spawn_camera(Camera {
        eye: Vec3::new(0.0, 3.0, 9.0),
        target: Vec3::new(0.0, 1.0, 0.0),
        ..Camera::default()
    });
    scene.spawn_directional_light(
        Transform::default().with_rotation(Quat::from_euler(
            glam::EulerRot::YXZ,
            0.6,
            -0.9,
            0.0,
        )),
        1.2,
    );

    let cube = scene.assets.meshes.insert(cube_mesh());
    let plane = scene.assets.meshes.insert(plane_mesh());

    // Same size and mip count, so both land in one atlas.
    let checker = scene.assets.textures.insert(
        TextureData::checker(256, 8, [230, 230, 230, 255], [40, 40, 40, 255]).with_mips(),
    );
    let stripes = scene.assets.textures.insert(
        TextureData::checker(256, 2, [200, 80, 40, 255], [240, 200, 60, 255]).with_mips(),
    );

    let mut visible = Vec::new();

    visible.push(
        scene
            .spawn()
            .with_name("Textured cube")
            .with_mesh(cube)
            .with_transform(
                Transform::from_translation(Vec3::new(-2.0, 1.0, 0.0))
                    .with_rotation(Quat::from_rotation_y(0.5))
                    .with_scale(Vec3::splat(2.0)),
            )
            .with_material(MaterialDescriptor::diffuse(Vec3::ONE).with_base_texture(checker))
            .spawn(),
    );

    visible.push(
        scene
            .spawn()
            .with_name("Textured panel")
            .with_mesh(plane)
            .with_transform(
                Transform::from_translation(Vec3::new(0.0, 2.0, -3.0))
                    .with_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2))
                    .with_scale(Vec3::new(6.0, 1.0, 4.0)),
            )
            .with_material(MaterialDescriptor::diffuse(Vec3::ONE).with_base_texture(stripes))
            .spawn(),
    );

    visible.push(
        scene
            .spawn()
            .with_name("Mirror")
            .with_mesh(plane)
            .with_transform(
                Transform::from_translation(Vec3::new(3.5, 1.5, -1.0))
                    .with_rotation(
                        Quat::from_rotation_y(-0.6)
                            * Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
                    )
                    .with_scale(Vec3::new(2.5, 1.0, 3.0)),
            )
            .with_material(MaterialDescriptor::metal(Vec3::splat(0.9), 0.95))
            .spawn(),
    );

    for i in 0..5 {
        let x = -1.0 + i as f32 * 1.1;
        let ball = scene
            .spawn()
            .with_name(format!("Sphere {i}"))
            .with_transform(Transform::from_translation(Vec3::new(x, 0.5, 2.0)))
            .as_sphere()
            .spawn();
        visible.push(ball);
    }

    for entity in visible {
        scene.set_visible(entity, true);
    }

    log::info!(
        "Demo scene: {} meshes, {} spheres",
        scene.registry().meshes().len(),
        scene.registry().spheres().len()
    );
    scene
}
