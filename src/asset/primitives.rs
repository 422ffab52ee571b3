use glam::{Vec2, Vec3};

use super::MeshData;

/// Unit quad in the XZ plane facing +Y, centred on the origin.
pub fn plane_mesh() -> MeshData {
    MeshData::new(
        vec![
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.0, 0.5),
            Vec3::new(-0.5, 0.0, 0.5),
        ],
        vec![Vec3::Y; 4],
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ],
        vec![0, 2, 1, 0, 3, 2],
    )
}

/// Unit cube with per-face normals and UVs (24 vertices, 12 triangles).
pub fn cube_mesh() -> MeshData {
    // (normal, u axis, v axis) per face
    let faces = [
        (Vec3::X, Vec3::Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::X, Vec3::Y),
    ];

    let mut mesh = MeshData::default();
    for (face, (normal, u_axis, v_axis)) in faces.into_iter().enumerate() {
        let corners = [(-1.0, -1.0), (-1.0, 1.0), (1.0, 1.0), (1.0, -1.0)];
        for (cu, cv) in corners {
            mesh.positions
                .push((normal + u_axis * cu + v_axis * cv) * 0.5);
            mesh.normals.push(normal);
            mesh.uvs.push(Vec2::new((cu + 1.0) * 0.5, (1.0 - cv) * 0.5));
        }
        let o = face as u32 * 4;
        mesh.indices.extend_from_slice(&[o, o + 1, o + 2, o, o + 2, o + 3]);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_counts_look_right() {
        let mesh = cube_mesh();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn cube_vertices_sit_on_the_unit_box() {
        for p in cube_mesh().positions {
            assert!((p.abs().max_element() - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn plane_is_two_triangles() {
        let mesh = plane_mesh();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }
}
