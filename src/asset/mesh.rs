use glam::{Vec2, Vec3};

/// CPU-resident triangle mesh in object space.
///
/// Attribute arrays are parallel: `normals` and `uvs` are either empty or
/// exactly as long as `positions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, uvs: Vec<Vec2>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals,
            uvs,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Checks the layout rules the packer relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            ));
        }
        if !self.normals.is_empty() && self.normals.len() != self.positions.len() {
            return Err(format!(
                "{} normals for {} positions",
                self.normals.len(),
                self.positions.len()
            ));
        }
        if !self.uvs.is_empty() && self.uvs.len() != self.positions.len() {
            return Err(format!(
                "{} uvs for {} positions",
                self.uvs.len(),
                self.positions.len()
            ));
        }
        if let Some(&bad) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.positions.len())
        {
            return Err(format!(
                "index {} out of range for {} vertices",
                bad,
                self.positions.len()
            ));
        }
        Ok(())
    }

    pub fn normal(&self, vertex: usize) -> Vec3 {
        self.normals.get(vertex).copied().unwrap_or(Vec3::ZERO)
    }

    pub fn uv(&self, vertex: usize) -> Vec2 {
        self.uvs.get(vertex).copied().unwrap_or(Vec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Vec3::Z; 3],
            vec![],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn valid_triangle_passes() {
        let mesh = triangle();
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.uv(2), Vec2::ZERO);
    }

    #[test]
    fn rejects_ragged_indices_and_bad_attributes() {
        let mut ragged = triangle();
        ragged.indices.push(0);
        assert!(ragged.validate().is_err());

        let mut out_of_range = triangle();
        out_of_range.indices[2] = 9;
        assert!(out_of_range.validate().unwrap_err().contains("out of range"));

        let mut short_normals = triangle();
        short_normals.normals.pop();
        assert!(short_normals.validate().is_err());
    }
}
