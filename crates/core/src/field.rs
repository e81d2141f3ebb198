use glam::Vec3;

use crate::mesh::Mesh;
use crate::model::{ReconstructionModel, SceneCode};

const DEBUG_FIELD_CHUNK: usize = 8192;

/// A color field the baker can sample at surface points.
pub trait ColorField {
    /// Largest number of points passed to one `query` call.
    fn chunk_size(&self) -> usize;

    /// Returns one RGB color per position. `normals` is co-indexed with
    /// `positions`.
    fn query(&self, positions: &[[f32; 3]], normals: &[[f32; 3]])
        -> Result<Vec<[f32; 3]>, String>;
}

/// The reconstruction model's color field for one scene code.
pub struct SceneColorField<'a> {
    model: &'a dyn ReconstructionModel,
    scene: &'a SceneCode,
}

impl<'a> SceneColorField<'a> {
    pub fn new(model: &'a dyn ReconstructionModel, scene: &'a SceneCode) -> Self {
        Self { model, scene }
    }
}

impl ColorField for SceneColorField<'_> {
    fn chunk_size(&self) -> usize {
        self.model.chunk_size()
    }

    fn query(
        &self,
        positions: &[[f32; 3]],
        normals: &[[f32; 3]],
    ) -> Result<Vec<[f32; 3]>, String> {
        self.model.query_color(self.scene, positions, normals)
    }
}

/// Maps positions inside the mesh bounds to RGB, for inspecting an atlas.
pub struct BoundsColorField {
    min: Vec3,
    size: Vec3,
}

impl BoundsColorField {
    pub fn for_mesh(mesh: &Mesh) -> Self {
        let (min, size) = mesh
            .bounds()
            .map(|bounds| (Vec3::from(bounds.min), Vec3::from(bounds.size())))
            .unwrap_or((Vec3::ZERO, Vec3::ONE));
        Self {
            min,
            size: size.max(Vec3::splat(1.0e-6)),
        }
    }
}

impl ColorField for BoundsColorField {
    fn chunk_size(&self) -> usize {
        DEBUG_FIELD_CHUNK
    }

    fn query(
        &self,
        positions: &[[f32; 3]],
        _normals: &[[f32; 3]],
    ) -> Result<Vec<[f32; 3]>, String> {
        Ok(positions
            .iter()
            .map(|p| ((Vec3::from(*p) - self.min) / self.size).to_array())
            .collect())
    }
}

/// Encodes normals as `0.5 * n + 0.5`.
pub struct NormalColorField;

impl ColorField for NormalColorField {
    fn chunk_size(&self) -> usize {
        DEBUG_FIELD_CHUNK
    }

    fn query(
        &self,
        _positions: &[[f32; 3]],
        normals: &[[f32; 3]],
    ) -> Result<Vec<[f32; 3]>, String> {
        Ok(normals
            .iter()
            .map(|n| (Vec3::from(*n) * 0.5 + Vec3::splat(0.5)).to_array())
            .collect())
    }
}
