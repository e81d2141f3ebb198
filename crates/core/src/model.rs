use std::path::PathBuf;
use std::sync::Arc;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::mesh::Mesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Accelerator,
    Cpu,
}

impl Device {
    /// Falls back to the CPU path when no accelerator is present.
    pub fn select(preferred: Device, accelerator_available: bool) -> Device {
        match preferred {
            Device::Accelerator if !accelerator_available => {
                tracing::warn!("no accelerator available, running on cpu");
                Device::Cpu
            }
            other => other,
        }
    }
}

/// Latent code the reconstruction model produces for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCode {
    shape: Vec<usize>,
    values: Arc<[f32]>,
}

impl SceneCode {
    pub fn new(shape: Vec<usize>, values: Vec<f32>) -> Result<Self, String> {
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(format!(
                "scene code shape {shape:?} needs {expected} values, got {}",
                values.len()
            ));
        }
        Ok(Self {
            shape,
            values: values.into(),
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Pretrained image-to-3D model: image to scene code, scene code to surface
/// mesh, and the color field used for baking.
pub trait ReconstructionModel: Send + Sync {
    fn name(&self) -> &str;

    fn device(&self) -> Device;

    /// Points evaluated per color-field call.
    fn chunk_size(&self) -> usize;

    fn reconstruct(&self, image: &RgbImage) -> Result<SceneCode, String>;

    fn extract_mesh(
        &self,
        scene: &SceneCode,
        resolution: u32,
        threshold: f32,
    ) -> Result<Mesh, String>;

    fn query_color(
        &self,
        scene: &SceneCode,
        positions: &[[f32; 3]],
        normals: &[[f32; 3]],
    ) -> Result<Vec<[f32; 3]>, String>;
}

pub type ModelHandle = Arc<dyn ReconstructionModel>;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelLoadRequest {
    pub weights_path: PathBuf,
    pub config_path: PathBuf,
    pub chunk_size: usize,
    pub device: Device,
}

/// Builds model instances from checkpoints.
pub trait ModelBackend: Send + Sync {
    fn accelerator_available(&self) -> bool;

    fn load(&self, request: &ModelLoadRequest) -> Result<ModelHandle, String>;
}
