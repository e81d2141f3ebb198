use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::RgbImage;

use crate::field::ColorField;
use crate::mesh::{make_box, Mesh};
use crate::model::{
    Device, ModelBackend, ModelHandle, ModelLoadRequest, ReconstructionModel, SceneCode,
};

/// Fresh, empty directory under the system temp dir.
pub fn temp_dir(name: &str) -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "meshbake_test_{}_{}_{}",
        std::process::id(),
        name,
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub struct ConstantColorField {
    color: [f32; 3],
}

impl ConstantColorField {
    pub fn new(color: [f32; 3]) -> Self {
        Self { color }
    }
}

impl ColorField for ConstantColorField {
    fn chunk_size(&self) -> usize {
        4096
    }

    fn query(
        &self,
        positions: &[[f32; 3]],
        _normals: &[[f32; 3]],
    ) -> Result<Vec<[f32; 3]>, String> {
        Ok(vec![self.color; positions.len()])
    }
}

/// Records the size of every query.
pub struct CountingColorField {
    chunk_size: usize,
    calls: RefCell<Vec<usize>>,
}

impl CountingColorField {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<usize> {
        self.calls.borrow().clone()
    }
}

impl ColorField for CountingColorField {
    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn query(
        &self,
        positions: &[[f32; 3]],
        _normals: &[[f32; 3]],
    ) -> Result<Vec<[f32; 3]>, String> {
        self.calls.borrow_mut().push(positions.len());
        Ok(vec![[0.25, 0.5, 0.75]; positions.len()])
    }
}

/// Scene code is the mean image color; the surface is a unit box colored
/// with that mean.
pub struct FakeModel {
    chunk_size: usize,
    pub reconstructed: Mutex<Vec<RgbImage>>,
}

impl FakeModel {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            reconstructed: Mutex::new(Vec::new()),
        }
    }
}

impl ReconstructionModel for FakeModel {
    fn name(&self) -> &str {
        "fake"
    }

    fn device(&self) -> Device {
        Device::Cpu
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn reconstruct(&self, image: &RgbImage) -> Result<SceneCode, String> {
        let mut sum = [0.0f32; 3];
        for pixel in image.pixels() {
            for (acc, value) in sum.iter_mut().zip(pixel.0) {
                *acc += value as f32 / 255.0;
            }
        }
        let count = (image.width() * image.height()).max(1) as f32;
        self.reconstructed
            .lock()
            .expect("reconstructed lock")
            .push(image.clone());
        SceneCode::new(vec![3], sum.iter().map(|v| v / count).collect())
    }

    fn extract_mesh(
        &self,
        _scene: &SceneCode,
        _resolution: u32,
        _threshold: f32,
    ) -> Result<Mesh, String> {
        Ok(make_box([1.0, 1.0, 1.0]))
    }

    fn query_color(
        &self,
        scene: &SceneCode,
        positions: &[[f32; 3]],
        _normals: &[[f32; 3]],
    ) -> Result<Vec<[f32; 3]>, String> {
        let v = scene.values();
        Ok(vec![[v[0], v[1], v[2]]; positions.len()])
    }
}

#[derive(Default)]
pub struct FakeBackend {
    pub accelerator: bool,
    pub loads: AtomicUsize,
    pub requests: Mutex<Vec<ModelLoadRequest>>,
}

impl ModelBackend for FakeBackend {
    fn accelerator_available(&self) -> bool {
        self.accelerator
    }

    fn load(&self, request: &ModelLoadRequest) -> Result<ModelHandle, String> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        Ok(Arc::new(FakeModel::new(request.chunk_size)))
    }
}
