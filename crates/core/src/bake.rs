use std::fmt;

use glam::Vec3;
use image::RgbImage;

use crate::field::ColorField;
use crate::float_image::{quantize, FloatImage};
use crate::mesh::Mesh;
use crate::progress::report_progress;
use crate::raster::{pixel_index, rasterize_atlas};
use crate::uv_atlas::{self, UnwrapOptions, UvAtlas};

/// Color of texels no UV triangle covers.
pub const BACKGROUND: [f32; 3] = [0.0, 0.0, 0.0];

#[derive(Debug, Clone, PartialEq)]
pub enum BakeError {
    InvalidResolution(u32),
    IndexOutOfRange {
        what: &'static str,
        index: u32,
        len: usize,
    },
    MalformedAtlas(String),
    Unwrap(String),
    Field(String),
}

impl fmt::Display for BakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BakeError::InvalidResolution(resolution) => {
                write!(f, "texture resolution must be positive, got {resolution}")
            }
            BakeError::IndexOutOfRange { what, index, len } => {
                write!(f, "{what} {index} is out of range for {len} entries")
            }
            BakeError::MalformedAtlas(message) => write!(f, "malformed uv atlas: {message}"),
            BakeError::Unwrap(message) => write!(f, "uv unwrap failed: {message}"),
            BakeError::Field(message) => write!(f, "color field query failed: {message}"),
        }
    }
}

impl std::error::Error for BakeError {}

/// Square RGB texture in rasterization row order (row 0 is `v` near 0).
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub resolution: u32,
    pub texels: Vec<[f32; 3]>,
}

impl TextureImage {
    pub fn new(resolution: u32, fill: [f32; 3]) -> Self {
        let len = resolution as usize * resolution as usize;
        Self {
            resolution,
            texels: vec![fill; len],
        }
    }

    pub fn texel(&self, x: u32, y: u32) -> [f32; 3] {
        self.texels[pixel_index(self.resolution, x, y)]
    }

    /// 8-bit image with row 0 at the top, the orientation viewers expect for
    /// OBJ texture coordinates.
    pub fn to_rgb8_flipped(&self) -> RgbImage {
        let size = self.resolution;
        RgbImage::from_fn(size, size, |x, y| {
            let texel = self.texel(x, size - 1 - y);
            image::Rgb([quantize(texel[0]), quantize(texel[1]), quantize(texel[2])])
        })
    }

    pub fn to_float_image_flipped(&self) -> FloatImage {
        FloatImage::from_rgb8(&self.to_rgb8_flipped())
    }
}

#[derive(Debug, Clone)]
pub struct BakeOutput {
    pub atlas: UvAtlas,
    pub texture: TextureImage,
    pub occupied: usize,
}

/// Bakes `field` into a `resolution x resolution` texture over `atlas`.
///
/// The atlas is returned untouched alongside the texture so the caller can
/// export mesh and texture consistently.
pub fn bake_texture(
    mesh: &Mesh,
    atlas: &UvAtlas,
    field: &dyn ColorField,
    resolution: u32,
) -> Result<BakeOutput, BakeError> {
    if resolution == 0 {
        return Err(BakeError::InvalidResolution(resolution));
    }
    if let Some(&index) = atlas
        .vmapping
        .iter()
        .find(|&&idx| idx as usize >= mesh.positions.len())
    {
        return Err(BakeError::IndexOutOfRange {
            what: "vertex mapping",
            index,
            len: mesh.positions.len(),
        });
    }
    if atlas.chart_ids.len() != atlas.triangle_count() {
        return Err(BakeError::MalformedAtlas(format!(
            "{} chart ids for {} triangles",
            atlas.chart_ids.len(),
            atlas.triangle_count()
        )));
    }

    let raster = rasterize_atlas(atlas, resolution)?;
    let normals = mesh.vertex_normals();

    let occupied = raster.occupied_count();
    let mut pixels = Vec::with_capacity(occupied);
    let mut positions = Vec::with_capacity(occupied);
    let mut surface_normals = Vec::with_capacity(occupied);
    for (pixel, tri, bary) in raster.occupied() {
        let base = tri as usize * 3;
        let mut position = Vec3::ZERO;
        let mut normal = Vec3::ZERO;
        for corner in 0..3 {
            let original = atlas.vmapping[atlas.indices[base + corner] as usize] as usize;
            position += Vec3::from(mesh.positions[original]) * bary[corner];
            normal += Vec3::from(normals[original]) * bary[corner];
        }
        pixels.push(pixel);
        positions.push(position.to_array());
        surface_normals.push(normal.try_normalize().unwrap_or(Vec3::Y).to_array());
    }

    let mut texture = TextureImage::new(resolution, BACKGROUND);
    let chunk = field.chunk_size().max(1);
    let chunk_count = positions.len().div_ceil(chunk);
    for (chunk_idx, ((pixel_chunk, position_chunk), normal_chunk)) in pixels
        .chunks(chunk)
        .zip(positions.chunks(chunk))
        .zip(surface_normals.chunks(chunk))
        .enumerate()
    {
        let colors = field
            .query(position_chunk, normal_chunk)
            .map_err(BakeError::Field)?;
        if colors.len() != position_chunk.len() {
            return Err(BakeError::Field(format!(
                "expected {} colors, got {}",
                position_chunk.len(),
                colors.len()
            )));
        }
        for (&pixel, color) in pixel_chunk.iter().zip(colors) {
            texture.texels[pixel] = color.map(|c| c.clamp(0.0, 1.0));
        }
        report_progress((chunk_idx + 1) as f32 / chunk_count as f32);
    }

    tracing::debug!(
        resolution,
        occupied,
        chunks = chunk_count,
        "texture baked"
    );
    Ok(BakeOutput {
        atlas: atlas.clone(),
        texture,
        occupied,
    })
}

/// Unwraps `mesh` with the built-in chart unwrapper, laid out for `resolution`,
/// then bakes over the result.
pub fn unwrap_and_bake(
    mesh: &Mesh,
    field: &dyn ColorField,
    resolution: u32,
    options: &UnwrapOptions,
) -> Result<BakeOutput, BakeError> {
    if resolution == 0 {
        return Err(BakeError::InvalidResolution(resolution));
    }
    let options = UnwrapOptions {
        resolution,
        ..*options
    };
    let atlas = uv_atlas::unwrap(mesh, &options).map_err(BakeError::Unwrap)?;
    bake_texture(mesh, &atlas, field, resolution)
}
