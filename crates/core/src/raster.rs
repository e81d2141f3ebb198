use glam::Vec2;

use crate::bake::BakeError;
use crate::parallel;
use crate::uv_atlas::UvAtlas;

/// Marks a pixel no triangle covers.
pub const EMPTY_PIXEL: u32 = u32::MAX;

/// Tolerance on barycentric weights so pixel centers lying exactly on an
/// edge are still claimed.
const EDGE_EPSILON: f32 = 1.0e-5;

/// Per-pixel triangle ownership over the atlas, in rasterization order:
/// pixel `(x, y)` lives at `y * resolution + x` and row 0 is `v` near 0.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasRaster {
    pub resolution: u32,
    pub triangles: Vec<u32>,
    pub barycentric: Vec<[f32; 3]>,
}

impl AtlasRaster {
    pub fn triangle_at(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.resolution || y >= self.resolution {
            return None;
        }
        let tri = self.triangles[pixel_index(self.resolution, x, y)];
        (tri != EMPTY_PIXEL).then_some(tri)
    }

    pub fn occupied_count(&self) -> usize {
        self.triangles
            .iter()
            .filter(|&&tri| tri != EMPTY_PIXEL)
            .count()
    }

    /// `(pixel index, triangle, barycentric)` for every covered pixel.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, u32, [f32; 3])> + '_ {
        self.triangles
            .iter()
            .zip(self.barycentric.iter())
            .enumerate()
            .filter(|(_, (&tri, _))| tri != EMPTY_PIXEL)
            .map(|(pixel, (&tri, &bary))| (pixel, tri, bary))
    }
}

/// Row-major offset of pixel `(x, y)`, widened before multiplying.
pub(crate) fn pixel_index(resolution: u32, x: u32, y: u32) -> usize {
    y as usize * resolution as usize + x as usize
}

struct RasterTriangle {
    index: u32,
    corners: [Vec2; 3],
    inv_area: f32,
    min_x: usize,
    max_x: usize,
}

#[derive(Clone)]
struct RasterRow {
    triangles: Vec<u32>,
    barycentric: Vec<[f32; 3]>,
}

/// Rasterizes the atlas triangles at pixel centers of an `R x R` grid.
///
/// Triangles are visited in index order and a pixel keeps the first triangle
/// that covers it, so overlapping charts never write a pixel twice.
pub fn rasterize_atlas(atlas: &UvAtlas, resolution: u32) -> Result<AtlasRaster, BakeError> {
    if resolution == 0 {
        return Err(BakeError::InvalidResolution(resolution));
    }
    validate_atlas_indices(atlas)?;

    let size = resolution as usize;
    let scale = resolution as f32;
    let mut prepared = Vec::new();
    let mut bins: Vec<Vec<usize>> = vec![Vec::new(); size];
    for (tri_idx, tri) in atlas.indices.chunks_exact(3).enumerate() {
        let corners = [
            Vec2::from(atlas.uvs[tri[0] as usize]) * scale,
            Vec2::from(atlas.uvs[tri[1] as usize]) * scale,
            Vec2::from(atlas.uvs[tri[2] as usize]) * scale,
        ];
        let area = edge(corners[0], corners[1], corners[2]);
        if area.abs() < 1.0e-12 {
            continue;
        }
        let min = corners[0].min(corners[1]).min(corners[2]);
        let max = corners[0].max(corners[1]).max(corners[2]);
        let Some((min_y, max_y)) = pixel_span(min.y, max.y, size) else {
            continue;
        };
        let Some((min_x, max_x)) = pixel_span(min.x, max.x, size) else {
            continue;
        };
        let slot = prepared.len();
        prepared.push(RasterTriangle {
            index: tri_idx as u32,
            corners,
            inv_area: 1.0 / area,
            min_x,
            max_x,
        });
        for bin in &mut bins[min_y..=max_y] {
            bin.push(slot);
        }
    }

    let mut rows = vec![
        RasterRow {
            triangles: vec![EMPTY_PIXEL; size],
            barycentric: vec![[0.0; 3]; size],
        };
        size
    ];
    parallel::for_each_indexed_mut(&mut rows, |y, row| {
        let center_y = y as f32 + 0.5;
        for &slot in &bins[y] {
            let tri = &prepared[slot];
            for x in tri.min_x..=tri.max_x {
                if row.triangles[x] != EMPTY_PIXEL {
                    continue;
                }
                let p = Vec2::new(x as f32 + 0.5, center_y);
                if let Some(bary) = barycentric(tri, p) {
                    row.triangles[x] = tri.index;
                    row.barycentric[x] = bary;
                }
            }
        }
    });

    let mut raster = AtlasRaster {
        resolution,
        triangles: Vec::with_capacity(size * size),
        barycentric: Vec::with_capacity(size * size),
    };
    for row in rows {
        raster.triangles.extend(row.triangles);
        raster.barycentric.extend(row.barycentric);
    }
    Ok(raster)
}

fn validate_atlas_indices(atlas: &UvAtlas) -> Result<(), BakeError> {
    if !atlas.indices.len().is_multiple_of(3) {
        return Err(BakeError::MalformedAtlas(format!(
            "index count {} is not a multiple of 3",
            atlas.indices.len()
        )));
    }
    if atlas.uvs.len() != atlas.vmapping.len() {
        return Err(BakeError::MalformedAtlas(format!(
            "{} uvs for {} remapped vertices",
            atlas.uvs.len(),
            atlas.vmapping.len()
        )));
    }
    if let Some(&index) = atlas
        .indices
        .iter()
        .find(|&&idx| idx as usize >= atlas.uvs.len())
    {
        return Err(BakeError::IndexOutOfRange {
            what: "atlas index",
            index,
            len: atlas.uvs.len(),
        });
    }
    Ok(())
}

/// Pixel indices whose centers fall inside `[lo, hi]`, clamped to the grid.
fn pixel_span(lo: f32, hi: f32, size: usize) -> Option<(usize, usize)> {
    let first = (lo - 0.5 - EDGE_EPSILON).ceil().max(0.0);
    let last = (hi - 0.5 + EDGE_EPSILON).floor().min(size as f32 - 1.0);
    if last < first {
        return None;
    }
    Some((first as usize, last as usize))
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

fn barycentric(tri: &RasterTriangle, p: Vec2) -> Option<[f32; 3]> {
    let [a, b, c] = tri.corners;
    let w0 = edge(b, c, p) * tri.inv_area;
    let w1 = edge(c, a, p) * tri.inv_area;
    let w2 = edge(a, b, p) * tri.inv_area;
    if w0 < -EDGE_EPSILON || w1 < -EDGE_EPSILON || w2 < -EDGE_EPSILON {
        return None;
    }
    Some([w0, w1, w2])
}
