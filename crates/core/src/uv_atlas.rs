use std::collections::{HashMap, VecDeque};

use glam::{Vec2, Vec3};

use crate::mesh::Mesh;

/// Texture-space parameterization of a mesh.
///
/// Unwrapping splits vertices along chart seams, so the atlas carries its own
/// vertex list: `vmapping[i]` is the original vertex behind remapped vertex `i`
/// and `uvs[i]` its texture coordinate. `indices` are triangles over the
/// remapped vertices and `chart_ids` holds one chart per triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UvAtlas {
    pub vmapping: Vec<u32>,
    pub indices: Vec<u32>,
    pub uvs: Vec<[f32; 2]>,
    pub chart_ids: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnwrapOptions {
    /// Maximum angle between a chart's seed normal and any of its triangles.
    pub normal_threshold_degrees: f32,
    /// Texture resolution the atlas is laid out for.
    pub resolution: u32,
    /// Gutter between packed charts in texels. `None` uses `max(2, R / 256)`.
    pub padding_texels: Option<f32>,
}

impl Default for UnwrapOptions {
    fn default() -> Self {
        Self {
            normal_threshold_degrees: 45.0,
            resolution: 1024,
            padding_texels: None,
        }
    }
}

impl UnwrapOptions {
    pub fn for_resolution(resolution: u32) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    /// Gutter as a fraction of the atlas side.
    pub fn padding_fraction(&self) -> f32 {
        let resolution = self.resolution.max(1) as f32;
        let texels = self
            .padding_texels
            .unwrap_or_else(|| (resolution / 256.0).max(2.0))
            .max(0.0);
        (texels / resolution).min(MAX_PADDING_FRACTION)
    }
}

const MAX_PADDING_FRACTION: f32 = 0.25;
const ROW_WIDTH_FACTORS: [f32; 7] = [0.6, 0.75, 0.9, 1.0, 1.15, 1.3, 1.5];
const PADDING_ITERATIONS: usize = 8;

impl UvAtlas {
    pub fn vertex_count(&self) -> usize {
        self.vmapping.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn chart_count(&self) -> usize {
        self.chart_ids
            .iter()
            .max()
            .map(|max| *max as usize + 1)
            .unwrap_or(0)
    }

    /// Builds the export mesh: original positions and normals gathered through
    /// `vmapping`, with the atlas UVs and indices.
    pub fn remap_mesh(&self, mesh: &Mesh) -> Result<Mesh, String> {
        let normals = mesh.vertex_normals();
        let mut positions = Vec::with_capacity(self.vmapping.len());
        let mut remapped_normals = Vec::with_capacity(self.vmapping.len());
        for &original in &self.vmapping {
            let Some(position) = mesh.positions.get(original as usize) else {
                return Err(format!(
                    "atlas maps to vertex {original} but mesh has {} vertices",
                    mesh.positions.len()
                ));
            };
            positions.push(*position);
            remapped_normals.push(normals[original as usize]);
        }
        Ok(Mesh {
            positions,
            indices: self.indices.clone(),
            normals: Some(remapped_normals),
            uvs: Some(self.uvs.clone()),
        })
    }
}

/// Splits the mesh into charts of triangles whose normals stay within a cone
/// around the chart's seed triangle and whose projections onto the seed plane
/// neither fold nor overlap, then shelf-packs the charts into the unit square.
pub fn unwrap(mesh: &Mesh, options: &UnwrapOptions) -> Result<UvAtlas, String> {
    mesh.validate()?;
    if mesh.indices.is_empty() {
        return Ok(UvAtlas::default());
    }

    let threshold_deg = options.normal_threshold_degrees.clamp(0.0, 89.0);
    let cos_threshold = threshold_deg.to_radians().cos();
    let tri_indices = &mesh.indices;
    let tri_count = tri_indices.len() / 3;

    let tri_normals: Vec<Vec3> = (0..tri_count)
        .map(|tri_idx| {
            let [p0, p1, p2] = triangle_positions(mesh, tri_idx);
            (p1 - p0).cross(p2 - p0).try_normalize().unwrap_or(Vec3::Y)
        })
        .collect();

    let charts = build_charts(mesh, &tri_normals, cos_threshold);
    let mut chart_uvs = Vec::with_capacity(charts.len());
    for chart in charts {
        let mut vertex_uvs: Vec<(u32, Vec2)> = Vec::new();
        let mut local: HashMap<u32, usize> = HashMap::new();
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for &tri_idx in &chart.tris {
            for &vertex in &tri_indices[tri_idx * 3..tri_idx * 3 + 3] {
                if local.contains_key(&vertex) {
                    continue;
                }
                let uv = chart.plane.project(Vec3::from(mesh.positions[vertex as usize]));
                min = min.min(uv);
                max = max.max(uv);
                local.insert(vertex, vertex_uvs.len());
                vertex_uvs.push((vertex, uv));
            }
        }
        chart_uvs.push(ChartUv {
            min,
            max,
            tris: chart.tris,
            local,
            vertex_uvs,
        });
    }

    let sizes: Vec<Vec2> = chart_uvs.iter().map(|chart| chart.max - chart.min).collect();
    let layout = pack_charts(&sizes, options.padding_fraction());
    let scale = 1.0 / layout.side.max(1.0e-6);
    let mut atlas = UvAtlas {
        vmapping: Vec::new(),
        indices: vec![0; tri_indices.len()],
        uvs: Vec::new(),
        chart_ids: vec![0; tri_count],
    };
    for (chart_id, chart) in chart_uvs.iter().enumerate() {
        let base = atlas.vmapping.len() as u32;
        let offset = layout.offsets[chart_id] - chart.min;
        for (vertex, uv) in &chart.vertex_uvs {
            atlas.vmapping.push(*vertex);
            let uv = ((*uv + offset) * scale).clamp(Vec2::ZERO, Vec2::ONE);
            atlas.uvs.push(uv.to_array());
        }
        for &tri_idx in &chart.tris {
            atlas.chart_ids[tri_idx] = chart_id as u32;
            for corner in 0..3 {
                let vertex = tri_indices[tri_idx * 3 + corner];
                atlas.indices[tri_idx * 3 + corner] = base + chart.local[&vertex] as u32;
            }
        }
    }

    tracing::debug!(
        charts = chart_uvs.len(),
        vertices = atlas.vmapping.len(),
        triangles = tri_count,
        padding = layout.padding * scale,
        "uv atlas built"
    );
    Ok(atlas)
}

struct ChartUv {
    min: Vec2,
    max: Vec2,
    tris: Vec<usize>,
    local: HashMap<u32, usize>,
    vertex_uvs: Vec<(u32, Vec2)>,
}

struct Chart {
    tris: Vec<usize>,
    plane: ChartPlane,
}

/// Orthonormal basis of a chart's projection plane; `tangent x bitangent`
/// is the seed normal, so front-facing triangles keep a positive winding.
#[derive(Clone, Copy)]
struct ChartPlane {
    tangent: Vec3,
    bitangent: Vec3,
}

impl ChartPlane {
    fn new(normal: Vec3) -> Self {
        let up = if normal.abs().dot(Vec3::Y) < 0.9 {
            Vec3::Y
        } else {
            Vec3::X
        };
        let tangent = normal.cross(up).normalize_or_zero();
        let bitangent = normal.cross(tangent).normalize_or_zero();
        Self { tangent, bitangent }
    }

    fn project(&self, p: Vec3) -> Vec2 {
        Vec2::new(p.dot(self.tangent), p.dot(self.bitangent))
    }
}

fn triangle_positions(mesh: &Mesh, tri_idx: usize) -> [Vec3; 3] {
    let tri = &mesh.indices[tri_idx * 3..tri_idx * 3 + 3];
    [
        Vec3::from(mesh.positions[tri[0] as usize]),
        Vec3::from(mesh.positions[tri[1] as usize]),
        Vec3::from(mesh.positions[tri[2] as usize]),
    ]
}

/// Region growing over shared edges, seeded from the lowest unassigned
/// triangle so chart order is deterministic. A neighbour that passes the
/// normal cone still stays out if its projection would fold over or overlap
/// the chart so far; it seeds a later chart instead.
fn build_charts(mesh: &Mesh, normals: &[Vec3], cos_threshold: f32) -> Vec<Chart> {
    let tri_indices = &mesh.indices;
    let tri_count = tri_indices.len() / 3;
    let mut edge_map: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (tri_idx, tri) in tri_indices.chunks_exact(3).enumerate() {
        let edges = [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])];
        for (a, b) in edges {
            let key = if a < b { (a, b) } else { (b, a) };
            edge_map.entry(key).or_default().push(tri_idx);
        }
    }
    let cell_size = mean_edge_length(mesh).max(1.0e-6);

    let mut assigned = vec![false; tri_count];
    let mut charts = Vec::new();
    for seed in 0..tri_count {
        if assigned[seed] {
            continue;
        }
        let seed_normal = normals[seed];
        let plane = ChartPlane::new(seed_normal);
        let project = |tri_idx: usize| triangle_positions(mesh, tri_idx).map(|p| plane.project(p));

        let mut footprint = ChartFootprint::new(cell_size);
        footprint.try_insert(project(seed));
        let mut tris = vec![seed];
        assigned[seed] = true;
        let mut queue = VecDeque::from([seed]);
        while let Some(tri_idx) = queue.pop_front() {
            let tri = &tri_indices[tri_idx * 3..tri_idx * 3 + 3];
            let edges = [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])];
            for (a, b) in edges {
                let key = if a < b { (a, b) } else { (b, a) };
                let Some(neighbours) = edge_map.get(&key) else {
                    continue;
                };
                for &next in neighbours {
                    if assigned[next] || normals[next].dot(seed_normal) < cos_threshold {
                        continue;
                    }
                    if !footprint.try_insert(project(next)) {
                        continue;
                    }
                    assigned[next] = true;
                    tris.push(next);
                    queue.push_back(next);
                }
            }
        }
        tris.sort_unstable();
        charts.push(Chart { tris, plane });
    }
    charts
}

fn mean_edge_length(mesh: &Mesh) -> f32 {
    let tri_count = mesh.indices.len() / 3;
    if tri_count == 0 {
        return 0.0;
    }
    let total: f32 = (0..tri_count)
        .map(|tri_idx| {
            let [p0, p1, p2] = triangle_positions(mesh, tri_idx);
            p0.distance(p1) + p1.distance(p2) + p2.distance(p0)
        })
        .sum();
    total / (tri_count * 3) as f32
}

/// Projected triangles already accepted into a chart, bucketed on a square
/// grid so each admission only tests nearby triangles.
struct ChartFootprint {
    cell_size: f32,
    epsilon: f32,
    triangles: Vec<[Vec2; 3]>,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl ChartFootprint {
    fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            epsilon: cell_size * 1.0e-5,
            triangles: Vec::new(),
            cells: HashMap::new(),
        }
    }

    fn cell_range(&self, corners: &[Vec2; 3]) -> ((i32, i32), (i32, i32)) {
        let min = corners[0].min(corners[1]).min(corners[2]) / self.cell_size;
        let max = corners[0].max(corners[1]).max(corners[2]) / self.cell_size;
        (
            (min.x.floor() as i32, min.y.floor() as i32),
            (max.x.floor() as i32, max.y.floor() as i32),
        )
    }

    /// Adds the triangle unless its winding flips or it overlaps an accepted
    /// triangle. Degenerate triangles cover no texels and are always taken.
    fn try_insert(&mut self, corners: [Vec2; 3]) -> bool {
        let area = signed_area(&corners);
        let tiny = self.epsilon * self.epsilon;
        if area < -tiny {
            return false;
        }
        if area <= tiny {
            return true;
        }

        let ((x0, y0), (x1, y1)) = self.cell_range(&corners);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                let Some(slots) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                if slots
                    .iter()
                    .any(|&slot| triangles_overlap(&self.triangles[slot], &corners, self.epsilon))
                {
                    return false;
                }
            }
        }

        let slot = self.triangles.len();
        self.triangles.push(corners);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                self.cells.entry((cx, cy)).or_default().push(slot);
            }
        }
        true
    }
}

fn signed_area(corners: &[Vec2; 3]) -> f32 {
    0.5 * (corners[1] - corners[0]).perp_dot(corners[2] - corners[0])
}

/// Separating-axis test over both triangles' edge normals. Triangles that
/// only share an edge or a corner do not overlap.
fn triangles_overlap(a: &[Vec2; 3], b: &[Vec2; 3], epsilon: f32) -> bool {
    !(separated_by_edges(a, b, epsilon) || separated_by_edges(b, a, epsilon))
}

fn separated_by_edges(a: &[Vec2; 3], b: &[Vec2; 3], epsilon: f32) -> bool {
    (0..3).any(|i| {
        let Some(axis) = (a[(i + 1) % 3] - a[i]).perp().try_normalize() else {
            return false;
        };
        let (a_min, a_max) = project_span(a, axis);
        let (b_min, b_max) = project_span(b, axis);
        a_max <= b_min + epsilon || b_max <= a_min + epsilon
    })
}

fn project_span(corners: &[Vec2; 3], axis: Vec2) -> (f32, f32) {
    corners
        .iter()
        .map(|corner| corner.dot(axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}

struct PackLayout {
    offsets: Vec<Vec2>,
    side: f32,
    padding: f32,
}

/// Shelf-packs chart boxes tallest first. Several row widths are tried and
/// the most square layout wins. The gutter is re-derived from the resulting
/// side until it holds `padding_fraction` of the atlas.
fn pack_charts(sizes: &[Vec2], padding_fraction: f32) -> PackLayout {
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| {
        sizes[b]
            .y
            .partial_cmp(&sizes[a].y)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let box_area: f32 = sizes.iter().map(|size| size.x * size.y).sum();
    let max_width = sizes.iter().map(|size| size.x).fold(0.0f32, f32::max);

    let mut padding = padding_fraction * box_area.sqrt();
    let mut best = shelf_pack(&order, sizes, max_width, padding);
    for _ in 0..PADDING_ITERATIONS {
        let padded_area: f32 = sizes
            .iter()
            .map(|size| (size.x + padding) * (size.y + padding))
            .sum();
        let base_width = padded_area.sqrt();
        if let Some(layout) = ROW_WIDTH_FACTORS
            .iter()
            .map(|factor| {
                let row_width = (base_width * factor).max(max_width + 2.0 * padding);
                shelf_pack(&order, sizes, row_width, padding)
            })
            .min_by(|a, b| a.side.partial_cmp(&b.side).unwrap_or(std::cmp::Ordering::Equal))
        {
            best = layout;
        }
        let needed = padding_fraction * best.side;
        if best.padding >= needed {
            break;
        }
        padding = needed * 1.01;
    }
    best
}

fn shelf_pack(order: &[usize], sizes: &[Vec2], row_width: f32, padding: f32) -> PackLayout {
    let mut offsets = vec![Vec2::ZERO; sizes.len()];
    let mut cursor = Vec2::splat(padding);
    let mut row_height = 0.0f32;
    let mut extent = Vec2::ZERO;
    for &chart_idx in order {
        let size = sizes[chart_idx];
        if cursor.x + size.x + padding > row_width && cursor.x > padding {
            cursor.x = padding;
            cursor.y += row_height + padding;
            row_height = 0.0;
        }
        offsets[chart_idx] = cursor;
        cursor.x += size.x + padding;
        row_height = row_height.max(size.y);
        extent.x = extent.x.max(cursor.x);
        extent.y = extent.y.max(cursor.y + row_height + padding);
    }
    PackLayout {
        offsets,
        side: extent.x.max(extent.y),
        padding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::make_box;
    use crate::raster::{rasterize_atlas, EMPTY_PIXEL};

    /// Two-turn ramp between radius 1 and 2, rising 0.5 per turn. Every
    /// triangle faces roughly +Y, so the turns stack in a top-down projection.
    fn helical_ramp(turns: usize, segments_per_turn: usize) -> Mesh {
        let steps = turns * segments_per_turn;
        let mut positions = Vec::with_capacity((steps + 1) * 2);
        for i in 0..=steps {
            let t = i as f32 / segments_per_turn as f32;
            let (sin, cos) = (t * std::f32::consts::TAU).sin_cos();
            let y = 0.5 * t;
            positions.push([cos, y, sin]);
            positions.push([2.0 * cos, y, 2.0 * sin]);
        }
        let mut indices = Vec::with_capacity(steps * 6);
        for i in 0..steps as u32 {
            let inner = 2 * i;
            let outer = inner + 1;
            indices.extend_from_slice(&[inner, inner + 2, outer, outer, inner + 2, inner + 3]);
        }
        Mesh::with_positions_indices(positions, indices)
    }

    fn uv_sphere(rings: u32, segments: u32) -> Mesh {
        let mut positions = Vec::new();
        for ring in 0..=rings {
            let theta = ring as f32 / rings as f32 * std::f32::consts::PI;
            for segment in 0..=segments {
                let phi = segment as f32 / segments as f32 * std::f32::consts::TAU;
                positions.push([theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()]);
            }
        }
        let stride = segments + 1;
        let mut indices = Vec::new();
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        Mesh::with_positions_indices(positions, indices)
    }

    /// `(covered, multiply covered)` pixel centers, counting a center only
    /// when it lies strictly inside a triangle.
    fn coverage(atlas: &UvAtlas, resolution: u32) -> (usize, usize) {
        let size = resolution as usize;
        let scale = resolution as f32;
        let mut hits = vec![0u32; size * size];
        for tri in atlas.indices.chunks_exact(3) {
            let c = [0, 1, 2].map(|k| Vec2::from(atlas.uvs[tri[k] as usize]) * scale);
            let area = (c[1] - c[0]).perp_dot(c[2] - c[0]);
            if area.abs() < 1.0e-9 {
                continue;
            }
            let min = c[0].min(c[1]).min(c[2]);
            let max = c[0].max(c[1]).max(c[2]);
            let (x0, x1) = (min.x.floor().max(0.0) as usize, (max.x.ceil() as usize).min(size));
            let (y0, y1) = (min.y.floor().max(0.0) as usize, (max.y.ceil() as usize).min(size));
            for y in y0..y1 {
                for x in x0..x1 {
                    let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    let w0 = (c[1] - p).perp_dot(c[2] - p) / area;
                    let w1 = (c[2] - p).perp_dot(c[0] - p) / area;
                    let w2 = 1.0 - w0 - w1;
                    if w0 > 1.0e-4 && w1 > 1.0e-4 && w2 > 1.0e-4 {
                        hits[y * size + x] += 1;
                    }
                }
            }
        }
        let covered = hits.iter().filter(|&&count| count > 0).count();
        let multiply = hits.iter().filter(|&&count| count > 1).count();
        (covered, multiply)
    }

    #[test]
    fn stacked_ramp_turns_split_into_separate_charts() {
        let mesh = helical_ramp(2, 48);
        assert_eq!(mesh.indices.len() / 3, 192);
        let atlas = unwrap(&mesh, &UnwrapOptions::for_resolution(256)).expect("atlas");
        assert!(atlas.chart_count() >= 2, "charts = {}", atlas.chart_count());
        let (covered, multiply) = coverage(&atlas, 256);
        assert!(covered > 0);
        assert_eq!(multiply, 0, "UV triangles overlap in texture space");
    }

    #[test]
    fn sphere_charts_do_not_overlap() {
        let mesh = uv_sphere(24, 48);
        let atlas = unwrap(&mesh, &UnwrapOptions::for_resolution(256)).expect("atlas");
        let (covered, multiply) = coverage(&atlas, 256);
        assert!(covered > 0);
        assert_eq!(multiply, 0);
    }

    #[test]
    fn chart_footprint_rejects_overlap_and_folds() {
        let mut footprint = ChartFootprint::new(1.0);
        let base = [Vec2::ZERO, Vec2::X, Vec2::Y];
        assert!(footprint.try_insert(base));
        // Shares the hypotenuse from the far side.
        assert!(footprint.try_insert([Vec2::X, Vec2::ONE, Vec2::Y]));
        // Reversed winding.
        assert!(!footprint.try_insert([
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(3.0, 0.0)
        ]));
        // Lies over the first triangle.
        assert!(!footprint.try_insert([
            Vec2::splat(0.1),
            Vec2::new(0.6, 0.1),
            Vec2::new(0.1, 0.6)
        ]));
        // Touches only at a corner.
        assert!(footprint.try_insert([Vec2::X, Vec2::new(2.0, 0.0), Vec2::new(2.0, 1.0)]));
    }

    #[test]
    fn gutter_is_measured_in_texels() {
        let options = UnwrapOptions::for_resolution(256);
        assert!((options.padding_fraction() - 2.0 / 256.0).abs() < 1.0e-6);
        let options = UnwrapOptions::for_resolution(2048);
        assert!((options.padding_fraction() - 8.0 / 2048.0).abs() < 1.0e-6);
        let options = UnwrapOptions {
            padding_texels: Some(5.0),
            ..UnwrapOptions::for_resolution(100)
        };
        assert!((options.padding_fraction() - 0.05).abs() < 1.0e-6);
    }

    #[test]
    fn packed_charts_keep_their_gutter() {
        let mesh = make_box([1.0, 1.0, 1.0]);
        let resolution = 256;
        let atlas = unwrap(&mesh, &UnwrapOptions::for_resolution(resolution)).expect("atlas");
        let raster = rasterize_atlas(&atlas, resolution).expect("raster");
        let size = resolution as usize;
        let chart_at = |x: usize, y: usize| {
            let tri = raster.triangles[y * size + x];
            (tri != EMPTY_PIXEL).then(|| atlas.chart_ids[tri as usize])
        };
        for y in 0..size {
            for x in 0..size {
                let Some(chart) = chart_at(x, y) else {
                    continue;
                };
                if x + 1 < size {
                    assert!(chart_at(x + 1, y).is_none_or(|other| other == chart));
                }
                if y + 1 < size {
                    assert!(chart_at(x, y + 1).is_none_or(|other| other == chart));
                }
            }
        }
    }

    #[test]
    fn box_atlas_fills_most_of_the_texture() {
        let mesh = make_box([1.0, 1.0, 1.0]);
        let atlas = unwrap(&mesh, &UnwrapOptions::for_resolution(256)).expect("atlas");
        let raster = rasterize_atlas(&atlas, 256).expect("raster");
        // Six equal squares pack 3 x 2, filling close to two thirds.
        assert!(raster.occupied_count() as f32 > 0.55 * 256.0 * 256.0);
    }

    #[test]
    fn box_unwraps_into_six_charts() {
        let mesh = make_box([1.0, 1.0, 1.0]);
        let atlas = unwrap(&mesh, &UnwrapOptions::default()).expect("atlas");
        assert_eq!(atlas.chart_count(), 6);
        assert_eq!(atlas.triangle_count(), 12);
        assert_eq!(atlas.chart_ids.len(), 12);
        // Each face keeps its four corners; seams split the rest.
        assert_eq!(atlas.vertex_count(), 24);
    }

    #[test]
    fn uvs_stay_in_unit_square_and_map_back() {
        let mesh = make_box([2.0, 1.0, 0.5]);
        let atlas = unwrap(&mesh, &UnwrapOptions::default()).expect("atlas");
        assert_eq!(atlas.uvs.len(), atlas.vmapping.len());
        for uv in &atlas.uvs {
            assert!((0.0..=1.0).contains(&uv[0]));
            assert!((0.0..=1.0).contains(&uv[1]));
        }
        for &original in &atlas.vmapping {
            assert!((original as usize) < mesh.positions.len());
        }
        for (tri, original) in atlas.indices.chunks_exact(3).zip(mesh.indices.chunks_exact(3)) {
            for corner in 0..3 {
                assert_eq!(atlas.vmapping[tri[corner] as usize], original[corner]);
            }
        }
    }

    #[test]
    fn charts_do_not_share_remapped_vertices() {
        let mesh = make_box([1.0, 1.0, 1.0]);
        let atlas = unwrap(&mesh, &UnwrapOptions::default()).expect("atlas");
        let mut owner: HashMap<u32, u32> = HashMap::new();
        for (tri_idx, tri) in atlas.indices.chunks_exact(3).enumerate() {
            let chart = atlas.chart_ids[tri_idx];
            for &vertex in tri {
                let existing = *owner.entry(vertex).or_insert(chart);
                assert_eq!(existing, chart);
            }
        }
    }

    #[test]
    fn unwrap_is_deterministic() {
        let mesh = make_box([1.0, 2.0, 3.0]);
        let a = unwrap(&mesh, &UnwrapOptions::default()).expect("atlas");
        let b = unwrap(&mesh, &UnwrapOptions::default()).expect("atlas");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_mesh_gives_empty_atlas() {
        let atlas = unwrap(&Mesh::default(), &UnwrapOptions::default()).expect("atlas");
        assert_eq!(atlas, UvAtlas::default());
    }

    #[test]
    fn invalid_mesh_is_rejected() {
        let mesh = Mesh::with_positions_indices(vec![[0.0; 3]], vec![0, 1, 2]);
        assert!(unwrap(&mesh, &UnwrapOptions::default()).is_err());
    }

    #[test]
    fn remap_mesh_gathers_positions() {
        let mesh = make_box([1.0, 1.0, 1.0]);
        let atlas = unwrap(&mesh, &UnwrapOptions::default()).expect("atlas");
        let remapped = atlas.remap_mesh(&mesh).expect("remap");
        assert_eq!(remapped.positions.len(), atlas.vertex_count());
        assert!(remapped.validate().is_ok());
        for (i, &original) in atlas.vmapping.iter().enumerate() {
            assert_eq!(remapped.positions[i], mesh.positions[original as usize]);
        }
    }
}
