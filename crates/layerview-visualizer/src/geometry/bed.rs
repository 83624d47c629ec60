//! Static helper geometry: bed ground, grid, outline, world axes and
//! selection corner brackets.

use super::buffer::ColoredMesh;
use glam::Vec3;
use layerview_core::{BoundingBox3, Point2};
use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};

/// Ground plane Z, just under the first layer.
pub const GROUND_Z: f32 = -0.02;

/// Height the selection brackets are lifted by to stay clear of the grid.
pub const OUTLINE_Z_BIAS: f32 = 0.01;

/// Colours for the bed helpers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BedColors {
    pub ground: [f32; 4],
    pub grid: [f32; 4],
    pub outline: [f32; 4],
}

/// Ground, grid and outline built from one bed polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct BedGeometry {
    pub ground: ColoredMesh,
    pub grid: ColoredMesh,
    pub outline: ColoredMesh,
}

impl BedGeometry {
    pub fn from_outline(outline: &[Point2], grid_spacing: f32, colors: &BedColors) -> Self {
        Self {
            ground: ground_mesh(outline, colors.ground),
            grid: grid_lines(outline, grid_spacing, colors.grid),
            outline: outline_lines(outline, colors.outline),
        }
    }
}

/// Fill the bed polygon with triangles at [`GROUND_Z`].
pub fn ground_mesh(outline: &[Point2], color: [f32; 4]) -> ColoredMesh {
    let mut mesh = ColoredMesh::triangles();
    if outline.len() < 3 {
        return mesh;
    }

    let mut builder = Path::builder();
    builder.begin(point(outline[0].x, outline[0].y));
    for p in &outline[1..] {
        builder.line_to(point(p.x, p.y));
    }
    builder.close();
    let path = builder.build();

    let mut buffers: VertexBuffers<Vec3, u32> = VertexBuffers::new();
    let mut tessellator = FillTessellator::new();
    let result = tessellator.tessellate_path(
        &path,
        &FillOptions::default(),
        &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex| {
            Vec3::new(vertex.position().x, vertex.position().y, GROUND_Z)
        }),
    );
    if let Err(e) = result {
        tracing::warn!(error = ?e, "bed outline tessellation failed");
        return mesh;
    }

    for tri in buffers.indices.chunks_exact(3) {
        mesh.push_triangle(
            buffers.vertices[tri[0] as usize],
            buffers.vertices[tri[1] as usize],
            buffers.vertices[tri[2] as usize],
            color,
        );
    }
    mesh
}

/// Closed polyline around the bed.
pub fn outline_lines(outline: &[Point2], color: [f32; 4]) -> ColoredMesh {
    let mut mesh = ColoredMesh::lines();
    if outline.len() < 2 {
        return mesh;
    }
    for (i, a) in outline.iter().enumerate() {
        let b = outline[(i + 1) % outline.len()];
        mesh.push_line(a.to_vec3(GROUND_Z), b.to_vec3(GROUND_Z), color);
    }
    mesh
}

/// Axis-parallel grid lines every `spacing` mm, clipped to the bed polygon.
pub fn grid_lines(outline: &[Point2], spacing: f32, color: [f32; 4]) -> ColoredMesh {
    let mut mesh = ColoredMesh::lines();
    if outline.len() < 3 || spacing <= 0.0 {
        return mesh;
    }

    let (mut min, mut max) = (Point2::new(f32::MAX, f32::MAX), Point2::new(f32::MIN, f32::MIN));
    for p in outline {
        min = Point2::new(min.x.min(p.x), min.y.min(p.y));
        max = Point2::new(max.x.max(p.x), max.y.max(p.y));
    }

    let mut x = (min.x / spacing).ceil() * spacing;
    while x <= max.x {
        for (y0, y1) in scanline_spans(outline, x, true) {
            mesh.push_line(
                Vec3::new(x, y0, GROUND_Z),
                Vec3::new(x, y1, GROUND_Z),
                color,
            );
        }
        x += spacing;
    }

    let mut y = (min.y / spacing).ceil() * spacing;
    while y <= max.y {
        for (x0, x1) in scanline_spans(outline, y, false) {
            mesh.push_line(
                Vec3::new(x0, y, GROUND_Z),
                Vec3::new(x1, y, GROUND_Z),
                color,
            );
        }
        y += spacing;
    }
    mesh
}

/// Inside spans of the polygon along `x = at` (`vertical`) or `y = at`.
fn scanline_spans(outline: &[Point2], at: f32, vertical: bool) -> Vec<(f32, f32)> {
    let coords = |p: &Point2| if vertical { (p.x, p.y) } else { (p.y, p.x) };
    let mut hits = Vec::new();
    for (i, a) in outline.iter().enumerate() {
        let (au, av) = coords(a);
        let (bu, bv) = coords(&outline[(i + 1) % outline.len()]);
        // Half-open test so a vertex on the scanline is counted once.
        if (au <= at && at < bu) || (bu <= at && at < au) {
            hits.push(av + (at - au) * (bv - av) / (bu - au));
        }
    }
    hits.sort_by(f32::total_cmp);
    hits.chunks_exact(2)
        .filter(|pair| pair[1] - pair[0] > 0.0)
        .map(|pair| (pair[0], pair[1]))
        .collect()
}

/// X (red), Y (green) and Z (blue) axes from the origin.
pub fn axes(length: f32) -> ColoredMesh {
    let mut mesh = ColoredMesh::lines();
    mesh.push_line(Vec3::ZERO, Vec3::X * length, [1.0, 0.0, 0.0, 1.0]);
    mesh.push_line(Vec3::ZERO, Vec3::Y * length, [0.0, 1.0, 0.0, 1.0]);
    mesh.push_line(Vec3::ZERO, Vec3::Z * length, [0.0, 0.0, 1.0, 1.0]);
    mesh
}

/// Corner bracket length along an axis of extent `dim`.
pub fn bracket_length(dim: f32) -> f32 {
    (0.15 * dim).min(0.30 * dim).max(1.0)
}

/// Three short segments from each of the 8 corners of `bbox`, pointing
/// inward along each axis.
pub fn selection_brackets(bbox: &BoundingBox3, color: [f32; 4], mesh: &mut ColoredMesh) {
    if bbox.is_empty() {
        return;
    }
    let size = bbox.size();
    let lengths = [
        bracket_length(size.x),
        bracket_length(size.y),
        bracket_length(size.z),
    ];
    let lift = Vec3::Z * OUTLINE_Z_BIAS;
    for (i, corner) in bbox.corners().into_iter().enumerate() {
        for (axis, unit) in [Vec3::X, Vec3::Y, Vec3::Z].into_iter().enumerate() {
            let inward = if i & (1 << axis) != 0 { -1.0 } else { 1.0 };
            let from = corner + lift;
            mesh.push_line(from, from + unit * inward * lengths[axis], color);
        }
    }
}
