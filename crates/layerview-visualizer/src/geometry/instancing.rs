//! Per-segment instance records for instanced toolpath drawing.
//!
//! Instead of a full tube mesh, each segment becomes one 48-byte record and
//! a shared template mesh is stretched between its endpoints in the vertex
//! shader. Records are kept sorted by the Z of their first endpoint so a
//! clip height maps to a prefix of the array.

use super::buffer::{GeometryBuffer, Vertex};
use super::extrusion::stadium_width;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use layerview_core::constants::CLIP_EPSILON;
use layerview_core::{BoundingBox3, Toolpath};
use std::ops::Range;

/// Whether geometry whose layer top is `top` survives the clip `(min_z, max_z]`.
///
/// The fragment stage discards on the negation of this test, and
/// [`InstanceArray::clip_range`] selects exactly the records it accepts.
pub fn layer_visible(top: f32, min_z: f32, max_z: f32) -> bool {
    top > min_z + CLIP_EPSILON && top <= max_z + CLIP_EPSILON
}

/// One renderable segment. `pos_a.z` and `pos_b.z` are the layer top.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct InstanceRecord {
    pub pos_a: [f32; 3],
    pub width: f32,
    pub pos_b: [f32; 3],
    pub height: f32,
    pub color: [f32; 4],
}

impl InstanceRecord {
    pub const SIZE: usize = 48;

    pub fn new(pos_a: Vec3, pos_b: Vec3, width: f32, height: f32, color: [f32; 4]) -> Self {
        Self {
            pos_a: pos_a.to_array(),
            width,
            pos_b: pos_b.to_array(),
            height,
            color,
        }
    }

    pub fn z(&self) -> f32 {
        self.pos_a[2]
    }
}

/// Z-sorted instance records.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceArray {
    records: Vec<InstanceRecord>,
    sorted: bool,
}

impl Default for InstanceArray {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceArray {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            sorted: true,
        }
    }

    pub fn records(&self) -> &[InstanceRecord] {
        &self.records
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.sorted = true;
    }

    pub fn push(&mut self, record: InstanceRecord) {
        self.records.push(record);
        self.sorted = false;
    }

    /// Add one record per segment of `toolpath`, with its top at `top_z`.
    ///
    /// Widths are recomputed from the segment flow where one is known so a
    /// single stadium tube carries the extruded volume.
    pub fn extend_from_toolpath(&mut self, toolpath: &Toolpath, top_z: f32, color: [f32; 4]) {
        self.records.reserve(toolpath.len());
        for (k, line) in toolpath.lines.iter().enumerate() {
            let height = toolpath.heights[k];
            let width = stadium_width(toolpath.flows[k], height, toolpath.widths[k]);
            self.records.push(InstanceRecord::new(
                line.a.to_vec3(top_z),
                line.b.to_vec3(top_z),
                width,
                height,
                color,
            ));
        }
        self.sorted = false;
    }

    /// Stable sort by the Z of the first endpoint.
    pub fn sort_by_z(&mut self) {
        if !self.sorted {
            self.records.sort_by(|a, b| a.z().total_cmp(&b.z()));
            self.sorted = true;
        }
    }

    /// Number of leading records with `z <= max_z` (within [`CLIP_EPSILON`]).
    pub fn clip_count(&self, max_z: f32) -> usize {
        let limit = max_z + CLIP_EPSILON;
        if !self.sorted {
            tracing::warn!("clip query on unsorted instance array");
            return self.records.iter().filter(|r| r.z() <= limit).count();
        }
        self.records.partition_point(|r| r.z() <= limit)
    }

    /// Records with `min_z < z <= max_z`, as an index range.
    ///
    /// `min_z` is the bottom of the lowest visible layer, i.e. the top of
    /// the layer beneath it, so that layer's records are excluded.
    pub fn clip_range(&self, min_z: f32, max_z: f32) -> Range<usize> {
        if !self.sorted {
            tracing::warn!("clip query on unsorted instance array");
            return 0..self.records.len();
        }
        let upper = self.clip_count(max_z);
        let lower = self
            .records
            .partition_point(|r| r.z() <= min_z + CLIP_EPSILON)
            .min(upper);
        lower..upper
    }

    /// Bounds of all tubes, including their width and height.
    pub fn bounding_box(&self) -> BoundingBox3 {
        let mut bbox = BoundingBox3::empty();
        for r in &self.records {
            let half_w = r.width * 0.5;
            let pad = Vec3::new(half_w, half_w, 0.0);
            for p in [Vec3::from_array(r.pos_a), Vec3::from_array(r.pos_b)] {
                bbox.merge_point(p + pad);
                bbox.merge_point(p - pad - Vec3::new(0.0, 0.0, r.height));
            }
        }
        bbox
    }
}

/// Sides of the instancing template.
pub const TEMPLATE_SIDES: usize = 8;

/// Unit octagonal tube along +X from 0 to 1 with diameter 1 in Y and Z,
/// closed at both ends. The instanced vertex shader scales it by the
/// record's length, width and height.
pub fn tube_template() -> GeometryBuffer {
    let ring: Vec<(Vec3, f32)> = (0..TEMPLATE_SIDES)
        .map(|k| {
            let a = (k as f32 + 0.5) * std::f32::consts::TAU / TEMPLATE_SIDES as f32;
            let (sin, cos) = a.sin_cos();
            (Vec3::new(0.0, 0.5 * cos, 0.5 * sin), cos)
        })
        .collect();

    let mut tris = GeometryBuffer::triangles();
    let start = Vec3::ZERO;
    let end = Vec3::X;
    for i in 0..TEMPLATE_SIDES {
        let j = (i + 1) % TEMPLATE_SIDES;
        let (pi, ti) = ring[i];
        let (pj, tj) = ring[j];
        let (ni, nj) = (pi.normalize(), pj.normalize());
        let vertex = Vertex::new;

        // Body
        tris.push_triangle(vertex(pi, ni, ti), vertex(pj + end, nj, tj), vertex(pi + end, ni, ti));
        tris.push_triangle(vertex(pi, ni, ti), vertex(pj, nj, tj), vertex(pj + end, nj, tj));

        // Caps
        tris.push_triangle(
            vertex(start, -Vec3::X, 0.0),
            vertex(pj, -Vec3::X, tj),
            vertex(pi, -Vec3::X, ti),
        );
        tris.push_triangle(
            vertex(end, Vec3::X, 0.0),
            vertex(pi + end, Vec3::X, ti),
            vertex(pj + end, Vec3::X, tj),
        );
    }
    tris
}
