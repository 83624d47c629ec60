//! # Extrusion Tube Geometry
//!
//! Turns 2D toolpaths with per-segment width and height into a solid
//! "stadium tube": every polyline vertex gets an 8-point ring shaped like
//! the cross-section of a squashed filament bead, consecutive rings are
//! bridged by quads, sharp turns are closed with miter quads plus axis
//! fans, and open paths get fan end caps.
//!
//! Ring layout, in the plane spanned by the right-hand side vector
//! `s = dir x Z` and `Z`:
//!
//! ```text
//!          3 ---------- 2
//!        4                1
//!        5                0
//!          6 ---------- 7
//! ```
//!
//! Points 2-3 and 6-7 are the flat top and bottom edges at `+-h/2`; 0-1 and
//! 4-5 lie on the round ends at -30/+30 and 150/210 degrees.

use super::buffer::{GeometryBuffer, Primitive, Vertex};
use glam::{Vec2, Vec3};
use layerview_core::constants::EPSILON;
use layerview_core::{Line2, Point2, Toolpath};
use std::f32::consts::PI;

/// Points per cross-section ring. Fixed for every tube.
pub const RING_POINTS: usize = 8;

/// Turns flatter than this (cosine of the direction change) share one ring.
const COLLINEAR_COS: f32 = 0.999_99;

/// Angle of each ring point on its round end, in degrees.
const RING_ANGLES_DEG: [f32; RING_POINTS] = [-30.0, 30.0, 90.0, 90.0, 150.0, 210.0, 270.0, 270.0];

/// Which round end (+1 right, -1 left) each ring point hangs from.
const RING_SIDE: [f32; RING_POINTS] = [1.0, 1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0];

/// Cross-section of one bead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StadiumProfile {
    pub width: f32,
    pub height: f32,
    /// 0 is the true stadium; towards 1 the profile approaches a rectangle.
    pub flatness: f32,
}

impl StadiumProfile {
    pub fn new(width: f32, height: f32, flatness: f32) -> Self {
        Self {
            width,
            height,
            flatness: flatness.clamp(0.0, 1.0),
        }
    }

    /// Ring points in local (side, up) coordinates with outward normals and
    /// tube coordinates.
    pub fn local_points(&self) -> [(Vec2, Vec2, f32); RING_POINTS] {
        let half_w = self.width * 0.5;
        let ry = self.height * 0.5;
        // Flat half-length and horizontal radius of the round ends. When the
        // bead is narrower than it is tall the flat part vanishes and the
        // ends become a single ellipse.
        let half_flat = ((self.width - self.height) * 0.5).max(0.0);
        let rx = half_w.min(ry);
        let exponent = 1.0 - self.flatness;

        let mut out = [(Vec2::ZERO, Vec2::ZERO, 0.0); RING_POINTS];
        for (i, point) in out.iter_mut().enumerate() {
            let (sin, cos) = RING_ANGLES_DEG[i].to_radians().sin_cos();
            // Snap the flat-edge points so the symmetric pairs are exact.
            let (sin, cos) = match i {
                2 | 3 => (1.0, 0.0),
                6 | 7 => (-1.0, 0.0),
                _ => (sin, cos),
            };
            let x = RING_SIDE[i] * half_flat + rx * cos;
            let v = sin.signum() * sin.abs().powf(exponent);
            let y = ry * v;
            let normal = Vec2::new(cos * ry, sin * rx).normalize_or_zero();
            let tube = if half_w > 0.0 {
                (x / half_w).clamp(-1.0, 1.0)
            } else {
                0.0
            };
            *point = (Vec2::new(x, y), normal, tube);
        }
        out
    }

    /// Ring around `center`, oriented for a segment travelling along `dir`
    /// (unit vector in the XY plane).
    pub fn ring(&self, center: Vec3, dir: Vec3) -> Ring {
        let side = Vec3::new(dir.y, -dir.x, 0.0);
        let mut ring = Ring {
            center,
            top: center.z + self.height * 0.5,
            positions: [Vec3::ZERO; RING_POINTS],
            normals: [Vec3::ZERO; RING_POINTS],
            tubes: [0.0; RING_POINTS],
        };
        for (i, (p, n, t)) in self.local_points().into_iter().enumerate() {
            ring.positions[i] = center + side * p.x + Vec3::Z * p.y;
            ring.normals[i] = side * n.x + Vec3::Z * n.y;
            ring.tubes[i] = t;
        }
        ring
    }
}

/// One cross-section placed in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub center: Vec3,
    /// Top of the layer the ring belongs to.
    pub top: f32,
    pub positions: [Vec3; RING_POINTS],
    pub normals: [Vec3; RING_POINTS],
    pub tubes: [f32; RING_POINTS],
}

impl Ring {
    fn vertex(&self, i: usize) -> Vertex {
        Vertex::new(self.positions[i], self.normals[i], self.tubes[i]).with_layer_top(self.top)
    }

    fn flat_vertex(&self, i: usize, normal: Vec3) -> Vertex {
        Vertex::new(self.positions[i], normal, self.tubes[i]).with_layer_top(self.top)
    }

    fn center_vertex(&self, normal: Vec3) -> Vertex {
        Vertex::new(self.center, normal, 0.0).with_layer_top(self.top)
    }
}

/// Output of the tube builder: body and miter quads plus fan triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct TubeMesh {
    pub quads: GeometryBuffer,
    pub triangles: GeometryBuffer,
}

impl Default for TubeMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl TubeMesh {
    pub fn new() -> Self {
        Self {
            quads: GeometryBuffer::quads(),
            triangles: GeometryBuffer::triangles(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty() && self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.quads.triangle_count() + self.triangles.triangle_count()
    }

    /// Single drawable triangle list.
    pub fn into_triangles(self) -> GeometryBuffer {
        let mut out = GeometryBuffer::with_capacity(
            Primitive::Triangles,
            self.triangle_count() * 3,
        );
        out.append(&self.quads);
        out.append(&self.triangles);
        out
    }
}

/// Counters describing what one build call emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeometryStats {
    pub segments: usize,
    pub joints: usize,
    pub caps: usize,
    pub quads: usize,
    pub triangles: usize,
}

impl GeometryStats {
    pub fn merge(&mut self, other: &GeometryStats) {
        self.segments += other.segments;
        self.joints += other.joints;
        self.caps += other.caps;
        self.quads += other.quads;
        self.triangles += other.triangles;
    }

    /// Triangles after quad triangulation.
    pub fn total_triangles(&self) -> usize {
        self.quads * 2 + self.triangles
    }
}

/// Stadium-tube builder.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExtrusionGeometry {
    pub flatness: f32,
}

impl ExtrusionGeometry {
    pub fn new(flatness: f32) -> Self {
        Self {
            flatness: flatness.clamp(0.0, 1.0),
        }
    }

    /// Build tube geometry for a flattened toolpath whose top sits at `top_z`.
    pub fn build_toolpath(&self, toolpath: &Toolpath, top_z: f32, out: &mut TubeMesh) -> GeometryStats {
        self.build(
            &toolpath.lines,
            &toolpath.widths,
            &toolpath.heights,
            toolpath.closed,
            top_z,
            out,
        )
    }

    /// Append tube geometry for `lines` to `out`.
    ///
    /// `widths` and `heights` are per segment. Segments must be longer than
    /// [`EPSILON`] and cross-sections positive; this is only checked in
    /// debug builds.
    pub fn build(
        &self,
        lines: &[Line2],
        widths: &[f32],
        heights: &[f32],
        closed: bool,
        top_z: f32,
        out: &mut TubeMesh,
    ) -> GeometryStats {
        debug_assert_eq!(lines.len(), widths.len());
        debug_assert_eq!(lines.len(), heights.len());
        debug_assert!(lines.iter().all(|l| l.length() > EPSILON));
        debug_assert!(widths.iter().chain(heights).all(|v| *v > 0.0));

        let n = lines.len();
        let mut stats = GeometryStats::default();
        if n == 0 {
            return stats;
        }

        let dirs: Vec<Vec3> = lines
            .iter()
            .map(|l| Vec3::new(l.b.x - l.a.x, l.b.y - l.a.y, 0.0).normalize_or_zero())
            .collect();

        let mut starts = Vec::with_capacity(n);
        let mut ends = Vec::with_capacity(n);
        for (k, line) in lines.iter().enumerate() {
            let profile = StadiumProfile::new(widths[k], heights[k], self.flatness);
            let z = top_z - heights[k] * 0.5;
            // Exact top so the whole layer compares equal under the clip.
            let place = |p: Point2| Ring {
                top: top_z,
                ..profile.ring(p.to_vec3(z), dirs[k])
            };
            starts.push(place(line.a));
            ends.push(place(line.b));
        }

        // Joints between consecutive segments, plus the wrap-around when closed.
        let joint_count = if closed { n } else { n - 1 };
        let mut joints = Vec::with_capacity(joint_count);
        for j in 0..joint_count {
            let prev = j;
            let next = (j + 1) % n;
            let straight = dirs[prev].dot(dirs[next]) > COLLINEAR_COS
                && widths[prev] == widths[next]
                && heights[prev] == heights[next];
            if straight {
                // Reuse the ring so both bodies meet on identical vertices.
                starts[next] = ends[prev];
            } else {
                joints.push((prev, next));
            }
        }

        out.quads.reserve((n + joints.len()) * RING_POINTS * 4);

        for k in 0..n {
            emit_body(&starts[k], &ends[k], &mut out.quads);
        }
        stats.segments = n;
        stats.quads += n * RING_POINTS;

        for &(prev, next) in &joints {
            emit_joint(
                &ends[prev],
                &starts[next],
                dirs[prev],
                dirs[next],
                out,
            );
        }
        stats.joints = joints.len();
        stats.quads += joints.len() * RING_POINTS;
        stats.triangles += joints.len() * RING_POINTS * 2;

        if !closed {
            emit_cap(&starts[0], -dirs[0], false, &mut out.triangles);
            emit_cap(&ends[n - 1], dirs[n - 1], true, &mut out.triangles);
            stats.caps = 2;
            stats.triangles += 2 * RING_POINTS;
        }

        stats
    }
}

fn emit_body(start: &Ring, end: &Ring, quads: &mut GeometryBuffer) {
    for i in 0..RING_POINTS {
        let j = (i + 1) % RING_POINTS;
        quads.push_quad(start.vertex(i), end.vertex(i), end.vertex(j), start.vertex(j));
    }
}

fn emit_joint(a: &Ring, b: &Ring, dir_in: Vec3, dir_out: Vec3, out: &mut TubeMesh) {
    // Axis fans close each ring on its own side of the turn.
    for i in 0..RING_POINTS {
        let j = (i + 1) % RING_POINTS;
        out.triangles.push_triangle(
            a.center_vertex(dir_in),
            a.flat_vertex(j, dir_in),
            a.flat_vertex(i, dir_in),
        );
        out.triangles.push_triangle(
            b.center_vertex(-dir_out),
            b.flat_vertex(i, -dir_out),
            b.flat_vertex(j, -dir_out),
        );
    }
    // Miter quads bridge the incoming ring straight to the outgoing one.
    for i in 0..RING_POINTS {
        let j = (i + 1) % RING_POINTS;
        out.quads.push_quad(a.vertex(i), b.vertex(i), b.vertex(j), a.vertex(j));
    }
}

fn emit_cap(ring: &Ring, normal: Vec3, at_end: bool, triangles: &mut GeometryBuffer) {
    let center = ring.center_vertex(normal);
    for i in 0..RING_POINTS {
        let j = (i + 1) % RING_POINTS;
        let (first, second) = if at_end { (j, i) } else { (i, j) };
        triangles.push_triangle(
            center,
            ring.flat_vertex(first, normal),
            ring.flat_vertex(second, normal),
        );
    }
}

/// Cross-section area of a stadium bead: a `(width - height) x height`
/// rectangle with two half-discs of diameter `height`.
pub fn stadium_area(width: f32, height: f32) -> f32 {
    (width - height) * height + PI * height * height * 0.25
}

/// Width of a stadium bead of the given height carrying `flow` mm³/mm.
/// Returns `default` when `flow` or `height` is not positive.
pub fn stadium_width(flow: f32, height: f32, default: f32) -> f32 {
    if flow <= 0.0 || height <= 0.0 {
        return default;
    }
    flow / height + height * (1.0 - 0.25 * PI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerview_core::Point2;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn line(ax: f32, ay: f32, bx: f32, by: f32) -> Line2 {
        Line2::new(Point2::new(ax, ay), Point2::new(bx, by))
    }

    fn build(lines: &[Line2], closed: bool) -> (TubeMesh, GeometryStats) {
        let mut mesh = TubeMesh::new();
        let widths = vec![0.45; lines.len()];
        let heights = vec![0.2; lines.len()];
        let stats =
            ExtrusionGeometry::default().build(lines, &widths, &heights, closed, 0.2, &mut mesh);
        (mesh, stats)
    }

    fn key(p: [f32; 3]) -> (i64, i64, i64) {
        let q = |v: f32| (v * 1e5).round() as i64;
        (q(p[0]), q(p[1]), q(p[2]))
    }

    fn edge_counts(buffer: &GeometryBuffer) -> HashMap<((i64, i64, i64), (i64, i64, i64)), usize> {
        let mut counts = HashMap::new();
        for tri in buffer.triangulate().vertices().chunks_exact(3) {
            for (u, v) in [(0, 1), (1, 2), (2, 0)] {
                let (a, b) = (key(tri[u].position), key(tri[v].position));
                if a == b {
                    continue;
                }
                let edge = if a < b { (a, b) } else { (b, a) };
                *counts.entry(edge).or_insert(0) += 1;
            }
        }
        counts
    }

    fn square_loop() -> Vec<Line2> {
        vec![
            line(0.0, 0.0, 10.0, 0.0),
            line(10.0, 0.0, 10.0, 10.0),
            line(10.0, 10.0, 0.0, 10.0),
            line(0.0, 10.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_ring_flat_edges_at_half_height() {
        let profile = StadiumProfile::new(0.45, 0.2, 0.0);
        let pts = profile.local_points();
        for i in [2, 3] {
            assert!((pts[i].0.y - 0.1).abs() < 1e-6);
        }
        for i in [6, 7] {
            assert!((pts[i].0.y + 0.1).abs() < 1e-6);
        }
        // Flat edges span the rectangle part.
        assert!((pts[2].0.x - 0.125).abs() < 1e-6);
        assert!((pts[3].0.x + 0.125).abs() < 1e-6);
        // Round-end points stay within the bead width.
        assert!(pts.iter().all(|(p, _, _)| p.x.abs() <= 0.225 + 1e-6));
    }

    #[test]
    fn test_narrow_profile_degenerates_to_ellipse() {
        let profile = StadiumProfile::new(0.2, 0.4, 0.0);
        let pts = profile.local_points();
        assert!(pts[2].0.x.abs() < 1e-6);
        assert!(pts[3].0.x.abs() < 1e-6);
        assert!(pts.iter().all(|(p, _, t)| p.x.abs() <= 0.1 + 1e-6 && t.abs() <= 1.0));
    }

    #[test]
    fn test_flatness_pushes_points_outward() {
        let round = StadiumProfile::new(0.45, 0.2, 0.0).local_points();
        let flat = StadiumProfile::new(0.45, 0.2, 0.9).local_points();
        assert!(flat[1].0.y > round[1].0.y);
        assert!(flat[0].0.y < round[0].0.y);
        assert!((flat[2].0.y - round[2].0.y).abs() < 1e-6);
    }

    #[test]
    fn test_ring_normals_point_away_from_center() {
        let ring = StadiumProfile::new(0.45, 0.2, 0.0).ring(Vec3::new(1.0, 2.0, 0.1), Vec3::X);
        for i in 0..RING_POINTS {
            let radial = ring.positions[i] - ring.center;
            assert!(ring.normals[i].dot(radial) > 0.0, "point {}", i);
            assert!((ring.normals[i].length() - 1.0).abs() < 1e-5);
            assert!(ring.normals[i].dot(Vec3::X).abs() < 1e-6);
        }
    }

    #[test]
    fn test_straight_open_polyline_scenario() {
        let lines = [line(0.0, 0.0, 5.0, 0.0), line(5.0, 0.0, 10.0, 0.0)];
        let (mesh, stats) = build(&lines, false);
        assert_eq!(stats.segments, 2);
        assert_eq!(stats.caps, 2);
        assert_eq!(stats.joints, 0);
        assert_eq!(mesh.quads.face_count(), 16);
        assert_eq!(mesh.triangles.face_count(), 16);
        assert_eq!(mesh.triangle_count(), 48);
        assert_eq!(stats.total_triangles(), 48);
    }

    #[test]
    fn test_single_segment_has_caps_only() {
        let (mesh, stats) = build(&[line(0.0, 0.0, 3.0, 4.0)], false);
        assert_eq!(stats.joints, 0);
        assert_eq!(stats.caps, 2);
        assert_eq!(mesh.triangle_count(), 8 * 2 + 8 * 2);
    }

    #[test]
    fn test_open_path_end_caps_face_outward() {
        let lines = [line(0.0, 0.0, 5.0, 0.0), line(5.0, 0.0, 5.0, 5.0)];
        let (mesh, stats) = build(&lines, false);
        assert_eq!(stats.caps, 2);
        assert_eq!(stats.joints, 1);

        // Joint fans come first, then the start cap, then the end cap.
        let fans = mesh.triangles.vertices();
        let cap_len = RING_POINTS * 3;
        let start_cap = &fans[fans.len() - 2 * cap_len..fans.len() - cap_len];
        let end_cap = &fans[fans.len() - cap_len..];
        let start_tangent = Vec3::X;
        let end_tangent = Vec3::Y;

        for tri in start_cap.chunks_exact(3) {
            let face = (tri[1].position() - tri[0].position())
                .cross(tri[2].position() - tri[0].position());
            assert!(face.dot(start_tangent) < 0.0);
            assert!(tri[0].normal().dot(start_tangent) < 0.0);
        }
        for tri in end_cap.chunks_exact(3) {
            let face = (tri[1].position() - tri[0].position())
                .cross(tri[2].position() - tri[0].position());
            assert!(face.dot(end_tangent) > 0.0);
            assert!(tri[0].normal().dot(end_tangent) > 0.0);
        }
    }

    #[test]
    fn test_closed_loop_body_and_miters_are_watertight() {
        let (mesh, stats) = build(&square_loop(), true);
        assert_eq!(stats.joints, 4);
        assert_eq!(stats.caps, 0);

        let counts = edge_counts(&mesh.quads);
        assert!(counts.values().all(|&c| c == 2));
    }

    #[test]
    fn test_closed_loop_has_no_single_use_edges() {
        let (mesh, _) = build(&square_loop(), true);
        let counts = edge_counts(&mesh.into_triangles());
        assert!(!counts.is_empty());
        assert!(counts.values().all(|&c| c != 1));
    }

    #[test]
    fn test_open_straight_path_is_closed_manifold() {
        let lines = [line(0.0, 0.0, 5.0, 0.0), line(5.0, 0.0, 10.0, 0.0)];
        let (mesh, _) = build(&lines, false);
        let counts = edge_counts(&mesh.into_triangles());
        assert!(counts.values().all(|&c| c == 2));
    }

    #[test]
    fn test_sharp_reversal_stays_finite() {
        let lines = [line(0.0, 0.0, 5.0, 0.0), line(5.0, 0.0, 0.0, 0.1)];
        let (mesh, stats) = build(&lines, false);
        assert_eq!(stats.joints, 1);
        let tris = mesh.into_triangles();
        assert!(tris
            .vertices()
            .iter()
            .all(|v| v.position.iter().chain(&v.normal).all(|c| c.is_finite())));
        let counts = edge_counts(&tris);
        assert!(counts.values().all(|&c| c != 1));
    }

    #[test]
    fn test_every_vertex_carries_layer_top() {
        let (mesh, _) = build(&square_loop(), true);
        let tris = mesh.into_triangles();
        assert!(tris.vertices().iter().all(|v| v.layer_top == 0.2));

        let (open, _) = build(&[line(0.0, 0.0, 5.0, 0.0), line(5.0, 0.0, 5.0, 5.0)], false);
        assert!(open.into_triangles().vertices().iter().all(|v| v.layer_top == 0.2));
    }

    #[test]
    fn test_tube_coordinates_in_range() {
        let (mesh, _) = build(&square_loop(), true);
        let tris = mesh.into_triangles();
        assert!(tris.vertices().iter().all(|v| (-1.0..=1.0).contains(&v.tube)));
    }

    #[test]
    fn test_top_z_sets_vertical_extent() {
        let (mesh, _) = build(&[line(0.0, 0.0, 1.0, 0.0)], false);
        let bbox = mesh.into_triangles().bounding_box();
        assert!((bbox.max.z - 0.2).abs() < 1e-6);
        assert!(bbox.min.z.abs() < 1e-6);
    }

    #[test]
    fn test_stadium_width_default_for_no_flow() {
        assert_eq!(stadium_width(0.0, 0.2, 0.45), 0.45);
        assert_eq!(stadium_width(-1.0, 0.2, 0.45), 0.45);
    }

    proptest! {
        #[test]
        fn prop_ring_symmetric_about_both_axes(w in 0.05f32..2.0, h in 0.05f32..1.0) {
            let pts = StadiumProfile::new(w, h, 0.0).local_points();
            let mirror_x = [5, 4, 3, 2, 1, 0, 7, 6];
            let mirror_y = [1, 0, 7, 6, 5, 4, 3, 2];
            for i in 0..RING_POINTS {
                let p = pts[i].0;
                let mx = pts[mirror_x[i]].0;
                let my = pts[mirror_y[i]].0;
                prop_assert!((p.x + mx.x).abs() < 1e-5 && (p.y - mx.y).abs() < 1e-5);
                prop_assert!((p.x - my.x).abs() < 1e-5 && (p.y + my.y).abs() < 1e-5);
            }
            for i in [2, 3] {
                prop_assert!((pts[i].0.y - h * 0.5).abs() < 1e-5);
            }
            for i in [6, 7] {
                prop_assert!((pts[i].0.y + h * 0.5).abs() < 1e-5);
            }
        }

        #[test]
        fn prop_stadium_width_reproduces_flow(flow in 0.001f32..2.0, h in 0.05f32..0.6) {
            let w = stadium_width(flow, h, 0.45);
            let area = stadium_area(w, h);
            prop_assert!((area - flow).abs() < 1e-4 * flow.max(1.0));
        }
    }
}
